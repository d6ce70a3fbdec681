use crate::security::{DEFAULT_POLICY_RULES, PolicyRule, SafetyPolicy};
use crate::shell::Interpreter;
use crate::audit::LOG_FILE_NAME;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Env file the translator credential may live in
const DOTENV_FILE: &str = "dotenv.env";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Config directory not found")]
    DirectoryNotFound,

    #[error("Invalid config value: {0}")]
    InvalidValue(String),
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    pub llm: LLMConfig,
    pub shell: ShellConfig,
    pub behavior: BehaviorConfig,
    pub audit: AuditConfig,
    pub safety: SafetyConfig,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct LLMConfig {
    pub provider: String,
    pub model: String,
    pub api_key_env: String,
    pub api_key: Option<String>,
    pub timeout_seconds: u64,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ShellConfig {
    /// Interpreter program; platform default when unset
    pub program: Option<String>,
    /// Arguments placed before the command text; platform default when unset
    pub args: Option<Vec<String>>,
    pub timeout_seconds: u64,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct BehaviorConfig {
    pub safe_mode: bool,
    pub dry_run: bool,
    pub log_commands: bool,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Default)]
#[serde(default)]
pub struct AuditConfig {
    pub log_path: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct SafetyConfig {
    pub rules: Vec<RuleConfig>,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct RuleConfig {
    pub keyword: String,
    #[serde(default)]
    pub requires_url_absence: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_config()
    }
}

impl Default for LLMConfig {
    fn default() -> Self {
        Config::default_config().llm
    }
}

impl Default for ShellConfig {
    fn default() -> Self {
        Config::default_config().shell
    }
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Config::default_config().behavior
    }
}

impl Default for SafetyConfig {
    fn default() -> Self {
        Config::default_config().safety
    }
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> Result<PathBuf, ConfigError> {
        let dir = dirs::config_dir().ok_or(ConfigError::DirectoryNotFound)?;
        Ok(dir.join("askshell"))
    }

    /// Get the config file path
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load configuration from a file
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;

        // Validate config
        config.validate()?;

        Ok(config)
    }

    /// Load configuration, falling back to defaults when the file is absent
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => match Self::config_path() {
                Ok(path) => path,
                Err(_) => return Ok(Self::default_config()),
            },
        };

        if !path.exists() {
            debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default_config());
        }

        Self::load_from(&path)
    }

    /// Create default configuration
    pub fn default_config() -> Self {
        Config {
            llm: LLMConfig {
                provider: "gemini".to_string(),
                model: "gemini-2.5-pro".to_string(),
                api_key_env: "GEMINI_API_KEY".to_string(),
                api_key: None,
                timeout_seconds: 60,
            },
            shell: ShellConfig {
                program: None,
                args: None,
                timeout_seconds: 30,
            },
            behavior: BehaviorConfig {
                safe_mode: true,
                dry_run: false,
                log_commands: true,
            },
            audit: AuditConfig { log_path: None },
            safety: SafetyConfig {
                rules: DEFAULT_POLICY_RULES
                    .iter()
                    .map(|&(keyword, requires_url_absence)| RuleConfig {
                        keyword: keyword.to_string(),
                        requires_url_absence,
                    })
                    .collect(),
            },
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        // Validate provider
        if self.llm.provider != "gemini" {
            return Err(ConfigError::InvalidValue(format!(
                "Unsupported LLM provider: {}. Only 'gemini' is supported",
                self.llm.provider
            )));
        }

        if self.llm.model.trim().is_empty() {
            return Err(ConfigError::InvalidValue(
                "llm.model must not be empty".to_string(),
            ));
        }

        if self.llm.timeout_seconds == 0 {
            return Err(ConfigError::InvalidValue(
                "llm.timeout_seconds must be greater than 0".to_string(),
            ));
        }

        // Validate shell settings
        if self.shell.timeout_seconds == 0 {
            return Err(ConfigError::InvalidValue(
                "shell.timeout_seconds must be greater than 0".to_string(),
            ));
        }

        if let Some(ref program) = self.shell.program
            && program.trim().is_empty()
        {
            return Err(ConfigError::InvalidValue(
                "shell.program must not be empty".to_string(),
            ));
        }

        // Validate safety rules
        if let Some(rule) = self.safety.rules.iter().find(|r| r.keyword.trim().is_empty()) {
            return Err(ConfigError::InvalidValue(format!(
                "Safety rule keyword must not be blank (found {:?})",
                rule.keyword
            )));
        }

        Ok(())
    }

    /// Build the process-wide safety policy from the configured rules
    pub fn safety_policy(&self) -> SafetyPolicy {
        let rules = self
            .safety
            .rules
            .iter()
            .map(|rule| {
                if rule.requires_url_absence {
                    PolicyRule::url_gated(rule.keyword.trim())
                } else {
                    PolicyRule::blocking(rule.keyword.trim())
                }
            })
            .collect();
        SafetyPolicy::new(rules)
    }

    /// Interpreter from config, filling gaps with the platform default
    pub fn interpreter(&self) -> Interpreter {
        let default = Interpreter::platform_default();
        match (&self.shell.program, &self.shell.args) {
            (None, None) => default,
            (program, args) => {
                let program = program
                    .clone()
                    .unwrap_or_else(|| default.program().to_string());
                let args = args.clone().unwrap_or_else(|| default.args().to_vec());
                Interpreter::new(program, args)
            }
        }
    }

    pub fn shell_timeout(&self) -> Duration {
        Duration::from_secs(self.shell.timeout_seconds)
    }

    pub fn llm_timeout(&self) -> Duration {
        Duration::from_secs(self.llm.timeout_seconds)
    }

    /// Audit log location, configured or default
    pub fn audit_log_path(&self) -> Option<PathBuf> {
        self.audit
            .log_path
            .clone()
            .or_else(|| Self::config_dir().ok().map(|dir| dir.join(LOG_FILE_NAME)))
    }

    /// Get API key from environment variable or config
    pub fn get_api_key(&self) -> Option<String> {
        // First try environment variable
        if let Ok(key) = std::env::var(&self.llm.api_key_env)
            && !key.is_empty()
        {
            return Some(key);
        }

        // Fall back to config file if present
        self.llm.api_key.clone().filter(|key| !key.is_empty())
    }

}

/// Load `dotenv.env` (or `.env`) from the working directory into the
/// environment. Existing variables win; a missing file is not an error.
pub fn load_dotenv() -> Option<PathBuf> {
    match dotenvy::from_filename(DOTENV_FILE) {
        Ok(path) => Some(path),
        Err(_) => dotenvy::dotenv().ok(),
    }
}
