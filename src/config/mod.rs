pub mod settings;

pub use settings::{
    AuditConfig, BehaviorConfig, Config, ConfigError, LLMConfig, RuleConfig, SafetyConfig,
    ShellConfig, load_dotenv,
};
