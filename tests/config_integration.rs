// Configuration files feeding the safety policy and the executor

use askshell::{Config, SafetyEvaluator};
use std::fs;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

#[test]
fn test_partial_file_fills_in_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(
        &path,
        r#"
[behavior]
safe_mode = false
"#,
    )
    .unwrap();

    let config = Config::load_or_default(Some(&path)).unwrap();
    assert!(!config.behavior.safe_mode);
    assert!(config.behavior.log_commands);
    assert_eq!(config.llm.provider, "gemini");
    assert_eq!(config.shell_timeout(), Duration::from_secs(30));

    // No rules section keeps the built-in policy
    let evaluator = SafetyEvaluator::new(Arc::new(config.safety_policy()));
    assert!(evaluator.evaluate("Remove-Item C:\\Windows").is_blocked());
}

#[test]
fn test_custom_rules_drive_evaluation() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(
        &path,
        r#"
[[safety.rules]]
keyword = "Stop-Computer"

[[safety.rules]]
keyword = "curl"
requires_url_absence = true
"#,
    )
    .unwrap();

    let config = Config::load_or_default(Some(&path)).unwrap();
    let evaluator = SafetyEvaluator::new(Arc::new(config.safety_policy()));

    assert!(evaluator.evaluate("stop-computer -Force").is_blocked());
    assert!(evaluator.evaluate("curl https://example.com").is_blocked());
    assert!(evaluator.evaluate("curl --version").allowed);
    // Only the configured rules apply
    assert!(evaluator.evaluate("Remove-Item foo.txt").allowed);
}

#[test]
fn test_shell_section_overrides_interpreter() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(
        &path,
        r#"
[shell]
program = "sh"
args = ["-c"]
timeout_seconds = 5
"#,
    )
    .unwrap();

    let config = Config::load_or_default(Some(&path)).unwrap();
    let interpreter = config.interpreter();
    assert_eq!(interpreter.program(), "sh");
    assert_eq!(interpreter.args(), ["-c".to_string()]);
    assert_eq!(config.shell_timeout(), Duration::from_secs(5));
}

#[test]
fn test_invalid_values_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(
        &path,
        r#"
[llm]
provider = "someone-else"
"#,
    )
    .unwrap();

    assert!(Config::load_or_default(Some(&path)).is_err());
}
