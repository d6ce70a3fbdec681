#![allow(dead_code)]

use askshell::llm::{LLMClient, LLMError};
use askshell::session::ProposalOutcome;
use askshell::shell::Interpreter;
use askshell::{AuditLogger, SafetyEvaluator, Session, SessionOptions, ShellExecutor};
use async_trait::async_trait;
use std::path::PathBuf;
use tempfile::TempDir;

/// LLM client that always answers with the same text
pub struct MockLLMClient {
    pub response: String,
}

impl MockLLMClient {
    /// Reply in the shape the translator asks the model for
    pub fn proposing(command: &str, explanation: &str) -> Self {
        Self {
            response: proposal_json(command, explanation),
        }
    }
}

#[async_trait]
impl LLMClient for MockLLMClient {
    async fn complete(&self, _prompt: &str) -> Result<String, LLMError> {
        Ok(self.response.clone())
    }
}

pub fn proposal_json(command: &str, explanation: &str) -> String {
    serde_json::json!({ "command": command, "explanation": explanation }).to_string()
}

pub fn log_path(dir: &TempDir) -> PathBuf {
    dir.path().join("command_log.txt")
}

/// Session whose executor can never start a process
pub fn offline_session(dir: &TempDir, options: SessionOptions) -> Session {
    let executor = ShellExecutor::new(Interpreter::new("askshell-no-such-interpreter", ["-c"]));
    Session::new(
        SafetyEvaluator::default(),
        executor,
        Some(AuditLogger::with_path(log_path(dir))),
        options,
    )
}

/// Session running commands through POSIX `sh -c`
#[cfg(unix)]
pub fn sh_session(dir: &TempDir, options: SessionOptions) -> Session {
    Session::new(
        SafetyEvaluator::default(),
        ShellExecutor::new(Interpreter::new("sh", ["-c"])),
        Some(AuditLogger::with_path(log_path(dir))),
        options,
    )
}

/// Drive a session to ProposalReady holding `command`
pub fn propose(session: &mut Session, command: &str) {
    let ticket = session.submit("test request").unwrap();
    let outcome = session.receive_translation(ticket, Ok(proposal_json(command, "test")));
    assert!(
        matches!(outcome, ProposalOutcome::Ready(_)),
        "proposal for {:?} was not accepted: {:?}",
        command,
        outcome
    );
}

/// True when a PowerShell interpreter is installed
pub fn powershell_available() -> bool {
    Interpreter::platform_default().resolve().is_ok()
}

/// True when PowerShell can run; otherwise reports the skipped test
pub fn require_powershell(test: &str) -> bool {
    let available = powershell_available();
    if !available {
        eprintln!(
            "skipping {}: {} not found on PATH",
            test,
            Interpreter::platform_default().program()
        );
    }
    available
}
