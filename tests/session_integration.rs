// End-to-end request cycles: translation, confirmation, execution and the
// audit trail they leave behind.

mod helpers;

use askshell::audit::AuditEntry;
use askshell::llm::Translator;
use askshell::session::{
    ConfirmOutcome, ProposalOutcome, SessionEvent, SessionOptions, SessionPhase, TranslationWorker,
};
use askshell::shell::{ExecutionStatus, Interpreter};
use askshell::{AuditLogger, ShellExecutor};
use helpers::{MockLLMClient, log_path, offline_session, propose, require_powershell};
use std::sync::Arc;
use tempfile::TempDir;

#[test]
fn test_empty_command_fails_without_process() {
    // Even a missing interpreter is never looked up for an empty command
    let executor = ShellExecutor::new(Interpreter::new("askshell-no-such-interpreter", ["-c"]));
    let result = executor.execute("");

    assert_eq!(result.status, ExecutionStatus::Failure);
    assert_eq!(result.stderr, "Command cannot be empty");
    assert!(result.stdout.is_empty());
}

#[test]
fn test_dry_run_mode_never_executes_or_logs() {
    let dir = TempDir::new().unwrap();
    let options = SessionOptions {
        safe_mode: true,
        dry_run: true,
    };
    let mut session = offline_session(&dir, options);

    for command in ["Get-Process", "Remove-Item C:\\Windows", "Get-Date"] {
        propose(&mut session, command);
        match session.confirm().unwrap() {
            ConfirmOutcome::Simulated(report) => assert_eq!(report.command, command),
            other => panic!("expected a simulation, got {:?}", other),
        }
    }

    assert!(!log_path(&dir).exists());
}

#[test]
fn test_audit_trail_keeps_execution_order() {
    let dir = TempDir::new().unwrap();
    let mut session = offline_session(&dir, SessionOptions::default());

    let commands = ["Get-Process", "Get-Date", "Get-ChildItem -Path C:\\"];
    for command in commands {
        propose(&mut session, command);
        assert!(matches!(session.confirm().unwrap(), ConfirmOutcome::Executed(_)));
    }

    let entries = AuditLogger::with_path(log_path(&dir)).read_entries().unwrap();
    let logged: Vec<&str> = entries.iter().map(|e| e.command.as_str()).collect();
    assert_eq!(logged, commands);

    // Lines read back parse to identical entries
    for entry in &entries {
        assert_eq!(AuditEntry::parse_line(&entry.to_line()).as_ref(), Some(entry));
    }
}

#[test]
fn test_blocked_between_executions_leaves_no_gap_entry() {
    let dir = TempDir::new().unwrap();
    let mut session = offline_session(&dir, SessionOptions::default());

    propose(&mut session, "Get-Date");
    session.confirm().unwrap();
    propose(&mut session, "shutdown /r /t 0");
    assert!(matches!(session.confirm().unwrap(), ConfirmOutcome::Blocked(_)));
    propose(&mut session, "Get-Process");
    session.confirm().unwrap();

    let entries = AuditLogger::with_path(log_path(&dir)).read_entries().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].command, "Get-Date");
    assert_eq!(entries[1].command, "Get-Process");
}

#[tokio::test]
async fn test_worker_round_trip() {
    let dir = TempDir::new().unwrap();
    let mut session = offline_session(&dir, SessionOptions::default());
    let translator = Arc::new(Translator::new(Box::new(MockLLMClient::proposing(
        "Get-Process",
        "Lists running processes",
    ))));
    let (worker, mut events) = TranslationWorker::new(translator);

    let ticket = session.submit("show me what's running").unwrap();
    worker.spawn(ticket, "show me what's running".to_string());

    let Some(SessionEvent::TranslationReady { ticket, reply }) = events.recv().await else {
        panic!("worker delivered nothing");
    };
    match session.receive_translation(ticket, reply) {
        ProposalOutcome::Ready(proposal) => {
            assert_eq!(proposal.raw_command(), "Get-Process");
            assert_eq!(proposal.explanation(), "Lists running processes");
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
    assert_eq!(session.phase(), SessionPhase::ProposalReady);
}

#[tokio::test]
async fn test_fenced_reply_is_accepted() {
    let dir = TempDir::new().unwrap();
    let mut session = offline_session(&dir, SessionOptions::default());
    let fenced = format!("```json\n{}\n```", helpers::proposal_json("Get-Date", "Today"));
    let translator = Arc::new(Translator::new(Box::new(MockLLMClient { response: fenced })));
    let (worker, mut events) = TranslationWorker::new(translator);

    let ticket = session.submit("what day is it").unwrap();
    worker.spawn(ticket, "what day is it".to_string()).await.unwrap();

    let Some(SessionEvent::TranslationReady { ticket, reply }) = events.recv().await else {
        panic!("worker delivered nothing");
    };
    assert!(matches!(
        session.receive_translation(ticket, reply),
        ProposalOutcome::Ready(_)
    ));
}

#[cfg(unix)]
mod posix {
    use super::*;
    use crate::helpers::sh_session;

    #[test]
    fn test_successful_command_logged_as_success() {
        let dir = TempDir::new().unwrap();
        let mut session = sh_session(&dir, SessionOptions::default());
        propose(&mut session, "echo running");

        let report = match session.confirm().unwrap() {
            ConfirmOutcome::Executed(report) => report,
            other => panic!("unexpected outcome: {:?}", other),
        };
        assert_eq!(report.result.exit_code, 0);
        assert_eq!(report.result.stdout, "running\n");

        let entries = AuditLogger::with_path(log_path(&dir)).read_entries().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].status, "Success");
    }

    #[test]
    fn test_failing_command_logged_with_stderr() {
        let dir = TempDir::new().unwrap();
        let mut session = sh_session(&dir, SessionOptions::default());
        propose(&mut session, "echo no such cmdlet >&2; exit 3");

        let report = match session.confirm().unwrap() {
            ConfirmOutcome::Executed(report) => report,
            other => panic!("unexpected outcome: {:?}", other),
        };
        assert_eq!(report.result.exit_code, 3);
        assert_eq!(report.result.status, ExecutionStatus::Failure);

        let entries = AuditLogger::with_path(log_path(&dir)).read_entries().unwrap();
        assert_eq!(entries.len(), 1);
        assert!(entries[0].status.starts_with("Failure"));
        assert!(entries[0].status.contains("no such cmdlet"));
    }
}

mod powershell {
    use super::*;
    use askshell::SafetyEvaluator;
    use askshell::Session;

    fn pwsh_session(dir: &TempDir) -> Session {
        Session::new(
            SafetyEvaluator::default(),
            ShellExecutor::new(Interpreter::platform_default()),
            Some(AuditLogger::with_path(log_path(dir))),
            SessionOptions::default(),
        )
    }

    #[test]
    fn test_get_process_succeeds() {
        if !require_powershell("test_get_process_succeeds") {
            return;
        }

        let dir = TempDir::new().unwrap();
        let mut session = pwsh_session(&dir);
        propose(&mut session, "Get-Process");

        let report = match session.confirm().unwrap() {
            ConfirmOutcome::Executed(report) => report,
            other => panic!("unexpected outcome: {:?}", other),
        };
        assert_eq!(report.result.exit_code, 0);
        assert!(!report.result.stdout.is_empty());

        let entries = AuditLogger::with_path(log_path(&dir)).read_entries().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].status, "Success");
    }

    #[test]
    fn test_unknown_cmdlet_fails_with_stderr() {
        if !require_powershell("test_unknown_cmdlet_fails_with_stderr") {
            return;
        }

        let dir = TempDir::new().unwrap();
        let mut session = pwsh_session(&dir);
        propose(&mut session, "Get-NonExistentCmdlet");

        let report = match session.confirm().unwrap() {
            ConfirmOutcome::Executed(report) => report,
            other => panic!("unexpected outcome: {:?}", other),
        };
        assert_ne!(report.result.exit_code, 0);
        assert!(!report.result.stderr.is_empty());

        let entries = AuditLogger::with_path(log_path(&dir)).read_entries().unwrap();
        assert_eq!(entries.len(), 1);
        assert!(entries[0].status.starts_with("Failure (stderr:"));
    }
}
