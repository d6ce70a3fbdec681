use crate::audit::{AuditEntry, AuditError, AuditLogger};
use crate::llm::TranslationError;
use crate::security::{SafetyDecision, SafetyEvaluator};
use crate::session::parser::{CommandProposal, parse_proposal};
use crate::shell::{ExecutionResult, ShellExecutor};
use std::fmt;
use thiserror::Error;
use tracing::{info, warn};

/// Identifies one submission, so late translator replies can be told apart
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ticket(u64);

impl Ticket {
    pub fn id(&self) -> u64 {
        self.0
    }
}

/// Observable session state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    AwaitingProposal,
    ProposalReady,
    Executing,
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionPhase::Idle => "idle",
            SessionPhase::AwaitingProposal => "awaiting a proposal",
            SessionPhase::ProposalReady => "a proposal is ready",
            SessionPhase::Executing => "executing",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("Please enter a command request")]
    EmptyPrompt,

    #[error("Cannot {action} while {phase}")]
    InvalidTransition {
        action: &'static str,
        phase: SessionPhase,
    },
}

/// Toggles the presentation layer can flip between cycles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions {
    /// Blocked decisions veto execution
    pub safe_mode: bool,
    /// Confirm only simulates
    pub dry_run: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            safe_mode: true,
            dry_run: false,
        }
    }
}

/// What became of a translator reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProposalOutcome {
    /// A proposal is now held
    Ready(CommandProposal),
    /// No usable command; the session is idle again
    Failed(String),
    /// Reply for a cancelled or superseded submission; ignored
    Stale,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DryRunReport {
    pub command: String,
    pub explanation: String,
}

#[derive(Debug)]
pub struct ExecutionReport {
    pub command: String,
    pub decision: SafetyDecision,
    pub result: ExecutionResult,
    /// Set when the audit entry could not be written
    pub audit_error: Option<AuditError>,
}

#[derive(Debug)]
pub enum ConfirmOutcome {
    Blocked(SafetyDecision),
    Executed(ExecutionReport),
    Simulated(DryRunReport),
}

#[derive(Debug)]
enum State {
    Idle,
    AwaitingProposal(Ticket),
    ProposalReady(CommandProposal),
    Executing,
}

/// The safety-gated execution state machine.
///
/// Transitions are plain method calls returning what happened; the session
/// owns no UI and is driven from one thread of control at a time.
pub struct Session {
    evaluator: SafetyEvaluator,
    executor: ShellExecutor,
    audit: Option<AuditLogger>,
    options: SessionOptions,
    state: State,
    next_ticket: u64,
}

impl Session {
    pub fn new(
        evaluator: SafetyEvaluator,
        executor: ShellExecutor,
        audit: Option<AuditLogger>,
        options: SessionOptions,
    ) -> Self {
        Self {
            evaluator,
            executor,
            audit,
            options,
            state: State::Idle,
            next_ticket: 0,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        match self.state {
            State::Idle => SessionPhase::Idle,
            State::AwaitingProposal(_) => SessionPhase::AwaitingProposal,
            State::ProposalReady(_) => SessionPhase::ProposalReady,
            State::Executing => SessionPhase::Executing,
        }
    }

    pub fn proposal(&self) -> Option<&CommandProposal> {
        match self.state {
            State::ProposalReady(ref proposal) => Some(proposal),
            _ => None,
        }
    }

    pub fn options(&self) -> SessionOptions {
        self.options
    }

    pub fn set_safe_mode(&mut self, enabled: bool) {
        self.options.safe_mode = enabled;
    }

    pub fn set_dry_run(&mut self, enabled: bool) {
        self.options.dry_run = enabled;
    }

    pub fn audit_logger(&self) -> Option<&AuditLogger> {
        self.audit.as_ref()
    }

    /// Program the executor hands commands to
    pub fn interpreter_name(&self) -> &str {
        self.executor.interpreter().program()
    }

    /// Start a new request. The caller runs the translator for the returned
    /// ticket and hands the reply to `receive_translation`.
    pub fn submit(&mut self, prompt: &str) -> Result<Ticket, SessionError> {
        if prompt.trim().is_empty() {
            return Err(SessionError::EmptyPrompt);
        }

        match self.state {
            State::Idle | State::ProposalReady(_) => {}
            _ => return Err(self.invalid("submit")),
        }

        self.next_ticket += 1;
        let ticket = Ticket(self.next_ticket);
        self.state = State::AwaitingProposal(ticket);
        info!(ticket = ticket.id(), "awaiting proposal");
        Ok(ticket)
    }

    /// Accept the translator's reply for a submission
    pub fn receive_translation(
        &mut self,
        ticket: Ticket,
        reply: Result<String, TranslationError>,
    ) -> ProposalOutcome {
        match self.state {
            State::AwaitingProposal(pending) if pending == ticket => {}
            _ => {
                info!(ticket = ticket.id(), "ignoring stale translation");
                return ProposalOutcome::Stale;
            }
        }

        let parsed = reply
            .map_err(|e| e.to_string())
            .and_then(|raw| parse_proposal(&raw).map_err(|e| e.to_string()));

        match parsed {
            Ok(proposal) => {
                info!(command = proposal.raw_command(), "proposal ready");
                self.state = State::ProposalReady(proposal.clone());
                ProposalOutcome::Ready(proposal)
            }
            Err(reason) => {
                warn!(%reason, "could not generate a command");
                self.state = State::Idle;
                ProposalOutcome::Failed(reason)
            }
        }
    }

    /// Run the held proposal through the policy and, if allowed, execute it.
    ///
    /// In dry-run mode this only simulates. Blocked commands are discarded
    /// without an audit entry; executed commands are always logged, and a
    /// logging failure is reported alongside the result instead of failing
    /// the call.
    pub fn confirm(&mut self) -> Result<ConfirmOutcome, SessionError> {
        if self.options.dry_run {
            return self.dry_run().map(ConfirmOutcome::Simulated);
        }

        let proposal = self.take_proposal("confirm")?;
        let command = proposal.raw_command();

        let decision = self.evaluator.evaluate(command);
        if decision.is_blocked() {
            if self.options.safe_mode {
                warn!(
                    command,
                    keyword = decision.matched_keyword.as_deref().unwrap_or_default(),
                    "command blocked in safe mode"
                );
                self.state = State::Idle;
                return Ok(ConfirmOutcome::Blocked(decision));
            }
            warn!(
                command,
                keyword = decision.matched_keyword.as_deref().unwrap_or_default(),
                "safe mode off, running command the policy would block"
            );
        }

        self.state = State::Executing;
        let result = self.executor.execute(command);

        let audit_error = self.record(command, &result);
        self.state = State::Idle;

        Ok(ConfirmOutcome::Executed(ExecutionReport {
            command: command.to_string(),
            decision,
            result,
            audit_error,
        }))
    }

    /// Report the held command without evaluating, executing or logging it
    pub fn dry_run(&mut self) -> Result<DryRunReport, SessionError> {
        let proposal = self.take_proposal("dry-run")?;
        info!(command = proposal.raw_command(), "dry run, command not executed");
        self.state = State::Idle;

        Ok(DryRunReport {
            command: proposal.raw_command().to_string(),
            explanation: proposal.explanation().to_string(),
        })
    }

    /// Drop any pending request or held proposal. Returns whether anything
    /// was discarded.
    pub fn cancel(&mut self) -> bool {
        match self.state {
            State::AwaitingProposal(_) | State::ProposalReady(_) => {
                info!("request cancelled");
                self.state = State::Idle;
                true
            }
            _ => false,
        }
    }

    fn take_proposal(&mut self, action: &'static str) -> Result<CommandProposal, SessionError> {
        match std::mem::replace(&mut self.state, State::Idle) {
            State::ProposalReady(proposal) => Ok(proposal),
            other => {
                self.state = other;
                Err(self.invalid(action))
            }
        }
    }

    fn record(&self, command: &str, result: &ExecutionResult) -> Option<AuditError> {
        let logger = self.audit.as_ref()?;
        let entry = AuditEntry::for_execution(command, result);

        match logger.append(&entry) {
            Ok(()) => None,
            Err(e) => {
                warn!(error = %e, "could not write audit entry");
                Some(e)
            }
        }
    }

    fn invalid(&self, action: &'static str) -> SessionError {
        SessionError::InvalidTransition {
            action,
            phase: self.phase(),
        }
    }
}
