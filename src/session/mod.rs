pub mod orchestrator;
pub mod parser;
pub mod worker;

pub use orchestrator::{
    ConfirmOutcome, DryRunReport, ExecutionReport, ProposalOutcome, Session, SessionError,
    SessionOptions, SessionPhase, Ticket,
};
pub use parser::{CommandProposal, ParseError, parse_proposal};
pub use worker::{SessionEvent, TranslationWorker};
