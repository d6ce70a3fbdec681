pub mod audit;
pub mod config;
pub mod error;
pub mod llm;
pub mod security;
pub mod session;
pub mod shell;
pub mod ui;

// Re-export commonly used types for convenience
pub use audit::{AuditEntry, AuditLogger};
pub use config::Config;
pub use error::{AppError, AppResult};
pub use security::{SafetyDecision, SafetyEvaluator, SafetyPolicy};
pub use session::{CommandProposal, Session, SessionOptions};
pub use shell::{ExecutionResult, ExecutionStatus, Interpreter, ShellExecutor};
