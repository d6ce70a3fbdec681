use std::io;
use thiserror::Error;

// Import module-level errors for AppError
use crate::audit::AuditError;
use crate::config::ConfigError;
use crate::llm::{LLMError, TranslationError};
use crate::session::{ParseError, SessionError};
use crate::shell::ShellError;

/// Top-level application error that wraps all module-specific errors
///
/// Core operations recover from their own failures (a bad proposal, a
/// blocked command, a failed run, an unwritable log). This type is for the
/// front ends, which surface those errors and decide whether the process
/// can continue.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("LLM error: {0}")]
    Llm(#[from] LLMError),

    #[error("Translation error: {0}")]
    Translation(#[from] TranslationError),

    #[error("Could not parse the proposed command: {0}")]
    Parse(#[from] ParseError),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("Shell error: {0}")]
    Shell(#[from] ShellError),

    #[error("Audit log error: {0}")]
    Audit(#[from] AuditError),

    #[error("{0} is not set; the translator is unavailable")]
    MissingCredential(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl AppError {
    /// Process exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            AppError::MissingCredential(_) => 2,
            _ => 1,
        }
    }
}

/// Result type for application-level operations
pub type AppResult<T> = std::result::Result<T, AppError>;
