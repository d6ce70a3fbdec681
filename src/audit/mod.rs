pub mod logger;

pub use logger::{AuditEntry, AuditError, AuditLogger, LOG_FILE_NAME};
