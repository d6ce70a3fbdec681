use crate::shell::ExecutionResult;
use chrono::{Local, NaiveDateTime, Timelike};
use fs2::FileExt;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
/// File name of the command log inside the config directory
pub const LOG_FILE_NAME: &str = "command_log.txt";

#[derive(Debug, Error)]
pub enum AuditError {
    #[error("Could not write to audit log {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not read audit log {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed audit log line {line}")]
    Malformed { line: usize },
}

/// One line of the audit trail
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEntry {
    pub timestamp: NaiveDateTime,
    pub command: String,
    pub status: String,
}

impl AuditEntry {
    /// Create an entry stamped with the current local time
    pub fn new(command: &str, status: &str) -> Self {
        let now = Local::now().naive_local();
        Self::with_timestamp(now, command, status)
    }

    /// Create an entry with an explicit timestamp.
    ///
    /// Fields are normalized so the entry always fits on one line and reads
    /// back unchanged: sub-second precision is dropped, line breaks in the
    /// command become spaces, and the status has its whitespace collapsed
    /// and square brackets swapped for parentheses.
    pub fn with_timestamp(timestamp: NaiveDateTime, command: &str, status: &str) -> Self {
        let timestamp = timestamp.with_nanosecond(0).unwrap_or(timestamp);
        let command = command.replace(['\r', '\n'], " ");
        let status = status
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .replace('[', "(")
            .replace(']', ")");

        Self {
            timestamp,
            command,
            status,
        }
    }

    /// Entry describing a finished execution
    pub fn for_execution(command: &str, result: &ExecutionResult) -> Self {
        Self::new(command, &result.audit_status())
    }

    /// Render as `[YYYY-MM-DD HH:MM:SS] [<status>] <command>`
    pub fn to_line(&self) -> String {
        format!(
            "[{}] [{}] {}",
            self.timestamp.format(TIMESTAMP_FORMAT),
            self.status,
            self.command
        )
    }

    /// Parse a line produced by `to_line`
    pub fn parse_line(line: &str) -> Option<Self> {
        let rest = line.strip_prefix('[')?;
        let (timestamp, rest) = rest.split_once("] [")?;
        let (status, command) = rest.split_once("] ")?;
        let timestamp = NaiveDateTime::parse_from_str(timestamp, TIMESTAMP_FORMAT).ok()?;

        Some(Self {
            timestamp,
            command: command.to_string(),
            status: status.to_string(),
        })
    }
}

/// Append-only command log.
///
/// Each append opens the file, takes an exclusive lock for the single line
/// it writes, and closes it again, so concurrent sessions never interleave
/// partial lines.
#[derive(Debug, Clone)]
pub struct AuditLogger {
    log_path: PathBuf,
}

impl AuditLogger {
    /// Create an AuditLogger with a custom log path
    pub fn with_path<P: AsRef<Path>>(path: P) -> Self {
        Self {
            log_path: path.as_ref().to_path_buf(),
        }
    }

    /// Append one entry
    pub fn append(&self, entry: &AuditEntry) -> Result<(), AuditError> {
        let write_err = |source| AuditError::Write {
            path: self.log_path.clone(),
            source,
        };

        if let Some(parent) = self.log_path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(write_err)?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)
            .map_err(write_err)?;

        file.lock_exclusive().map_err(write_err)?;

        let mut line = entry.to_line();
        line.push('\n');
        let written = file.write_all(line.as_bytes()).and_then(|_| file.flush());

        // Unlock even if the write failed; the write error wins
        let unlocked = FileExt::unlock(&file);
        written.map_err(write_err)?;
        unlocked.map_err(write_err)?;

        Ok(())
    }

    /// Read every entry back in write order
    pub fn read_entries(&self) -> Result<Vec<AuditEntry>, AuditError> {
        let contents = self.read_contents()?;

        contents
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.is_empty())
            .map(|(index, line)| {
                AuditEntry::parse_line(line).ok_or(AuditError::Malformed { line: index + 1 })
            })
            .collect()
    }

    /// Last `count` well-formed entries, oldest first.
    ///
    /// Lines that do not parse (older log formats, hand edits) are skipped.
    pub fn recent_entries(&self, count: usize) -> Result<Vec<AuditEntry>, AuditError> {
        let contents = self.read_contents()?;

        let entries: Vec<AuditEntry> = contents.lines().filter_map(AuditEntry::parse_line).collect();
        let start = entries.len().saturating_sub(count);
        Ok(entries[start..].to_vec())
    }

    fn read_contents(&self) -> Result<String, AuditError> {
        match fs::read_to_string(&self.log_path) {
            Ok(contents) => Ok(contents),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(String::new()),
            Err(source) => Err(AuditError::Read {
                path: self.log_path.clone(),
                source,
            }),
        }
    }

    /// Get the path to the log file
    pub fn log_path(&self) -> &Path {
        &self.log_path
    }
}
