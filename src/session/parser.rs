use chrono::{DateTime, Local};
use serde_json::Value;
use thiserror::Error;

const NO_EXPLANATION: &str = "No explanation provided.";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Translator output is not valid JSON: {0}")]
    InvalidJson(String),

    #[error("Translator output is not a JSON object")]
    NotAnObject,

    #[error("Translator output has no 'command' field")]
    MissingCommand,

    #[error("Translator proposed an empty command")]
    EmptyCommand,
}

/// A proposed command awaiting the user's decision.
///
/// Fields are read-only; a new submission replaces the whole proposal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandProposal {
    raw_command: String,
    explanation: String,
    created_at: DateTime<Local>,
}

impl CommandProposal {
    /// Build a proposal directly. The command is trimmed and must not be empty.
    pub fn new(command: &str, explanation: &str) -> Result<Self, ParseError> {
        let raw_command = command.trim();
        if raw_command.is_empty() {
            return Err(ParseError::EmptyCommand);
        }

        let explanation = match explanation.trim() {
            "" => NO_EXPLANATION,
            text => text,
        };

        Ok(Self {
            raw_command: raw_command.to_string(),
            explanation: explanation.to_string(),
            created_at: Local::now(),
        })
    }

    pub fn raw_command(&self) -> &str {
        &self.raw_command
    }

    pub fn explanation(&self) -> &str {
        &self.explanation
    }

    pub fn created_at(&self) -> DateTime<Local> {
        self.created_at
    }
}

/// Parse the translator's reply into a proposal.
///
/// Markdown code fences around the JSON are stripped first. The object must
/// carry a non-empty string `command`; `explanation` is optional.
pub fn parse_proposal(raw: &str) -> Result<CommandProposal, ParseError> {
    let body = strip_fences(raw);

    let value: Value =
        serde_json::from_str(body).map_err(|e| ParseError::InvalidJson(e.to_string()))?;
    let object = value.as_object().ok_or(ParseError::NotAnObject)?;

    let command = object
        .get("command")
        .and_then(Value::as_str)
        .ok_or(ParseError::MissingCommand)?;
    let explanation = object
        .get("explanation")
        .and_then(Value::as_str)
        .unwrap_or_default();

    CommandProposal::new(command, explanation)
}

/// Strip a ```` ``` ```` / ```` ```json ```` fence, if present
fn strip_fences(raw: &str) -> &str {
    let text = raw.trim();

    let Some(open) = text.find("```") else {
        return text;
    };
    let after_open = &text[open + 3..];

    // Skip the language tag on the opening fence line
    let body = match after_open.find('\n') {
        Some(newline) => &after_open[newline + 1..],
        None => after_open.trim_start_matches(|c: char| c.is_ascii_alphanumeric()),
    };

    let body = match body.find("```") {
        Some(close) => &body[..close],
        None => body,
    };

    body.trim()
}
