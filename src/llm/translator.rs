use crate::llm::client::{LLMClient, LLMError};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Error)]
pub enum TranslationError {
    #[error("Request is empty")]
    EmptyQuery,

    #[error("LLM error: {0}")]
    LLMError(#[from] LLMError),

    #[error("Translator did not answer within {0}s")]
    TimedOut(u64),
}

/// Turns a natural-language request into the model's raw proposal text.
///
/// The reply is expected to be a JSON object with `command` and
/// `explanation` keys, possibly wrapped in a markdown fence; parsing it is
/// left to the session.
pub struct Translator {
    client: Box<dyn LLMClient>,
    timeout: Duration,
}

impl Translator {
    pub fn new(client: Box<dyn LLMClient>) -> Self {
        Self {
            client,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub async fn propose(&self, query: &str) -> Result<String, TranslationError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(TranslationError::EmptyQuery);
        }

        let prompt = Self::build_prompt(query);
        debug!(query, "requesting command proposal");

        match tokio::time::timeout(self.timeout, self.client.complete(&prompt)).await {
            Ok(reply) => Ok(reply?),
            Err(_) => Err(TranslationError::TimedOut(self.timeout.as_secs())),
        }
    }

    pub(crate) fn build_prompt(query: &str) -> String {
        // The request is embedded as a JSON string so quotes in it cannot
        // close the surrounding instruction.
        let quoted = serde_json::Value::String(query.to_string()).to_string();

        format!(
            r#"You are an expert in PowerShell. Your task is to translate the following
natural language request into a single, executable PowerShell command.

Request: {quoted}

Provide the command and a brief, one-line explanation of what it does.
Return the output in a JSON format with two keys: 'command' and 'explanation'.

Example:
Request: "list all running processes"
{{
    "command": "Get-Process",
    "explanation": "This command lists all the currently running processes on the system."
}}"#
        )
    }
}
