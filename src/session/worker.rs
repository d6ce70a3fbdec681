use crate::llm::{TranslationError, Translator};
use crate::session::orchestrator::Ticket;
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::debug;

/// Messages delivered back to the loop that drives a `Session`
#[derive(Debug)]
pub enum SessionEvent {
    TranslationReady {
        ticket: Ticket,
        reply: Result<String, TranslationError>,
    },
}

/// Runs translator calls off the driving thread.
///
/// Each call becomes a tokio task whose only output is a `SessionEvent` on
/// the channel returned by `new`; the task never touches session state.
#[derive(Clone)]
pub struct TranslationWorker {
    translator: Arc<Translator>,
    sender: UnboundedSender<SessionEvent>,
}

impl TranslationWorker {
    pub fn new(translator: Arc<Translator>) -> (Self, UnboundedReceiver<SessionEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { translator, sender }, receiver)
    }

    /// Translate `prompt` for `ticket` in the background
    pub fn spawn(&self, ticket: Ticket, prompt: String) -> JoinHandle<()> {
        let translator = Arc::clone(&self.translator);
        let sender = self.sender.clone();

        tokio::spawn(async move {
            let reply = translator.propose(&prompt).await;
            debug!(ticket = ticket.id(), ok = reply.is_ok(), "translation finished");
            // The driver may have shut down; nothing left to deliver to
            let _ = sender.send(SessionEvent::TranslationReady { ticket, reply });
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::AuditLogger;
    use crate::llm::{LLMClient, LLMError};
    use crate::security::SafetyEvaluator;
    use crate::session::orchestrator::{ProposalOutcome, Session, SessionOptions};
    use crate::shell::ShellExecutor;
    use async_trait::async_trait;
    use tempfile::TempDir;

    struct MockLLMClient {
        response: String,
    }

    #[async_trait]
    impl LLMClient for MockLLMClient {
        async fn complete(&self, _prompt: &str) -> Result<String, LLMError> {
            Ok(self.response.clone())
        }
    }

    #[tokio::test]
    async fn test_reply_delivered_on_channel() {
        let translator = Arc::new(Translator::new(Box::new(MockLLMClient {
            response: r#"{"command": "Get-Date"}"#.to_string(),
        })));
        let (worker, mut events) = TranslationWorker::new(translator);

        let dir = TempDir::new().unwrap();
        let mut session = Session::new(
            SafetyEvaluator::default(),
            ShellExecutor::default(),
            Some(AuditLogger::with_path(dir.path().join("log.txt"))),
            SessionOptions::default(),
        );

        let ticket = session.submit("what day is it").unwrap();
        worker.spawn(ticket, "what day is it".to_string()).await.unwrap();

        let Some(SessionEvent::TranslationReady { ticket, reply }) = events.recv().await else {
            panic!("no event delivered");
        };
        let outcome = session.receive_translation(ticket, reply);
        match outcome {
            ProposalOutcome::Ready(proposal) => assert_eq!(proposal.raw_command(), "Get-Date"),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }
}
