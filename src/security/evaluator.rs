use crate::security::policy::{ContextRule, SafetyPolicy};
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;

static URL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[A-Za-z][A-Za-z0-9+.\-]*://\S+").expect("URL pattern is a valid regex")
});

/// Outcome of checking one command against the policy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SafetyDecision {
    pub allowed: bool,
    pub matched_keyword: Option<String>,
    pub reason: Option<String>,
}

impl SafetyDecision {
    fn safe() -> Self {
        Self {
            allowed: true,
            matched_keyword: None,
            reason: None,
        }
    }

    fn safe_local_use(keyword: &str) -> Self {
        Self {
            allowed: true,
            matched_keyword: Some(keyword.to_string()),
            reason: Some(format!("'{}' allowed without a URL", keyword)),
        }
    }

    fn blocked(keyword: &str, reason: String) -> Self {
        Self {
            allowed: false,
            matched_keyword: Some(keyword.to_string()),
            reason: Some(reason),
        }
    }

    pub fn is_blocked(&self) -> bool {
        !self.allowed
    }
}

/// Checks proposed commands against a shared `SafetyPolicy`
#[derive(Debug, Clone)]
pub struct SafetyEvaluator {
    policy: Arc<SafetyPolicy>,
}

impl SafetyEvaluator {
    pub fn new(policy: Arc<SafetyPolicy>) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &SafetyPolicy {
        &self.policy
    }

    /// Evaluate a command.
    ///
    /// Keywords are matched case-insensitively in policy order and the first
    /// match decides. A URL-gated keyword blocks only when the command also
    /// contains a URL; without one the command is allowed even though the
    /// keyword matched.
    pub fn evaluate(&self, command: &str) -> SafetyDecision {
        let command_lower = command.to_lowercase();

        let Some(rule) = self
            .policy
            .rules()
            .iter()
            .find(|rule| command_lower.contains(rule.keyword_lower()))
        else {
            return SafetyDecision::safe();
        };

        match rule.context_rule {
            ContextRule::None => SafetyDecision::blocked(
                &rule.keyword,
                format!("Dangerous keyword '{}' found", rule.keyword),
            ),
            ContextRule::RequiresUrlAbsence => {
                if contains_url(command) {
                    SafetyDecision::blocked(
                        &rule.keyword,
                        format!("Dangerous keyword '{}' found with a URL", rule.keyword),
                    )
                } else {
                    SafetyDecision::safe_local_use(&rule.keyword)
                }
            }
        }
    }
}

impl Default for SafetyEvaluator {
    fn default() -> Self {
        Self::new(Arc::new(SafetyPolicy::default()))
    }
}

fn contains_url(command: &str) -> bool {
    URL_PATTERN.is_match(command)
}
