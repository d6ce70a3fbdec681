// Safety policy properties and the blocked-command scenarios, end to end
// through the default policy and a session.

mod helpers;

use askshell::SafetyEvaluator;
use askshell::security::{ContextRule, DEFAULT_POLICY_RULES};
use askshell::session::{ConfirmOutcome, SessionOptions, SessionPhase};
use helpers::{log_path, offline_session, propose};
use proptest::prelude::*;
use tempfile::TempDir;

fn blocking_keywords() -> Vec<&'static str> {
    DEFAULT_POLICY_RULES
        .iter()
        .filter(|(_, url_gated)| !url_gated)
        .map(|(keyword, _)| *keyword)
        .collect()
}

fn url_gated_keywords() -> Vec<&'static str> {
    DEFAULT_POLICY_RULES
        .iter()
        .filter(|(_, url_gated)| *url_gated)
        .map(|(keyword, _)| *keyword)
        .collect()
}

fn recase(keyword: &str, upper: &[bool]) -> String {
    keyword
        .chars()
        .zip(upper.iter().cycle())
        .map(|(c, &up)| {
            if up {
                c.to_ascii_uppercase()
            } else {
                c.to_ascii_lowercase()
            }
        })
        .collect()
}

proptest! {
    #[test]
    fn blocking_keyword_in_any_casing_is_blocked(
        index in 0usize..64,
        upper in prop::collection::vec(any::<bool>(), 1..32),
        prefix in "[0-9 ]{0,12}",
        suffix in "[0-9 ]{0,12}",
    ) {
        let keywords = blocking_keywords();
        let keyword = keywords[index % keywords.len()];
        let command = format!("{}{}{}", prefix, recase(keyword, &upper), suffix);

        let decision = SafetyEvaluator::default().evaluate(&command);
        prop_assert!(decision.is_blocked());
        prop_assert_eq!(decision.matched_keyword.as_deref(), Some(keyword));
    }

    #[test]
    fn command_without_keywords_is_safe(command in "[0-9a-c |\\-]{0,40}") {
        let decision = SafetyEvaluator::default().evaluate(&command);
        prop_assert!(decision.allowed);
        prop_assert!(decision.matched_keyword.is_none());
    }

    #[test]
    fn url_gated_keyword_blocks_only_with_url(
        index in 0usize..8,
        host in "[a-z]{1,10}\\.(com|org|test)",
        path in "[a-z0-9]{0,10}",
    ) {
        let keywords = url_gated_keywords();
        let keyword = keywords[index % keywords.len()];
        let evaluator = SafetyEvaluator::default();

        let with_url = format!("{} https://{}/{}", keyword, host, path);
        let decision = evaluator.evaluate(&with_url);
        prop_assert!(decision.is_blocked());
        prop_assert_eq!(decision.matched_keyword.as_deref(), Some(keyword));

        let without_url = format!("{} {}.exe", keyword, path);
        prop_assert!(evaluator.evaluate(&without_url).allowed);
    }
}

#[test]
fn test_default_policy_matches_keyword_table() {
    let evaluator = SafetyEvaluator::default();
    let rules = evaluator.policy().rules();

    assert_eq!(rules.len(), DEFAULT_POLICY_RULES.len());
    for (rule, (keyword, url_gated)) in rules.iter().zip(DEFAULT_POLICY_RULES) {
        assert_eq!(rule.keyword, *keyword);
        let expected = if *url_gated {
            ContextRule::RequiresUrlAbsence
        } else {
            ContextRule::None
        };
        assert_eq!(rule.context_rule, expected);
    }
}

#[test]
fn test_remove_item_blocked_without_execution_or_log() {
    let dir = TempDir::new().unwrap();
    let mut session = offline_session(&dir, SessionOptions::default());
    propose(&mut session, "Remove-Item C:\\Windows");

    match session.confirm().unwrap() {
        ConfirmOutcome::Blocked(decision) => {
            assert_eq!(decision.matched_keyword.as_deref(), Some("Remove-Item"));
        }
        other => panic!("expected a block, got {:?}", other),
    }
    assert_eq!(session.phase(), SessionPhase::Idle);
    assert!(!log_path(&dir).exists());
}

#[test]
fn test_download_with_url_blocked() {
    let dir = TempDir::new().unwrap();
    let mut session = offline_session(&dir, SessionOptions::default());
    propose(&mut session, "Invoke-WebRequest http://example.com/x");

    match session.confirm().unwrap() {
        ConfirmOutcome::Blocked(decision) => {
            assert_eq!(decision.matched_keyword.as_deref(), Some("Invoke-WebRequest"));
        }
        other => panic!("expected a block, got {:?}", other),
    }
    assert!(!log_path(&dir).exists());
}

#[test]
fn test_local_start_process_goes_through() {
    let dir = TempDir::new().unwrap();
    let mut session = offline_session(&dir, SessionOptions::default());
    propose(&mut session, "Start-Process notepad.exe");

    // Allowed, so it reaches the (missing) interpreter and is logged
    assert!(matches!(session.confirm().unwrap(), ConfirmOutcome::Executed(_)));
    assert!(log_path(&dir).exists());
}
