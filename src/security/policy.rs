use crate::security::DEFAULT_POLICY_RULES;

/// Extra condition a keyword match must meet before it blocks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContextRule {
    /// The keyword blocks wherever it appears
    #[default]
    None,
    /// The keyword blocks only when a URL is present in the same command
    RequiresUrlAbsence,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyRule {
    pub keyword: String,
    pub context_rule: ContextRule,
    // Cached lowercase form, so evaluation never re-lowers the table
    keyword_lower: String,
}

impl PolicyRule {
    pub fn new(keyword: impl Into<String>, context_rule: ContextRule) -> Self {
        let keyword = keyword.into();
        let keyword_lower = keyword.to_lowercase();
        Self {
            keyword,
            context_rule,
            keyword_lower,
        }
    }

    /// Keyword blocks unconditionally
    pub fn blocking(keyword: impl Into<String>) -> Self {
        Self::new(keyword, ContextRule::None)
    }

    /// Keyword blocks only together with a URL
    pub fn url_gated(keyword: impl Into<String>) -> Self {
        Self::new(keyword, ContextRule::RequiresUrlAbsence)
    }

    pub(crate) fn keyword_lower(&self) -> &str {
        &self.keyword_lower
    }
}

/// Ordered set of danger rules.
///
/// Built once at startup and shared read-only (usually behind an `Arc`)
/// by every evaluator in the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SafetyPolicy {
    rules: Vec<PolicyRule>,
}

impl SafetyPolicy {
    /// Build a policy from rules; duplicate keywords (case-insensitive) keep
    /// their first position.
    pub fn new(rules: Vec<PolicyRule>) -> Self {
        let mut deduped: Vec<PolicyRule> = Vec::with_capacity(rules.len());
        for rule in rules {
            if !deduped
                .iter()
                .any(|existing| existing.keyword_lower == rule.keyword_lower)
            {
                deduped.push(rule);
            }
        }
        Self { rules: deduped }
    }

    pub fn rules(&self) -> &[PolicyRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl Default for SafetyPolicy {
    fn default() -> Self {
        let rules = DEFAULT_POLICY_RULES
            .iter()
            .map(|&(keyword, url_gated)| {
                if url_gated {
                    PolicyRule::url_gated(keyword)
                } else {
                    PolicyRule::blocking(keyword)
                }
            })
            .collect();
        Self::new(rules)
    }
}
