pub mod evaluator;
pub mod policy;

pub use evaluator::{SafetyDecision, SafetyEvaluator};
pub use policy::{ContextRule, PolicyRule, SafetyPolicy};

/// Default danger policy, in evaluation order.
///
/// This is the only keyword table in the crate. The config layer, the
/// evaluator and the front ends all build their `SafetyPolicy` from it (or
/// from the config override), so a keyword is never declared twice.
///
/// The boolean marks keywords that only block when the command also
/// contains a URL. Changing the order changes which keyword a decision
/// names, since the first match wins.
pub const DEFAULT_POLICY_RULES: &[(&str, bool)] = &[
    // Destructive file and disk operations
    ("Remove-Item", false),
    ("Format-Drive", false),
    // Power state
    ("shutdown", false),
    // Execution policy
    ("Set-ExecutionPolicy", false),
    // Network-capable operations (local use allowed)
    ("Invoke-WebRequest", true),
    ("Start-Process", true),
    // cmd.exe style equivalents
    ("restart", false),
    ("diskpart", false),
    ("rd /s", false),
];
