use std::fmt;

use super::error::RuleError;
use super::rule::WarnLevel;

/// The verdict of one enabled rule that evaluated cleanly.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub struct RuleOutcome {
    rule_name: String,
    desc: String,
    warn_level: WarnLevel,
    violated: bool,
}

impl fmt::Display for RuleOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = if self.violated { "violated" } else { "ok" };
        write!(f, "{} = {state} ({})", self.rule_name, self.warn_level)
    }
}

impl RuleOutcome {
    pub fn new(
        rule_name: impl Into<String>,
        desc: impl Into<String>,
        warn_level: WarnLevel,
        violated: bool,
    ) -> Self {
        Self {
            rule_name: rule_name.into(),
            desc: desc.into(),
            warn_level,
            violated,
        }
    }

    #[must_use]
    pub fn rule_name(&self) -> &str {
        &self.rule_name
    }

    #[must_use]
    pub fn desc(&self) -> &str {
        &self.desc
    }

    #[must_use]
    pub fn warn_level(&self) -> WarnLevel {
        self.warn_level
    }

    /// `true` when the rule's expression held, i.e. the statement was flagged.
    #[must_use]
    pub fn violated(&self) -> bool {
        self.violated
    }

    /// Violated and marked blocking.
    #[must_use]
    pub fn blocks(&self) -> bool {
        self.violated && self.warn_level.is_blocking()
    }
}

/// An enabled rule that could not produce a verdict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleFailure {
    rule_name: String,
    error: RuleError,
}

impl RuleFailure {
    pub fn new(rule_name: impl Into<String>, error: RuleError) -> Self {
        Self {
            rule_name: rule_name.into(),
            error,
        }
    }

    #[must_use]
    pub fn rule_name(&self) -> &str {
        &self.rule_name
    }

    #[must_use]
    pub fn error(&self) -> &RuleError {
        &self.error
    }
}

impl fmt::Display for RuleFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.rule_name, self.error)
    }
}
