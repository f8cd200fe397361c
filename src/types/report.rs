use std::fmt;
use std::time::Duration;

use super::outcome::{RuleFailure, RuleOutcome};

/// Result of running a batch of rules against one statement.
///
/// Outcomes and failures each keep the order the rules were given in.
#[derive(Debug, Clone)]
#[must_use]
pub struct GroupReport {
    group: Option<String>,
    outcomes: Vec<RuleOutcome>,
    failures: Vec<RuleFailure>,
    duration: Duration,
}

impl GroupReport {
    pub(crate) fn new(
        group: Option<String>,
        outcomes: Vec<RuleOutcome>,
        failures: Vec<RuleFailure>,
        duration: Duration,
    ) -> Self {
        Self {
            group,
            outcomes,
            failures,
            duration,
        }
    }

    /// The catalog group, when the batch came from [`RuleRunner::run_group`](crate::RuleRunner::run_group).
    #[must_use]
    pub fn group(&self) -> Option<&str> {
        self.group.as_deref()
    }

    #[must_use]
    pub fn outcomes(&self) -> &[RuleOutcome] {
        &self.outcomes
    }

    #[must_use]
    pub fn failures(&self) -> &[RuleFailure] {
        &self.failures
    }

    /// Outcomes whose rule was violated.
    pub fn violations(&self) -> impl Iterator<Item = &RuleOutcome> {
        self.outcomes.iter().filter(|o| o.violated())
    }

    /// Violations of blocking rules.
    pub fn blocking_violations(&self) -> impl Iterator<Item = &RuleOutcome> {
        self.outcomes.iter().filter(|o| o.blocks())
    }

    /// Whether any blocking rule was violated.
    #[must_use]
    pub fn is_blocked(&self) -> bool {
        self.outcomes.iter().any(RuleOutcome::blocks)
    }

    /// Look up the outcome for a rule by name.
    #[must_use]
    pub fn outcome(&self, rule_name: &str) -> Option<&RuleOutcome> {
        self.outcomes.iter().find(|o| o.rule_name() == rule_name)
    }

    /// Wall-clock time spent in the batch.
    #[must_use]
    pub fn duration(&self) -> Duration {
        self.duration
    }
}

impl fmt::Display for GroupReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "group: {}", self.group.as_deref().unwrap_or("-"))?;
        let violated: Vec<&str> = self.violations().map(RuleOutcome::rule_name).collect();
        write!(f, ", violated: [{}]", violated.join(", "))?;
        write!(f, ", failed: {}", self.failures.len())?;
        write!(f, ", duration: {:?}", self.duration)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DecodeError, WarnLevel};

    fn report() -> GroupReport {
        GroupReport::new(
            Some("CommandRule".into()),
            vec![
                RuleOutcome::new("HighRiskCommandRule", "", WarnLevel::Advisory, true),
                RuleOutcome::new("BanCommandRule", "", WarnLevel::Blocking, false),
            ],
            vec![RuleFailure::new(
                "Broken",
                DecodeError::UnrecognizedType("float".into()).into(),
            )],
            Duration::from_nanos(500),
        )
    }

    #[test]
    fn report_accessors() {
        let r = report();
        assert_eq!(r.group(), Some("CommandRule"));
        assert_eq!(r.outcomes().len(), 2);
        assert_eq!(r.failures().len(), 1);
        assert_eq!(r.violations().count(), 1);
        assert_eq!(r.blocking_violations().count(), 0);
        assert!(!r.is_blocked());
        assert!(r.outcome("BanCommandRule").is_some());
        assert!(r.outcome("Missing").is_none());
        assert_eq!(r.duration(), Duration::from_nanos(500));
    }

    #[test]
    fn report_display() {
        let s = report().to_string();
        assert!(s.contains("group: CommandRule"));
        assert!(s.contains("violated: [HighRiskCommandRule]"));
        assert!(s.contains("failed: 1"));
    }

    #[test]
    fn blocked_when_blocking_rule_violated() {
        let r = GroupReport::new(
            None,
            vec![RuleOutcome::new("BanCommandRule", "", WarnLevel::Blocking, true)],
            vec![],
            Duration::ZERO,
        );
        assert!(r.is_blocked());
        assert!(r.to_string().contains("group: -"));
    }
}
