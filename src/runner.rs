use std::collections::HashMap;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};
use std::time::Instant;

use thiserror::Error;
use tracing::{debug, warn};

use crate::catalog::{CatalogError, RuleCatalog};
use crate::{
    CompiledExpression, EvalError, GroupReport, RuleError, RuleFailure, RuleOutcome, SyntaxRule,
    TypedValue, ValueSource,
};

/// Errors from a direct single-rule check.
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error("rule '{group}.{rule}' is disabled")]
    Disabled { group: String, rule: String },

    #[error("rule '{rule}' failed: {error}")]
    Rule {
        rule: String,
        #[source]
        error: RuleError,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    group: String,
    rule: String,
}

impl CacheKey {
    fn of(rule: &SyntaxRule) -> Self {
        Self {
            group: rule.group_name.clone(),
            rule: rule.rule_name.clone(),
        }
    }
}

/// One rule's prepared form, tagged with the content it was built from.
#[derive(Debug)]
struct CacheEntry {
    expr: String,
    item_type: String,
    item: String,
    slot: Arc<OnceLock<Prepared>>,
}

impl CacheEntry {
    fn of(rule: &SyntaxRule) -> Self {
        Self {
            expr: rule.expr.clone(),
            item_type: rule.item_type.clone(),
            item: rule.item.clone(),
            slot: Arc::default(),
        }
    }

    fn matches(&self, rule: &SyntaxRule) -> bool {
        self.expr == rule.expr && self.item_type == rule.item_type && self.item == rule.item
    }
}

type Prepared = Result<Arc<CompiledExpression>, RuleError>;

/// Runs rules against analyzer output.
///
/// Each rule is decoded and compiled once, including when it fails, and the
/// result is shared by every thread using the runner. The cache holds one
/// entry per `(group_name, rule_name)`: editing a rule's `expr`, `item_type`
/// or `item` replaces its entry rather than adding another.
///
/// ```
/// use sqlrule::{MemoryCatalog, RuleRunner, StatementValues, seed};
///
/// let mut catalog = MemoryCatalog::new();
/// seed(&mut catalog).unwrap();
///
/// let runner = RuleRunner::new();
/// let values = StatementValues::new().set("BanCommandRule", "truncate");
/// let report = runner.run_group(&catalog, "CommandRule", &values).unwrap();
/// assert!(report.is_blocked());
/// ```
#[derive(Debug, Default)]
pub struct RuleRunner {
    cache: RwLock<HashMap<CacheKey, CacheEntry>>,
}

impl RuleRunner {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rules prepared so far.
    #[must_use]
    pub fn cached_len(&self) -> usize {
        self.cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Drop every prepared rule.
    pub fn clear_cache(&self) {
        self.cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Evaluate `rules` in order. Disabled rules are skipped; every enabled
    /// rule lands in either the outcomes or the failures of the report.
    pub fn evaluate_rules<V: ValueSource + ?Sized>(
        &self,
        rules: &[SyntaxRule],
        values: &V,
    ) -> GroupReport {
        self.evaluate_batch(None, rules, values)
    }

    /// List `group` from the catalog and evaluate it.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] if the catalog cannot be read.
    pub fn run_group<C, V>(
        &self,
        catalog: &C,
        group: &str,
        values: &V,
    ) -> Result<GroupReport, CatalogError>
    where
        C: RuleCatalog + ?Sized,
        V: ValueSource + ?Sized,
    {
        let rules = catalog.list_rules(group)?;
        Ok(self.evaluate_batch(Some(group.to_owned()), &rules, values))
    }

    /// Look up one rule and evaluate it against `val`.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::Catalog`] if the rule does not exist,
    /// [`RunnerError::Disabled`] if it is switched off, or
    /// [`RunnerError::Rule`] if it cannot produce a verdict.
    pub fn check_rule<C: RuleCatalog + ?Sized>(
        &self,
        catalog: &C,
        group: &str,
        rule: &str,
        val: &TypedValue,
    ) -> Result<RuleOutcome, RunnerError> {
        let rule = catalog.get_rule(group, rule)?;
        if !rule.is_enabled() {
            return Err(RunnerError::Disabled {
                group: rule.group_name,
                rule: rule.rule_name,
            });
        }
        match self.judge(&rule, Some(val)) {
            Ok(violated) => Ok(outcome(&rule, violated)),
            Err(error) => Err(RunnerError::Rule {
                rule: rule.to_string(),
                error,
            }),
        }
    }

    fn evaluate_batch<V: ValueSource + ?Sized>(
        &self,
        group: Option<String>,
        rules: &[SyntaxRule],
        values: &V,
    ) -> GroupReport {
        let start = Instant::now();
        let mut outcomes = Vec::new();
        let mut failures = Vec::new();

        for rule in rules.iter().filter(|r| r.is_enabled()) {
            match self.judge(rule, values.value_for(rule)) {
                Ok(violated) => outcomes.push(outcome(rule, violated)),
                Err(error) => {
                    warn!(rule = %rule, %error, "rule skipped");
                    failures.push(RuleFailure::new(rule.rule_name.clone(), error));
                }
            }
        }

        GroupReport::new(group, outcomes, failures, start.elapsed())
    }

    fn judge(&self, rule: &SyntaxRule, val: Option<&TypedValue>) -> Result<bool, RuleError> {
        let compiled = self.prepare(rule)?;
        let val = val.ok_or_else(|| EvalError::UnboundOperand("Val".to_owned()))?;
        Ok(compiled.evaluate(val)?)
    }

    fn prepare(&self, rule: &SyntaxRule) -> Prepared {
        let key = CacheKey::of(rule);
        let existing = self
            .cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
            .filter(|entry| entry.matches(rule))
            .map(|entry| Arc::clone(&entry.slot));
        let slot = match existing {
            Some(slot) => slot,
            None => {
                let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
                let entry = cache.entry(key).or_insert_with(|| CacheEntry::of(rule));
                if !entry.matches(rule) {
                    debug!(rule = %rule, "rule changed, replacing cached entry");
                    *entry = CacheEntry::of(rule);
                }
                Arc::clone(&entry.slot)
            }
        };
        slot.get_or_init(|| {
            debug!(rule = %rule, "compiling rule");
            rule.compile().map(Arc::new)
        })
        .clone()
    }
}

fn outcome(rule: &SyntaxRule, violated: bool) -> RuleOutcome {
    RuleOutcome::new(
        rule.rule_name.clone(),
        rule.desc.clone(),
        rule.warn_level,
        violated,
    )
}
