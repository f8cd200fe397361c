use std::collections::HashMap;
use std::fmt;

use thiserror::Error;
use tracing::debug;

use crate::SyntaxRule;

/// Errors raised by catalog access.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("rule '{group}.{rule}' not found")]
    NotFound { group: String, rule: String },

    #[error("field '{field}' is {actual} bytes, limit is {max}")]
    FieldTooLong {
        field: &'static str,
        max: usize,
        actual: usize,
    },

    #[error("invalid warn level {0}; expected 0 or 1")]
    InvalidWarnLevel(i16),

    #[error("malformed catalog JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// What [`RuleCatalog::upsert_rule_if_absent`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    /// A rule with the same identity already existed and was left untouched.
    DuplicateIgnored,
}

/// Access to persisted syntax rules, keyed by `(group_name, rule_name)`.
///
/// Implementations may be backed by anything; reads return owned snapshots
/// so a pass over a group never observes a concurrent write.
pub trait RuleCatalog {
    /// Rules of one group in insertion order. An unknown group yields an
    /// empty list.
    ///
    /// # Errors
    ///
    /// Backend failures only.
    fn list_rules(&self, group: &str) -> Result<Vec<SyntaxRule>, CatalogError>;

    /// # Errors
    ///
    /// Returns [`CatalogError::NotFound`] when no rule has this identity.
    fn get_rule(&self, group: &str, rule: &str) -> Result<SyntaxRule, CatalogError>;

    /// Insert `rule` unless its identity is taken. Conflict is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::FieldTooLong`] if the record does not fit the
    /// persisted columns.
    fn upsert_rule_if_absent(&mut self, rule: SyntaxRule) -> Result<UpsertOutcome, CatalogError>;

    /// Every rule in insertion order.
    ///
    /// # Errors
    ///
    /// Backend failures only.
    fn all_rules(&self) -> Result<Vec<SyntaxRule>, CatalogError>;

    /// Distinct group names in order of first appearance.
    ///
    /// # Errors
    ///
    /// Backend failures only.
    fn groups(&self) -> Result<Vec<String>, CatalogError>;
}

/// In-memory [`RuleCatalog`] that keeps insertion order.
#[derive(Debug, Clone, Default)]
pub struct MemoryCatalog {
    rules: Vec<SyntaxRule>,
    index: HashMap<(String, String), usize>,
}

impl MemoryCatalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a catalog from a JSON array of rule records.
    ///
    /// Records repeating an earlier identity are ignored, as on insert.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] on malformed JSON, an out-of-range
    /// `warn_level`, or a field exceeding its width.
    pub fn from_json(input: &str) -> Result<Self, CatalogError> {
        let records: Vec<SyntaxRule> = serde_json::from_str(input)?;
        Self::from_rules(records)
    }

    /// Read a JSON file and load the catalog it contains.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] on I/O failure or anything
    /// [`from_json`](Self::from_json) rejects.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, CatalogError> {
        let input = std::fs::read_to_string(path)?;
        Self::from_json(&input)
    }

    /// Build a catalog from records, ignoring repeated identities.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::FieldTooLong`] for an oversized record.
    pub fn from_rules(rules: impl IntoIterator<Item = SyntaxRule>) -> Result<Self, CatalogError> {
        let mut catalog = Self::new();
        for rule in rules {
            catalog.upsert_rule_if_absent(rule)?;
        }
        Ok(catalog)
    }

    /// Serialize all rules as a pretty-printed JSON array.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Json`] if serialization fails. A rule whose
    /// `item` is not valid JSON does not fail the export; its item is written
    /// as a JSON string.
    pub fn to_json(&self) -> Result<String, CatalogError> {
        Ok(serde_json::to_string_pretty(&self.rules)?)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Borrowing iterator over all rules in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &SyntaxRule> {
        self.rules.iter()
    }

    fn key(group: &str, rule: &str) -> (String, String) {
        (group.to_owned(), rule.to_owned())
    }
}

impl RuleCatalog for MemoryCatalog {
    fn list_rules(&self, group: &str) -> Result<Vec<SyntaxRule>, CatalogError> {
        Ok(self
            .rules
            .iter()
            .filter(|r| r.group_name == group)
            .cloned()
            .collect())
    }

    fn get_rule(&self, group: &str, rule: &str) -> Result<SyntaxRule, CatalogError> {
        self.index
            .get(&Self::key(group, rule))
            .map(|&idx| self.rules[idx].clone())
            .ok_or_else(|| CatalogError::NotFound {
                group: group.to_owned(),
                rule: rule.to_owned(),
            })
    }

    fn upsert_rule_if_absent(&mut self, rule: SyntaxRule) -> Result<UpsertOutcome, CatalogError> {
        rule.validate()?;
        let key = Self::key(&rule.group_name, &rule.rule_name);
        if self.index.contains_key(&key) {
            debug!(rule = %rule, "rule already present, insert ignored");
            return Ok(UpsertOutcome::DuplicateIgnored);
        }
        self.index.insert(key, self.rules.len());
        self.rules.push(rule);
        Ok(UpsertOutcome::Inserted)
    }

    fn all_rules(&self) -> Result<Vec<SyntaxRule>, CatalogError> {
        Ok(self.rules.clone())
    }

    fn groups(&self) -> Result<Vec<String>, CatalogError> {
        let mut seen: Vec<String> = Vec::new();
        for rule in &self.rules {
            if !seen.contains(&rule.group_name) {
                seen.push(rule.group_name.clone());
            }
        }
        Ok(seen)
    }
}

#[cfg(feature = "binary-cache")]
impl MemoryCatalog {
    /// Encode this catalog as a binary snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`SerializeError`](crate::SerializeError) if encoding fails.
    pub fn to_bytes(&self) -> Result<Vec<u8>, crate::serial::SerializeError> {
        crate::serial::encode(&self.rules)
    }

    /// Load a catalog from a snapshot produced by [`to_bytes`](Self::to_bytes).
    ///
    /// # Errors
    ///
    /// Returns [`DeserializeError`](crate::DeserializeError) on
    /// format, integrity, or validation failure.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, crate::serial::DeserializeError> {
        let rules = crate::serial::decode(bytes)?;
        let mut catalog = Self::new();
        for rule in rules {
            catalog
                .index
                .insert(Self::key(&rule.group_name, &rule.rule_name), catalog.rules.len());
            catalog.rules.push(rule);
        }
        Ok(catalog)
    }

    /// Write a binary snapshot to a file.
    ///
    /// # Errors
    ///
    /// Returns [`SerializeError`](crate::SerializeError) on
    /// encoding or I/O failure.
    pub fn to_binary_file(
        &self,
        path: impl AsRef<std::path::Path>,
    ) -> Result<(), crate::serial::SerializeError> {
        let bytes = self.to_bytes()?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    /// Read a binary snapshot from a file.
    ///
    /// # Errors
    ///
    /// Returns [`DeserializeError`](crate::DeserializeError) on
    /// I/O, format, integrity, or validation failure.
    pub fn from_binary_file(
        path: impl AsRef<std::path::Path>,
    ) -> Result<Self, crate::serial::DeserializeError> {
        let bytes = std::fs::read(path)?;
        Self::from_bytes(&bytes)
    }
}

impl fmt::Display for MemoryCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let groups = self.groups().map(|g| g.len()).unwrap_or_default();
        write!(f, "MemoryCatalog({} rules, {groups} groups)", self.rules.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{TypedValue, WarnLevel};

    fn rule(group: &str, name: &str) -> SyntaxRule {
        SyntaxRule::new(group, name, "Val in Item").with_item(&TypedValue::set(["drop_column"]))
    }

    #[test]
    fn insert_then_get() {
        let mut catalog = MemoryCatalog::new();
        let outcome = catalog
            .upsert_rule_if_absent(rule("AlterTableRule", "HighRiskType"))
            .unwrap();
        assert_eq!(outcome, UpsertOutcome::Inserted);
        let got = catalog.get_rule("AlterTableRule", "HighRiskType").unwrap();
        assert_eq!(got.expr, "Val in Item");
    }

    #[test]
    fn duplicate_is_ignored_and_first_wins() {
        let mut catalog = MemoryCatalog::new();
        catalog.upsert_rule_if_absent(rule("g", "r")).unwrap();
        let second = rule("g", "r").with_warn_level(WarnLevel::Blocking);
        assert_eq!(
            catalog.upsert_rule_if_absent(second).unwrap(),
            UpsertOutcome::DuplicateIgnored
        );
        assert_eq!(catalog.len(), 1);
        assert_eq!(
            catalog.get_rule("g", "r").unwrap().warn_level,
            WarnLevel::Advisory
        );
    }

    #[test]
    fn same_rule_name_in_different_groups() {
        let mut catalog = MemoryCatalog::new();
        catalog.upsert_rule_if_absent(rule("a", "r")).unwrap();
        assert_eq!(
            catalog.upsert_rule_if_absent(rule("b", "r")).unwrap(),
            UpsertOutcome::Inserted
        );
    }

    #[test]
    fn get_missing_is_not_found() {
        let catalog = MemoryCatalog::new();
        let err = catalog.get_rule("DmlRule", "Nope").unwrap_err();
        assert!(matches!(err, CatalogError::NotFound { .. }));
        assert_eq!(err.to_string(), "rule 'DmlRule.Nope' not found");
    }

    #[test]
    fn list_keeps_insertion_order() {
        let catalog = MemoryCatalog::from_rules([
            rule("g", "c"),
            rule("h", "x"),
            rule("g", "a"),
            rule("g", "b"),
        ])
        .unwrap();
        let names: Vec<String> = catalog
            .list_rules("g")
            .unwrap()
            .into_iter()
            .map(|r| r.rule_name)
            .collect();
        assert_eq!(names, ["c", "a", "b"]);
        assert_eq!(catalog.groups().unwrap(), ["g", "h"]);
        assert!(catalog.list_rules("missing").unwrap().is_empty());
        assert_eq!(catalog.all_rules().unwrap().len(), 4);
    }

    #[test]
    fn oversized_rule_is_rejected() {
        let mut catalog = MemoryCatalog::new();
        let long = rule("g", "r").with_desc("x".repeat(513));
        assert!(matches!(
            catalog.upsert_rule_if_absent(long),
            Err(CatalogError::FieldTooLong { field: "desc", .. })
        ));
        assert!(catalog.is_empty());
    }

    #[test]
    fn json_round_trip() {
        let catalog = MemoryCatalog::from_rules([
            rule("AlterTableRule", "HighRiskType"),
            SyntaxRule::new("DmlRule", "DmlNotHasWhere", " Val != Item ")
                .with_item(&TypedValue::Bool(true))
                .with_status(false),
        ])
        .unwrap();
        let json = catalog.to_json().unwrap();
        let back = MemoryCatalog::from_json(&json).unwrap();
        assert_eq!(back.all_rules().unwrap(), catalog.all_rules().unwrap());
    }

    #[test]
    fn from_json_reports_bad_input() {
        assert!(matches!(
            MemoryCatalog::from_json("not json"),
            Err(CatalogError::Json(_))
        ));
    }

    #[test]
    fn display() {
        let catalog = MemoryCatalog::from_rules([rule("a", "r"), rule("b", "r")]).unwrap();
        assert_eq!(catalog.to_string(), "MemoryCatalog(2 rules, 2 groups)");
    }
}
