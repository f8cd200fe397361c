use std::collections::HashMap;

use super::rule::SyntaxRule;
use super::value::TypedValue;

/// Supplies the runtime `Val` for each rule in a batch.
pub trait ValueSource {
    /// The `Val` for `rule`, or `None` if the analyzer produced nothing for it.
    fn value_for(&self, rule: &SyntaxRule) -> Option<&TypedValue>;
}

/// A single value is handed to every rule.
impl ValueSource for TypedValue {
    fn value_for(&self, _rule: &SyntaxRule) -> Option<&TypedValue> {
        Some(self)
    }
}

/// Keyed by bare rule name.
impl ValueSource for HashMap<String, TypedValue> {
    fn value_for(&self, rule: &SyntaxRule) -> Option<&TypedValue> {
        self.get(&rule.rule_name)
    }
}

impl<T: ValueSource + ?Sized> ValueSource for &T {
    fn value_for(&self, rule: &SyntaxRule) -> Option<&TypedValue> {
        (**self).value_for(rule)
    }
}

/// The analyzer's findings for one statement, keyed by rule.
///
/// Keys are either `Group.Rule` or a bare rule name. The qualified key wins
/// when both are present.
#[derive(Debug, Clone, Default)]
pub struct StatementValues {
    data: HashMap<String, TypedValue>,
}

impl StatementValues {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the `Val` for a key.
    #[must_use]
    pub fn set(mut self, key: &str, value: impl Into<TypedValue>) -> Self {
        self.insert(key, value.into());
        self
    }

    pub fn insert(&mut self, key: &str, value: TypedValue) {
        self.data.insert(key.to_owned(), value);
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&TypedValue> {
        self.data.get(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl ValueSource for StatementValues {
    fn value_for(&self, rule: &SyntaxRule) -> Option<&TypedValue> {
        self.data
            .get(&rule.to_string())
            .or_else(|| self.data.get(&rule.rule_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(group: &str, name: &str) -> SyntaxRule {
        SyntaxRule::new(group, name, "Val == Item")
    }

    #[test]
    fn bare_name_lookup() {
        let values = StatementValues::new().set("NeedPrimaryKey", 1_i64);
        assert_eq!(
            values.value_for(&rule("CreateTableRule", "NeedPrimaryKey")),
            Some(&TypedValue::Int(1))
        );
        assert_eq!(values.value_for(&rule("CreateTableRule", "SuggestEngine")), None);
    }

    #[test]
    fn qualified_key_wins() {
        let values = StatementValues::new()
            .set("HighRiskType", vec!["add_column"])
            .set("AlterTableRule.HighRiskType", vec!["drop_column"]);
        assert_eq!(
            values.value_for(&rule("AlterTableRule", "HighRiskType")),
            Some(&TypedValue::set(["drop_column"]))
        );
        assert_eq!(
            values.value_for(&rule("OtherGroup", "HighRiskType")),
            Some(&TypedValue::set(["add_column"]))
        );
    }

    #[test]
    fn single_value_applies_to_all() {
        let v = TypedValue::from("drop_table");
        assert_eq!(v.value_for(&rule("a", "b")), Some(&v));
        assert_eq!(v.value_for(&rule("c", "d")), Some(&v));
    }

    #[test]
    fn hashmap_source() {
        let mut map = HashMap::new();
        map.insert("DmlNotHasWhere".to_owned(), TypedValue::Bool(false));
        assert_eq!(
            map.value_for(&rule("DmlRule", "DmlNotHasWhere")),
            Some(&TypedValue::Bool(false))
        );
    }

    #[test]
    fn overwrite_and_len() {
        let mut values = StatementValues::new().set("r", 1_i64);
        values.insert("r", TypedValue::Int(2));
        assert_eq!(values.get("r"), Some(&TypedValue::Int(2)));
        assert_eq!(values.len(), 1);
        assert!(!values.is_empty());
        assert!(StatementValues::new().is_empty());
    }
}
