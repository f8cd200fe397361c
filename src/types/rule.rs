use std::fmt;

use serde::{Deserialize, Serialize};

use super::compiled_expression::CompiledExpression;
use super::error::{DecodeError, RuleError};
use super::value::{ItemType, TypedValue};
use crate::catalog::CatalogError;

/// Column widths of the persisted rule record, in bytes.
const MAX_NAME_LEN: usize = 64;
const MAX_ITEM_LEN: usize = 1024;
const MAX_ITEM_TYPE_LEN: usize = 128;
const MAX_EXPR_LEN: usize = 128;
const MAX_DESC_LEN: usize = 512;

/// How a violation of a rule is treated by the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i16", into = "i16")]
pub enum WarnLevel {
    /// Reported as a warning; the statement may still run.
    #[default]
    Advisory,
    /// The statement must not run.
    Blocking,
}

impl WarnLevel {
    #[must_use]
    pub fn is_blocking(self) -> bool {
        self == WarnLevel::Blocking
    }
}

impl TryFrom<i16> for WarnLevel {
    type Error = CatalogError;

    fn try_from(level: i16) -> Result<Self, Self::Error> {
        match level {
            0 => Ok(WarnLevel::Advisory),
            1 => Ok(WarnLevel::Blocking),
            other => Err(CatalogError::InvalidWarnLevel(other)),
        }
    }
}

impl From<WarnLevel> for i16 {
    fn from(level: WarnLevel) -> Self {
        match level {
            WarnLevel::Advisory => 0,
            WarnLevel::Blocking => 1,
        }
    }
}

impl fmt::Display for WarnLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            WarnLevel::Advisory => "advisory",
            WarnLevel::Blocking => "blocking",
        })
    }
}

/// One persisted syntax rule, identified by `(group_name, rule_name)`.
///
/// `item` holds the raw JSON literal and `item_type` the tag it is decoded
/// under. Both stay undecoded here so a bad row is reported against the rule
/// that carries it rather than rejected when the catalog loads.
///
/// ```
/// use sqlrule::{SyntaxRule, TypedValue, WarnLevel};
///
/// let rule = SyntaxRule::new("DmlRule", "DmlNotHasWhere", " Val != Item ")
///     .with_item(&TypedValue::Bool(true))
///     .with_warn_level(WarnLevel::Advisory);
/// assert_eq!(rule.decode_item().unwrap(), TypedValue::Bool(true));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyntaxRule {
    pub group_name: String,
    pub rule_name: String,
    /// Inline JSON in the persisted form, e.g. `"item": ["drop_table"]`.
    #[serde(with = "raw_json")]
    pub item: String,
    pub item_type: String,
    pub expr: String,
    pub desc: String,
    pub warn_level: WarnLevel,
    /// `false` disables the rule without deleting it.
    pub status: bool,
}

impl SyntaxRule {
    /// A new enabled, advisory rule whose `Item` is the empty string.
    #[must_use]
    pub fn new(
        group_name: impl Into<String>,
        rule_name: impl Into<String>,
        expr: impl Into<String>,
    ) -> Self {
        Self {
            group_name: group_name.into(),
            rule_name: rule_name.into(),
            item: "\"\"".to_owned(),
            item_type: ItemType::String.as_str().to_owned(),
            expr: expr.into(),
            desc: String::new(),
            warn_level: WarnLevel::Advisory,
            status: true,
        }
    }

    /// Set `item` and `item_type` from a typed value.
    #[must_use]
    pub fn with_item(mut self, item: &TypedValue) -> Self {
        self.item = item.encode();
        self.item_type = item.item_type().as_str().to_owned();
        self
    }

    /// Set `item` and `item_type` verbatim. Nothing is checked until the
    /// rule is decoded.
    #[must_use]
    pub fn with_raw_item(mut self, item_type: impl Into<String>, raw: impl Into<String>) -> Self {
        self.item_type = item_type.into();
        self.item = raw.into();
        self
    }

    #[must_use]
    pub fn with_desc(mut self, desc: impl Into<String>) -> Self {
        self.desc = desc.into();
        self
    }

    #[must_use]
    pub fn with_warn_level(mut self, warn_level: WarnLevel) -> Self {
        self.warn_level = warn_level;
        self
    }

    #[must_use]
    pub fn with_status(mut self, enabled: bool) -> Self {
        self.status = enabled;
        self
    }

    #[must_use]
    pub fn identity(&self) -> (&str, &str) {
        (&self.group_name, &self.rule_name)
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.status
    }

    /// Decode the rule's `Item` under its `item_type` tag.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError`] for an unknown tag or a literal that does not
    /// match it.
    pub fn decode_item(&self) -> Result<TypedValue, DecodeError> {
        TypedValue::decode_tagged(&self.item, &self.item_type)
    }

    /// Decode `Item` and compile `expr` with it bound.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError::Decode`] or [`RuleError::Compile`].
    pub fn compile(&self) -> Result<CompiledExpression, RuleError> {
        let item = self.decode_item()?;
        Ok(crate::compile_with_item(&self.expr, item)?)
    }

    /// Check the record against the persisted column widths.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::FieldTooLong`] naming the first offending field.
    pub fn validate(&self) -> Result<(), CatalogError> {
        let fields = [
            ("group_name", self.group_name.len(), MAX_NAME_LEN),
            ("rule_name", self.rule_name.len(), MAX_NAME_LEN),
            ("item", self.item.len(), MAX_ITEM_LEN),
            ("item_type", self.item_type.len(), MAX_ITEM_TYPE_LEN),
            ("expr", self.expr.len(), MAX_EXPR_LEN),
            ("desc", self.desc.len(), MAX_DESC_LEN),
        ];
        for (field, actual, max) in fields {
            if actual > max {
                return Err(CatalogError::FieldTooLong { field, max, actual });
            }
        }
        Ok(())
    }
}

impl fmt::Display for SyntaxRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.group_name, self.rule_name)
    }
}

/// Stores `item` as inline JSON while keeping the exact source text. An item
/// that is not JSON at all is written as a JSON string so one bad record
/// cannot block export of the rest.
mod raw_json {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use serde_json::value::RawValue;
    use tracing::warn;

    pub(super) fn serialize<S: Serializer>(raw: &str, serializer: S) -> Result<S::Ok, S::Error> {
        match RawValue::from_string(raw.to_owned()) {
            Ok(value) => value.serialize(serializer),
            Err(error) => {
                warn!(item = raw, %error, "item is not valid JSON; writing it as a string");
                raw.serialize(serializer)
            }
        }
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<String, D::Error> {
        let value = Box::<RawValue>::deserialize(deserializer)?;
        Ok(value.get().to_owned())
    }
}
