use std::fmt::{self, Write as _};
use std::str::FromStr;

use super::error::DecodeError;

/// Type tag attached to a rule's reference value.
///
/// The tag decides how the raw `item` literal is decoded and doubles as the
/// type name reported in evaluation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemType {
    String,
    Array,
    Int,
    Bool,
}

impl ItemType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ItemType::String => "string",
            ItemType::Array => "array",
            ItemType::Int => "int",
            ItemType::Bool => "bool",
        }
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemType {
    type Err = DecodeError;

    /// Parses a tag. The legacy spelling `arry` is read as `array`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "string" => Ok(ItemType::String),
            "array" | "arry" => Ok(ItemType::Array),
            "int" => Ok(ItemType::Int),
            "bool" => Ok(ItemType::Bool),
            other => Err(DecodeError::UnrecognizedType(other.to_owned())),
        }
    }
}

/// A dynamically typed operand: either a rule's `Item` or a runtime `Val`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypedValue {
    /// A single string, e.g. a command name or storage engine.
    String(String),
    /// An ordered sequence of strings. Order and duplicates are kept as given.
    StringSet(Vec<String>),
    /// A 64-bit signed integer.
    Int(i64),
    /// A boolean flag.
    Bool(bool),
}

impl TypedValue {
    /// Decode a raw JSON literal under the given type tag.
    ///
    /// No coercion happens here: `"10"` is not an `int` and `1` is not a `bool`.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::Malformed`] if the literal does not have the
    /// shape the tag requires.
    pub fn decode(raw: impl AsRef<[u8]>, item_type: ItemType) -> Result<Self, DecodeError> {
        let raw = raw.as_ref();
        let malformed = |e: serde_json::Error| DecodeError::Malformed {
            expected: item_type,
            raw: String::from_utf8_lossy(raw).into_owned(),
            reason: e.to_string(),
        };
        match item_type {
            ItemType::String => serde_json::from_slice::<String>(raw)
                .map(TypedValue::String)
                .map_err(malformed),
            ItemType::Array => serde_json::from_slice::<Vec<String>>(raw)
                .map(TypedValue::StringSet)
                .map_err(malformed),
            ItemType::Int => serde_json::from_slice::<i64>(raw)
                .map(TypedValue::Int)
                .map_err(malformed),
            ItemType::Bool => serde_json::from_slice::<bool>(raw)
                .map(TypedValue::Bool)
                .map_err(malformed),
        }
    }

    /// Decode a raw literal whose type tag is still a string, as stored in
    /// the catalog.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::UnrecognizedType`] for an unknown tag, or
    /// [`DecodeError::Malformed`] if the literal does not match it.
    pub fn decode_tagged(raw: impl AsRef<[u8]>, tag: &str) -> Result<Self, DecodeError> {
        let item_type: ItemType = tag.parse()?;
        Self::decode(raw, item_type)
    }

    /// Build a [`TypedValue::StringSet`] from anything yielding strings.
    pub fn set<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        TypedValue::StringSet(items.into_iter().map(Into::into).collect())
    }

    #[must_use]
    pub fn item_type(&self) -> ItemType {
        match self {
            TypedValue::String(_) => ItemType::String,
            TypedValue::StringSet(_) => ItemType::Array,
            TypedValue::Int(_) => ItemType::Int,
            TypedValue::Bool(_) => ItemType::Bool,
        }
    }

    /// The JSON form of this value, matching what [`decode`](Self::decode) accepts.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            TypedValue::String(s) => serde_json::Value::from(s.as_str()),
            TypedValue::StringSet(items) => serde_json::Value::from(items.clone()),
            TypedValue::Int(v) => serde_json::Value::from(*v),
            TypedValue::Bool(v) => serde_json::Value::from(*v),
        }
    }

    /// Encode as a raw literal suitable for a rule's `item` column.
    #[must_use]
    pub fn encode(&self) -> String {
        self.to_json().to_string()
    }
}

impl From<i64> for TypedValue {
    fn from(v: i64) -> Self {
        TypedValue::Int(v)
    }
}

impl From<bool> for TypedValue {
    fn from(v: bool) -> Self {
        TypedValue::Bool(v)
    }
}

impl From<&str> for TypedValue {
    fn from(v: &str) -> Self {
        TypedValue::String(v.to_owned())
    }
}

impl From<String> for TypedValue {
    fn from(v: String) -> Self {
        TypedValue::String(v)
    }
}

impl From<Vec<String>> for TypedValue {
    fn from(v: Vec<String>) -> Self {
        TypedValue::StringSet(v)
    }
}

impl From<Vec<&str>> for TypedValue {
    fn from(v: Vec<&str>) -> Self {
        TypedValue::set(v)
    }
}

impl fmt::Display for TypedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypedValue::String(v) => write_quoted(f, v),
            TypedValue::StringSet(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write_quoted(f, item)?;
                }
                f.write_str("]")
            }
            TypedValue::Int(v) => write!(f, "{v}"),
            TypedValue::Bool(v) => write!(f, "{v}"),
        }
    }
}

/// Writes `s` as a double-quoted literal the expression grammar reads back.
fn write_quoted(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    f.write_str("\"")?;
    for c in s.chars() {
        match c {
            '"' => f.write_str("\\\"")?,
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            '\t' => f.write_str("\\t")?,
            c => f.write_char(c)?,
        }
    }
    f.write_str("\"")
}
