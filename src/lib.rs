//! Typed syntax-rule catalog and expression evaluator for SQL linting.
//!
//! Rules pair a small boolean expression over `Val` (what the SQL analyzer
//! found) and `Item` (the rule's reference value) with a warn level. The
//! runner decodes and compiles each rule once and evaluates it per statement.
//!
//! ```
//! use sqlrule::{compile_with_item, TypedValue};
//!
//! let banned = TypedValue::set(["truncate", "kill"]);
//! let expr = compile_with_item("Val in Item", banned).unwrap();
//! assert_eq!(expr.evaluate(&"truncate".into()), Ok(true));
//! ```

mod catalog;
mod compile;
mod error;
mod evaluate;
pub mod parse;
mod runner;
mod seed;
#[cfg(feature = "binary-cache")]
mod serial;
mod types;

pub use catalog::{CatalogError, MemoryCatalog, RuleCatalog, UpsertOutcome};
pub use compile::{compile, compile_with_item};
pub use error::SqlRuleError;
pub use runner::{RuleRunner, RunnerError};
pub use seed::{default_rules, seed, SeedReport};
#[cfg(feature = "binary-cache")]
pub use serial::{DeserializeError, SerializeError};
pub use types::{
    item, val, CompileError, CompiledExpression, DecodeError, EvalError, Expr, GroupReport,
    ItemType, Operand, Operator, RuleError, RuleFailure, RuleOutcome, StatementValues, SyntaxRule,
    TypedValue, ValueSource, WarnLevel,
};
