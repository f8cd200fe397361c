mod compiled_expression;
mod error;
mod expr;
mod outcome;
mod report;
mod rule;
mod value;
mod values;

pub use compiled_expression::CompiledExpression;
pub use error::{CompileError, DecodeError, EvalError, RuleError};
pub(crate) use expr::{CompiledExpr, CompiledOperand};
pub use expr::{item, val, Expr, Operand, Operator};
pub use outcome::{RuleFailure, RuleOutcome};
pub use report::GroupReport;
pub use rule::{SyntaxRule, WarnLevel};
pub use value::{ItemType, TypedValue};
pub use values::{StatementValues, ValueSource};
