use std::fmt;

use super::error::EvalError;
use super::expr::{CompiledExpr, CompiledOperand};
use super::value::TypedValue;

/// A parsed and checked rule expression, optionally carrying its `Item`.
///
/// Immutable once built. Safe to share behind `Arc` and evaluate from many
/// threads at once.
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub struct CompiledExpression {
    pub(crate) source: String,
    pub(crate) root: CompiledExpr,
    pub(crate) item: Option<TypedValue>,
}

impl CompiledExpression {
    /// The expression text this was compiled from.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The bound `Item`, if any.
    #[must_use]
    pub fn item(&self) -> Option<&TypedValue> {
        self.item.as_ref()
    }

    /// Whether the expression mentions `Item` anywhere.
    #[must_use]
    pub fn references_item(&self) -> bool {
        expr_mentions_item(&self.root)
    }

    /// Evaluate against a runtime `Val`. `true` means the rule is violated.
    ///
    /// # Errors
    ///
    /// Returns [`EvalError`] when an operator meets operand types it is not
    /// defined for, or when `Item` is referenced but was never bound.
    pub fn evaluate(&self, val: &TypedValue) -> Result<bool, EvalError> {
        crate::evaluate::evaluate(&self.root, self.item.as_ref(), val)
    }
}

fn expr_mentions_item(expr: &CompiledExpr) -> bool {
    match expr {
        CompiledExpr::Compare { left, right, .. } => {
            operand_mentions_item(left) || operand_mentions_item(right)
        }
        CompiledExpr::And(a, b) | CompiledExpr::Or(a, b) => {
            expr_mentions_item(a) || expr_mentions_item(b)
        }
        CompiledExpr::Not(inner) => expr_mentions_item(inner),
    }
}

fn operand_mentions_item(operand: &CompiledOperand) -> bool {
    match operand {
        CompiledOperand::Item => true,
        CompiledOperand::Len(inner) => operand_mentions_item(inner),
        CompiledOperand::Val | CompiledOperand::Literal(_) => false,
    }
}

impl fmt::Display for CompiledExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.item {
            Some(item) => write!(f, "{} [Item = {item}]", self.source.trim()),
            None => f.write_str(self.source.trim()),
        }
    }
}
