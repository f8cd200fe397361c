use thiserror::Error;

use super::expr::Operator;
use super::value::ItemType;
use crate::parse::ParseError;

/// A raw literal could not be turned into a [`TypedValue`](super::TypedValue).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("unrecognized item type '{0}'")]
    UnrecognizedType(String),

    #[error("malformed {expected} literal '{raw}': {reason}")]
    Malformed {
        expected: ItemType,
        raw: String,
        reason: String,
    },
}

/// An expression source could not be compiled.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    #[error(transparent)]
    Syntax(#[from] ParseError),

    #[error("unknown identifier '{name}'; expected Val or Item")]
    UnknownIdentifier { name: String },

    #[error("operator '{op}' cannot compare {left} with {right}")]
    TypeMismatch {
        op: Operator,
        left: ItemType,
        right: ItemType,
    },

    #[error("'{op}' is not defined for {ty}")]
    InvalidOperand { op: &'static str, ty: ItemType },
}

/// A compiled expression failed against a concrete `Val`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    #[error("operator '{op}' cannot compare {left} with {right}")]
    TypeMismatch {
        op: Operator,
        left: ItemType,
        right: ItemType,
    },

    #[error("operand '{0}' is not bound")]
    UnboundOperand(String),

    #[error("'{op}' is not defined for {ty}")]
    InvalidOperand { op: &'static str, ty: ItemType },

    /// Not produced by the built-in grammar, which rejects unknown operators
    /// at compile time.
    #[error("unsupported operator '{0}'")]
    UnsupportedOperator(String),
}

/// Why a single rule could not produce a verdict.
///
/// Failures are scoped to one rule: the runner records them and moves on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleError {
    #[error("decode failed: {0}")]
    Decode(#[from] DecodeError),

    #[error("compile failed: {0}")]
    Compile(#[from] CompileError),

    #[error("evaluation failed: {0}")]
    Eval(#[from] EvalError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unrecognized_type_message() {
        let err = DecodeError::UnrecognizedType("float".into());
        assert_eq!(err.to_string(), "unrecognized item type 'float'");
    }

    #[test]
    fn unknown_identifier_message() {
        let err = CompileError::UnknownIdentifier {
            name: "Value".into(),
        };
        assert_eq!(
            err.to_string(),
            "unknown identifier 'Value'; expected Val or Item"
        );
    }

    #[test]
    fn type_mismatch_message() {
        let err = EvalError::TypeMismatch {
            op: Operator::In,
            left: ItemType::Int,
            right: ItemType::String,
        };
        assert_eq!(err.to_string(), "operator 'in' cannot compare int with string");
    }

    #[test]
    fn unbound_operand_message() {
        let err = EvalError::UnboundOperand("Item".into());
        assert_eq!(err.to_string(), "operand 'Item' is not bound");
    }

    #[test]
    fn invalid_operand_message() {
        let err = EvalError::InvalidOperand {
            op: "len",
            ty: ItemType::Bool,
        };
        assert_eq!(err.to_string(), "'len' is not defined for bool");
    }

    #[test]
    fn rule_error_wraps_stage() {
        let err = RuleError::from(EvalError::UnboundOperand("Val".into()));
        assert_eq!(
            err.to_string(),
            "evaluation failed: operand 'Val' is not bound"
        );
    }
}
