use std::borrow::Cow;

use crate::types::{CompiledExpr, CompiledOperand};
use crate::{EvalError, Operator, TypedValue};

pub(crate) fn evaluate(
    expr: &CompiledExpr,
    item: Option<&TypedValue>,
    val: &TypedValue,
) -> Result<bool, EvalError> {
    match expr {
        CompiledExpr::Compare { left, op, right } => {
            let left = resolve(left, item, val)?;
            let right = resolve(right, item, val)?;
            apply(*op, &left, &right)
        }
        // `?` on the left propagates its error before the right side is considered.
        CompiledExpr::And(a, b) => Ok(evaluate(a, item, val)? && evaluate(b, item, val)?),
        CompiledExpr::Or(a, b) => Ok(evaluate(a, item, val)? || evaluate(b, item, val)?),
        CompiledExpr::Not(inner) => Ok(!evaluate(inner, item, val)?),
    }
}

fn resolve<'a>(
    operand: &'a CompiledOperand,
    item: Option<&'a TypedValue>,
    val: &'a TypedValue,
) -> Result<Cow<'a, TypedValue>, EvalError> {
    match operand {
        CompiledOperand::Val => Ok(Cow::Borrowed(val)),
        CompiledOperand::Item => item
            .map(Cow::Borrowed)
            .ok_or_else(|| EvalError::UnboundOperand("Item".to_owned())),
        CompiledOperand::Literal(value) => Ok(Cow::Borrowed(value)),
        CompiledOperand::Len(inner) => {
            let inner = resolve(inner, item, val)?;
            length(&inner).map(|n| Cow::Owned(TypedValue::Int(n)))
        }
    }
}

fn length(value: &TypedValue) -> Result<i64, EvalError> {
    let n = match value {
        TypedValue::String(s) => s.chars().count(),
        TypedValue::StringSet(items) => items.len(),
        TypedValue::Int(_) | TypedValue::Bool(_) => {
            return Err(EvalError::InvalidOperand {
                op: "len",
                ty: value.item_type(),
            });
        }
    };
    Ok(i64::try_from(n).unwrap_or(i64::MAX))
}

fn mismatch(op: Operator, left: &TypedValue, right: &TypedValue) -> EvalError {
    EvalError::TypeMismatch {
        op,
        left: left.item_type(),
        right: right.item_type(),
    }
}

fn apply(op: Operator, left: &TypedValue, right: &TypedValue) -> Result<bool, EvalError> {
    match op {
        Operator::Eq => equals(op, left, right),
        Operator::Neq => equals(op, left, right).map(|eq| !eq),
        Operator::Gt | Operator::Gte | Operator::Lt | Operator::Lte => order(op, left, right),
        Operator::In => member(op, left, right),
        Operator::NotIn => member(op, left, right).map(|found| !found),
        Operator::Contains => contains(op, left, right),
    }
}

fn equals(op: Operator, left: &TypedValue, right: &TypedValue) -> Result<bool, EvalError> {
    match (left, right) {
        (TypedValue::String(a), TypedValue::String(b)) => Ok(a == b),
        (TypedValue::StringSet(a), TypedValue::StringSet(b)) => Ok(a == b),
        (TypedValue::Int(a), TypedValue::Int(b)) => Ok(a == b),
        (TypedValue::Bool(a), TypedValue::Bool(b)) => Ok(a == b),
        _ => Err(mismatch(op, left, right)),
    }
}

fn order(op: Operator, left: &TypedValue, right: &TypedValue) -> Result<bool, EvalError> {
    let (TypedValue::Int(a), TypedValue::Int(b)) = (left, right) else {
        return Err(mismatch(op, left, right));
    };
    Ok(match op {
        Operator::Gt => a > b,
        Operator::Gte => a >= b,
        Operator::Lt => a < b,
        _ => a <= b,
    })
}

fn member(op: Operator, left: &TypedValue, right: &TypedValue) -> Result<bool, EvalError> {
    match (left, right) {
        (TypedValue::String(needle), TypedValue::StringSet(haystack)) => {
            Ok(haystack.iter().any(|s| s == needle))
        }
        _ => Err(mismatch(op, left, right)),
    }
}

fn contains(op: Operator, left: &TypedValue, right: &TypedValue) -> Result<bool, EvalError> {
    match (left, right) {
        (TypedValue::String(haystack), TypedValue::String(needle)) => {
            Ok(haystack.contains(needle.as_str()))
        }
        (TypedValue::StringSet(set), TypedValue::String(s))
        | (TypedValue::String(s), TypedValue::StringSet(set)) => Ok(set.iter().any(|e| e == s)),
        (TypedValue::StringSet(outer), TypedValue::StringSet(inner)) => {
            Ok(inner.iter().all(|e| outer.contains(e)))
        }
        _ => Err(mismatch(op, left, right)),
    }
}
