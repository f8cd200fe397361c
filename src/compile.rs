use crate::types::{CompiledExpr, CompiledOperand};
use crate::{CompileError, CompiledExpression, Expr, ItemType, Operand, Operator, TypedValue};

/// Compile an expression with no `Item` bound.
///
/// Evaluating an expression that mentions `Item` then fails with
/// [`EvalError::UnboundOperand`](crate::EvalError::UnboundOperand).
///
/// # Errors
///
/// Returns [`CompileError`] on syntax errors, unknown identifiers, or operand
/// types that can never satisfy their operator.
pub fn compile(source: &str) -> Result<CompiledExpression, CompileError> {
    build(source, None)
}

/// Compile an expression and bind the rule's reference value as `Item`.
///
/// Knowing `Item`'s type lets more operator misuse surface here instead of on
/// every evaluation.
///
/// # Errors
///
/// See [`compile`].
pub fn compile_with_item(source: &str, item: TypedValue) -> Result<CompiledExpression, CompileError> {
    build(source, Some(item))
}

fn build(source: &str, item: Option<TypedValue>) -> Result<CompiledExpression, CompileError> {
    let expr = crate::parse::parse(source)?;
    let root = lower_expr(&expr, item.as_ref())?;
    Ok(CompiledExpression {
        source: source.to_owned(),
        root,
        item,
    })
}

pub(crate) fn lower_expr(expr: &Expr, item: Option<&TypedValue>) -> Result<CompiledExpr, CompileError> {
    lower(expr, item, true)
}

/// `always_evaluated` is false below the right side of `and`/`or`. Type
/// errors there may be skipped by short-circuiting, so they are left to
/// evaluation.
fn lower(
    expr: &Expr,
    item: Option<&TypedValue>,
    always_evaluated: bool,
) -> Result<CompiledExpr, CompileError> {
    match expr {
        Expr::Compare { left, op, right } => {
            let left = lower_operand(left)?;
            let right = lower_operand(right)?;
            if always_evaluated {
                check_operands(&left, *op, &right, item)?;
            }
            Ok(CompiledExpr::Compare {
                left,
                op: *op,
                right,
            })
        }
        Expr::And(a, b) => Ok(CompiledExpr::And(
            Box::new(lower(a, item, always_evaluated)?),
            Box::new(lower(b, item, false)?),
        )),
        Expr::Or(a, b) => Ok(CompiledExpr::Or(
            Box::new(lower(a, item, always_evaluated)?),
            Box::new(lower(b, item, false)?),
        )),
        Expr::Not(inner) => Ok(CompiledExpr::Not(Box::new(lower(
            inner,
            item,
            always_evaluated,
        )?))),
    }
}

fn lower_operand(operand: &Operand) -> Result<CompiledOperand, CompileError> {
    match operand {
        Operand::Name(name) => match name.as_str() {
            "Val" => Ok(CompiledOperand::Val),
            "Item" => Ok(CompiledOperand::Item),
            _ => Err(CompileError::UnknownIdentifier { name: name.clone() }),
        },
        Operand::Literal(value) => Ok(CompiledOperand::Literal(value.clone())),
        Operand::Len(inner) => Ok(CompiledOperand::Len(Box::new(lower_operand(inner)?))),
    }
}

/// The operand's type if it is known before `Val` arrives.
fn static_type(
    operand: &CompiledOperand,
    item: Option<&TypedValue>,
) -> Result<Option<ItemType>, CompileError> {
    match operand {
        CompiledOperand::Val => Ok(None),
        CompiledOperand::Item => Ok(item.map(TypedValue::item_type)),
        CompiledOperand::Literal(value) => Ok(Some(value.item_type())),
        CompiledOperand::Len(inner) => match static_type(inner, item)? {
            Some(ty @ (ItemType::Int | ItemType::Bool)) => {
                Err(CompileError::InvalidOperand { op: "len", ty })
            }
            _ => Ok(Some(ItemType::Int)),
        },
    }
}

const ALL_TYPES: [ItemType; 4] = [
    ItemType::String,
    ItemType::Array,
    ItemType::Int,
    ItemType::Bool,
];

/// Reject a comparison no `Val` could ever satisfy. With one side unknown
/// the mismatch names the first type the operator takes on that side.
fn check_operands(
    left: &CompiledOperand,
    op: Operator,
    right: &CompiledOperand,
    item: Option<&TypedValue>,
) -> Result<(), CompileError> {
    let left_ty = static_type(left, item)?;
    let right_ty = static_type(right, item)?;
    let mismatch = match (left_ty, right_ty) {
        (Some(l), Some(r)) => (!op.accepts(l, r)).then_some((l, r)),
        (None, Some(r)) => {
            let fits = |l: &ItemType| op.accepts(*l, r);
            (!ALL_TYPES.iter().any(fits)).then(|| (expected(op, true), r))
        }
        (Some(l), None) => {
            let fits = |r: &ItemType| op.accepts(l, *r);
            (!ALL_TYPES.iter().any(fits)).then(|| (l, expected(op, false)))
        }
        (None, None) => None,
    };
    match mismatch {
        Some((left, right)) => Err(CompileError::TypeMismatch { op, left, right }),
        None => Ok(()),
    }
}

fn expected(op: Operator, left_side: bool) -> ItemType {
    ALL_TYPES
        .into_iter()
        .find(|&t| {
            ALL_TYPES
                .iter()
                .any(|&u| if left_side { op.accepts(t, u) } else { op.accepts(u, t) })
        })
        .unwrap_or(ItemType::String)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{item, val, EvalError};

    #[test]
    fn compile_simple_expression() {
        let compiled = compile("Val in Item").unwrap();
        assert_eq!(compiled.source(), "Val in Item");
        assert!(compiled.item().is_none());
        assert!(compiled.references_item());
    }

    #[test]
    fn compile_is_deterministic() {
        let source = "not (Val contains Item) and ( len(Val) != 0 )";
        assert_eq!(compile(source).unwrap(), compile(source).unwrap());
    }

    #[test]
    fn compile_unknown_identifier() {
        let result = compile("Value in Item");
        assert_eq!(
            result.unwrap_err(),
            CompileError::UnknownIdentifier {
                name: "Value".into()
            }
        );
    }

    #[test]
    fn operand_names_are_case_sensitive() {
        assert!(matches!(
            compile("val == 1"),
            Err(CompileError::UnknownIdentifier { .. })
        ));
    }

    #[test]
    fn compile_syntax_error() {
        assert!(matches!(
            compile("Val ~= Item"),
            Err(CompileError::Syntax(_))
        ));
    }

    #[test]
    fn literal_type_mismatch_is_caught() {
        let result = compile(r#""a" > 2 and Val == 1"#);
        assert_eq!(
            result.unwrap_err(),
            CompileError::TypeMismatch {
                op: Operator::Gt,
                left: ItemType::String,
                right: ItemType::Int,
            }
        );
    }

    #[test]
    fn bound_item_type_mismatch_is_caught() {
        let result = compile_with_item("Val in Item", TypedValue::Int(10));
        assert!(matches!(
            result,
            Err(CompileError::TypeMismatch {
                op: Operator::In,
                right: ItemType::Int,
                ..
            })
        ));
    }

    #[test]
    fn unsatisfiable_val_comparison_is_caught() {
        assert!(matches!(
            compile_with_item("Val > Item", TypedValue::String("x".into())),
            Err(CompileError::TypeMismatch {
                op: Operator::Gt,
                left: ItemType::Int,
                right: ItemType::String,
            })
        ));
        assert!(matches!(
            compile_with_item("Item contains Val", TypedValue::Bool(true)),
            Err(CompileError::TypeMismatch {
                op: Operator::Contains,
                left: ItemType::Bool,
                ..
            })
        ));
    }

    #[test]
    fn short_circuited_mismatch_waits_for_evaluation() {
        let compiled =
            compile_with_item("Val == 1 or Item > 2", TypedValue::String("x".into())).unwrap();
        assert_eq!(compiled.evaluate(&TypedValue::Int(1)), Ok(true));
        assert_eq!(
            compiled.evaluate(&TypedValue::Int(5)),
            Err(EvalError::TypeMismatch {
                op: Operator::Gt,
                left: ItemType::String,
                right: ItemType::Int,
            })
        );

        let guarded = compile(r#"Val == 1 and "a" > 2"#).unwrap();
        assert_eq!(guarded.evaluate(&TypedValue::Int(0)), Ok(false));

        let negated = compile("Val != 0 and not (len(3) > 1)").unwrap();
        assert_eq!(negated.evaluate(&TypedValue::Int(0)), Ok(false));
        assert!(matches!(
            negated.evaluate(&TypedValue::Int(1)),
            Err(EvalError::InvalidOperand { op: "len", .. })
        ));
    }

    #[test]
    fn len_of_int_is_rejected() {
        assert_eq!(
            compile("len(3) > 1").unwrap_err(),
            CompileError::InvalidOperand {
                op: "len",
                ty: ItemType::Int,
            }
        );
        assert!(matches!(
            compile_with_item("len(Item) > 1", TypedValue::Bool(true)),
            Err(CompileError::InvalidOperand { op: "len", .. })
        ));
    }

    #[test]
    fn val_side_is_left_to_evaluation() {
        assert!(compile_with_item("Val >= Item", TypedValue::Int(10)).is_ok());
        assert!(compile_with_item("len(Val) > Item", TypedValue::Int(1)).is_ok());
    }

    #[test]
    fn lower_builder_expression() {
        let expr = val().is_in(item());
        let lowered = lower_expr(&expr, None).unwrap();
        assert_eq!(
            lowered,
            CompiledExpr::Compare {
                left: CompiledOperand::Val,
                op: Operator::In,
                right: CompiledOperand::Item,
            }
        );
    }
}
