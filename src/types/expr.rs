use std::fmt;
use std::ops::Not;

use super::value::{ItemType, TypedValue};

/// Binary operators of the rule expression language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
    In,
    NotIn,
    Contains,
}

impl Operator {
    /// Whether the operator is defined for the given operand types.
    ///
    /// The evaluator and the compile-time check share this table.
    #[must_use]
    pub fn accepts(self, left: ItemType, right: ItemType) -> bool {
        match self {
            Operator::Eq | Operator::Neq => left == right,
            Operator::Gt | Operator::Gte | Operator::Lt | Operator::Lte => {
                left == ItemType::Int && right == ItemType::Int
            }
            Operator::In | Operator::NotIn => {
                left == ItemType::String && right == ItemType::Array
            }
            Operator::Contains => matches!(
                (left, right),
                (ItemType::String | ItemType::Array, ItemType::String | ItemType::Array)
            ),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Operator::Eq => "==",
            Operator::Neq => "!=",
            Operator::Gt => ">",
            Operator::Gte => ">=",
            Operator::Lt => "<",
            Operator::Lte => "<=",
            Operator::In => "in",
            Operator::NotIn => "not in",
            Operator::Contains => "contains",
        })
    }
}

/// An operand as written in the source. Names are resolved during compilation.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Name(String),
    Literal(TypedValue),
    Len(Box<Operand>),
}

/// User-facing expression AST produced by the parser.
/// Transformed into [`CompiledExpr`] during compilation.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Compare {
        left: Operand,
        op: Operator,
        right: Operand,
    },
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Not(Box<Expr>),
}

/// Operand with its name resolved to one of the two bound slots.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum CompiledOperand {
    Val,
    Item,
    Literal(TypedValue),
    Len(Box<CompiledOperand>),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum CompiledExpr {
    Compare {
        left: CompiledOperand,
        op: Operator,
        right: CompiledOperand,
    },
    And(Box<CompiledExpr>, Box<CompiledExpr>),
    Or(Box<CompiledExpr>, Box<CompiledExpr>),
    Not(Box<CompiledExpr>),
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Name(name) => f.write_str(name),
            Operand::Literal(value) => write!(f, "{value}"),
            Operand::Len(inner) => write!(f, "len({inner})"),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Compare { left, op, right } => write!(f, "({left} {op} {right})"),
            Expr::And(a, b) => write!(f, "({a} AND {b})"),
            Expr::Or(a, b) => write!(f, "({a} OR {b})"),
            Expr::Not(inner) => write!(f, "(NOT {inner})"),
        }
    }
}

impl Expr {
    #[must_use]
    pub fn and(self, other: Expr) -> Expr {
        Expr::And(Box::new(self), Box::new(other))
    }

    #[must_use]
    pub fn or(self, other: Expr) -> Expr {
        Expr::Or(Box::new(self), Box::new(other))
    }
}

impl Not for Expr {
    type Output = Expr;

    fn not(self) -> Expr {
        Expr::Not(Box::new(self))
    }
}

impl Operand {
    fn compare(self, op: Operator, other: impl Into<Operand>) -> Expr {
        Expr::Compare {
            left: self,
            op,
            right: other.into(),
        }
    }

    #[must_use]
    pub fn len(self) -> Operand {
        Operand::Len(Box::new(self))
    }

    #[must_use]
    pub fn eq(self, other: impl Into<Operand>) -> Expr {
        self.compare(Operator::Eq, other)
    }

    #[must_use]
    pub fn neq(self, other: impl Into<Operand>) -> Expr {
        self.compare(Operator::Neq, other)
    }

    #[must_use]
    pub fn gt(self, other: impl Into<Operand>) -> Expr {
        self.compare(Operator::Gt, other)
    }

    #[must_use]
    pub fn gte(self, other: impl Into<Operand>) -> Expr {
        self.compare(Operator::Gte, other)
    }

    #[must_use]
    pub fn lt(self, other: impl Into<Operand>) -> Expr {
        self.compare(Operator::Lt, other)
    }

    #[must_use]
    pub fn lte(self, other: impl Into<Operand>) -> Expr {
        self.compare(Operator::Lte, other)
    }

    #[must_use]
    pub fn is_in(self, other: impl Into<Operand>) -> Expr {
        self.compare(Operator::In, other)
    }

    #[must_use]
    pub fn not_in(self, other: impl Into<Operand>) -> Expr {
        self.compare(Operator::NotIn, other)
    }

    #[must_use]
    pub fn contains(self, other: impl Into<Operand>) -> Expr {
        self.compare(Operator::Contains, other)
    }
}

impl From<TypedValue> for Operand {
    fn from(value: TypedValue) -> Self {
        Operand::Literal(value)
    }
}

impl From<i64> for Operand {
    fn from(v: i64) -> Self {
        Operand::Literal(TypedValue::Int(v))
    }
}

impl From<bool> for Operand {
    fn from(v: bool) -> Self {
        Operand::Literal(TypedValue::Bool(v))
    }
}

impl From<&str> for Operand {
    fn from(v: &str) -> Self {
        Operand::Literal(TypedValue::from(v))
    }
}

/// The runtime operand `Val`.
#[must_use]
pub fn val() -> Operand {
    Operand::Name("Val".to_owned())
}

/// The rule's reference operand `Item`.
#[must_use]
pub fn item() -> Operand {
    Operand::Name("Item".to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_produces_compare() {
        let expr = val().is_in(item());
        assert_eq!(
            expr,
            Expr::Compare {
                left: Operand::Name("Val".into()),
                op: Operator::In,
                right: Operand::Name("Item".into()),
            }
        );
    }

    #[test]
    fn builder_literal_operand() {
        let expr = val().len().neq(0_i64);
        assert_eq!(
            expr,
            Expr::Compare {
                left: Operand::Len(Box::new(Operand::Name("Val".into()))),
                op: Operator::Neq,
                right: Operand::Literal(TypedValue::Int(0)),
            }
        );
    }

    #[test]
    fn display_round_shape() {
        let expr = (!val().contains(item())).and(val().len().neq(0_i64));
        assert_eq!(
            expr.to_string(),
            "((NOT (Val contains Item)) AND (len(Val) != 0))"
        );
    }

    #[test]
    fn display_escapes_string_literals() {
        let expr = val().eq("a\"b\\c").or(val().eq("it's"));
        let printed = expr.to_string();
        assert_eq!(printed, r#"((Val == "a\"b\\c") OR (Val == "it's"))"#);
        assert_eq!(crate::parse::parse(&printed).unwrap(), expr);
    }

    #[test]
    fn operator_table() {
        use ItemType::{Array, Bool, Int, String};

        assert!(Operator::Eq.accepts(Bool, Bool));
        assert!(!Operator::Eq.accepts(Int, String));
        assert!(Operator::Gte.accepts(Int, Int));
        assert!(!Operator::Gte.accepts(String, String));
        assert!(Operator::In.accepts(String, Array));
        assert!(!Operator::In.accepts(Array, String));
        assert!(Operator::Contains.accepts(String, String));
        assert!(Operator::Contains.accepts(String, Array));
        assert!(Operator::Contains.accepts(Array, String));
        assert!(Operator::Contains.accepts(Array, Array));
        assert!(!Operator::Contains.accepts(Int, String));
    }

    #[test]
    fn operator_display() {
        assert_eq!(Operator::NotIn.to_string(), "not in");
        assert_eq!(Operator::Lte.to_string(), "<=");
    }
}
