#![allow(dead_code)]

use proptest::prelude::*;
use sqlrule::{item, val, Expr, Operand, SyntaxRule, TypedValue, WarnLevel};

// --- Fixed vocabulary ---
// Strings come from a small alphabet so membership tests hit as often as
// they miss.

const WORDS: &[&str] = &["drop_table", "add_column", "innodb", "InnoDB", "grant", ""];

pub fn arb_word() -> impl Strategy<Value = String> {
    prop::sample::select(WORDS).prop_map(str::to_owned)
}

pub fn arb_set() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(arb_word(), 0..5)
}

/// Any `TypedValue`, with strings drawn from the shared vocabulary.
pub fn arb_value() -> impl Strategy<Value = TypedValue> {
    prop_oneof![
        arb_word().prop_map(TypedValue::String),
        arb_set().prop_map(TypedValue::StringSet),
        (-20_i64..=20).prop_map(TypedValue::Int),
        any::<bool>().prop_map(TypedValue::Bool),
    ]
}

/// Literals the grammar can print and read back, quotes and escapes included.
fn arb_literal() -> impl Strategy<Value = Operand> {
    prop_oneof![
        prop::sample::select(
            &[
                "drop_table",
                "add_column",
                "innodb",
                "a\"b",
                "back\\slash",
                "it's",
                "tab\there",
            ][..]
        )
        .prop_map(|s| Operand::from(s)),
        (-20_i64..=20).prop_map(Operand::from),
        any::<bool>().prop_map(Operand::from),
    ]
}

fn arb_operand() -> impl Strategy<Value = Operand> {
    prop_oneof![
        3 => Just(val()),
        3 => Just(item()),
        2 => arb_literal(),
        1 => prop_oneof![Just(val()), Just(item())].prop_map(Operand::len),
    ]
}

/// A single comparison between two operands.
pub fn arb_compare() -> impl Strategy<Value = Expr> {
    (arb_operand(), 0u8..9, arb_operand()).prop_map(|(left, op, right)| match op {
        0 => left.eq(right),
        1 => left.neq(right),
        2 => left.gt(right),
        3 => left.gte(right),
        4 => left.lt(right),
        5 => left.lte(right),
        6 => left.is_in(right),
        7 => left.not_in(right),
        _ => left.contains(right),
    })
}

/// Boolean trees of comparisons, up to a few levels deep.
pub fn arb_expr() -> impl Strategy<Value = Expr> {
    arb_compare().prop_recursive(4, 24, 2, |inner| {
        prop_oneof![
            (inner.clone(), inner.clone()).prop_map(|(a, b)| a.and(b)),
            (inner.clone(), inner.clone()).prop_map(|(a, b)| a.or(b)),
            inner.prop_map(|e| !e),
        ]
    })
}

/// A rule with a well-formed item and a random enabled flag.
pub fn arb_rule() -> impl Strategy<Value = SyntaxRule> {
    (
        prop::sample::select(&["CommandRule", "AlterTableRule", "DmlRule"][..]),
        "[A-Z][a-z]{2,8}",
        arb_compare(),
        arb_value(),
        any::<bool>(),
        any::<bool>(),
    )
        .prop_map(|(group, name, expr, item, blocking, enabled)| {
            let level = if blocking {
                WarnLevel::Blocking
            } else {
                WarnLevel::Advisory
            };
            SyntaxRule::new(group, name, expr.to_string())
                .with_item(&item)
                .with_warn_level(level)
                .with_status(enabled)
        })
}
