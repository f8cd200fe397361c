use winnow::ascii::dec_int;
use winnow::combinator::{alt, cut_err, delimited, opt, preceded, repeat, terminated};
use winnow::error::{ErrMode, ModalResult, ParserError, StrContext, StrContextValue};
use winnow::prelude::*;
use winnow::token::{any, take_while};

use crate::{Expr, Operand, Operator, TypedValue};

// -- Whitespace & words -----------------------------------------------------

fn ws(input: &mut &str) -> ModalResult<()> {
    take_while(0.., char::is_whitespace)
        .void()
        .parse_next(input)
}

fn ident<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    (
        take_while(1.., |c: char| c.is_ascii_alphabetic() || c == '_'),
        take_while(0.., |c: char| c.is_ascii_alphanumeric() || c == '_'),
    )
        .take()
        .parse_next(input)
}

/// Matches a whole word, ignoring ASCII case. `android` is not `and`.
fn keyword<'i>(kw: &'static str) -> impl FnMut(&mut &'i str) -> ModalResult<()> {
    move |input: &mut &'i str| {
        let checkpoint = input.checkpoint();
        let word = ident.parse_next(input)?;
        if word.eq_ignore_ascii_case(kw) {
            Ok(())
        } else {
            input.reset(&checkpoint);
            Err(ErrMode::from_input(input))
        }
    }
}

// -- Operands ---------------------------------------------------------------

fn quoted(input: &mut &str) -> ModalResult<String> {
    let quote = alt(('"', '\'')).parse_next(input)?;
    let mut s = String::new();
    loop {
        let ch = cut_err(any)
            .context(StrContext::Expected(StrContextValue::Description(
                "closing quote",
            )))
            .parse_next(input)?;
        match ch {
            c if c == quote => return Ok(s),
            '\\' => {
                let esc = cut_err(any).parse_next(input)?;
                match esc {
                    '"' => s.push('"'),
                    '\'' => s.push('\''),
                    '\\' => s.push('\\'),
                    'n' => s.push('\n'),
                    't' => s.push('\t'),
                    other => {
                        s.push('\\');
                        s.push(other);
                    }
                }
            }
            c => s.push(c),
        }
    }
}

fn named_operand(input: &mut &str) -> ModalResult<Operand> {
    let name = ident.parse_next(input)?;
    if name.eq_ignore_ascii_case("true") {
        return Ok(Operand::Literal(TypedValue::Bool(true)));
    }
    if name.eq_ignore_ascii_case("false") {
        return Ok(Operand::Literal(TypedValue::Bool(false)));
    }
    if name.eq_ignore_ascii_case("len") {
        let inner = cut_err(delimited((ws, '('), operand, (ws, ')')))
            .context(StrContext::Expected(StrContextValue::Description(
                "len(<operand>)",
            )))
            .parse_next(input)?;
        return Ok(Operand::Len(Box::new(inner)));
    }
    Ok(Operand::Name(name.to_owned()))
}

fn operand(input: &mut &str) -> ModalResult<Operand> {
    ws.parse_next(input)?;
    alt((
        quoted.map(|s| Operand::Literal(TypedValue::String(s))),
        dec_int::<_, i64, _>.map(|n| Operand::Literal(TypedValue::Int(n))),
        named_operand,
    ))
    .context(StrContext::Expected(StrContextValue::Description("operand")))
    .parse_next(input)
}

// -- Operators --------------------------------------------------------------

fn operator(input: &mut &str) -> ModalResult<Operator> {
    ws.parse_next(input)?;
    alt((
        "==".value(Operator::Eq),
        "!=".value(Operator::Neq),
        ">=".value(Operator::Gte),
        "<=".value(Operator::Lte),
        ">".value(Operator::Gt),
        "<".value(Operator::Lt),
        keyword("in").value(Operator::In),
        (keyword("not"), ws, keyword("in")).value(Operator::NotIn),
        keyword("contains").value(Operator::Contains),
    ))
    .context(StrContext::Expected(StrContextValue::Description(
        "comparison operator",
    )))
    .parse_next(input)
}

// -- Expressions (precedence: OR < AND < NOT < primary) ---------------------

fn comparison(input: &mut &str) -> ModalResult<Expr> {
    let left = operand.parse_next(input)?;
    let op = cut_err(operator).parse_next(input)?;
    let right = cut_err(operand).parse_next(input)?;
    Ok(Expr::Compare { left, op, right })
}

fn primary(input: &mut &str) -> ModalResult<Expr> {
    ws.parse_next(input)?;
    alt((
        preceded('(', cut_err(terminated(expr, (ws, ')')))),
        comparison,
    ))
    .context(StrContext::Expected(StrContextValue::Description(
        "expression",
    )))
    .parse_next(input)
}

fn not_expr(input: &mut &str) -> ModalResult<Expr> {
    ws.parse_next(input)?;
    if opt(alt((keyword("not"), '!'.void())))
        .parse_next(input)?
        .is_some()
    {
        let inner = cut_err(not_expr).parse_next(input)?;
        Ok(Expr::Not(Box::new(inner)))
    } else {
        primary(input)
    }
}

fn and_expr(input: &mut &str) -> ModalResult<Expr> {
    let first = not_expr(input)?;
    let rest: Vec<Expr> = repeat(
        0..,
        preceded((ws, alt(("&&".void(), keyword("and")))), cut_err(not_expr)),
    )
    .parse_next(input)?;
    Ok(rest
        .into_iter()
        .fold(first, |acc, r| Expr::And(Box::new(acc), Box::new(r))))
}

fn or_expr(input: &mut &str) -> ModalResult<Expr> {
    let first = and_expr(input)?;
    let rest: Vec<Expr> = repeat(
        0..,
        preceded((ws, alt(("||".void(), keyword("or")))), cut_err(and_expr)),
    )
    .parse_next(input)?;
    Ok(rest
        .into_iter()
        .fold(first, |acc, r| Expr::Or(Box::new(acc), Box::new(r))))
}

fn expr(input: &mut &str) -> ModalResult<Expr> {
    ws.parse_next(input)?;
    or_expr(input)
}

// -- Top-level parser -------------------------------------------------------

pub fn expression(input: &mut &str) -> ModalResult<Expr> {
    let parsed = expr(input)?;
    ws.parse_next(input)?;
    Ok(parsed)
}
