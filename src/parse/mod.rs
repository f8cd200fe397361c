mod error;
mod grammar;

pub use error::ParseError;

use crate::Expr;

/// Parse a rule expression such as `Val in Item` into an [`Expr`].
///
/// Identifiers are kept as written; resolving them to `Val`/`Item` is the
/// compiler's job.
///
/// # Errors
///
/// Returns [`ParseError`] if the input is not valid expression syntax.
pub fn parse(input: &str) -> Result<Expr, ParseError> {
    use winnow::Parser;
    grammar::expression
        .parse(input)
        .map_err(|e| ParseError::new(e.to_string()))
}
