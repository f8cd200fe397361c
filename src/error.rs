use thiserror::Error;

use crate::catalog::CatalogError;
use crate::runner::RunnerError;
use crate::{CompileError, DecodeError, EvalError, RuleError};

/// Unified error type for callers that do not need to tell the stages apart.
///
/// Every error in the crate converts into it with `?`.
#[derive(Debug, Error)]
pub enum SqlRuleError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error(transparent)]
    Eval(#[from] EvalError),

    #[error(transparent)]
    Rule(#[from] RuleError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Runner(#[from] RunnerError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[cfg(feature = "binary-cache")]
    #[error(transparent)]
    Serialize(#[from] crate::serial::SerializeError),

    #[cfg(feature = "binary-cache")]
    #[error(transparent)]
    Deserialize(#[from] crate::serial::DeserializeError),
}
