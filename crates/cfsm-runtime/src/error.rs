use cfsm_types::VariantError;
use thiserror::Error;

/// Failure to load a machine from a namespace.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuntimeError {
    #[error("malformed namespace: {0}")]
    MalformedNamespace(String),

    #[error("malformed namespace: {0}")]
    Variant(#[from] VariantError),
}

pub type RuntimeResult<T> = Result<T, RuntimeError>;
