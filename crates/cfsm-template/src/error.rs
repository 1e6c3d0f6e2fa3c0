use cfsm_types::{ErrorCode, Span, VariantKind};
use thiserror::Error;

/// Template parse and render failures. Every variant except `Io` carries
/// the location of the offending directive.
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("{span}: {message}")]
    Syntax { message: String, span: Span },

    #[error("{span}: invalid path '{path}': {reason}")]
    InvalidPath {
        path: String,
        reason: String,
        span: Span,
    },

    #[error("{span}: unresolved reference '{path}'")]
    UnresolvedReference { path: String, span: Span },

    #[error("{span}: cannot iterate over '{path}', a {kind}")]
    NotIterable {
        path: String,
        kind: VariantKind,
        span: Span,
    },

    #[error("{span}: cannot substitute '{path}', a {kind}")]
    NotScalar {
        path: String,
        kind: VariantKind,
        span: Span,
    },

    #[error("write failed: {0}")]
    Io(#[from] std::io::Error),
}

impl TemplateError {
    pub(crate) fn syntax(message: impl Into<String>, span: Span) -> Self {
        Self::Syntax {
            message: message.into(),
            span,
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Syntax { .. } | Self::InvalidPath { .. } | Self::Io(_) => {
                ErrorCode::TEMPLATE_SYNTAX
            }
            Self::UnresolvedReference { .. } => ErrorCode::UNRESOLVED_REFERENCE,
            Self::NotIterable { .. } => ErrorCode::NOT_ITERABLE,
            Self::NotScalar { .. } => ErrorCode::NOT_SCALAR,
        }
    }

    /// Location of the directive at fault, if the error has one.
    pub fn span(&self) -> Option<Span> {
        match self {
            Self::Syntax { span, .. }
            | Self::InvalidPath { span, .. }
            | Self::UnresolvedReference { span, .. }
            | Self::NotIterable { span, .. }
            | Self::NotScalar { span, .. } => Some(*span),
            Self::Io(_) => None,
        }
    }
}

pub type TemplateResult<T> = Result<T, TemplateError>;
