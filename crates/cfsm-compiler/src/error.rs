use std::io;
use std::path::PathBuf;

use cfsm_template::TemplateError;
use cfsm_types::{CfsmError, CompileErrors, ErrorCode, Span};
use thiserror::Error;

/// Everything that can stop a generator invocation.
#[derive(Debug, Error)]
pub enum GenerateError {
    /// The description did not produce a namespace.
    #[error("{0}")]
    Description(CompileErrors),

    #[error("template '{name}': {source}")]
    Template {
        name: String,
        /// The template line holding the offending directive.
        source_line: String,
        #[source]
        source: TemplateError,
    },

    #[error("cannot read template '{}': {source}", path.display())]
    TemplateRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot write '{path}': {source}")]
    Write {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("invalid options: {0}")]
    Options(String),
}

impl GenerateError {
    pub(crate) fn template(name: &str, text: &str, source: TemplateError) -> Self {
        let source_line = source
            .span()
            .and_then(|span| text.lines().nth(span.start_line.saturating_sub(1) as usize))
            .unwrap_or_default()
            .to_string();
        Self::Template {
            name: name.to_string(),
            source_line,
            source,
        }
    }

    /// Diagnostic code, for errors that have one.
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            Self::Description(errors) => errors.first().map(|e| e.code),
            Self::Template { source, .. } => Some(source.code()),
            _ => None,
        }
    }

    /// The error as structured diagnostics, for `--json` output.
    pub fn to_diagnostics(&self, file: &str) -> CompileErrors {
        match self {
            Self::Description(errors) => errors.clone(),
            Self::Template {
                name,
                source_line,
                source,
            } => {
                let mut errors = CompileErrors::empty();
                errors.push_error(CfsmError::new(
                    name.as_str(),
                    source.code(),
                    source.to_string(),
                    source.span().unwrap_or_default(),
                    source_line.as_str(),
                ));
                errors
            }
            other => {
                let mut errors = CompileErrors::empty();
                errors.push_error(CfsmError::new(
                    file,
                    ErrorCode::TEMPLATE_SYNTAX,
                    other.to_string(),
                    Span::default(),
                    "",
                ));
                errors
            }
        }
    }
}

pub type GenerateResult<T> = Result<T, GenerateError>;
