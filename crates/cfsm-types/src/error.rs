use crate::Span;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum number of diagnostics stored before further ones are only counted.
pub const MAX_ERRORS: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// Diagnostic category, derived from the code range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorCategory {
    Syntax,
    Declaration,
    Structure,
    Template,
}

/// Numeric diagnostic code (E100–E499).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ErrorCode(pub u16);

impl ErrorCode {
    // ── Syntax (E100–E199) ──
    pub const UNEXPECTED_TOKEN: Self = Self(100);
    pub const UNTERMINATED_STRING: Self = Self(101);
    pub const INVALID_CHARACTER: Self = Self(102);
    pub const INVALID_IDENTIFIER: Self = Self(103);

    // ── Declaration (E200–E299) ──
    pub const DUPLICATE_STATE: Self = Self(200);
    pub const DUPLICATE_EVENT: Self = Self(201);
    pub const UNKNOWN_STATE: Self = Self(202);
    pub const UNKNOWN_EVENT: Self = Self(203);
    pub const DUPLICATE_TRANSITION: Self = Self(204);
    pub const MIXED_TRANSITIONS: Self = Self(205);
    pub const UNKNOWN_OPTION: Self = Self(206);
    pub const INVALID_OPTION_VALUE: Self = Self(207);
    pub const UNSUPPORTED_HOOK: Self = Self(208);
    pub const DUPLICATE_INITIAL: Self = Self(209);
    pub const UNKNOWN_TRANSITION: Self = Self(210);
    /// Warning only: a state nothing can ever enter.
    pub const UNREACHABLE_STATE: Self = Self(211);
    pub const NAME_CONFLICT: Self = Self(212);
    pub const HOOK_KIND_CONFLICT: Self = Self(213);
    pub const RESERVED_NAME: Self = Self(214);

    // ── Structure (E300–E399) ──
    pub const NO_STATES: Self = Self(300);
    pub const SINGLE_STATE: Self = Self(301);
    pub const NO_INITIAL_STATE: Self = Self(302);

    // ── Template (E400–E499) ──
    pub const TEMPLATE_SYNTAX: Self = Self(400);
    pub const UNRESOLVED_REFERENCE: Self = Self(401);
    pub const NOT_ITERABLE: Self = Self(402);
    pub const NOT_SCALAR: Self = Self(403);

    pub fn category(self) -> ErrorCategory {
        match self.0 {
            100..=199 => ErrorCategory::Syntax,
            200..=299 => ErrorCategory::Declaration,
            300..=399 => ErrorCategory::Structure,
            _ => ErrorCategory::Template,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{}", self.0)
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Syntax => "syntax",
            Self::Declaration => "declaration",
            Self::Structure => "structure",
            Self::Template => "template",
        })
    }
}

/// A located diagnostic about a machine description.
///
/// Serializes flat so tooling can consume `--json` output without parsing
/// free-form text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CfsmError {
    pub file: String,
    pub code: ErrorCode,
    pub severity: Severity,
    pub category: ErrorCategory,
    pub message: String,
    #[serde(flatten)]
    pub span: Span,
    /// The offending source line, verbatim.
    pub source_line: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl CfsmError {
    pub fn new(
        file: impl Into<String>,
        code: ErrorCode,
        message: impl Into<String>,
        span: Span,
        source_line: impl Into<String>,
    ) -> Self {
        Self {
            file: file.into(),
            code,
            severity: Severity::Error,
            category: code.category(),
            message: message.into(),
            span,
            source_line: source_line.into(),
            suggestion: None,
        }
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    pub fn warning(mut self) -> Self {
        self.severity = Severity::Warning;
        self
    }
}

impl fmt::Display for CfsmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}: {} [{}] {}",
            self.file, self.span, self.code, self.category, self.message
        )
    }
}

impl std::error::Error for CfsmError {}

/// Every diagnostic produced while reading one description.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompileErrors {
    pub errors: Vec<CfsmError>,
    pub warnings: Vec<CfsmError>,
    pub total_errors: usize,
    pub total_warnings: usize,
}

impl CompileErrors {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn has_errors(&self) -> bool {
        self.total_errors > 0
    }

    /// True once the stored-error cap is reached and scanning should stop.
    pub fn is_full(&self) -> bool {
        self.total_errors >= MAX_ERRORS
    }

    pub fn push_error(&mut self, error: CfsmError) {
        if self.errors.len() < MAX_ERRORS {
            self.errors.push(error);
        }
        self.total_errors += 1;
    }

    pub fn push_warning(&mut self, warning: CfsmError) {
        self.warnings.push(warning.warning());
        self.total_warnings += 1;
    }

    /// Fold another collection into this one, keeping the cap.
    pub fn extend(&mut self, other: CompileErrors) {
        let overflow = other.total_errors - other.errors.len();
        for e in other.errors {
            self.push_error(e);
        }
        self.total_errors += overflow;
        for w in other.warnings {
            self.push_warning(w);
        }
    }

    /// First stored error, if any.
    pub fn first(&self) -> Option<&CfsmError> {
        self.errors.first()
    }
}

impl fmt::Display for CompileErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for e in &self.errors {
            writeln!(f, "{e}")?;
        }
        if self.total_errors > self.errors.len() {
            writeln!(
                f,
                "... and {} more errors",
                self.total_errors - self.errors.len()
            )?;
        }
        Ok(())
    }
}

impl std::error::Error for CompileErrors {}
