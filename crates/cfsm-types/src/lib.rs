//! Shared types for the CFSM generator.
//!
//! Source spans and structured diagnostics, the description AST, the
//! declaration events consumed by the model builder, the variant store that
//! holds the semantic model, and the run-time status contract.

pub mod ast;
mod decl;
mod error;
mod span;
mod status;
pub mod variant;

pub use decl::{Decl, DeclKind, HookTarget};
pub use error::{
    CfsmError, CompileErrors, ErrorCategory, ErrorCode, Severity, MAX_ERRORS,
};
pub use span::{SourceFile, Span};
pub use status::{CallbackOrder, Status};
pub use variant::{OrderedMap, Variant, VariantError, VariantKind, VariantResult};
