//! CFSM model builder.
//!
//! Consumes the ordered [`Decl`](cfsm_types::Decl) stream produced by the
//! parser, validates it (unique names, declared endpoints, no duplicate
//! edges, a sane machine shape) and produces a frozen [`Namespace`]: the
//! variant-store mapping every template renders against.
//!
//! # Example
//!
//! ```
//! use cfsm_model::ModelBuilder;
//! use cfsm_types::Decl;
//!
//! let mut builder = ModelBuilder::new("door.fsm");
//! for decl in [
//!     Decl::state("CLOSED"),
//!     Decl::state("OPEN"),
//!     Decl::transition("CLOSED", None, "OPEN"),
//!     Decl::initial("CLOSED"),
//! ] {
//!     builder.apply(&decl).unwrap();
//! }
//! let ns = builder.finalize().unwrap();
//! assert_eq!(ns.state_names(), vec!["CLOSED", "OPEN"]);
//! ```

pub mod config;
mod builder;
mod error;
mod namespace;

pub use builder::ModelBuilder;
pub use error::{ModelError, ModelResult};
pub use namespace::Namespace;

/// Apply every declaration and finalize, stopping at the first rejection.
pub fn build(input_path: &str, decls: &[cfsm_types::Decl]) -> ModelResult<Namespace> {
    let mut builder = ModelBuilder::new(input_path);
    for decl in decls {
        builder.apply(decl)?;
    }
    builder.finalize()
}
