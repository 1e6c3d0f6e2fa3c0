//! CFSM parser: token stream to description AST, and AST to declaration
//! events.
//!
//! Recursive descent with error recovery; see [`Parser`]. [`lower`] turns a
//! parsed [`Description`](cfsm_types::ast::Description) into the ordered
//! [`Decl`](cfsm_types::Decl) stream the model builder consumes.

mod lower;
mod parse_decl;
mod parser;

pub use lower::lower;
pub use parser::{is_c_identifier, ParseResult, Parser};
