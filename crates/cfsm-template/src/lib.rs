//! CFSM template engine.
//!
//! Renders template text against a read-only [`Variant`] namespace.
//!
//! | construct                               | effect                              |
//! |-----------------------------------------|-------------------------------------|
//! | `{{path}}`                              | substitute a string or integer      |
//! | `{{for v in path}}…{{endfor}}`          | repeat per element                  |
//! | `{{for k, v in path}}…{{endfor}}`       | also bind the key (or index)        |
//! | `{{if c}}…{{elif c}}…{{else}}…{{endif}}`| first truthy branch; `!path` negates |
//! | `{{# comment}}`                         | nothing                             |
//!
//! Paths are `name`, `name.key`, `name[3]` and `name[other.path]`. Inside a
//! loop body, `loop.index`, `loop.first`, `loop.last` and `loop.length`
//! describe the current iteration. Text outside directives is copied
//! byte for byte; `{{-` and `-}}` trim the whitespace of the directive's
//! own line.
//!
//! Rendering has no side effects besides writing to the supplied sink and
//! the same template and namespace always produce the same bytes.
//!
//! ```
//! use cfsm_template::Template;
//! use cfsm_types::{OrderedMap, Variant};
//!
//! let mut states = OrderedMap::new();
//! states.insert("OPEN", Variant::Int(0));
//! states.insert("CLOSED", Variant::Int(1));
//! let mut ns = OrderedMap::new();
//! ns.insert("states", Variant::Map(states));
//!
//! let t = Template::parse("enum", "{{for name, n in states}}{{name}}={{n}};{{endfor}}").unwrap();
//! assert_eq!(t.render_to_string(&Variant::Map(ns)).unwrap(), "OPEN=0;CLOSED=1;");
//! ```

mod error;
mod parser;
mod path;
mod render;
mod syntax;

pub use error::{TemplateError, TemplateResult};
pub use parser::{Cond, Node};
pub use path::{Path, Step};
pub use render::LOOP_VAR;

use std::io::Write;

use cfsm_types::Variant;
use log::debug;

/// A parsed template, reusable across any number of renders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    name: String,
    nodes: Vec<Node>,
}

impl Template {
    /// Parse template text; `name` is used in log output only.
    pub fn parse(name: impl Into<String>, text: &str) -> TemplateResult<Self> {
        let name = name.into();
        let nodes = parser::parse(syntax::scan(text)?)?;
        debug!("parsed template '{name}': {} top-level nodes", nodes.len());
        Ok(Self { name, nodes })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Render against `namespace`, writing to `out`.
    pub fn render<W: Write>(&self, namespace: &Variant, out: W) -> TemplateResult<W> {
        let mut renderer = render::Renderer::new(namespace, out);
        renderer.render(&self.nodes)?;
        renderer.finish()
    }

    pub fn render_to_vec(&self, namespace: &Variant) -> TemplateResult<Vec<u8>> {
        self.render(namespace, Vec::new())
    }

    pub fn render_to_string(&self, namespace: &Variant) -> TemplateResult<String> {
        let bytes = self.render_to_vec(namespace)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

/// Parse and render in one step.
pub fn render_str(text: &str, namespace: &Variant) -> TemplateResult<String> {
    Template::parse("<inline>", text)?.render_to_string(namespace)
}
