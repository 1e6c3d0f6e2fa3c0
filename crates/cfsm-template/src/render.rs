//! Tree-walking renderer.
//!
//! Names resolve against a stack of loop scopes, innermost first, and then
//! against the namespace root. Values borrowed from the namespace stay
//! borrowed; only loop keys and the `loop` mapping are built per iteration.

use std::borrow::Cow;
use std::io::Write;

use cfsm_types::{OrderedMap, Span, Variant};
use log::trace;

use crate::error::{TemplateError, TemplateResult};
use crate::parser::{Cond, Node};
use crate::path::{Path, Step};

/// Name of the per-iteration metadata mapping.
pub const LOOP_VAR: &str = "loop";

type Entries<'a> = Vec<(Variant, Cow<'a, Variant>)>;

pub(crate) struct Renderer<'a, W> {
    root: &'a Variant,
    scopes: Vec<(String, Cow<'a, Variant>)>,
    out: W,
}

impl<'a, W: Write> Renderer<'a, W> {
    pub(crate) fn new(root: &'a Variant, out: W) -> Self {
        Self {
            root,
            scopes: Vec::new(),
            out,
        }
    }

    pub(crate) fn render(&mut self, nodes: &[Node]) -> TemplateResult<()> {
        for node in nodes {
            match node {
                Node::Text(text) => self.out.write_all(text.as_bytes())?,
                Node::Subst { path, span } => self.substitute(path, *span)?,
                Node::For {
                    key_var,
                    value_var,
                    path,
                    body,
                    span,
                } => self.iterate(key_var.as_deref(), value_var, path, body, *span)?,
                Node::If {
                    branches,
                    otherwise,
                } => {
                    let taken = branches
                        .iter()
                        .find(|(cond, _)| self.test(cond))
                        .map(|(_, body)| body)
                        .unwrap_or(otherwise);
                    self.render(taken)?;
                }
            }
        }
        Ok(())
    }

    pub(crate) fn finish(mut self) -> TemplateResult<W> {
        self.out.flush()?;
        Ok(self.out)
    }

    // ── Directives ────────────────────────────────────────────────────────────

    fn substitute(&mut self, path: &Path, span: Span) -> TemplateResult<()> {
        let value = self.require(path, span)?;
        match value.as_ref() {
            Variant::Str(s) => self.out.write_all(s.as_bytes())?,
            Variant::Int(n) => write!(self.out, "{n}")?,
            other => {
                return Err(TemplateError::NotScalar {
                    path: path.to_string(),
                    kind: other.kind(),
                    span,
                })
            }
        }
        Ok(())
    }

    fn iterate(
        &mut self,
        key_var: Option<&str>,
        value_var: &str,
        path: &Path,
        body: &[Node],
        span: Span,
    ) -> TemplateResult<()> {
        let container = self.require(path, span)?;
        let kind = container.kind();
        let Some(entries) = entries(container) else {
            return Err(TemplateError::NotIterable {
                path: path.to_string(),
                kind,
                span,
            });
        };
        trace!("for {path}: {} iterations", entries.len());

        let length = entries.len();
        let depth = self.scopes.len();
        for (index, (key, value)) in entries.into_iter().enumerate() {
            self.scopes
                .push((LOOP_VAR.to_string(), Cow::Owned(loop_meta(index, length))));
            if let Some(key_var) = key_var {
                self.scopes.push((key_var.to_string(), Cow::Owned(key)));
            }
            self.scopes.push((value_var.to_string(), value));
            let result = self.render(body);
            self.scopes.truncate(depth);
            result?;
        }
        Ok(())
    }

    fn test(&self, cond: &Cond) -> bool {
        let truthy = self.resolve(&cond.path).is_some_and(|v| v.is_truthy());
        truthy != cond.negated
    }

    // ── Resolution ────────────────────────────────────────────────────────────

    fn require(&self, path: &Path, span: Span) -> TemplateResult<Cow<'a, Variant>> {
        self.resolve(path)
            .ok_or_else(|| TemplateError::UnresolvedReference {
                path: path.to_string(),
                span,
            })
    }

    /// The value at `path`, or `None` if any step is missing.
    fn resolve(&self, path: &Path) -> Option<Cow<'a, Variant>> {
        let mut current = self.lookup_root(&path.root)?;
        for step in &path.steps {
            current = match step {
                Step::Key(key) => child(current, |v| v.get(key).ok())?,
                Step::Index(i) => child(current, |v| positional(v, *i))?,
                Step::Lookup(inner) => {
                    let selector = self.resolve(inner)?;
                    match selector.as_ref() {
                        Variant::Str(key) => child(current, |v| v.get(key).ok())?,
                        Variant::Int(n) => {
                            let i = usize::try_from(*n).ok()?;
                            child(current, |v| positional(v, i))?
                        }
                        _ => return None,
                    }
                }
            };
        }
        Some(current)
    }

    fn lookup_root(&self, name: &str) -> Option<Cow<'a, Variant>> {
        if let Some((_, value)) = self.scopes.iter().rev().find(|(n, _)| n == name) {
            return Some(match value {
                Cow::Borrowed(v) => Cow::Borrowed(*v),
                Cow::Owned(v) => Cow::Owned(v.clone()),
            });
        }
        self.root.get(name).ok().map(Cow::Borrowed)
    }
}

/// Step into `parent`, keeping borrowed values borrowed.
fn child<'a>(
    parent: Cow<'a, Variant>,
    select: impl for<'v> Fn(&'v Variant) -> Option<&'v Variant>,
) -> Option<Cow<'a, Variant>> {
    match parent {
        Cow::Borrowed(v) => select(v).map(Cow::Borrowed),
        Cow::Owned(v) => select(&v).cloned().map(Cow::Owned),
    }
}

/// Element `i` of a sequence, or the value of the `i`-th mapping entry.
fn positional(v: &Variant, i: usize) -> Option<&Variant> {
    match v {
        Variant::Seq(items) => items.get(i),
        Variant::Map(map) => map.entry_at(i).map(|(_, value)| value),
        _ => None,
    }
}

/// (key, value) pairs of a container; sequence keys are indices.
fn entries(container: Cow<'_, Variant>) -> Option<Entries<'_>> {
    match container {
        Cow::Borrowed(v) => borrowed_entries(v),
        Cow::Owned(v) => borrowed_entries(&v).map(|es| {
            es.into_iter()
                .map(|(k, value)| (k, Cow::Owned(value.into_owned())))
                .collect()
        }),
    }
}

fn borrowed_entries(v: &Variant) -> Option<Entries<'_>> {
    match v {
        Variant::Seq(items) => Some(
            items
                .iter()
                .enumerate()
                .map(|(i, item)| (Variant::Int(i as i64), Cow::Borrowed(item)))
                .collect(),
        ),
        Variant::Map(map) => Some(
            map.iter()
                .map(|(k, item)| (Variant::from(k), Cow::Borrowed(item)))
                .collect(),
        ),
        _ => None,
    }
}

fn loop_meta(index: usize, length: usize) -> Variant {
    let mut meta = OrderedMap::new();
    meta.insert("index", Variant::Int(index as i64));
    meta.insert("first", Variant::from(index == 0));
    meta.insert("last", Variant::from(index + 1 == length));
    meta.insert("length", Variant::Int(length as i64));
    Variant::Map(meta)
}
