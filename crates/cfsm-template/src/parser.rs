//! Directive parsing and block structure.

use cfsm_types::Span;

use crate::error::{TemplateError, TemplateResult};
use crate::path::{is_name_byte, Path};
use crate::syntax::{Segment, Tag};

// ══════════════════════════════════════════════════════════════════════════════
// Node Tree
// ══════════════════════════════════════════════════════════════════════════════

/// `path` or `!path`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cond {
    pub negated: bool,
    pub path: Path,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Text(String),
    Subst {
        path: Path,
        span: Span,
    },
    For {
        key_var: Option<String>,
        value_var: String,
        path: Path,
        body: Vec<Node>,
        span: Span,
    },
    If {
        /// `if` and every `elif`, in order.
        branches: Vec<(Cond, Vec<Node>)>,
        otherwise: Vec<Node>,
    },
}

// ══════════════════════════════════════════════════════════════════════════════
// Directives
// ══════════════════════════════════════════════════════════════════════════════

#[derive(Debug)]
enum Directive {
    Comment,
    Subst(Path),
    For {
        key_var: Option<String>,
        value_var: String,
        path: Path,
    },
    EndFor,
    If(Cond),
    Elif(Cond),
    Else,
    EndIf,
}

fn parse_path(text: &str, span: Span) -> TemplateResult<Path> {
    Path::parse(text).map_err(|reason| TemplateError::InvalidPath {
        path: text.to_string(),
        reason,
        span,
    })
}

fn parse_cond(text: &str, span: Span) -> TemplateResult<Cond> {
    let text = text.trim();
    if text.is_empty() {
        return Err(TemplateError::syntax("missing condition", span));
    }
    match text.strip_prefix('!') {
        Some(rest) => Ok(Cond {
            negated: true,
            path: parse_path(rest.trim_start(), span)?,
        }),
        None => Ok(Cond {
            negated: false,
            path: parse_path(text, span)?,
        }),
    }
}

fn is_variable(name: &str) -> bool {
    !name.is_empty() && name.bytes().all(is_name_byte)
}

/// `v in path` or `k, v in path`
fn parse_for(text: &str, span: Span) -> TemplateResult<Directive> {
    let spaced = text.replace(',', " , ");
    let words: Vec<&str> = spaced.split_whitespace().collect();
    let (key_var, value_var, path) = match words.as_slice() {
        [v, "in", p] => (None, *v, *p),
        [k, ",", v, "in", p] => (Some(*k), *v, *p),
        _ => {
            return Err(TemplateError::syntax(
                format!("malformed for loop 'for {text}', expected 'for [key,] value in path'"),
                span,
            ))
        }
    };
    for var in key_var.iter().chain([&value_var]) {
        if !is_variable(var) {
            return Err(TemplateError::syntax(
                format!("'{var}' is not a valid loop variable"),
                span,
            ));
        }
    }
    Ok(Directive::For {
        key_var: key_var.map(str::to_string),
        value_var: value_var.to_string(),
        path: parse_path(path, span)?,
    })
}

fn directive(tag: &Tag<'_>) -> TemplateResult<Directive> {
    let body = tag.body;
    if body.starts_with('#') {
        return Ok(Directive::Comment);
    }
    if body.is_empty() {
        return Err(TemplateError::syntax("empty directive", tag.span));
    }
    let (word, rest) = match body.find(char::is_whitespace) {
        Some(i) => (&body[..i], body[i..].trim_start()),
        None => (body, ""),
    };
    let bare = |d: Directive| {
        if rest.is_empty() {
            Ok(d)
        } else {
            Err(TemplateError::syntax(
                format!("'{word}' takes no arguments"),
                tag.span,
            ))
        }
    };
    match word {
        "for" => parse_for(rest, tag.span),
        "endfor" => bare(Directive::EndFor),
        "if" => Ok(Directive::If(parse_cond(rest, tag.span)?)),
        "elif" => Ok(Directive::Elif(parse_cond(rest, tag.span)?)),
        "else" => bare(Directive::Else),
        "endif" => bare(Directive::EndIf),
        _ => Ok(Directive::Subst(parse_path(body, tag.span)?)),
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Block Structure
// ══════════════════════════════════════════════════════════════════════════════

/// What closed a block.
enum Terminator {
    Eof,
    EndFor(Span),
    Elif(Cond, Span),
    Else(Span),
    EndIf(Span),
}

impl Terminator {
    fn describe(&self) -> &'static str {
        match self {
            Terminator::Eof => "end of template",
            Terminator::EndFor(_) => "{{endfor}}",
            Terminator::Elif(..) => "{{elif}}",
            Terminator::Else(_) => "{{else}}",
            Terminator::EndIf(_) => "{{endif}}",
        }
    }

    fn span(&self) -> Option<Span> {
        match self {
            Terminator::Eof => None,
            Terminator::EndFor(s)
            | Terminator::Elif(_, s)
            | Terminator::Else(s)
            | Terminator::EndIf(s) => Some(*s),
        }
    }
}

struct TreeBuilder<'t> {
    segments: std::vec::IntoIter<Segment<'t>>,
}

/// Build the node tree of a scanned template.
pub(crate) fn parse(segments: Vec<Segment<'_>>) -> TemplateResult<Vec<Node>> {
    let mut builder = TreeBuilder {
        segments: segments.into_iter(),
    };
    let (nodes, end) = builder.block()?;
    match end {
        Terminator::Eof => Ok(nodes),
        other => Err(TemplateError::syntax(
            format!("{} without a matching opening directive", other.describe()),
            other.span().unwrap_or_default(),
        )),
    }
}

impl TreeBuilder<'_> {
    fn block(&mut self) -> TemplateResult<(Vec<Node>, Terminator)> {
        let mut nodes = Vec::new();
        while let Some(segment) = self.segments.next() {
            let tag = match segment {
                Segment::Text(text) => {
                    nodes.push(Node::Text(text.to_string()));
                    continue;
                }
                Segment::Tag(tag) => tag,
            };
            match directive(&tag)? {
                Directive::Comment => {}
                Directive::Subst(path) => nodes.push(Node::Subst {
                    path,
                    span: tag.span,
                }),
                Directive::For {
                    key_var,
                    value_var,
                    path,
                } => {
                    let (body, end) = self.block()?;
                    if !matches!(end, Terminator::EndFor(_)) {
                        return Err(unclosed("for", "{{endfor}}", &end, tag.span));
                    }
                    nodes.push(Node::For {
                        key_var,
                        value_var,
                        path,
                        body,
                        span: tag.span,
                    });
                }
                Directive::If(cond) => nodes.push(self.if_chain(cond, tag.span)?),
                Directive::EndFor => return Ok((nodes, Terminator::EndFor(tag.span))),
                Directive::Elif(cond) => return Ok((nodes, Terminator::Elif(cond, tag.span))),
                Directive::Else => return Ok((nodes, Terminator::Else(tag.span))),
                Directive::EndIf => return Ok((nodes, Terminator::EndIf(tag.span))),
            }
        }
        Ok((nodes, Terminator::Eof))
    }

    fn if_chain(&mut self, first: Cond, span: Span) -> TemplateResult<Node> {
        let mut branches = Vec::new();
        let mut cond = first;
        loop {
            let (body, end) = self.block()?;
            branches.push((cond, body));
            match end {
                Terminator::Elif(next, _) => cond = next,
                Terminator::Else(_) => {
                    let (otherwise, end) = self.block()?;
                    if !matches!(end, Terminator::EndIf(_)) {
                        return Err(unclosed("else", "{{endif}}", &end, span));
                    }
                    return Ok(Node::If {
                        branches,
                        otherwise,
                    });
                }
                Terminator::EndIf(_) => {
                    return Ok(Node::If {
                        branches,
                        otherwise: Vec::new(),
                    })
                }
                other => return Err(unclosed("if", "{{endif}}", &other, span)),
            }
        }
    }
}

fn unclosed(what: &str, expected: &str, found: &Terminator, open: Span) -> TemplateError {
    TemplateError::syntax(
        format!(
            "'{what}' opened at {open} expects {expected}, found {}",
            found.describe()
        ),
        found.span().unwrap_or(open),
    )
}
