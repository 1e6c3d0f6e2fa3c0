//! Built-in templates and template lookup.

use std::fs;
use std::path::{Path, PathBuf};

use cfsm_template::Template;
use cfsm_types::Variant;
use log::debug;

use crate::error::{GenerateError, GenerateResult};

pub const SOURCE_TEMPLATE: &str = "source.m";
pub const HEADER_TEMPLATE: &str = "header.m";
pub const GRAPHVIZ_TEMPLATE: &str = "graphviz.m";

const BUILTINS: [(&str, &str); 3] = [
    (SOURCE_TEMPLATE, include_str!("../templates/source.m")),
    (HEADER_TEMPLATE, include_str!("../templates/header.m")),
    (GRAPHVIZ_TEMPLATE, include_str!("../templates/graphviz.m")),
];

/// Text of a built-in template.
pub fn builtin(name: &str) -> Option<&'static str> {
    BUILTINS
        .iter()
        .find(|(builtin, _)| *builtin == name)
        .map(|(_, text)| *text)
}

/// A parsed template together with its text, which render errors quote.
#[derive(Debug, Clone)]
pub struct LoadedTemplate {
    pub template: Template,
    text: String,
}

impl LoadedTemplate {
    pub fn name(&self) -> &str {
        self.template.name()
    }

    pub fn render(&self, namespace: &Variant) -> GenerateResult<Vec<u8>> {
        self.template
            .render_to_vec(namespace)
            .map_err(|e| GenerateError::template(self.name(), &self.text, e))
    }
}

/// Where the named output templates come from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TemplateSource {
    /// The copies compiled into this crate.
    #[default]
    Builtin,
    /// `<dir>/source.m` and friends.
    Directory(PathBuf),
}

impl TemplateSource {
    /// Read and parse template `name`.
    pub fn load(&self, name: &str) -> GenerateResult<LoadedTemplate> {
        match self {
            TemplateSource::Builtin => {
                let text = builtin(name).ok_or_else(|| {
                    GenerateError::Options(format!("no built-in template '{name}'"))
                })?;
                parse(name, text)
            }
            TemplateSource::Directory(dir) => load_file(&dir.join(name)),
        }
    }
}

/// Read a template from an explicit path, read fully before parsing.
pub fn load_file(path: &Path) -> GenerateResult<LoadedTemplate> {
    let text = fs::read_to_string(path).map_err(|source| GenerateError::TemplateRead {
        path: path.to_path_buf(),
        source,
    })?;
    debug!("read template {} ({} bytes)", path.display(), text.len());
    parse(&path.display().to_string(), text)
}

fn parse(name: &str, text: impl Into<String>) -> GenerateResult<LoadedTemplate> {
    let text = text.into();
    match Template::parse(name, &text) {
        Ok(template) => Ok(LoadedTemplate { template, text }),
        Err(e) => Err(GenerateError::template(name, &text, e)),
    }
}
