//! CFSM generator: orchestrates the full pipeline.
//!
//! ```text
//! description → Lexer → Parser → lower → ModelBuilder → Namespace → Template → artifacts
//! ```
//!
//! Every stage before rendering reports through [`CompileErrors`]; rendering
//! happens only once a namespace has been finalized, and every artifact is
//! rendered into memory before anything is written.

pub mod artifact;
mod error;
pub mod templates;

use std::path::{Path, PathBuf};

use cfsm_lexer::Lexer;
use cfsm_model::{ModelBuilder, ModelError, Namespace};
use cfsm_parser::{lower, Parser};
use cfsm_types::{CfsmError, CompileErrors, Decl, DeclKind, ErrorCode, SourceFile, Span};
use log::{debug, info};
use serde::{Deserialize, Serialize};

pub use artifact::{write_all, Artifact, ArtifactSummary, OutputKind, STDOUT};
pub use error::{GenerateError, GenerateResult};
pub use templates::{LoadedTemplate, TemplateSource};

// ══════════════════════════════════════════════════════════════════════════════
// Options
// ══════════════════════════════════════════════════════════════════════════════

/// Which artifacts one invocation produces.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Outputs {
    #[default]
    Source,
    SourceAndHeader,
    Header,
    Graphviz,
    /// Render a caller-supplied template; needs an explicit output path.
    Manual(PathBuf),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerateOptions {
    pub outputs: Outputs,
    /// Output path, [`STDOUT`] for standard output, `None` for the defaults.
    pub output: Option<String>,
    pub templates: TemplateSource,
}

impl GenerateOptions {
    pub fn new(outputs: Outputs) -> Self {
        Self {
            outputs,
            ..Self::default()
        }
    }

    pub fn with_output(mut self, path: impl Into<String>) -> Self {
        self.output = Some(path.into());
        self
    }

    pub fn with_template_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.templates = TemplateSource::Directory(dir.into());
        self
    }

    fn writes_source(&self) -> bool {
        matches!(self.outputs, Outputs::Source | Outputs::SourceAndHeader)
    }

    /// Header path derived from a `foo.c` source output: `foo.h`.
    pub fn synthesized_header(&self) -> Option<String> {
        let out = self.output.as_deref()?;
        let stem = out.strip_suffix(".c")?;
        self.writes_source().then(|| format!("{stem}.h"))
    }

    /// Declarations applied ahead of the description: the synthesized
    /// header name and its include guard. Description options still win.
    pub fn default_decls(&self) -> Vec<Decl> {
        let Some(header) = self.synthesized_header() else {
            return Vec::new();
        };
        let name = Path::new(&header)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(&header)
            .to_string();
        vec![
            Decl::config("header_guard", header_guard_for(&name)),
            Decl::config("header_name", name),
        ]
    }

    /// Resolve every artifact to its destination, rejecting combinations
    /// that cannot be written.
    pub fn plan(&self) -> GenerateResult<Vec<(OutputKind, String)>> {
        let out = self.output.as_deref();
        let or_default = |kind: OutputKind| {
            out.or(kind.default_path())
                .unwrap_or_default()
                .to_string()
        };
        let plan = match &self.outputs {
            Outputs::Source => vec![(OutputKind::Source, or_default(OutputKind::Source))],
            Outputs::Header => vec![(OutputKind::Header, or_default(OutputKind::Header))],
            Outputs::Graphviz => vec![(OutputKind::Graphviz, or_default(OutputKind::Graphviz))],
            Outputs::SourceAndHeader => {
                let header = match (out, self.synthesized_header()) {
                    (Some(STDOUT), _) => {
                        return Err(GenerateError::Options(
                            "cannot write both C source and header to stdout".to_string(),
                        ))
                    }
                    (_, Some(header)) => header,
                    (None, None) => artifact::DEFAULT_OUT_HEADER.to_string(),
                    (Some(path), None) => {
                        return Err(GenerateError::Options(format!(
                            "C source and header would both be written to '{path}'; \
                             use a path ending in .c"
                        )))
                    }
                };
                vec![
                    (OutputKind::Source, or_default(OutputKind::Source)),
                    (OutputKind::Header, header),
                ]
            }
            Outputs::Manual(template) => {
                let Some(path) = out else {
                    return Err(GenerateError::Options(format!(
                        "an output path is required to render '{}'",
                        template.display()
                    )));
                };
                vec![(OutputKind::Manual, path.to_string())]
            }
        };
        Ok(plan)
    }

    fn load(&self, kind: OutputKind) -> GenerateResult<LoadedTemplate> {
        match (&self.outputs, kind.template_name()) {
            (Outputs::Manual(path), None) => templates::load_file(path),
            (_, Some(name)) => self.templates.load(name),
            (_, None) => Err(GenerateError::Options(
                "manual output without a template".to_string(),
            )),
        }
    }
}

/// `_FOO_H` for `foo.h`.
pub fn header_guard_for(header_name: &str) -> String {
    let mut guard = String::from("_");
    guard.extend(header_name.chars().map(|c| {
        if c.is_ascii_alphanumeric() {
            c.to_ascii_uppercase()
        } else {
            '_'
        }
    }));
    guard
}

// ══════════════════════════════════════════════════════════════════════════════
// Description → Namespace
// ══════════════════════════════════════════════════════════════════════════════

struct Analysis {
    namespace: Option<Namespace>,
    diagnostics: CompileErrors,
}

fn model_diagnostic(file: &SourceFile, span: Span, err: &ModelError) -> CfsmError {
    let line = file.line(span.start_line).unwrap_or_default();
    let diagnostic = CfsmError::new(&file.name, err.code(), err.to_string(), span, line);
    match err.suggestion() {
        Some(hint) => diagnostic.with_suggestion(hint),
        None => diagnostic,
    }
}

fn analyze(source: &str, filename: &str, defaults: &[Decl]) -> Analysis {
    let source_file = SourceFile::new(filename, source);
    let failed = |diagnostics| Analysis {
        namespace: None,
        diagnostics,
    };

    // 1. Lex
    let lexed = Lexer::new(&source_file).lex();
    let mut diagnostics = lexed.errors;

    // 2. Parse
    let parsed = Parser::new(lexed.tokens, &source_file).parse();
    diagnostics.extend(parsed.errors);
    let description = match parsed.description {
        Some(d) if !diagnostics.has_errors() => d,
        _ => return failed(diagnostics),
    };

    // 3. Lower and build
    let decls = lower(&description);
    debug!("{filename}: {} declarations", decls.len());
    let mut builder = ModelBuilder::new(filename);
    for decl in defaults.iter().chain(&decls) {
        if let Err(e) = builder.apply(decl) {
            diagnostics.push_error(model_diagnostic(&source_file, decl.span, &e));
            if diagnostics.is_full() {
                break;
            }
        }
    }
    if diagnostics.has_errors() {
        return failed(diagnostics);
    }

    for state in builder.unreachable_states() {
        let span = decls
            .iter()
            .find(|d| matches!(&d.kind, DeclKind::DeclareState { name } if *name == state))
            .map_or_else(Span::default, |d| d.span);
        diagnostics.push_warning(CfsmError::new(
            filename,
            ErrorCode::UNREACHABLE_STATE,
            format!("state '{state}' is unreachable"),
            span,
            source_file.line(span.start_line).unwrap_or_default(),
        ));
    }

    // 4. Finalize
    match builder.finalize() {
        Ok(namespace) => Analysis {
            namespace: Some(namespace),
            diagnostics,
        },
        Err(e) => {
            diagnostics.push_error(model_diagnostic(&source_file, source_file.end_span(), &e));
            failed(diagnostics)
        }
    }
}

/// Description text to a finalized namespace.
pub fn build_namespace(source: &str, filename: &str) -> Result<Namespace, CompileErrors> {
    build_namespace_for(source, filename, &GenerateOptions::default())
}

/// Like [`build_namespace`], with the defaults `options` contribute.
pub fn build_namespace_for(
    source: &str,
    filename: &str,
    options: &GenerateOptions,
) -> Result<Namespace, CompileErrors> {
    let analysis = analyze(source, filename, &options.default_decls());
    analysis.namespace.ok_or(analysis.diagnostics)
}

/// Diagnostics only, without rendering anything.
pub fn check(source: &str, filename: &str) -> CompileErrors {
    analyze(source, filename, &[]).diagnostics
}

// ══════════════════════════════════════════════════════════════════════════════
// Rendering
// ══════════════════════════════════════════════════════════════════════════════

/// A successful run: the artifacts plus any warnings.
#[derive(Debug, Clone)]
pub struct Generated {
    pub namespace: Namespace,
    pub artifacts: Vec<Artifact>,
    pub diagnostics: CompileErrors,
}

/// Render every planned artifact against a finalized namespace.
pub fn render(namespace: &Namespace, options: &GenerateOptions) -> GenerateResult<Vec<Artifact>> {
    let mut artifacts = Vec::new();
    for (kind, path) in options.plan()? {
        let template = options.load(kind)?;
        let bytes = template.render(namespace.root())?;
        let artifact = Artifact::new(kind, path, bytes);
        info!(
            "rendered {kind} for \"{}\": {} bytes, sha256 {}",
            artifact.path,
            artifact.bytes.len(),
            artifact.sha256
        );
        artifacts.push(artifact);
    }
    Ok(artifacts)
}

/// Run the whole pipeline. Nothing is written; see [`Artifact::write`].
pub fn generate(
    source: &str,
    filename: &str,
    options: &GenerateOptions,
) -> GenerateResult<Generated> {
    options.plan()?;
    let analysis = analyze(source, filename, &options.default_decls());
    let Some(namespace) = analysis.namespace else {
        return Err(GenerateError::Description(analysis.diagnostics));
    };
    info!(
        "{filename}: {} states, {} events",
        namespace.state_names().len(),
        namespace.event_names().len()
    );
    let artifacts = render(&namespace, options)?;
    Ok(Generated {
        namespace,
        artifacts,
        diagnostics: analysis.diagnostics,
    })
}

// ══════════════════════════════════════════════════════════════════════════════
// Machine-readable result
// ══════════════════════════════════════════════════════════════════════════════

/// Serializable outcome of a generator run, for `--json` and tooling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompileResult {
    pub success: bool,
    pub artifacts: Vec<ArtifactSummary>,
    pub errors: CompileErrors,
}

impl CompileResult {
    pub fn from_generated(generated: &Generated) -> Self {
        Self {
            success: true,
            artifacts: generated.artifacts.iter().map(Artifact::summary).collect(),
            errors: generated.diagnostics.clone(),
        }
    }

    pub fn from_error(error: &GenerateError, filename: &str) -> Self {
        Self {
            success: false,
            artifacts: Vec::new(),
            errors: error.to_diagnostics(filename),
        }
    }
}

/// Run the pipeline and report the outcome as a [`CompileResult`].
pub fn compile_to_result(source: &str, filename: &str, options: &GenerateOptions) -> CompileResult {
    match generate(source, filename, options) {
        Ok(generated) => CompileResult::from_generated(&generated),
        Err(e) => CompileResult::from_error(&e, filename),
    }
}
