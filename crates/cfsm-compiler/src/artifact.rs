//! Rendered outputs and how they reach disk.

use std::fmt;
use std::fs;
use std::io::{self, Write};

use log::debug;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{GenerateError, GenerateResult};
use crate::templates;

/// Output path meaning standard output.
pub const STDOUT: &str = "-";

pub const DEFAULT_OUT_SOURCE: &str = "fsm.c";
pub const DEFAULT_OUT_HEADER: &str = "fsm.h";
pub const DEFAULT_OUT_GRAPHVIZ: &str = "fsm.dot";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputKind {
    Source,
    Header,
    Graphviz,
    /// A caller-supplied template.
    Manual,
}

impl OutputKind {
    /// Built-in template name; `None` for manual output.
    pub fn template_name(self) -> Option<&'static str> {
        match self {
            OutputKind::Source => Some(templates::SOURCE_TEMPLATE),
            OutputKind::Header => Some(templates::HEADER_TEMPLATE),
            OutputKind::Graphviz => Some(templates::GRAPHVIZ_TEMPLATE),
            OutputKind::Manual => None,
        }
    }

    pub fn default_path(self) -> Option<&'static str> {
        match self {
            OutputKind::Source => Some(DEFAULT_OUT_SOURCE),
            OutputKind::Header => Some(DEFAULT_OUT_HEADER),
            OutputKind::Graphviz => Some(DEFAULT_OUT_GRAPHVIZ),
            OutputKind::Manual => None,
        }
    }

    fn describe(self) -> &'static str {
        match self {
            OutputKind::Source => "C source",
            OutputKind::Header => "C header",
            OutputKind::Graphviz => "Graphviz dot",
            OutputKind::Manual => "template output",
        }
    }
}

impl fmt::Display for OutputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

/// One fully rendered output, not yet written anywhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub kind: OutputKind,
    /// Destination path; [`STDOUT`] for standard output.
    pub path: String,
    pub bytes: Vec<u8>,
    /// Lowercase hex SHA-256 of `bytes`.
    pub sha256: String,
}

impl Artifact {
    pub fn new(kind: OutputKind, path: impl Into<String>, bytes: Vec<u8>) -> Self {
        let sha256 = digest_hex(&bytes);
        Self {
            kind,
            path: path.into(),
            bytes,
            sha256,
        }
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }

    pub fn is_stdout(&self) -> bool {
        self.path == STDOUT
    }

    /// Write this artifact on its own; see [`write_all`].
    pub fn write(&self) -> GenerateResult<()> {
        write_all(std::slice::from_ref(self))
    }

    /// Sibling of the destination that holds the bytes until they are
    /// renamed into place.
    fn staging_path(&self) -> String {
        format!("{}.cfsm-tmp", self.path)
    }

    fn write_error(&self, source: io::Error) -> GenerateError {
        GenerateError::Write {
            path: self.path.clone(),
            source,
        }
    }
    pub fn summary(&self) -> ArtifactSummary {
        ArtifactSummary {
            kind: self.kind,
            path: self.path.clone(),
            size: self.bytes.len(),
            sha256: self.sha256.clone(),
        }
    }
}

/// Write every artifact, or none of the files.
///
/// Files are written and synced next to their destinations first, then
/// renamed into place once all of them succeeded. Standard output comes
/// last. On failure every staging file is removed.
pub fn write_all(artifacts: &[Artifact]) -> GenerateResult<()> {
    let files: Vec<&Artifact> = artifacts.iter().filter(|a| !a.is_stdout()).collect();

    let mut staged = Vec::with_capacity(files.len());
    for artifact in &files {
        let tmp = artifact.staging_path();
        debug!("staging {} in {tmp}", artifact.kind);
        if let Err(source) = stage(&tmp, &artifact.bytes) {
            let _ = fs::remove_file(&tmp);
            discard(&staged);
            return Err(artifact.write_error(source));
        }
        staged.push(tmp);
    }

    for (i, (artifact, tmp)) in files.iter().zip(&staged).enumerate() {
        if let Err(source) = fs::rename(tmp, &artifact.path) {
            discard(&staged[i..]);
            return Err(artifact.write_error(source));
        }
    }

    for artifact in artifacts.iter().filter(|a| a.is_stdout()) {
        let mut out = io::stdout().lock();
        out.write_all(&artifact.bytes)
            .and_then(|()| out.flush())
            .map_err(|source| artifact.write_error(source))?;
    }
    Ok(())
}

fn stage(path: &str, bytes: &[u8]) -> io::Result<()> {
    let mut file = fs::File::create(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}

fn discard(paths: &[String]) {
    for path in paths {
        let _ = fs::remove_file(path);
    }
}

/// What `--json` reports about an artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactSummary {
    pub kind: OutputKind,
    pub path: String,
    pub size: usize,
    pub sha256: String,
}

pub fn digest_hex(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_of_empty_input() {
        assert_eq!(
            digest_hex(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn artifact_carries_digest_and_summary() {
        let a = Artifact::new(OutputKind::Graphviz, "fsm.dot", b"digraph {}\n".to_vec());
        assert_eq!(a.sha256, digest_hex(b"digraph {}\n"));
        let s = a.summary();
        assert_eq!(s.size, 11);
        assert_eq!(s.kind, OutputKind::Graphviz);
        assert!(!a.is_stdout());
    }

    fn scratch(name: &str) -> String {
        let dir = std::env::temp_dir().join(format!("cfsm-artifact-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        dir.join(name).to_string_lossy().into_owned()
    }

    #[test]
    fn write_failure_leaves_no_file() {
        let a = Artifact::new(OutputKind::Source, "/nonexistent/dir/fsm.c", b"x".to_vec());
        match a.write() {
            Err(GenerateError::Write { path, .. }) => assert_eq!(path, "/nonexistent/dir/fsm.c"),
            other => panic!("expected a write error, got {other:?}"),
        }
        assert!(!std::path::Path::new("/nonexistent/dir/fsm.c").exists());
    }

    #[test]
    fn write_all_lands_every_file() {
        let source = scratch("ok.c");
        let header = scratch("ok.h");
        let artifacts = [
            Artifact::new(OutputKind::Source, source.as_str(), b"int x;\n".to_vec()),
            Artifact::new(OutputKind::Header, header.as_str(), b"extern int x;\n".to_vec()),
        ];
        write_all(&artifacts).unwrap();
        assert_eq!(fs::read(&source).unwrap(), b"int x;\n");
        assert_eq!(fs::read(&header).unwrap(), b"extern int x;\n");
        assert!(!std::path::Path::new(&artifacts[0].staging_path()).exists());
    }

    #[test]
    fn failed_header_write_keeps_source_off_disk() {
        let source = scratch("partial.c");
        let _ = fs::remove_file(&source);
        let artifacts = [
            Artifact::new(OutputKind::Source, source.as_str(), b"int x;\n".to_vec()),
            Artifact::new(OutputKind::Header, "/nonexistent/dir/partial.h", b"".to_vec()),
        ];
        match write_all(&artifacts) {
            Err(GenerateError::Write { path, .. }) => assert_eq!(path, "/nonexistent/dir/partial.h"),
            other => panic!("expected a write error, got {other:?}"),
        }
        assert!(!std::path::Path::new(&source).exists());
        assert!(!std::path::Path::new(&artifacts[0].staging_path()).exists());
    }

    #[test]
    fn kinds_name_their_templates() {
        assert_eq!(OutputKind::Header.template_name(), Some("header.m"));
        assert_eq!(OutputKind::Manual.template_name(), None);
        assert_eq!(OutputKind::Graphviz.default_path(), Some("fsm.dot"));
        assert_eq!(OutputKind::Source.to_string(), "C source");
    }
}
