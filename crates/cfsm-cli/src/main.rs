//! `cfsm`: generate C state machines and Graphviz diagrams from a
//! declarative description.
//!
//! ```text
//! cfsm door.fsm                 # fsm.c
//! cfsm -d -o door.c door.fsm    # door.c and door.h
//! cfsm -g door.fsm              # fsm.dot
//! cfsm -m api.m -o api.txt door.fsm
//! ```

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

use anyhow::{anyhow, bail, Context};
use clap::{ArgAction, Parser};
use log::{debug, info, LevelFilter};

use cfsm_compiler::{
    build_namespace_for, generate, write_all, Artifact, CompileResult, GenerateOptions, Outputs,
    STDOUT,
};

#[derive(Parser, Debug)]
#[command(name = "cfsm", version, about)]
struct Opts {
    /// Description file; `-` reads standard input.
    input: String,

    /// Generate a C header in addition to the source file.
    #[arg(short = 'd', conflicts_with_all = ["graphviz", "manual"])]
    with_header: bool,

    /// Only generate the C header.
    #[arg(short = 'D', conflicts_with_all = ["graphviz", "manual"])]
    header_only: bool,

    /// Generate a Graphviz dot file instead of C.
    #[arg(short = 'g', conflicts_with = "manual")]
    graphviz: bool,

    /// Render a user-supplied template ("manual" mode); requires -o.
    #[arg(short = 'm', value_name = "TEMPLATE", requires = "output")]
    manual: Option<PathBuf>,

    /// Output file (default: fsm.[c|h|dot]); `-` writes to standard output.
    #[arg(short = 'o', value_name = "PATH")]
    output: Option<String>,

    /// Directory holding source.m, header.m and graphviz.m (default: built-in).
    #[arg(short = 't', value_name = "DIR")]
    template_dir: Option<PathBuf>,

    /// Print the finalized namespace as JSON instead of generating.
    #[arg(long)]
    dump_namespace: bool,

    /// Report the outcome as JSON on standard output.
    #[arg(long)]
    json: bool,

    /// More log output (-v info, -vv debug).
    #[arg(short = 'v', action = ArgAction::Count)]
    verbose: u8,
}

impl Opts {
    fn outputs(&self) -> Outputs {
        if let Some(template) = &self.manual {
            Outputs::Manual(template.clone())
        } else if self.graphviz {
            Outputs::Graphviz
        } else if self.header_only {
            Outputs::Header
        } else if self.with_header {
            Outputs::SourceAndHeader
        } else {
            Outputs::Source
        }
    }

    fn generate_options(&self) -> GenerateOptions {
        let mut options = GenerateOptions::new(self.outputs());
        if let Some(out) = &self.output {
            options = options.with_output(out.as_str());
        }
        if let Some(dir) = &self.template_dir {
            options = options.with_template_dir(dir.as_path());
        }
        options
    }

    fn log_level(&self) -> LevelFilter {
        match self.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }
}

/// Description text and the name diagnostics should use for it.
fn read_input(input: &str) -> anyhow::Result<(String, String)> {
    if input == STDOUT {
        let mut source = String::new();
        io::stdin()
            .read_to_string(&mut source)
            .context("cannot read description from standard input")?;
        return Ok((source, "(stdin)".to_string()));
    }
    let source = fs::read_to_string(input)
        .with_context(|| format!("could not open \"{input}\" for reading"))?;
    Ok((source, input.to_string()))
}

fn write_artifacts(artifacts: &[Artifact]) -> anyhow::Result<()> {
    for artifact in artifacts {
        let dest = if artifact.is_stdout() {
            "(stdout)"
        } else {
            artifact.path.as_str()
        };
        info!("Writing {} to \"{dest}\"", artifact.kind);
        debug!("{dest}: sha256 {}", artifact.sha256);
    }
    write_all(artifacts).context("no output was written")
}

fn print_json(result: &CompileResult) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(result)?);
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let opts = Opts::parse();
    env_logger::Builder::new()
        .filter_level(opts.log_level())
        .parse_default_env()
        .init();

    let (source, filename) = read_input(&opts.input)?;
    let options = opts.generate_options();

    if opts.dump_namespace {
        let namespace = build_namespace_for(&source, &filename, &options)
            .map_err(|errors| anyhow!("{errors}"))
            .with_context(|| format!("input file \"{filename}\" had errors"))?;
        println!("{}", serde_json::to_string_pretty(&namespace)?);
        return Ok(());
    }

    if opts.json && opts.output.as_deref() == Some(STDOUT) {
        bail!("--json cannot share standard output with generated code");
    }

    match generate(&source, &filename, &options) {
        Ok(generated) => {
            write_artifacts(&generated.artifacts)?;
            if opts.json {
                print_json(&CompileResult::from_generated(&generated))?;
            }
            Ok(())
        }
        Err(e) if opts.json => {
            print_json(&CompileResult::from_error(&e, &filename))?;
            std::process::exit(1);
        }
        Err(e) => Err(e).with_context(|| format!("input file \"{filename}\" had errors")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts(args: &[&str]) -> Result<Opts, clap::Error> {
        Opts::try_parse_from(std::iter::once("cfsm").chain(args.iter().copied()))
    }

    #[test]
    fn default_is_source_only() {
        let o = opts(&["door.fsm"]).unwrap();
        assert_eq!(o.outputs(), Outputs::Source);
        assert_eq!(o.log_level(), LevelFilter::Warn);
    }

    #[test]
    fn flags_select_outputs() {
        assert_eq!(opts(&["-d", "x"]).unwrap().outputs(), Outputs::SourceAndHeader);
        assert_eq!(opts(&["-D", "x"]).unwrap().outputs(), Outputs::Header);
        assert_eq!(opts(&["-g", "x"]).unwrap().outputs(), Outputs::Graphviz);
        assert_eq!(
            opts(&["-m", "t.m", "-o", "out", "x"]).unwrap().outputs(),
            Outputs::Manual(PathBuf::from("t.m"))
        );
    }

    #[test]
    fn only_one_mode_at_a_time() {
        assert!(opts(&["-D", "-g", "x"]).is_err());
        assert!(opts(&["-g", "-m", "t.m", "-o", "o", "x"]).is_err());
        assert!(opts(&["-d", "-g", "x"]).is_err());
    }

    #[test]
    fn manual_mode_requires_output() {
        assert!(opts(&["-m", "t.m", "x"]).is_err());
    }

    #[test]
    fn verbosity_raises_log_level() {
        assert_eq!(opts(&["-v", "x"]).unwrap().log_level(), LevelFilter::Info);
        assert_eq!(opts(&["-vv", "x"]).unwrap().log_level(), LevelFilter::Debug);
    }

    #[test]
    fn options_carry_output_and_templates() {
        let o = opts(&["-d", "-o", "door.c", "-t", "tmpl", "x"]).unwrap();
        let options = o.generate_options();
        assert_eq!(options.output.as_deref(), Some("door.c"));
        assert_eq!(options.synthesized_header().as_deref(), Some("door.h"));
        assert_eq!(
            options.templates,
            cfsm_compiler::TemplateSource::Directory(PathBuf::from("tmpl"))
        );
    }
}
