//! Generate command - renders every model of a source tree into an output directory.

use std::io::{self, IsTerminal as _, Write};
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use forma_codegen::{GeneratedFileWriter, GenerationConfig, Round, RoundReport};
use forma_source::SourceScanner;
use nu_ansi_term::Color;
use tracing::info;

use crate::report::write_diagnostics;

#[derive(clap::Args)]
pub struct Args {
    /// Directory containing the model definition sources
    pub source_dir: PathBuf,

    /// Directory the generated files are written to
    #[arg(short, long, default_value = "generated")]
    pub out: PathBuf,

    /// Path the model definition sources are mounted at in the consuming crate
    #[arg(long, default_value = "crate")]
    pub trait_root: String,

    /// Omit the `@generated` header
    #[arg(long)]
    pub no_header: bool,

    /// Assemble models on the current thread only
    #[arg(long)]
    pub sequential: bool,

    /// Report what would be written without touching the output directory
    #[arg(long)]
    pub dry_run: bool,
}

impl Args {
    fn config(&self) -> GenerationConfig {
        GenerationConfig::builder()
            .trait_root(self.trait_root.as_str())
            .header(!self.no_header)
            .parallel(!self.sequential)
            .build()
    }
}

pub fn run(args: Args) -> anyhow::Result<bool> {
    let stderr = io::stderr();
    let color = stderr.is_terminal();
    generate(&args, &mut stderr.lock(), color)
}

/// Returns `false` when any diagnostic is an error or a file could not be
/// written.
pub fn generate(args: &Args, out: &mut impl Write, color: bool) -> anyhow::Result<bool> {
    let scan = SourceScanner::scan_dir(&args.source_dir)
        .with_context(|| format!("failed to scan {}", args.source_dir.display()))?;
    write_diagnostics(out, &scan.diagnostics, color)?;

    let report = Round::new(args.config()).process(&scan.sources);
    write_diagnostics(out, &report.diagnostics, color)?;

    let failed_writes = if args.dry_run {
        for file in &report.files {
            writeln!(out, "would write {}", args.out.join(&file.path).display())?;
        }
        0
    } else {
        write_files(&args.out, &report, out, color)?
    };

    let ok = !scan.diagnostics.has_errors() && !report.has_errors() && failed_writes == 0;
    let errors = scan.diagnostics.error_count() + report.diagnostics.error_count() + failed_writes;
    let summary = format!("{} generated, {errors} error(s)", report.files.len());
    let summary = match (color, ok) {
        (false, _) => summary,
        (true, true) => Color::Green.paint(summary).to_string(),
        (true, false) => Color::Red.paint(summary).to_string(),
    };
    writeln!(out, "{summary}")?;
    info!(files = report.files.len(), ok, "generate finished");
    Ok(ok)
}

fn write_files(
    out_dir: &Path,
    report: &RoundReport,
    out: &mut impl Write,
    color: bool,
) -> anyhow::Result<usize> {
    let writer = GeneratedFileWriter::new(out_dir);
    let mut failed = 0;
    for result in writer.write_all(&report.files) {
        if let Err(err) = result {
            failed += 1;
            let label = if color {
                Color::Red.bold().paint("error").to_string()
            } else {
                "error".to_owned()
            };
            writeln!(out, "{label}: {err}")?;
        }
    }
    Ok(failed)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use pretty_assertions::assert_eq;

    use super::*;

    fn args(source_dir: &Path, out: &Path) -> Args {
        Args {
            source_dir: source_dir.to_owned(),
            out: out.to_owned(),
            trait_root: "crate".to_owned(),
            no_header: false,
            sequential: true,
            dry_run: false,
        }
    }

    fn write(root: &Path, relative: &str, contents: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    #[test]
    fn test_generates_files_for_models() {
        let src = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        write(
            src.path(),
            "models.rs",
            "#[immutable_model] pub trait User { fn get_name(&self) -> String; }",
        );

        let mut log = Vec::new();
        let ok = generate(&args(src.path(), out.path()), &mut log, false).unwrap();

        assert!(ok);
        assert_eq!(String::from_utf8(log).unwrap(), "1 generated, 0 error(s)\n");
        let generated = fs::read_to_string(out.path().join("models/immutable_user.rs")).unwrap();
        assert!(generated.contains("pub struct ImmutableUser"));
    }

    #[test]
    fn test_dry_run_writes_nothing() {
        let src = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        write(
            src.path(),
            "models.rs",
            "#[mutable_model] pub trait Point { fn get_x(&self) -> i32; }",
        );
        let mut args = args(src.path(), out.path());
        args.dry_run = true;

        let mut log = Vec::new();
        assert!(generate(&args, &mut log, false).unwrap());

        let log = String::from_utf8(log).unwrap();
        assert!(log.starts_with("would write "), "{log}");
        assert!(log.contains("mutable_point.rs"), "{log}");
        assert!(!out.path().join("models").exists());
    }

    #[test]
    fn test_errors_fail_the_run_but_siblings_are_written() {
        let src = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        write(
            src.path(),
            "models.rs",
            r#"
#[immutable_model]
pub trait Good { fn get_name(&self) -> String; }

#[immutable_model]
pub trait Bad {
    fn get_x(&self) -> bool;
    fn is_x(&self) -> bool;
}
"#,
        );

        let mut log = Vec::new();
        let ok = generate(&args(src.path(), out.path()), &mut log, false).unwrap();

        assert!(!ok);
        let log = String::from_utf8(log).unwrap();
        assert!(log.starts_with("error: "), "{log}");
        assert!(log.ends_with("1 generated, 1 error(s)\n"), "{log}");
        assert!(out.path().join("models/immutable_good.rs").exists());
    }
}
