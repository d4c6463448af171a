//! Inspect command - shows how models resolve without writing anything.

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::Context as _;
use forma_codegen::{BuilderPlan, BuilderStage, GeneratedFile, GenerationConfig, Round};
use forma_ir::SettingName;
use forma_source::SourceScanner;

use crate::report::write_diagnostics;

#[derive(clap::Args)]
pub struct Args {
    /// Directory containing the model definition sources
    pub source_dir: PathBuf,

    /// Only show models whose trait or generated name contains this text
    #[arg(short, long)]
    pub model: Option<String>,
}

pub fn run(args: Args) -> anyhow::Result<bool> {
    inspect(&args, &mut io::stdout().lock())
}

pub fn inspect(args: &Args, out: &mut impl Write) -> anyhow::Result<bool> {
    let scan = SourceScanner::scan_dir(&args.source_dir)
        .with_context(|| format!("failed to scan {}", args.source_dir.display()))?;
    let config = GenerationConfig::builder().parallel(false).build();
    let report = Round::new(config).process(&scan.sources);

    let selected = report.files.iter().filter(|file| match &args.model {
        Some(filter) => {
            file.model.interface.to_string().contains(filter.as_str())
                || file.model.name.to_string().contains(filter.as_str())
        }
        None => true,
    });
    for file in selected {
        write_model(out, file)?;
    }

    write_diagnostics(out, &scan.diagnostics, false)?;
    write_diagnostics(out, &report.diagnostics, false)?;
    Ok(!scan.diagnostics.has_errors() && !report.has_errors())
}

fn write_model(out: &mut impl Write, file: &GeneratedFile) -> io::Result<()> {
    let model = &file.model;
    writeln!(out, "{} ({} {})", model.name, model.kind, model.interface)?;

    writeln!(out, "  settings:")?;
    for &setting in SettingName::ALL {
        writeln!(
            out,
            "    {setting} = {}  # {}",
            model.settings.render(setting),
            model.settings.provenance(setting).description()
        )?;
    }

    writeln!(out, "  attributes:")?;
    for attribute in model.attributes.iter() {
        let mut flags = Vec::new();
        if attribute.mandatory {
            flags.push("mandatory");
        }
        if attribute.setter {
            flags.push("setter");
        }
        if attribute.in_equality {
            flags.push("equality");
        }
        if attribute.in_to_string {
            flags.push("to_string");
        }
        if attribute.transient {
            flags.push("transient");
        }
        if attribute.is_final {
            flags.push("final");
        }
        writeln!(
            out,
            "    {}: {} [{}]",
            attribute.identifier,
            attribute.ty,
            flags.join(", ")
        )?;
    }

    if let Some(plan) = &file.plan {
        write_plan(out, plan)?;
    }
    writeln!(out, "  output: {}", file.path.display())
}

fn write_plan(out: &mut impl Write, plan: &BuilderPlan) -> io::Result<()> {
    writeln!(out, "  builder: {} ({})", plan.strategy.kind, plan.strategy.type_name)?;
    for stage in plan.reachable_stages() {
        match stage {
            BuilderStage::Dedicated {
                trait_name,
                attribute,
                ..
            } => writeln!(out, "    {trait_name}: {attribute}")?,
            BuilderStage::Final {
                trait_name,
                optional,
            } => writeln!(out, "    {trait_name}: {}", optional.join(", "))?,
        }
    }
    if let Some(tracker) = &plan.tracker {
        writeln!(out, "    initialization tracked in {}", tracker.width())?;
    }
    Ok(())
}
