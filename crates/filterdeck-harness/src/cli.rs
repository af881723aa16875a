use std::io::Write;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use filterdeck_drag::{DragConfig, PlacementRules};
use serde::Serialize;

use crate::error::{HarnessError, Result};
use crate::logging;
use crate::script::Script;

#[derive(Debug, Parser)]
#[command(
    name = "filterdeck-harness",
    about = "Replay scripted drag sessions against a filterdeck board",
    version
)]
pub struct Cli {
    /// Write logs to stderr as JSON objects.
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run a script, printing each transition as a JSON line and the final
    /// board as the last line.
    Run(RunArgs),

    /// Validate tuning and rule files and print them normalized.
    Check(CheckArgs),
}

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Script file (JSON).
    pub script: PathBuf,

    /// Tuning file (TOML) replacing the script's `config`.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Rules file (TOML) replacing the script's `rules`.
    #[arg(long)]
    pub rules: Option<PathBuf>,

    /// Print only the final board.
    #[arg(long)]
    pub quiet: bool,
}

#[derive(Debug, Args)]
pub struct CheckArgs {
    #[arg(long)]
    pub config: Option<PathBuf>,

    #[arg(long)]
    pub rules: Option<PathBuf>,
}

pub fn run_from_env() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.log_json)?;
    let stdout = std::io::stdout();
    run(cli, &mut stdout.lock())
}

pub fn run(cli: Cli, out: &mut dyn Write) -> Result<()> {
    match cli.command {
        Commands::Run(args) => run_script(&args, out),
        Commands::Check(args) => run_check(&args, out),
    }
}

fn run_script(args: &RunArgs, out: &mut dyn Write) -> Result<()> {
    let mut script = Script::load(&args.script)?;
    if let Some(path) = &args.config {
        script.config = DragConfig::from_toml_file(path)?;
    }
    if let Some(path) = &args.rules {
        script.rules = load_rules(path)?;
    }

    let report = script.run()?;
    if !args.quiet {
        for transition in &report.transitions {
            emit(out, transition)?;
        }
    }
    emit(out, &report)?;

    if report.failures.is_empty() {
        Ok(())
    } else {
        for failure in &report.failures {
            tracing::error!(%failure, "expectation failed");
        }
        Err(HarnessError::Expectations {
            failed: report.failures.len(),
        })
    }
}

fn run_check(args: &CheckArgs, out: &mut dyn Write) -> Result<()> {
    if args.config.is_none() && args.rules.is_none() {
        return Err(HarnessError::script("nothing to check; pass --config and/or --rules"));
    }
    if let Some(path) = &args.config {
        emit(out, &DragConfig::from_toml_file(path)?)?;
    }
    if let Some(path) = &args.rules {
        emit(out, &load_rules(path)?)?;
    }
    Ok(())
}

fn load_rules(path: &Path) -> Result<PlacementRules> {
    let raw = std::fs::read_to_string(path).map_err(|e| HarnessError::io(path, e))?;
    Ok(PlacementRules::from_toml_str(&raw)?)
}

fn emit(out: &mut dyn Write, value: &impl Serialize) -> Result<()> {
    serde_json::to_writer(&mut *out, value)?;
    writeln!(out).map_err(|e| HarnessError::io("<stdout>", e))
}
