//! flat64 command line interface.
//!
//! Parses arguments, runs the preflight checks, and drives one
//! conversion run: source tree in, flattened 16+3 copy out.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use dialoguer::{console::Term, Confirm};

use flat64_core::config::{ConfigManager, ErrorPolicy, Settings};
use flat64_core::logging::{self, LogLevel};
use flat64_core::pipeline::{self, Confirmer, RunContext};
use flat64_core::workspace;

#[derive(Parser)]
#[command(
    name = "flat64",
    version,
    about = "Flatten archived file trees into a copy fit for 16+3 filesystems"
)]
struct Cli {
    /// Source directory to convert.
    source: PathBuf,

    /// Destination directory for the converted copy.
    dest: PathBuf,

    /// Process nothing until this source file is reached.
    #[arg(short = 's', long, value_name = "PATH")]
    skip_until: Option<PathBuf>,

    /// Separator between base name and extension in produced names.
    #[arg(short = 'x', long, value_name = "CHAR")]
    ext_separator: Option<char>,

    /// Per-directory entry cap before fan-out rebalancing.
    #[arg(short = 'n', long, value_name = "N")]
    max_entries: Option<usize>,

    /// Apply Windows filename restrictions.
    #[arg(short = 'w', long)]
    windows_names: bool,

    /// Keep non-ASCII names and substitute symbolic glyphs.
    #[arg(short = 'u', long)]
    unicode_names: bool,

    /// Scratch directory root.
    #[arg(short = 't', long, value_name = "DIR")]
    temp_root: Option<PathBuf>,

    /// What to do when an external tool fails.
    #[arg(short = 'e', long, value_name = "MODE", value_enum)]
    on_tool_error: Option<PolicyArg>,

    /// TOML config file, created with defaults when missing.
    #[arg(short = 'c', long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Also write the log to this file.
    #[arg(short = 'l', long, value_name = "FILE")]
    log_file: Option<PathBuf>,

    /// Assume yes on all prompts.
    #[arg(short = 'y', long)]
    yes: bool,

    /// Increase log detail (-v debug, -vv trace).
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Clone, Copy, ValueEnum)]
enum PolicyArg {
    /// Keep the failing file verbatim and continue.
    Ignore,
    /// Prompt on each failure.
    Ask,
    /// Abort the run.
    Halt,
}

impl From<PolicyArg> for ErrorPolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::Ignore => ErrorPolicy::Ignore,
            PolicyArg::Ask => ErrorPolicy::Ask,
            PolicyArg::Halt => ErrorPolicy::Halt,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = LogLevel::from_verbosity(cli.verbose);
    match &cli.log_file {
        Some(path) => logging::init_tracing_with_file(level, path)
            .with_context(|| format!("opening log file {}", path.display()))?,
        None => logging::init_tracing(level),
    }

    let mut settings = load_settings(&cli)?;
    preflight_tools(&mut settings)?;

    if !cli.source.is_dir() {
        bail!("source {} is not a directory", cli.source.display());
    }
    confirm_destination(&cli)?;
    confirm_scratch(cli.yes, &settings)?;
    if let Some(resume) = &cli.skip_until {
        validate_resume(&cli.source, resume)?;
    }

    let ask = settings.run.on_tool_error == ErrorPolicy::Ask;
    let mut ctx = RunContext::new(settings, &cli.source, &cli.dest)?;
    if let Some(resume) = &cli.skip_until {
        ctx.resume_from(resume)?;
    }
    if ask {
        ctx.set_confirmer(confirmer(cli.yes));
    }

    tracing::info!(
        "flat64 {} starting at {}",
        flat64_core::version(),
        ctx.started_at
    );
    let summary = pipeline::run(&mut ctx)?;
    println!("{summary}");
    Ok(())
}

/// Settings from the config file (if any) with flag overrides applied.
fn load_settings(cli: &Cli) -> Result<Settings> {
    let mut settings = match &cli.config {
        Some(path) => {
            let mut manager = ConfigManager::new(path);
            manager
                .load_or_create()
                .with_context(|| format!("loading config {}", path.display()))?;
            manager.settings().clone()
        }
        None => Settings::default(),
    };

    if let Some(sep) = cli.ext_separator {
        settings.naming.extension_separator = sep;
    }
    if let Some(cap) = cli.max_entries {
        settings.layout.max_entries = cap;
    }
    if cli.windows_names {
        settings.naming.windows_safe = true;
    }
    if cli.unicode_names {
        settings.naming.unicode = true;
    }
    if let Some(dir) = &cli.temp_root {
        settings.run.temp_root = dir.display().to_string();
    }
    if let Some(policy) = cli.on_tool_error {
        settings.run.on_tool_error = policy.into();
    }

    settings.validate().map_err(|message| anyhow::anyhow!(message))?;
    Ok(settings)
}

/// Resolve every required tool up front so a missing program fails the
/// run before any file is touched. The disk lister is optional: when it
/// cannot be resolved, disk images fall back to extract-and-count.
fn preflight_tools(settings: &mut Settings) -> Result<()> {
    let required = [
        &settings.tools.unzip,
        &settings.tools.unrar,
        &settings.tools.gzip,
        &settings.tools.tar,
        &settings.tools.cbmconvert,
        &settings.tools.zip2disk,
    ];
    let missing: Vec<String> = required
        .iter()
        .filter(|tool| which::which(tool.as_str()).is_err())
        .map(|tool| tool.to_string())
        .collect();
    if !missing.is_empty() {
        bail!("required tools not found on PATH: {}", missing.join(", "));
    }

    if let Some(lister) = settings.tools.disk_lister.first() {
        if which::which(lister).is_err() {
            tracing::warn!(
                "disk lister '{}' not found, falling back to extract-and-count",
                lister
            );
            settings.tools.disk_lister.clear();
        }
    }
    Ok(())
}

fn confirm_destination(cli: &Cli) -> Result<()> {
    if cli.dest.is_dir() {
        return Ok(());
    }
    if cli.dest.exists() {
        bail!(
            "destination {} exists and is not a directory",
            cli.dest.display()
        );
    }
    if !cli.yes {
        let create = Confirm::new()
            .with_prompt(format!(
                "Destination {} does not exist. Create it?",
                cli.dest.display()
            ))
            .default(true)
            .interact_on(&Term::stderr())?;
        if !create {
            bail!("destination not created");
        }
    }
    fs::create_dir_all(&cli.dest)
        .with_context(|| format!("creating destination {}", cli.dest.display()))?;
    Ok(())
}

/// Leftovers under this run's scratch root would be mistaken for
/// extraction output, so they must go before the run starts.
fn confirm_scratch(yes: bool, settings: &Settings) -> Result<()> {
    let root = workspace::scratch_root(&settings.run.effective_temp_root());
    if !root.exists() {
        return Ok(());
    }
    let leftovers = fs::read_dir(&root)
        .with_context(|| format!("reading scratch root {}", root.display()))?
        .count();
    if leftovers == 0 {
        return Ok(());
    }

    if !yes {
        let clean = Confirm::new()
            .with_prompt(format!(
                "Scratch directory {} holds leftovers from an earlier run. Remove them?",
                root.display()
            ))
            .default(true)
            .interact_on(&Term::stderr())?;
        if !clean {
            bail!("scratch directory not cleaned");
        }
    }
    fs::remove_dir_all(&root).with_context(|| format!("removing {}", root.display()))?;
    Ok(())
}

fn validate_resume(source: &Path, target: &Path) -> Result<()> {
    if !target.is_file() {
        bail!("resume point {} does not exist", target.display());
    }
    let root = std::path::absolute(source)?;
    let target_abs = std::path::absolute(target)?;
    if !target_abs.starts_with(&root) {
        bail!(
            "resume point {} is not under the source tree",
            target.display()
        );
    }
    Ok(())
}

fn confirmer(yes: bool) -> Confirmer {
    if yes {
        Box::new(|_| true)
    } else {
        Box::new(|message: &str| {
            Confirm::new()
                .with_prompt(message)
                .default(false)
                .interact_on(&Term::stderr())
                .unwrap_or(false)
        })
    }
}
