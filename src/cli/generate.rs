use crate::cancel::CancelToken;
use crate::config::resolve::{resolve_config, CliOverrides};
use crate::config::ResolvedConfig;
use crate::errors::{PathKind, Result};
use crate::manifest::{render_manifest, OverwritePolicy};
use crate::output::OutputFormat;
use crate::parse::ImportName;
use crate::pipeline::{parent_dir, validate_input, Emit, Outcome, Pipeline, Report};
use crate::resolve::{PipLookup, VersionResolver};
use crate::stdlib::{InterpreterProbe, StandardLibrarySet};
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Workflow {
    File,
    Directory,
}

impl Workflow {
    fn input_kind(self) -> PathKind {
        match self {
            Workflow::File => PathKind::File,
            Workflow::Directory => PathKind::Directory,
        }
    }
}

#[derive(Debug, Args)]
pub struct GenerateArgs {
    /// Source file or directory to analyze
    pub path: PathBuf,

    /// Manifest to write (default: requirements.txt next to the sources)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Overwrite an existing manifest without asking
    #[arg(short, long)]
    pub force: bool,

    /// Print the manifest instead of writing it
    #[arg(long)]
    pub dry_run: bool,

    /// Report format
    #[arg(long)]
    pub format: Option<OutputFormat>,

    /// Only print the outcome line; no progress
    #[arg(short, long)]
    pub quiet: bool,

    /// Parallel version lookups
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Python interpreter used for pip and the stdlib probe
    #[arg(long)]
    pub python: Option<PathBuf>,

    /// Seconds to wait for each interpreter call
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Use only the built-in standard-library list
    #[arg(long)]
    pub no_stdlib_probe: bool,

    /// Include glob patterns
    #[arg(long)]
    pub include: Vec<String>,

    /// Exclude glob patterns
    #[arg(long)]
    pub exclude: Vec<String>,

    /// Also analyze files ignored by git
    #[arg(long)]
    pub no_gitignore: bool,

    /// Module names to never pin
    #[arg(long = "ignore", value_name = "MODULE")]
    pub ignore_modules: Vec<String>,

    /// Pin names that match modules inside the project
    #[arg(long)]
    pub keep_local: bool,
}

impl GenerateArgs {
    fn overrides(&self) -> CliOverrides {
        CliOverrides {
            format: self.format,
            quiet: self.quiet,
            jobs: self.jobs,
            output: self.output.clone(),
            python: self.python.clone(),
            timeout_secs: self.timeout,
            no_stdlib_probe: self.no_stdlib_probe,
            include: self.include.clone(),
            exclude: self.exclude.clone(),
            no_gitignore: self.no_gitignore,
            ignore_modules: self.ignore_modules.clone(),
            keep_local: self.keep_local,
        }
    }
}

pub fn run(args: &GenerateArgs, workflow: Workflow) -> Result<()> {
    let start = Instant::now();
    validate_input(&args.path, workflow.input_kind())?;

    let project_dir = match workflow {
        Workflow::File => parent_dir(&args.path),
        Workflow::Directory => args.path.clone(),
    };
    let config = resolve_config(&project_dir, &args.overrides())?;
    tracing::debug!("python={} jobs={}", config.python.display(), config.jobs);

    let probe = config
        .probe_stdlib
        .then(|| InterpreterProbe::new(&config.python, config.timeout()));
    let stdlib = StandardLibrarySet::compute(probe.as_ref());
    let resolver = VersionResolver::new(Box::new(PipLookup::new(&config.python, config.timeout())))
        .with_jobs(config.jobs);

    let cancel = CancelToken::new();
    cancel.install_ctrlc_handler();

    let progress = resolution_progress(config.quiet);
    let policy = overwrite_policy(args.force, &progress);
    let emit = if args.dry_run {
        Emit::DryRun
    } else {
        Emit::Manifest(&policy)
    };
    let target = manifest_target(&config, &project_dir);

    let on_resolved = {
        let progress = progress.clone();
        move |name: &ImportName| {
            progress.set_message(name.to_string());
            progress.inc(1);
        }
    };
    let pipeline = Pipeline::new(&stdlib, &resolver)
        .with_options(config.analysis_options())
        .with_cancel(cancel)
        .on_resolved(on_resolved);

    let result = match workflow {
        Workflow::File => pipeline.analyze_file(&args.path, target.as_deref(), &emit),
        Workflow::Directory => pipeline.analyze_directory(&args.path, target.as_deref(), &emit),
    };
    progress.finish_and_clear();
    let report = result?;

    let elapsed_ms = start.elapsed().as_millis() as u64;
    let stdout = std::io::stdout();
    let mut stdout = stdout.lock();
    match config.format {
        OutputFormat::Json => {
            crate::output::json::write_report_json(&mut stdout, &report, elapsed_ms)?;
        }
        OutputFormat::Text if args.dry_run => {
            // The manifest owns stdout so it can be redirected; the report goes to stderr.
            if report.outcome == Outcome::DryRun {
                stdout.write_all(render_manifest(&report.dependencies).as_bytes())?;
            }
            write_text(&mut std::io::stderr(), &report, config.quiet)?;
        }
        OutputFormat::Text => write_text(&mut stdout, &report, config.quiet)?,
    }
    stdout.flush()?;

    if report.outcome == Outcome::Cancelled {
        std::process::exit(130);
    }
    Ok(())
}

fn write_text<W: Write>(writer: &mut W, report: &Report, quiet: bool) -> Result<()> {
    if quiet {
        writeln!(writer, "{}", crate::output::text::outcome_line(report))?;
        Ok(())
    } else {
        crate::output::text::write_report_text(writer, report)
    }
}

/// A manifest path from the command line is taken as given; one from a
/// config file is relative to the analyzed directory.
fn manifest_target(config: &ResolvedConfig, project_dir: &Path) -> Option<PathBuf> {
    let output = config.output.as_ref()?;
    if config.provenance.is_from_cli("defaults.output") || output.is_absolute() {
        Some(output.clone())
    } else {
        Some(project_dir.join(output))
    }
}

fn resolution_progress(quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.green} {pos} packages looked up {msg}")
    {
        pb.set_style(style);
    }
    pb
}

fn overwrite_policy(force: bool, progress: &ProgressBar) -> OverwritePolicy {
    if force {
        return OverwritePolicy::Always;
    }
    if !std::io::stdin().is_terminal() || !std::io::stderr().is_terminal() {
        return OverwritePolicy::Never;
    }

    let progress = progress.clone();
    OverwritePolicy::Ask(Box::new(move |path: &Path| {
        progress.suspend(|| {
            dialoguer::Confirm::new()
                .with_prompt(format!("{} already exists. Overwrite?", path.display()))
                .default(false)
                .interact()
                .unwrap_or(false)
        })
    }))
}
