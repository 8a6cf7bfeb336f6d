use crate::config::provenance::{ProvenanceMap, Source};
use crate::config::schema::FileConfig;
use crate::config::{ResolvedConfig, PROJECT_CONFIG_FILE};
use crate::errors::{ReqpinError, Result};
use crate::output::OutputFormat;
use std::path::{Path, PathBuf};

/// CLI overrides extracted from command arguments.
#[derive(Debug, Default)]
pub struct CliOverrides {
    pub format: Option<OutputFormat>,
    pub quiet: bool,
    pub jobs: Option<usize>,
    pub output: Option<PathBuf>,
    pub python: Option<PathBuf>,
    pub timeout_secs: Option<u64>,
    pub no_stdlib_probe: bool,
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    pub no_gitignore: bool,
    pub ignore_modules: Vec<String>,
    pub keep_local: bool,
}

/// Resolve configuration by applying layers bottom-up:
/// 1. Built-in defaults
/// 2. User config (~/.config/reqpin/config.toml)
/// 3. Project config (nearest .reqpin.toml walking up from working_dir)
/// 4. Environment variables
/// 5. CLI overrides
pub fn resolve_config(working_dir: &Path, cli: &CliOverrides) -> Result<ResolvedConfig> {
    let mut prov = ProvenanceMap::new();
    let mut loaded_files = Vec::new();

    // 1. Built-in defaults
    let mut config = ResolvedConfig::default();
    set_all_default_provenance(&mut prov);

    // 2. User config
    if let Some(user_config_path) = find_user_config() {
        if user_config_path.exists() {
            let file_config = load_file_config(&user_config_path, "user")?;
            apply_file_config(
                &mut config,
                &file_config,
                Source::UserConfig(user_config_path.clone()),
                &mut prov,
            )?;
            loaded_files.push(user_config_path);
        }
    }

    // 3. Project config (walk up from working_dir)
    if let Some(project_config_path) = find_project_config(working_dir) {
        let file_config = load_file_config(&project_config_path, "project")?;
        apply_file_config(
            &mut config,
            &file_config,
            Source::ProjectConfig(project_config_path.clone()),
            &mut prov,
        )?;
        loaded_files.push(project_config_path);
    }

    // 4. Environment variables
    apply_env_vars(&mut config, &mut prov, |key| std::env::var(key).ok());

    // 5. CLI overrides
    apply_cli_overrides(&mut config, cli, &mut prov);

    config.ignore_patterns = crate::config::ignore::load_reqpinignore(working_dir);
    config.provenance = prov;
    config.loaded_files = loaded_files;

    Ok(config)
}

fn load_file_config(path: &Path, layer: &str) -> Result<FileConfig> {
    let content = std::fs::read_to_string(path).map_err(|_| {
        ReqpinError::Config(format!("Could not read {layer} config: {}", path.display()))
    })?;
    FileConfig::from_toml(&content)
        .map_err(|e| ReqpinError::Config(format!("Invalid {layer} config {}: {e}", path.display())))
}

fn find_user_config() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("reqpin").join("config.toml"))
}

fn find_project_config(start: &Path) -> Option<PathBuf> {
    let mut dir = start.to_path_buf();
    loop {
        let config_path = dir.join(PROJECT_CONFIG_FILE);
        if config_path.exists() {
            return Some(config_path);
        }
        if !dir.pop() {
            break;
        }
    }
    None
}

fn set_all_default_provenance(prov: &mut ProvenanceMap) {
    let defaults = [
        "defaults.format",
        "defaults.quiet",
        "defaults.jobs",
        "defaults.output",
        "resolver.python",
        "resolver.timeout_secs",
        "resolver.probe_stdlib",
        "targeting.include",
        "targeting.exclude",
        "targeting.respect_gitignore",
        "analysis.ignore_modules",
        "analysis.exclude_local",
    ];
    for key in defaults {
        prov.set(key, Source::Default);
    }
}

fn apply_file_config(
    config: &mut ResolvedConfig,
    file: &FileConfig,
    source: Source,
    prov: &mut ProvenanceMap,
) -> Result<()> {
    // Defaults
    if let Some(ref format) = file.defaults.format {
        config.format = format
            .parse()
            .map_err(|e| ReqpinError::Config(format!("{e} (from {source})")))?;
        prov.set("defaults.format", source.clone());
    }
    if let Some(quiet) = file.defaults.quiet {
        config.quiet = quiet;
        prov.set("defaults.quiet", source.clone());
    }
    if let Some(jobs) = file.defaults.jobs {
        config.jobs = jobs.max(1);
        prov.set("defaults.jobs", source.clone());
    }
    if let Some(ref output) = file.defaults.output {
        config.output = Some(PathBuf::from(output));
        prov.set("defaults.output", source.clone());
    }

    // Resolver
    if let Some(ref python) = file.resolver.python {
        config.python = PathBuf::from(python);
        prov.set("resolver.python", source.clone());
    }
    if let Some(timeout_secs) = file.resolver.timeout_secs {
        config.timeout_secs = timeout_secs;
        prov.set("resolver.timeout_secs", source.clone());
    }
    if let Some(probe_stdlib) = file.resolver.probe_stdlib {
        config.probe_stdlib = probe_stdlib;
        prov.set("resolver.probe_stdlib", source.clone());
    }

    // Targeting
    if !file.targeting.include.is_empty() {
        config.include = file.targeting.include.clone();
        prov.set("targeting.include", source.clone());
    }
    if !file.targeting.exclude.is_empty() {
        config.exclude = file.targeting.exclude.clone();
        prov.set("targeting.exclude", source.clone());
    }
    if let Some(respect_gitignore) = file.targeting.respect_gitignore {
        config.respect_gitignore = respect_gitignore;
        prov.set("targeting.respect_gitignore", source.clone());
    }

    // Analysis
    if !file.analysis.ignore_modules.is_empty() {
        config.ignore_modules = file.analysis.ignore_modules.clone();
        prov.set("analysis.ignore_modules", source.clone());
    }
    if let Some(exclude_local) = file.analysis.exclude_local {
        config.exclude_local = exclude_local;
        prov.set("analysis.exclude_local", source);
    }

    Ok(())
}

fn is_truthy(val: &str) -> bool {
    val == "1" || val.eq_ignore_ascii_case("true")
}

fn split_list(val: &str) -> Vec<String> {
    val.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn apply_env_vars(
    config: &mut ResolvedConfig,
    prov: &mut ProvenanceMap,
    var: impl Fn(&str) -> Option<String>,
) {
    if let Some(val) = var("REQPIN_FORMAT") {
        match val.parse() {
            Ok(format) => {
                config.format = format;
                prov.set("defaults.format", Source::EnvVar("REQPIN_FORMAT".into()));
            }
            Err(e) => tracing::warn!("ignoring REQPIN_FORMAT: {e}"),
        }
    }
    if let Some(val) = var("REQPIN_QUIET") {
        config.quiet = is_truthy(&val);
        prov.set("defaults.quiet", Source::EnvVar("REQPIN_QUIET".into()));
    }
    if let Some(val) = var("REQPIN_JOBS") {
        if let Ok(n) = val.parse::<usize>() {
            config.jobs = n.max(1);
            prov.set("defaults.jobs", Source::EnvVar("REQPIN_JOBS".into()));
        }
    }
    if let Some(val) = var("REQPIN_PYTHON") {
        config.python = PathBuf::from(val);
        prov.set("resolver.python", Source::EnvVar("REQPIN_PYTHON".into()));
    }
    if let Some(val) = var("REQPIN_TIMEOUT") {
        if let Ok(secs) = val.parse::<u64>() {
            config.timeout_secs = secs;
            prov.set("resolver.timeout_secs", Source::EnvVar("REQPIN_TIMEOUT".into()));
        }
    }
    if let Some(val) = var("REQPIN_EXCLUDE") {
        config.exclude = split_list(&val);
        prov.set("targeting.exclude", Source::EnvVar("REQPIN_EXCLUDE".into()));
    }
    if let Some(val) = var("REQPIN_IGNORE_MODULES") {
        config.ignore_modules = split_list(&val);
        prov.set(
            "analysis.ignore_modules",
            Source::EnvVar("REQPIN_IGNORE_MODULES".into()),
        );
    }
}

fn apply_cli_overrides(config: &mut ResolvedConfig, cli: &CliOverrides, prov: &mut ProvenanceMap) {
    if let Some(format) = cli.format {
        config.format = format;
        prov.set("defaults.format", Source::CliFlag("--format".into()));
    }
    if cli.quiet {
        config.quiet = true;
        prov.set("defaults.quiet", Source::CliFlag("--quiet".into()));
    }
    if let Some(jobs) = cli.jobs {
        config.jobs = jobs.max(1);
        prov.set("defaults.jobs", Source::CliFlag("--jobs".into()));
    }
    if let Some(ref output) = cli.output {
        config.output = Some(output.clone());
        prov.set("defaults.output", Source::CliFlag("--output".into()));
    }
    if let Some(ref python) = cli.python {
        config.python = python.clone();
        prov.set("resolver.python", Source::CliFlag("--python".into()));
    }
    if let Some(timeout_secs) = cli.timeout_secs {
        config.timeout_secs = timeout_secs;
        prov.set("resolver.timeout_secs", Source::CliFlag("--timeout".into()));
    }
    if cli.no_stdlib_probe {
        config.probe_stdlib = false;
        prov.set(
            "resolver.probe_stdlib",
            Source::CliFlag("--no-stdlib-probe".into()),
        );
    }
    if !cli.include.is_empty() {
        config.include = cli.include.clone();
        prov.set("targeting.include", Source::CliFlag("--include".into()));
    }
    if !cli.exclude.is_empty() {
        config.exclude = cli.exclude.clone();
        prov.set("targeting.exclude", Source::CliFlag("--exclude".into()));
    }
    if cli.no_gitignore {
        config.respect_gitignore = false;
        prov.set(
            "targeting.respect_gitignore",
            Source::CliFlag("--no-gitignore".into()),
        );
    }
    if !cli.ignore_modules.is_empty() {
        config.ignore_modules.extend(cli.ignore_modules.iter().cloned());
        prov.set("analysis.ignore_modules", Source::CliFlag("--ignore".into()));
    }
    if cli.keep_local {
        config.exclude_local = false;
        prov.set("analysis.exclude_local", Source::CliFlag("--keep-local".into()));
    }
}
