use crate::config::ResolvedConfig;
use std::io::Write;

pub const SECTIONS: &[&str] = &["defaults", "resolver", "targeting", "analysis"];

/// Render `config show` output.
pub fn render_show<W: Write>(w: &mut W, config: &ResolvedConfig) -> std::io::Result<()> {
    // Loaded files
    if config.loaded_files.is_empty() {
        writeln!(w, "Loaded config files: (none)")?;
    } else {
        writeln!(w, "Loaded config files:")?;
        for (i, path) in config.loaded_files.iter().enumerate() {
            writeln!(w, "  {}. {}", i + 1, path.display())?;
        }
    }
    if !config.ignore_patterns.is_empty() {
        writeln!(w, "Ignore patterns: {}", config.ignore_patterns.join(", "))?;
    }
    writeln!(w)?;

    // Resolved settings
    writeln!(
        w,
        "Resolved settings ({} of {} overridden):",
        config.provenance.overridden().count(),
        config.provenance.len()
    )?;
    for (key, source) in config.provenance.sorted_entries() {
        let value = get_value_for_key(config, key);
        writeln!(w, "  {}: {} <- {}", key, value, source)?;
    }

    Ok(())
}

/// Render `config show --section <name>` output.
pub fn render_section<W: Write>(
    w: &mut W,
    config: &ResolvedConfig,
    section: &str,
) -> std::io::Result<()> {
    let prefix = format!("{}.", section);
    let entries = config.provenance.entries_with_prefix(&prefix);

    if entries.is_empty() {
        writeln!(w, "Unknown config section: {}", section)?;
        writeln!(w, "Available sections: {}", SECTIONS.join(", "))?;
        return Ok(());
    }

    writeln!(w, "[{}]", section)?;
    for (key, source) in &entries {
        let value = get_value_for_key(config, key);
        writeln!(w, "  {}: {} <- {}", key, value, source)?;
    }

    Ok(())
}

fn list(values: &[String]) -> String {
    if values.is_empty() {
        "(none)".to_string()
    } else {
        format!("{:?}", values)
    }
}

fn get_value_for_key(config: &ResolvedConfig, key: &str) -> String {
    match key {
        "defaults.format" => config.format.to_string(),
        "defaults.quiet" => config.quiet.to_string(),
        "defaults.jobs" => config.jobs.to_string(),
        "defaults.output" => config
            .output
            .as_ref()
            .map_or("(next to sources)".to_string(), |p| p.display().to_string()),
        "resolver.python" => config.python.display().to_string(),
        "resolver.timeout_secs" => config.timeout_secs.to_string(),
        "resolver.probe_stdlib" => config.probe_stdlib.to_string(),
        "targeting.include" => list(&config.include),
        "targeting.exclude" => list(&config.exclude),
        "targeting.respect_gitignore" => config.respect_gitignore.to_string(),
        "analysis.ignore_modules" => list(&config.ignore_modules),
        "analysis.exclude_local" => config.exclude_local.to_string(),
        _ => "(unknown)".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::provenance::{ProvenanceMap, Source};
    use crate::output::OutputFormat;
    use std::path::PathBuf;

    fn make_test_config() -> ResolvedConfig {
        let mut prov = ProvenanceMap::new();
        prov.set("defaults.format", Source::Default);
        prov.set("defaults.quiet", Source::Default);
        prov.set(
            "resolver.python",
            Source::ProjectConfig(PathBuf::from("/project/.reqpin.toml")),
        );
        prov.set("resolver.timeout_secs", Source::EnvVar("REQPIN_TIMEOUT".into()));
        prov.set("analysis.ignore_modules", Source::Default);

        ResolvedConfig {
            format: OutputFormat::Json,
            python: PathBuf::from("venv/bin/python"),
            timeout_secs: 5,
            provenance: prov,
            loaded_files: vec![PathBuf::from("/project/.reqpin.toml")],
            ..Default::default()
        }
    }

    #[test]
    fn render_show_format() {
        let config = make_test_config();
        let mut buf = Vec::new();
        render_show(&mut buf, &config).unwrap();
        let output = String::from_utf8(buf).unwrap();

        assert!(output.contains("Loaded config files:"));
        assert!(output.contains("1. /project/.reqpin.toml"));
        assert!(output.contains("Resolved settings (2 of 5 overridden):"));
        assert!(output.contains("defaults.format: json <- default"));
        assert!(output.contains(
            "resolver.python: venv/bin/python <- project config (/project/.reqpin.toml)"
        ));
        assert!(output.contains("resolver.timeout_secs: 5 <- env var (REQPIN_TIMEOUT)"));
        assert!(output.contains("analysis.ignore_modules: (none) <- default"));
    }

    #[test]
    fn render_show_no_files() {
        let mut config = make_test_config();
        config.loaded_files.clear();
        let mut buf = Vec::new();
        render_show(&mut buf, &config).unwrap();
        let output = String::from_utf8(buf).unwrap();

        assert!(output.contains("Loaded config files: (none)"));
    }

    #[test]
    fn render_known_section() {
        let config = make_test_config();
        let mut buf = Vec::new();
        render_section(&mut buf, &config, "resolver").unwrap();
        let output = String::from_utf8(buf).unwrap();

        assert!(output.starts_with("[resolver]\n"));
        assert!(output.contains("resolver.python"));
        assert!(output.contains("resolver.timeout_secs"));
        assert!(!output.contains("defaults.format"));
    }

    #[test]
    fn render_unknown_section() {
        let config = make_test_config();
        let mut buf = Vec::new();
        render_section(&mut buf, &config, "rules").unwrap();
        let output = String::from_utf8(buf).unwrap();

        assert!(output.contains("Unknown config section: rules"));
        assert!(output.contains("defaults, resolver, targeting, analysis"));
    }
}
