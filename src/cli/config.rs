use crate::config::resolve::{resolve_config, CliOverrides};
use crate::errors::{ReqpinError, Result};
use clap::{Args, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Show resolved configuration with provenance
    Show {
        /// Working directory (defaults to current directory)
        #[arg(long)]
        path: Option<PathBuf>,
        /// Only show one section (defaults, resolver, targeting, analysis)
        #[arg(long)]
        section: Option<String>,
    },
}

pub fn run(args: &ConfigArgs) -> Result<()> {
    match &args.action {
        ConfigAction::Show { path, section } => {
            let working_dir = resolve_working_dir(path)?;
            let config = resolve_config(&working_dir, &CliOverrides::default())?;
            let mut stdout = std::io::stdout();
            match section {
                Some(section) => {
                    crate::config::show::render_section(&mut stdout, &config, section)?
                }
                None => crate::config::show::render_show(&mut stdout, &config)?,
            }
        }
    }
    Ok(())
}

fn resolve_working_dir(path: &Option<PathBuf>) -> Result<PathBuf> {
    let p = path.clone().unwrap_or_else(|| PathBuf::from("."));
    p.canonicalize()
        .map_err(|_| ReqpinError::Config(format!("Invalid path: {}", p.display())))
}
