use crate::config::resolve::{resolve_config, CliOverrides};
use crate::errors::Result;
use crate::output::OutputFormat;
use crate::stdlib::{InterpreterProbe, StandardLibrarySet};
use clap::Args;
use std::io::Write;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct StdlibArgs {
    /// Python interpreter to probe
    #[arg(long)]
    pub python: Option<PathBuf>,

    /// Print only the built-in list
    #[arg(long)]
    pub no_stdlib_probe: bool,

    /// Output format
    #[arg(long)]
    pub format: Option<OutputFormat>,
}

pub fn run(args: &StdlibArgs) -> Result<()> {
    let cli = CliOverrides {
        format: args.format,
        python: args.python.clone(),
        no_stdlib_probe: args.no_stdlib_probe,
        ..Default::default()
    };
    let config = resolve_config(&std::env::current_dir()?, &cli)?;

    let probe = config
        .probe_stdlib
        .then(|| InterpreterProbe::new(&config.python, config.timeout()));
    let stdlib = StandardLibrarySet::compute(probe.as_ref());

    let stdout = std::io::stdout();
    let mut stdout = stdout.lock();
    write_names(&mut stdout, &stdlib, config.format)?;
    stdout.flush()?;
    Ok(())
}

fn write_names<W: Write>(
    writer: &mut W,
    stdlib: &StandardLibrarySet,
    format: OutputFormat,
) -> Result<()> {
    match format {
        OutputFormat::Text => {
            for name in stdlib.iter() {
                writeln!(writer, "{name}")?;
            }
        }
        OutputFormat::Json => {
            let names: Vec<&str> = stdlib.iter().collect();
            serde_json::to_writer_pretty(&mut *writer, &names)?;
            writeln!(writer)?;
        }
    }
    Ok(())
}
