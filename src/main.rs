use canopy::cli::{run_cli, Cli};
use canopy::logging::{self, LogConfig};
use clap::Parser;
use std::process::ExitCode;

fn main() -> anyhow::Result<ExitCode> {
    logging::init(&LogConfig::from_env())?;
    let cli = Cli::parse();
    let ok = run_cli(&cli, &mut std::io::stdout().lock())?;
    Ok(if ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
