use adf_config::{telemetry, Settings};
use anyhow::Result;
use clap::{ArgAction, Parser};
use std::io::{self, Write};
use std::process;

#[derive(Parser)]
#[command(
    name = "adf-config",
    version,
    about = "Print an application's config entries stored in DynamoDB"
)]
struct Cli {
    /// List config entries as name=value lines
    #[arg(
        short = 'l',
        long = "list",
        action = ArgAction::Set,
        num_args = 0..=1,
        default_value_t = true,
        default_missing_value = "true"
    )]
    list: bool,
    /// Application name matched against the App attribute
    #[arg(short = 'a', long = "app", default_value = "")]
    app: String,
}

fn main() {
    if let Err(err) = real_main() {
        eprintln!("adf-config: {err:#}");
        process::exit(1);
    }
}

fn real_main() -> Result<()> {
    let cli = Cli::parse();
    telemetry::init()?;

    if !cli.list {
        return Ok(());
    }

    let settings = Settings::from_env();
    let lines = adf_config::list(&settings, &cli.app)?;

    let mut out = io::stdout().lock();
    for line in lines {
        writeln!(out, "{line}")?;
    }
    out.flush()?;
    Ok(())
}
