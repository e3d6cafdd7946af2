mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;
use forcekill_core::Config;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use cli::{Cli, Command};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive(format!("forcekill={}", level).parse()?)
                .add_directive(format!("forcekill_core={}", level).parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = load_config(&cli)?;

    match cli.command {
        Command::Signatures { signatures, json } => {
            commands::signatures::run(&config, signatures.as_deref(), json)
        }
        Command::Scan {
            file,
            base,
            pattern,
            start,
            len,
            width,
            limit,
        } => commands::scan::run(
            &file,
            &base,
            &pattern,
            start.as_deref(),
            len.as_deref(),
            width,
            limit,
        ),
        Command::Resolve {
            file,
            base,
            anchor,
            major,
            minor,
            width,
            window,
            signatures,
            json,
        } => commands::resolve::run(
            &config,
            commands::resolve::ResolveArgs {
                file,
                base,
                anchor,
                major,
                minor,
                width,
                window,
                signatures,
                json,
            },
        ),
        Command::Hexdump {
            file,
            base,
            address,
            size,
            ascii,
        } => commands::hexdump::run(&file, &base, address.as_deref(), size, ascii),
        Command::Config { output } => commands::config::run(&config, output.as_deref()),
    }
}

fn load_config(cli: &Cli) -> Result<Config> {
    let Some(path) = &cli.config else {
        return Ok(Config::default());
    };

    match Config::load(path) {
        Ok(config) => {
            debug!("Loaded config from {:?}", path);
            Ok(config)
        }
        Err(e) if e.is_not_found() => {
            warn!("Config file {:?} not found, using defaults", path);
            Ok(Config::default())
        }
        Err(e) => Err(e.into()),
    }
}
