//! # kiln — dependency-ordered container image builds
//!
//! Discovers Dockerfiles, orders them by their `FROM` dependencies, pulls
//! what is external, builds what is local, and optionally pushes.

mod commands;
mod output;

use clap::Parser;
use kiln_common::types::LogLevel;
use tracing_subscriber::EnvFilter;

use crate::commands::Cli;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = commands::load_config(&cli)?;
    init_tracing(config.logging.level, cli.log_json);
    commands::execute(cli, &config)
}

/// `RUST_LOG` wins over the configured level when set.
fn init_tracing(level: LogLevel, json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_filter()));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}
