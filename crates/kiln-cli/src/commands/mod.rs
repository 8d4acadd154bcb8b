//! CLI command definitions and dispatch.

pub mod build;
pub mod graph;
pub mod plan;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use kiln_common::config::BuildConfig;
use kiln_common::types::LogLevel;

/// kiln — Build interdependent container images in dependency order.
#[derive(Parser, Debug)]
#[command(name = "kiln", version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,

    /// Configuration file (defaults to ./kiln.yaml when present).
    #[arg(long, short, global = true, env = "KILN_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory to search for Dockerfiles; repeat to search several.
    /// Replaces the configured directories.
    #[arg(long = "dir", short = 'd', global = true)]
    pub directories: Vec<PathBuf>,

    /// Prefix for every discovered image name.
    #[arg(long, global = true)]
    pub namespace: Option<String>,

    /// Container runtime binary (docker or podman).
    #[arg(long, global = true)]
    pub runtime: Option<String>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    pub log_level: Option<LogLevel>,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    pub log_json: bool,
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Pull external dependencies, build local images, optionally push.
    Build(build::BuildArgs),
    /// Show which images would be pulled and built, in order.
    Plan(plan::PlanArgs),
    /// Show the discovered images and their dependencies.
    Graph(graph::GraphArgs),
}

/// Which images a run covers.
#[derive(Args, Debug, Clone, Default)]
pub struct Selection {
    /// Images to build (all discovered images when omitted).
    pub images: Vec<String>,

    /// Also build every image that depends on the given ones.
    #[arg(long)]
    pub downstream: bool,
}

impl Selection {
    fn apply(&self, config: &mut BuildConfig) {
        if !self.images.is_empty() {
            config.images.clone_from(&self.images);
        }
        if self.downstream {
            config.core.downstream = true;
        }
    }
}

/// Loads the configuration file and layers command-line flags over it.
///
/// # Errors
///
/// Returns an error if the configuration cannot be read or is invalid.
pub fn load_config(cli: &Cli) -> anyhow::Result<BuildConfig> {
    let cwd = std::env::current_dir()?;
    let config = BuildConfig::discover(cli.config.as_deref(), &cwd)?;
    let config = apply_overrides(cli, config);
    config.validate()?;
    Ok(config)
}

fn apply_overrides(cli: &Cli, mut config: BuildConfig) -> BuildConfig {
    if !cli.directories.is_empty() {
        config.directories.clone_from(&cli.directories);
    }
    if let Some(namespace) = &cli.namespace {
        config.core.namespace = Some(namespace.clone());
    }
    if let Some(runtime) = &cli.runtime {
        config.core.runtime.clone_from(runtime);
    }
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    match &cli.command {
        Command::Build(args) => args.apply(&mut config),
        Command::Plan(args) => args.selection.apply(&mut config),
        Command::Graph(_) => {}
    }
    config
}

/// Dispatches the parsed CLI command to its handler.
///
/// # Errors
///
/// Returns an error if the command execution fails.
pub fn execute(cli: Cli, config: &BuildConfig) -> anyhow::Result<()> {
    tracing::debug!(?config, "effective configuration");
    match cli.command {
        Command::Build(args) => build::execute(&args, config),
        Command::Plan(args) => plan::execute(&args, config),
        Command::Graph(args) => graph::execute(&args, config),
    }
}
