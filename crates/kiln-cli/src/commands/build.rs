//! `kiln build` — Pull external dependencies, build local images, push.

use clap::Args;
use kiln_common::config::BuildConfig;
use kiln_image::{DockerCli, DryRun, FsDiscovery};
use kiln_orchestrator::Orchestrator;

use super::Selection;

/// Arguments for the `build` command.
#[derive(Args, Debug)]
pub struct BuildArgs {
    /// Images to build and whether to include their dependents.
    #[command(flatten)]
    pub selection: Selection,

    /// Push built images to every registry.
    #[arg(long)]
    pub push: bool,

    /// Registry to push to, in addition to the configured ones.
    #[arg(long = "registry", short = 'r')]
    pub registries: Vec<String>,

    /// Print the runtime operations instead of running them.
    #[arg(long)]
    pub dry_run: bool,
}

impl BuildArgs {
    pub(super) fn apply(&self, config: &mut BuildConfig) {
        self.selection.apply(config);
        if self.push {
            config.core.push = true;
        }
        for registry in &self.registries {
            if !config.registries.contains(registry) {
                config.registries.push(registry.clone());
            }
        }
    }
}

/// Executes the `build` command.
///
/// # Errors
///
/// Returns an error if discovery, resolution, or any runtime operation
/// fails. Nothing after the failing operation is attempted.
pub fn execute(args: &BuildArgs, config: &BuildConfig) -> anyhow::Result<()> {
    let discovery = FsDiscovery::from_config(config);

    if args.dry_run {
        let mut runtime = DryRun::new();
        let summary = Orchestrator::run(config, &discovery, &mut runtime)?;
        for operation in runtime.operations() {
            println!("{operation}");
        }
        println!("{}", crate::output::format_summary(&summary, true));
        return Ok(());
    }

    let mut runtime = DockerCli::locate(&config.core.runtime, config.logging.level.is_verbose())?;
    let summary = Orchestrator::run(config, &discovery, &mut runtime)?;
    println!("{}", crate::output::format_summary(&summary, false));
    Ok(())
}
