//! `kiln plan` — Show which images would be pulled and built, in order.

use clap::Args;
use kiln_common::config::BuildConfig;
use kiln_image::FsDiscovery;
use kiln_orchestrator::Orchestrator;

use super::Selection;

/// Arguments for the `plan` command.
#[derive(Args, Debug)]
pub struct PlanArgs {
    /// Images to plan and whether to include their dependents.
    #[command(flatten)]
    pub selection: Selection,

    /// Print the plan as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Executes the `plan` command.
///
/// Indexes images, resolves the order, and prints the pull and build
/// lists without touching the container runtime.
///
/// # Errors
///
/// Returns an error if discovery or resolution fails.
pub fn execute(args: &PlanArgs, config: &BuildConfig) -> anyhow::Result<()> {
    let orchestrator = Orchestrator::index(&FsDiscovery::from_config(config))?;
    let plan = orchestrator.plan(&config.images, config.core.downstream)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
    } else {
        print!("{}", crate::output::render_plan(&plan, config));
    }
    Ok(())
}
