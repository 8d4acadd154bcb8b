//! Formatted output helpers for CLI commands.

use std::fmt::Write as _;
use std::time::Duration;

use kiln_common::config::BuildConfig;
use kiln_orchestrator::{BuildPlan, ExecutionSummary};

use crate::commands::graph::GraphNode;

/// Formats a duration for humans (e.g., "850 ms", "12.4 s", "3m 05s").
#[must_use]
pub fn format_duration(duration: Duration) -> String {
    let millis = duration.as_millis();
    if millis < 1_000 {
        format!("{millis} ms")
    } else if millis < 60_000 {
        format!("{}.{} s", millis / 1_000, (millis % 1_000) / 100)
    } else {
        let secs = duration.as_secs();
        format!("{}m {:02}s", secs / 60, secs % 60)
    }
}

/// One-line summary of a finished run.
#[must_use]
pub fn format_summary(summary: &ExecutionSummary, dry_run: bool) -> String {
    let mut line = format!(
        "{} pulled, {} built, {} pushed",
        summary.pulled, summary.built, summary.pushed
    );
    if dry_run {
        line.push_str(" (dry run)");
    } else {
        let _ = write!(line, " in {}", format_duration(summary.elapsed));
    }
    line
}

/// Renders a build plan as the pull list followed by the build list.
#[must_use]
pub fn render_plan(plan: &BuildPlan, config: &BuildConfig) -> String {
    let mut out = String::new();
    if plan.remote.is_empty() {
        out.push_str("Pull: (nothing)\n");
    } else {
        out.push_str("Pull:\n");
        for name in &plan.remote {
            let _ = writeln!(out, "  - {name}");
        }
    }
    if plan.local.is_empty() {
        out.push_str("Build: (nothing)\n");
    } else {
        out.push_str("Build:\n");
        for (i, name) in plan.local.iter().enumerate() {
            let _ = writeln!(out, "  {}. {name}", i + 1);
        }
    }
    if config.core.push && !plan.local.is_empty() {
        let _ = writeln!(out, "Push to: {}", config.registries.join(", "));
    }
    out
}

/// Renders graph nodes, one per line, with their dependencies indented.
#[must_use]
pub fn render_graph(nodes: &[GraphNode<'_>]) -> String {
    let mut out = String::new();
    for node in nodes {
        let kind = if node.local { "local" } else { "remote" };
        let _ = writeln!(out, "{} ({kind})", node.name);
        for dependency in &node.dependencies {
            let _ = writeln!(out, "  -> {dependency}");
        }
    }
    out
}
