//! JSON and console summaries of a finished experiment.

use std::fs;
use std::path::Path;

use color_eyre::eyre::{Context, Result};
use serde::Serialize;

use crate::experiment::ExperimentSummary;

/// Write any serializable report as pretty JSON
pub fn write_json_summary<T: Serialize>(report: &T, output_path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(report).context("Failed to serialize summary to JSON")?;

    fs::write(output_path, json)
        .with_context(|| format!("Failed to write JSON summary to {}", output_path.display()))?;

    log::info!("JSON summary written to {}", output_path.display());
    Ok(())
}

/// Print a short human-readable summary to stdout
pub fn print_summary(summary: &ExperimentSummary) {
    println!("{}", "=".repeat(72));
    println!("Honeypot placement experiment: {}", summary.name);
    println!("{}", "=".repeat(72));
    println!("Network:         {}", summary.network.network);
    println!("Vertices/edges:  {}/{}", summary.network.vertices, summary.network.edges);
    println!("Configurations:  {} completed, {} failed", summary.completed, summary.failed);
    println!(
        "Scenario cache:  {} fresh, {} extended, {} reused rollouts",
        summary.cache.fresh, summary.cache.extended, summary.cache.reused
    );
    println!();

    if summary.best.is_empty() {
        println!("No solutions were produced.");
        return;
    }
    println!("{:<44} {:<18} {:>8} {:>8}", "Configuration", "Strategy", "In", "Out");
    println!("{}", "-".repeat(72));
    for row in &summary.best {
        println!(
            "{:<44} {:<18} {:>8.4} {:>8.4}",
            row.configuration, row.strategy, row.in_sample, row.held_out
        );
    }
}
