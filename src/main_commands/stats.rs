use anyhow::{Context, Result};
use volbot::analysis::VolumeStats;
use volbot::collector::load_dataset;

use super::CommandContext;

/// Volume quartiles and deciles of the dataset, saved next to it
pub(crate) fn run_stats(ctx: &CommandContext) -> Result<()> {
    let rows = load_dataset(&ctx.paths.dataset)
        .with_context(|| format!("loading {}", ctx.paths.dataset.display()))?;
    let volumes: Vec<f64> = rows.iter().map(|r| r.volume).collect();

    let stats = VolumeStats::compute(&volumes)
        .with_context(|| format!("{} has no rows", ctx.paths.dataset.display()))?;
    stats.save(&ctx.paths.stats)?;

    println!("\n{} {} volume ({} rows)", ctx.symbol, ctx.interval, volumes.len());
    for (name, value) in stats.columns() {
        println!("  {:<4} {:>16.5}", name, value);
    }
    println!("\nSaved to {}", ctx.paths.stats.display());
    Ok(())
}
