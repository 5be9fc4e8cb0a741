use anyhow::{bail, Context, Result};
use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};
use tracing::info;
use volbot::collector::{merge_into, BinanceClient};

use super::CommandContext;

/// Download `[start, end)` K-lines and merge them into the dataset
pub(crate) async fn run_fetch(ctx: &CommandContext, start: NaiveDate, end: NaiveDate) -> Result<()> {
    if start >= end {
        bail!("start date {} must be before end date {}", start, end);
    }
    let start = Utc.from_utc_datetime(&start.and_time(NaiveTime::default()));
    let end = Utc.from_utc_datetime(&end.and_time(NaiveTime::default()));

    info!(
        "Fetching {} {} K-lines from {} to {}",
        ctx.symbol, ctx.interval, start, end
    );

    let client = BinanceClient::new(&ctx.config.live.api_base_url)?;
    let klines = client
        .klines_range(&ctx.symbol, &ctx.interval, start, end)
        .await
        .with_context(|| format!("fetching K-lines for {}", ctx.symbol))?;

    let rows = klines.iter().map(|k| k.to_observation()).collect();
    let added = merge_into(&ctx.paths.dataset, rows)
        .with_context(|| format!("writing {}", ctx.paths.dataset.display()))?;

    println!(
        "{} new rows saved to {}",
        added,
        ctx.paths.dataset.display()
    );
    Ok(())
}
