use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{Local, NaiveTime};
use tokio::signal;
use tracing::{info, warn};
use volbot::adapters::TelegramNotifier;
use volbot::analysis::{check_volume_alert, load_threshold};
use volbot::cli::MIN_WATCH_SECS;
use volbot::collector::{BinanceClient, OrderBook};
use volbot::collector::binance_rest::VALID_DEPTH_LIMITS;
use volbot::rl::AlertSink;

use super::CommandContext;

/// Smallest depth limit Binance accepts that covers `levels`
fn request_limit(levels: u32) -> u32 {
    VALID_DEPTH_LIMITS
        .iter()
        .copied()
        .find(|limit| *limit >= levels)
        .unwrap_or(VALID_DEPTH_LIMITS[VALID_DEPTH_LIMITS.len() - 1])
}

fn print_book(symbol: &str, book: &OrderBook, levels: usize) {
    println!("\n📊 {} order book (top {})", symbol, levels);
    println!("{:>16} {:>16} | {:>16} {:>16}", "BID", "QTY", "ASK", "QTY");
    for i in 0..levels {
        let bid = book.bids.get(i);
        let ask = book.asks.get(i);
        if bid.is_none() && ask.is_none() {
            break;
        }
        println!(
            "{:>16} {:>16} | {:>16} {:>16}",
            bid.map(|l| format!("{:.2}", l.price)).unwrap_or_default(),
            bid.map(|l| format!("{:.5}", l.quantity)).unwrap_or_default(),
            ask.map(|l| format!("{:.2}", l.price)).unwrap_or_default(),
            ask.map(|l| format!("{:.5}", l.quantity)).unwrap_or_default(),
        );
    }
    if let Some(spread) = book.spread() {
        println!("Spread: {:.2}", spread);
    }
}

/// Poll the book and alert when traded volume crosses the stats threshold
pub(crate) async fn run_watch(
    ctx: &CommandContext,
    column: &str,
    every: u64,
    depth: u32,
    until: Option<NaiveTime>,
) -> Result<()> {
    let every = Duration::from_secs(every.max(MIN_WATCH_SECS));
    let threshold = load_threshold(&ctx.paths.stats, column, &ctx.interval).with_context(|| {
        format!(
            "loading {} from {} (run `stats` first)",
            column,
            ctx.paths.stats.display()
        )
    })?;

    let client = BinanceClient::new(&ctx.config.live.api_base_url)?;
    let alerts = TelegramNotifier::from_config(&ctx.config.alerts);
    let limit = request_limit(depth);

    info!(
        "Watching {} every {:?}, threshold {} = {:.5}/s",
        ctx.symbol, every, column, threshold
    );

    loop {
        if let Some(stop_at) = until {
            if Local::now().time() >= stop_at {
                info!("Reached {}, stopping watch", stop_at.format("%H:%M"));
                break;
            }
        }

        let polled = async {
            let book = client.order_book(&ctx.symbol, limit).await?;
            let ticker = client.ticker_24h(&ctx.symbol).await?;
            Ok::<_, volbot::error::VolbotError>((ticker, book))
        }
        .await;

        match polled {
            Ok((ticker, book)) => {
                print_book(&ctx.symbol, &book, depth as usize);
                println!(
                    "Last qty: {:.5} | threshold: {:.5}",
                    ticker.last_qty.unwrap_or(0.0),
                    threshold
                );
                if let Some(alert) = check_volume_alert(&ticker, &book, depth as usize, threshold) {
                    println!("🚨 {} heavy levels", alert.levels.len());
                    alerts.notify(&alert.message()).await;
                }
            }
            Err(e) => warn!("Order book unavailable: {}. Retrying in {:?}", e, every),
        }

        tokio::select! {
            _ = tokio::time::sleep(every) => {}
            _ = signal::ctrl_c() => {
                info!("Received Ctrl+C, stopping watch");
                break;
            }
        }
    }
    Ok(())
}

/// Print the top of the book once
pub(crate) async fn show_order_book(ctx: &CommandContext, depth: u32) -> Result<()> {
    let client = BinanceClient::new(&ctx.config.live.api_base_url)?;
    let book = client
        .order_book(&ctx.symbol, request_limit(depth))
        .await
        .with_context(|| format!("fetching order book for {}", ctx.symbol))?;
    print_book(&ctx.symbol, &book, depth as usize);
    Ok(())
}
