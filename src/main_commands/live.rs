use std::sync::Arc;

use anyhow::{Context, Result};
use volbot::adapters::TelegramNotifier;
use volbot::collector::{BinanceClient, BinanceLiveFeed};
use volbot::coordination::Shutdown;
use volbot::rl::{LiveDriver, QLearningAgent, TradingAccount};

use super::CommandContext;

/// Run the online agent until Ctrl-C
pub(crate) async fn run_live(ctx: &CommandContext, balance: Option<f64>) -> Result<()> {
    let balance = balance.unwrap_or(ctx.config.account.live_initial_balance);
    let live = &ctx.config.live;

    let client = BinanceClient::new(&live.api_base_url)?;
    let feed = Arc::new(BinanceLiveFeed::new(client, &ctx.symbol, live.order_book_depth));
    let alerts = Arc::new(TelegramNotifier::from_config(&ctx.config.alerts));

    let shutdown = Shutdown::new();
    shutdown.listen_for_ctrl_c();

    let agent = QLearningAgent::load(ctx.config.agent.clone(), &ctx.paths.q_table);
    let account = TradingAccount::new(balance, ctx.config.account.fee_rate);

    let mut driver = LiveDriver::new(
        agent,
        account,
        ctx.paths.clone(),
        feed,
        alerts,
        live.settings(),
        shutdown,
    )
    .with_context(|| format!("opening {}", ctx.paths.decision_log.display()))?;

    println!("Running {} live agent (Ctrl-C to stop)...", ctx.symbol);
    let summary = driver.run().await?;

    println!(
        "\n{} ticks, {} trades, reward {:.2}, balance {:.2}, position {:.5}",
        summary.ticks,
        summary.trades,
        summary.total_reward,
        summary.final_balance,
        summary.final_position
    );
    if let Some(path) = summary.snapshot {
        println!("Q-table snapshot saved to {}", path.display());
    }
    println!("Session trades in {}", ctx.paths.live_trade_log.display());
    Ok(())
}
