use anyhow::{Context, Result};
use tracing::info;
use volbot::collector::load_dataset;
use volbot::coordination::Shutdown;
use volbot::rl::{QLearningAgent, ReplayDriver, TradingAccount};

use super::CommandContext;

/// Replay the dataset for `episodes` passes and save the Q-table
pub(crate) async fn run_train(ctx: &CommandContext, episodes: usize) -> Result<()> {
    let rows = load_dataset(&ctx.paths.dataset)
        .with_context(|| format!("loading dataset {}", ctx.paths.dataset.display()))?;

    let agent = QLearningAgent::load(ctx.config.agent.clone(), &ctx.paths.q_table);
    let account = TradingAccount::new(
        ctx.config.account.initial_balance,
        ctx.config.account.fee_rate,
    );

    let shutdown = Shutdown::new();
    let listener = shutdown.listen_for_ctrl_c();

    let mut driver = ReplayDriver::new(agent, account, ctx.paths.clone()).with_shutdown(shutdown);
    let report = tokio::task::spawn_blocking(move || driver.run(&rows, episodes))
        .await
        .context("training task failed")??;
    listener.abort();

    if let Some(best) = report.best_episode() {
        info!(
            "Best episode {}: reward={:.2}, round_trips={}",
            best.episode + 1,
            best.total_reward,
            best.round_trips
        );
    }
    println!(
        "\nTrained {} episodes{} | total reward {:.2}",
        report.episodes.len(),
        if report.cancelled { " (interrupted)" } else { "" },
        report.total_reward()
    );
    println!("Q-table saved to {}", ctx.paths.q_table.display());
    println!("Last trade log in {}", ctx.paths.trade_log.display());
    Ok(())
}
