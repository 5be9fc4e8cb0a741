use clap::Parser;
use tracing::error;
use volbot::cli::{Cli, Commands};
use volbot::config::AppConfig;
use volbot::error::{Result, VolbotError};

mod main_commands;
mod main_runtime;

use main_commands::CommandContext;
use main_runtime::{init_logging, init_logging_simple};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load_from(&cli.config)?;
    if let Err(errors) = config.validate() {
        for e in &errors {
            eprintln!("config: {}", e);
        }
        return Err(VolbotError::Validation(errors.join("; ")));
    }

    match &cli.command {
        Commands::Stats | Commands::Book { .. } => init_logging_simple(),
        _ => init_logging(&config.paths.log_dir, &config.logging),
    }

    let ctx = CommandContext::new(config, &cli.symbol, &cli.interval);
    let result = match &cli.command {
        Commands::Fetch { start, end } => main_commands::fetch::run_fetch(&ctx, *start, *end).await,
        Commands::Stats => main_commands::stats::run_stats(&ctx),
        Commands::Train { episodes } => main_commands::train::run_train(&ctx, *episodes).await,
        Commands::Live { balance } => main_commands::live::run_live(&ctx, *balance).await,
        Commands::Watch {
            column,
            every,
            depth,
            until,
        } => main_commands::watch::run_watch(&ctx, column, *every, *depth, *until).await,
        Commands::Book { depth } => main_commands::watch::show_order_book(&ctx, *depth).await,
    };

    if let Err(e) = &result {
        error!("{:#}", e);
    }
    result.map_err(VolbotError::from)
}
