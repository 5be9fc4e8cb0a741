use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::collector::binance_rest::{BINANCE_API_URL, VALID_DEPTH_LIMITS};
use crate::persistence::SymbolPaths;
use crate::rl::config::QLearningConfig;
use crate::rl::integration::LiveSettings;

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub agent: QLearningConfig,
    pub account: AccountConfig,
    pub paths: PathsConfig,
    pub live: LiveConfig,
    #[serde(default)]
    pub alerts: AlertConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AccountConfig {
    /// Starting balance for every replay episode
    pub initial_balance: f64,
    /// Starting balance for a live session
    pub live_initial_balance: f64,
    /// Proportional fee charged on each fill (e.g., 0.001 = 0.1%)
    pub fee_rate: f64,
}

impl Default for AccountConfig {
    fn default() -> Self {
        Self {
            initial_balance: 10_000.0,
            live_initial_balance: 1_000.0,
            fee_rate: 0.001,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PathsConfig {
    /// Directory for Q-tables, decision logs and trade logs
    pub log_dir: PathBuf,
    /// Directory for historical datasets and their statistics
    pub data_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            log_dir: PathBuf::from("logs"),
            data_dir: PathBuf::from("data"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LiveConfig {
    /// Binance public REST endpoint
    pub api_base_url: String,
    /// Minimum seconds between two ticks
    pub poll_interval_secs: u64,
    /// Order book levels requested per tick
    pub order_book_depth: u32,
    /// Save the Q-table every N ticks (0 = only on interrupt)
    pub checkpoint_every_ticks: u64,
}

impl Default for LiveConfig {
    fn default() -> Self {
        Self {
            api_base_url: BINANCE_API_URL.to_string(),
            poll_interval_secs: 5,
            order_book_depth: 5,
            checkpoint_every_ticks: 100,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AlertConfig {
    /// Telegram bot token (falls back to TELEGRAM_TOKEN)
    #[serde(default)]
    pub telegram_token: Option<String>,
    /// Telegram chat id (falls back to TELEGRAM_CHAT_ID)
    #[serde(default)]
    pub telegram_chat_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Enable JSON formatted logs
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl AppConfig {
    /// Load configuration from a specific directory
    pub fn load_from<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();
        let defaults = Self::default_config();

        let builder = Config::builder()
            // Start with default values
            .set_default("agent.epsilon", defaults.agent.epsilon)?
            .set_default("agent.epsilon_min", defaults.agent.epsilon_min)?
            .set_default("agent.epsilon_decay", defaults.agent.epsilon_decay)?
            .set_default("agent.alpha", defaults.agent.alpha)?
            .set_default("agent.gamma", defaults.agent.gamma)?
            .set_default("account.initial_balance", defaults.account.initial_balance)?
            .set_default(
                "account.live_initial_balance",
                defaults.account.live_initial_balance,
            )?
            .set_default("account.fee_rate", defaults.account.fee_rate)?
            .set_default("paths.log_dir", "logs")?
            .set_default("paths.data_dir", "data")?
            .set_default("live.api_base_url", defaults.live.api_base_url.clone())?
            .set_default("live.poll_interval_secs", defaults.live.poll_interval_secs)?
            .set_default("live.order_book_depth", defaults.live.order_book_depth as u64)?
            .set_default(
                "live.checkpoint_every_ticks",
                defaults.live.checkpoint_every_ticks,
            )?
            .set_default("logging.level", "info")?
            .set_default("logging.json", false)?
            // Load default config file
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            // Load environment-specific config (e.g., config/production.toml)
            .add_source(
                File::from(config_dir.join(
                    std::env::var("VOLBOT_ENV").unwrap_or_else(|_| "development".to_string()),
                ))
                .required(false),
            )
            // Override with environment variables (VOLBOT_AGENT__ALPHA, etc.)
            .add_source(
                Environment::with_prefix("VOLBOT")
                    .separator("__")
                    .try_parsing(true),
            );

        let mut config: Self = builder.build()?.try_deserialize()?;
        config.alerts.fill_from_env();
        Ok(config)
    }

    /// Built-in defaults, used when no config directory is present
    pub fn default_config() -> Self {
        Self {
            agent: QLearningConfig::default(),
            account: AccountConfig::default(),
            paths: PathsConfig::default(),
            live: LiveConfig::default(),
            alerts: AlertConfig::default(),
            logging: LoggingConfig::default(),
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = self.agent.validate();

        if self.account.fee_rate < 0.0 || self.account.fee_rate >= 1.0 {
            errors.push("fee_rate must be in [0, 1)".to_string());
        }

        if self.account.initial_balance <= 0.0 {
            errors.push("initial_balance must be positive".to_string());
        }

        if self.account.live_initial_balance <= 0.0 {
            errors.push("live_initial_balance must be positive".to_string());
        }

        if self.live.poll_interval_secs < 1 {
            errors.push("poll_interval_secs must be at least 1".to_string());
        }

        if !VALID_DEPTH_LIMITS.contains(&self.live.order_book_depth) {
            errors.push(format!(
                "order_book_depth must be one of {:?}",
                VALID_DEPTH_LIMITS
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

impl PathsConfig {
    /// Artifact paths for one symbol and candle interval
    pub fn for_symbol(&self, symbol: &str, interval: &str) -> SymbolPaths {
        SymbolPaths::resolve(&self.log_dir, &self.data_dir, symbol, interval)
    }
}

impl LiveConfig {
    pub fn settings(&self) -> LiveSettings {
        LiveSettings {
            poll_interval: Duration::from_secs(self.poll_interval_secs),
            checkpoint_every: self.checkpoint_every_ticks,
        }
    }
}

impl AlertConfig {
    fn fill_from_env(&mut self) {
        if self.telegram_token.is_none() {
            self.telegram_token = std::env::var("TELEGRAM_TOKEN").ok();
        }
        if self.telegram_chat_id.is_none() {
            self.telegram_chat_id = std::env::var("TELEGRAM_CHAT_ID").ok();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = AppConfig::default_config();
        assert!(config.validate().is_ok());
        assert_eq!(config.agent.alpha, 0.1);
        assert_eq!(config.agent.gamma, 0.95);
        assert_eq!(config.account.fee_rate, 0.001);
    }

    #[test]
    fn test_validate_collects_every_violation() {
        let mut config = AppConfig::default_config();
        config.account.fee_rate = 1.0;
        config.account.initial_balance = 0.0;
        config.live.poll_interval_secs = 0;
        config.agent.alpha = 0.0;

        let errors = config.validate().unwrap_err();
        assert_eq!(errors.len(), 4);
        assert!(errors.iter().any(|e| e.contains("fee_rate")));
        assert!(errors.iter().any(|e| e.contains("alpha")));
    }

    #[test]
    fn test_load_from_missing_dir_uses_defaults() {
        let dir = std::env::temp_dir().join(format!("volbot-cfg-{}", uuid::Uuid::new_v4()));
        let config = AppConfig::load_from(&dir).unwrap();

        assert_eq!(config.paths.log_dir, PathBuf::from("logs"));
        assert_eq!(config.live.poll_interval_secs, 5);
        assert_eq!(config.agent.epsilon_decay, 0.995);
    }

    #[test]
    fn test_load_from_file_overrides_defaults() {
        let dir = std::env::temp_dir().join(format!("volbot-cfg-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join("default.toml"),
            "[agent]\nalpha = 0.25\n\n[paths]\nlog_dir = \"/tmp/volbot-logs\"\n",
        )
        .unwrap();

        let config = AppConfig::load_from(&dir).unwrap();
        assert_eq!(config.agent.alpha, 0.25);
        assert_eq!(config.agent.gamma, 0.95);
        assert_eq!(config.paths.log_dir, PathBuf::from("/tmp/volbot-logs"));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_symbol_paths_and_live_settings() {
        let config = AppConfig::default_config();
        let paths = config.paths.for_symbol("SOLUSDT", "1h");
        assert_eq!(paths.q_table, PathBuf::from("logs/SOLUSDT_q_table.json"));
        assert_eq!(paths.stats, PathBuf::from("data/SOLUSDT_1h_stat.csv"));

        let settings = config.live.settings();
        assert_eq!(settings.poll_interval, Duration::from_secs(5));
        assert_eq!(settings.checkpoint_every, 100);
    }
}
