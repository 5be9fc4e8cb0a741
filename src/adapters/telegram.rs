//! Telegram bot notifications
//!
//! Sends live trade alerts to a Telegram chat. Delivery failures are logged
//! and never reach the trading loop.

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::config::AlertConfig;
use crate::rl::integration::AlertSink;

pub const TELEGRAM_API_URL: &str = "https://api.telegram.org";

const SEND_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
struct Credentials {
    token: String,
    chat_id: String,
}

/// Telegram notification client
#[derive(Debug, Clone)]
pub struct TelegramNotifier {
    client: Client,
    api_url: String,
    /// `None` when token or chat id is missing; messages are only logged
    credentials: Option<Credentials>,
}

#[derive(Serialize)]
struct TelegramMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'a str,
}

impl TelegramNotifier {
    /// Create from the alert configuration
    pub fn from_config(config: &AlertConfig) -> Self {
        let credentials = match (&config.telegram_token, &config.telegram_chat_id) {
            (Some(token), Some(chat_id)) if !token.is_empty() && !chat_id.is_empty() => {
                info!("Telegram notifications enabled");
                Some(Credentials {
                    token: token.clone(),
                    chat_id: chat_id.clone(),
                })
            }
            _ => {
                warn!("Telegram token or chat id not configured, alerts will only be logged");
                None
            }
        };

        Self {
            client: Client::builder()
                .timeout(SEND_TIMEOUT)
                .build()
                .unwrap_or_default(),
            api_url: TELEGRAM_API_URL.to_string(),
            credentials,
        }
    }

    /// Point at a different Bot API host
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.credentials.is_some()
    }

    /// Send a Markdown message
    pub async fn send_message(&self, text: &str) -> Result<(), String> {
        let Some(credentials) = &self.credentials else {
            return Err("Telegram not configured".to_string());
        };

        let url = format!("{}/bot{}/sendMessage", self.api_url, credentials.token);
        let message = TelegramMessage {
            chat_id: &credentials.chat_id,
            text,
            parse_mode: "Markdown",
        };

        match self.client.post(&url).json(&message).send().await {
            Ok(resp) => {
                if resp.status().is_success() {
                    debug!("Telegram notification sent successfully");
                    Ok(())
                } else {
                    let status = resp.status();
                    let body = resp.text().await.unwrap_or_default();
                    Err(format!("HTTP {}: {}", status, body))
                }
            }
            Err(e) => Err(e.to_string()),
        }
    }
}

#[async_trait]
impl AlertSink for TelegramNotifier {
    async fn notify(&self, message: &str) {
        if !self.is_enabled() {
            info!("Alert (not delivered): {}", message.replace('\n', " | "));
            return;
        }
        if let Err(e) = self.send_message(message).await {
            error!("Failed to send Telegram alert: {}", e);
        }
    }
}
