use thiserror::Error;

/// Main error type for the trading agent
#[derive(Error, Debug)]
pub enum VolbotError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    // Network errors
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Exchange API error: {status} - {body}")]
    ExchangeApi { status: u16, body: String },

    // Serialization errors
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    // Market data errors
    #[error("Invalid market data: {0}")]
    InvalidMarketData(String),

    #[error("Malformed dataset {path} at line {line}: {reason}")]
    Dataset {
        path: String,
        line: usize,
        reason: String,
    },

    // Persistence errors
    #[error("Q-table format error: {0}")]
    QTableFormat(String),

    // Validation errors
    #[error("Validation failed: {0}")]
    Validation(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Generic errors
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

/// Result type alias for VolbotError
pub type Result<T> = std::result::Result<T, VolbotError>;

impl VolbotError {
    /// Whether the live loop should log and retry instead of stopping
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            VolbotError::Http(_) | VolbotError::ExchangeApi { .. } | VolbotError::InvalidMarketData(_)
        )
    }
}
