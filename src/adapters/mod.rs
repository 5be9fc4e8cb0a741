//! External service adapters

pub mod telegram;

pub use telegram::TelegramNotifier;
