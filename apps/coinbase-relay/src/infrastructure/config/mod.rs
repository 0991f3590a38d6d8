//! Configuration Module
//!
//! Configuration loading for the relay service.

mod settings;

pub use settings::{CoinbaseSettings, ConfigError, RelayConfig, ServerSettings};
