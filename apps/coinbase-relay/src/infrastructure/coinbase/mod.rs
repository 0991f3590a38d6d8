//! Coinbase Advanced Trade REST adapter.

mod http_client;

pub use http_client::{CoinbaseError, CoinbaseHttpClient};
