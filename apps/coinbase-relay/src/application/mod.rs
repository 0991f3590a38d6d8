//! Application Layer
//!
//! Use cases orchestrating the signer and the outbound gateway.

pub mod ports;
pub mod use_cases;
