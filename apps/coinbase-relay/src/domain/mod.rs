//! Domain Layer
//!
//! Pure request-signing logic with no I/O: canonical JSON, signing
//! requests and credentials, and the relay outcome taxonomy.

pub mod canonical;
pub mod relay;
pub mod signing;
