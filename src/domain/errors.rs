//! Domain errors. Used by ports and use cases.
//!
//! Adapters map infrastructure errors into these.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Battle.net gateway error: {0}")]
    Gateway(String),

    #[error("Store error: {0}")]
    Store(String),

    /// Response body did not match the expected payload shape.
    #[error("Payload decode failed: {0}")]
    Decode(String),

    #[error("Configuration error: {0}")]
    Config(String),
}
