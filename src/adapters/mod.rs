//! Infrastructure adapters. Implement outbound ports.
//!
//! Battle.net HTTP gateway, SQLite persistence. Map errors to DomainError.

pub mod battlenet;
pub mod persistence;
