pub mod client;

pub use client::BattlenetGateway;
