//! client-manager - Per-user API client and credential lifecycle management
//!
//! This crate provides the concurrent state engine behind a set of
//! independently-authenticated API clients:
//! - Client registry with lazy, race-free construction and a replaceable
//!   constructor hook
//! - Token cache with one expiration watcher per live credential
//!   (refresh-on-expiry, replaced atomically on re-auth)
//! - Auth-event relay between clients and a downstream bridge consumer,
//!   strictly ordered with backpressure
//! - Primary/alternate endpoint failover with a bounded proxy window and
//!   automatic revert
//!
//! All state is in-memory for a single running process. The concrete API
//! client and the reachability prober are consumed through the [`Client`]
//! and [`EndpointProber`] traits.

pub mod auth;
pub mod client;
pub mod config;
pub mod failover;
pub mod manager;
pub mod registry;
mod relay;
#[cfg(test)]
pub mod testutil;
pub mod tokens;

pub use auth::{Auth, ClientAuth};
pub use client::{Client, ClientError, ClientFactory};
pub use config::{Config, ConfigError};
pub use failover::{EndpointProber, FailoverError};
pub use manager::ClientManager;
pub use tokens::TokenCache;
