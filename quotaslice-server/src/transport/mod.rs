//! Transport layer implementations for the quota server
//!
//! All transports implement the [`Transport`] trait and share the same
//! quota state through the actor handle.
//!
//! # Available Transports
//!
//! - [`http`]: REST API with JSON

pub mod http;

#[cfg(test)]
mod http_test;

use crate::actor::QuotaHandle;
use anyhow::Result;
use async_trait::async_trait;

/// Common interface for all transport implementations
///
/// Each transport is responsible for:
/// - Accepting client connections
/// - Parsing protocol-specific requests
/// - Forwarding requests to the quota actor
/// - Sending responses back to clients
#[async_trait]
pub trait Transport {
    /// Start the transport server
    ///
    /// Runs until an error occurs or the server shuts down.
    async fn start(self, quotas: QuotaHandle) -> Result<()>;
}
