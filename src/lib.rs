use thiserror::Error;

use crate::actions::{DiscoveryError, ImportError, UpgradeError};
use crate::api::provider_connection::ConnectionError;
use crate::client::ResourceError;
use crate::store::stream::StreamError;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Resource error: {0}")]
    Resource(#[from] ResourceError),

    #[error("Event stream error: {0}")]
    Stream(#[from] StreamError),

    #[error("Import error: {0}")]
    Import(#[from] ImportError),

    #[error("Upgrade error: {0}")]
    Upgrade(#[from] UpgradeError),

    #[error("Discovery error: {0}")]
    Discovery(#[from] DiscoveryError),

    #[error("Credential error: {0}")]
    Connection(#[from] ConnectionError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Cluster lifecycle operations
pub mod actions;
/// Typed hub resources and the identity trait the client builds paths from
pub mod api;
pub mod client;
pub mod cluster;
pub mod config;
pub mod query;
/// Shared state between the sync engine and the web server
pub mod state;
pub mod store;

/// Log and trace integrations
pub mod telemetry;

/// Metrics
mod metrics;
pub use client::Client;
pub use metrics::Metrics;
pub use state::State;
