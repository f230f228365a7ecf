use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{watch, RwLock};

use crate::cluster::Cluster;
use crate::store::{CollectionCounts, Collections};

/// Diagnostics exposed by the web server.
#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostics {
    pub last_event: DateTime<Utc>,
    pub stream_connected: bool,
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self {
            last_event: Utc::now(),
            stream_connected: false,
        }
    }
}

/// Snapshot served by the diagnostics endpoint.
#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusReport {
    #[serde(flatten)]
    pub diagnostics: Diagnostics,
    pub loading: bool,
    pub collections: CollectionCounts,
}

/// State shared between the sync engine and the web server.
#[derive(Clone)]
pub struct State {
    /// Diagnostics populated by the sync engine
    diagnostics: Arc<RwLock<Diagnostics>>,
    /// Metrics registry
    registry: prometheus::Registry,
    /// Collections mirrored by the sync store
    collections: Arc<Collections>,
    loading: watch::Receiver<bool>,
}

impl State {
    pub fn new(
        registry: prometheus::Registry,
        collections: Arc<Collections>,
        loading: watch::Receiver<bool>,
    ) -> Self {
        Self {
            diagnostics: Arc::new(RwLock::new(Diagnostics::default())),
            registry,
            collections,
            loading,
        }
    }

    /// Handle the sync engine writes through.
    pub fn diagnostics_handle(&self) -> Arc<RwLock<Diagnostics>> {
        self.diagnostics.clone()
    }

    pub async fn diagnostics(&self) -> Diagnostics {
        self.diagnostics.read().await.clone()
    }

    pub async fn report(&self) -> StatusReport {
        StatusReport {
            diagnostics: self.diagnostics().await,
            loading: self.loading(),
            collections: self.collections.counts(),
        }
    }

    pub fn metrics(&self) -> Vec<prometheus::proto::MetricFamily> {
        self.registry.gather()
    }

    /// Current cluster views joined from the live collections.
    pub fn clusters(&self) -> Vec<Cluster> {
        self.collections.clusters()
    }

    /// `true` until the store has applied its first snapshot.
    pub fn loading(&self) -> bool {
        *self.loading.borrow()
    }
}
