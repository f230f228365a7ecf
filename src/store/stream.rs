use std::sync::Arc;
use std::time::Duration;

use eventsource_stream::Eventsource;
use futures::StreamExt;
use k8s_openapi::api::certificates::v1::CertificateSigningRequest;
use thiserror::Error;
use tokio::sync::{watch, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, field, info, instrument, warn, Span};

use crate::api::cluster_deployment::ClusterDeployment;
use crate::api::managed_cluster::ManagedCluster;
use crate::api::managed_cluster_info::ManagedClusterInfo;
use crate::api::provider_connection::{ProviderConnection, CLOUD_CONNECTION_LABEL};
use crate::api::Resource;
use crate::client::{Client, ListOptions, ResourceResult};
use crate::metrics::Metrics;
use crate::state::Diagnostics;

use super::{SyncStore, WatchMessage};

static RECONNECT_MIN_DELAY: Duration = Duration::from_secs(1);
static RECONNECT_MAX_DELAY: Duration = Duration::from_secs(30);

#[derive(Error, Debug)]
pub enum StreamError {
    #[error("event stream connect failed: {0}")]
    Connect(#[source] reqwest::Error),

    #[error("event stream rejected: http {0}")]
    Rejected(u16),

    #[error("event stream transport failed: {0}")]
    Transport(#[from] eventsource_stream::EventStreamError<reqwest::Error>),
}

pub type StreamResult<T> = std::result::Result<T, StreamError>;

/// Owns the store and keeps it fed from the backend event stream.
///
/// One connection at a time. Every (re)connection gates the collections
/// behind a fresh snapshot marker and reconciles them from full lists while
/// incoming events queue up; the stream itself stays authoritative.
pub struct SyncEngine {
    client: Client,
    store: SyncStore,
    metrics: Arc<Metrics>,
    diagnostics: Arc<RwLock<Diagnostics>>,
}

impl SyncEngine {
    pub fn new(
        client: Client,
        store: SyncStore,
        metrics: Arc<Metrics>,
        diagnostics: Arc<RwLock<Diagnostics>>,
    ) -> Self {
        Self {
            client,
            store,
            metrics,
            diagnostics,
        }
    }

    pub fn spawn(self, shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }

    /// Runs until `shutdown` flips, reconnecting with exponential backoff.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        let mut delay = RECONNECT_MIN_DELAY;
        loop {
            tokio::select! {
                _ = shutdown.changed() => break,
                outcome = self.run_connection() => {
                    delay = match outcome {
                        Ok(()) => {
                            info!("event stream closed by server");
                            RECONNECT_MIN_DELAY
                        }
                        Err(error) => {
                            warn!(%error, "event stream failed");
                            (delay * 2).min(RECONNECT_MAX_DELAY)
                        }
                    };
                }
            }
            self.diagnostics.write().await.stream_connected = false;
            self.metrics.stream_reconnects.inc();
            tokio::select! {
                _ = shutdown.changed() => break,
                _ = tokio::time::sleep(delay) => {}
            }
        }
        info!("sync engine stopped");
    }

    #[instrument(skip(self), fields(trace_id))]
    async fn run_connection(&mut self) -> StreamResult<()> {
        Span::current().record(
            "trace_id",
            field::display(crate::telemetry::get_trace_id()),
        );
        let response = self
            .client
            .events_request()
            .send()
            .await
            .map_err(StreamError::Connect)?;
        if !response.status().is_success() {
            return Err(StreamError::Rejected(response.status().as_u16()));
        }
        debug!("event stream connected");
        self.diagnostics.write().await.stream_connected = true;

        self.store.handle(WatchMessage::Start);
        self.seed().await;

        let mut events = response.bytes_stream().eventsource();
        while let Some(event) = events.next().await {
            let event = event?;
            self.process(&event.data).await;
        }
        Ok(())
    }

    async fn process(&mut self, data: &str) {
        match serde_json::from_str::<WatchMessage>(data) {
            Ok(message) => {
                self.diagnostics.write().await.last_event = chrono::Utc::now();
                self.store.handle(message);
            }
            Err(error) => {
                warn!(%error, "failed to decode stream message");
                self.metrics.stream_parse_failures.inc();
            }
        }
    }

    /// Replaces every collection from a full list. A failed list is logged
    /// and skipped; the stream replay converges the collection later.
    async fn seed(&self) {
        fn apply_seed<K: Resource>(result: ResourceResult<Vec<K>>, target: impl FnOnce(Vec<K>)) {
            match result {
                Ok(items) => target(items),
                Err(error) => warn!(%error, kind = K::KIND, "seed list failed"),
            }
        }

        let collections = self.store.collections();
        let (managed, deployments, infos, csrs, connections) = tokio::join!(
            self.client
                .list::<ManagedCluster>(ListOptions::default())
                .promise(),
            self.client
                .list::<ClusterDeployment>(ListOptions::default())
                .promise(),
            self.client
                .list::<ManagedClusterInfo>(ListOptions::default())
                .promise(),
            self.client
                .list::<CertificateSigningRequest>(ListOptions::default())
                .promise(),
            self.client
                .list::<ProviderConnection>(
                    ListOptions::labeled(CLOUD_CONNECTION_LABEL).in_managed_namespaces()
                )
                .promise(),
        );
        apply_seed(managed, |items| collections.seed_managed_clusters(items));
        apply_seed(deployments, |items| {
            collections.seed_cluster_deployments(items)
        });
        apply_seed(infos, |items| collections.seed_cluster_infos(items));
        apply_seed(csrs, |items| collections.seed_certificate_requests(items));
        apply_seed(connections, |items| {
            collections.seed_provider_connections(items)
        });
    }
}
