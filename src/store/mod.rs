use std::sync::Arc;

use k8s_openapi::api::certificates::v1::CertificateSigningRequest;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::api::cluster_deployment::ClusterDeployment;
use crate::api::managed_cluster::ManagedCluster;
use crate::api::managed_cluster_info::ManagedClusterInfo;
use crate::api::provider_connection::{ProviderConnection, CLOUD_CONNECTION_LABEL};
use crate::api::Resource;
use crate::cluster::{map_clusters, Cluster};
use crate::metrics::Metrics;

pub mod session;
pub mod stream;

/// Wire form of one message on the event stream.
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(tag = "type", rename_all = "UPPERCASE")]
pub enum WatchMessage {
    Added { object: Value },
    Modified { object: Value },
    Deleted { object: Value },
    /// The server finished sending its current snapshot.
    Loaded,
    /// The server restarted its watch; a fresh snapshot follows.
    Start,
}

/// A stream object decoded into one of the kinds the store mirrors.
#[derive(Clone, Debug)]
pub enum KindedObject {
    ManagedCluster(ManagedCluster),
    ClusterDeployment(ClusterDeployment),
    ManagedClusterInfo(ManagedClusterInfo),
    CertificateSigningRequest(CertificateSigningRequest),
    ProviderConnection(ProviderConnection),
}

impl KindedObject {
    /// Decodes a stream payload. Untracked kinds, and secrets without the
    /// credential label, decode to `None`.
    pub fn from_value(object: Value) -> Result<Option<Self>, serde_json::Error> {
        let kind = object
            .get("kind")
            .and_then(Value::as_str)
            .unwrap_or_default();
        let decoded = if kind == ManagedCluster::KIND {
            Some(Self::ManagedCluster(serde_json::from_value(object)?))
        } else if kind == ClusterDeployment::KIND {
            Some(Self::ClusterDeployment(serde_json::from_value(object)?))
        } else if kind == ManagedClusterInfo::KIND {
            Some(Self::ManagedClusterInfo(serde_json::from_value(object)?))
        } else if kind == CertificateSigningRequest::KIND {
            Some(Self::CertificateSigningRequest(serde_json::from_value(
                object,
            )?))
        } else if kind == ProviderConnection::KIND {
            let secret: ProviderConnection = serde_json::from_value(object)?;
            if secret.label(CLOUD_CONNECTION_LABEL).is_some() {
                Some(Self::ProviderConnection(secret))
            } else {
                None
            }
        } else {
            None
        };
        Ok(decoded)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::ManagedCluster(_) => ManagedCluster::KIND,
            Self::ClusterDeployment(_) => ClusterDeployment::KIND,
            Self::ManagedClusterInfo(_) => ManagedClusterInfo::KIND,
            Self::CertificateSigningRequest(_) => CertificateSigningRequest::KIND,
            Self::ProviderConnection(_) => ProviderConnection::KIND,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventAction {
    Upsert,
    Delete,
}

impl EventAction {
    fn metric_label(&self) -> &'static str {
        match self {
            Self::Upsert => "upsert",
            Self::Delete => "delete",
        }
    }
}

/// Reactive mirror of one resource kind, fanned out over a watch channel.
pub struct Collection<K> {
    tx: watch::Sender<Vec<K>>,
}

impl<K: Resource> Collection<K> {
    fn new() -> Self {
        Self {
            tx: watch::channel(Vec::new()).0,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<Vec<K>> {
        self.tx.subscribe()
    }

    /// Snapshot of the current items.
    pub fn current(&self) -> Vec<K> {
        self.tx.borrow().clone()
    }

    fn apply(&self, action: EventAction, resource: K) {
        match action {
            EventAction::Upsert => self.upsert(resource),
            EventAction::Delete => self.remove(&resource.name_any(), resource.namespace().as_deref()),
        }
    }

    /// Replaces the entry with the same `(name, namespace)`, or appends.
    /// Collection order is not significant.
    fn upsert(&self, resource: K) {
        self.tx.send_modify(|items| {
            let name = resource.name_any();
            let namespace = resource.namespace();
            match items
                .iter_mut()
                .find(|existing| existing.name_any() == name && existing.namespace() == namespace)
            {
                Some(existing) => *existing = resource,
                None => items.push(resource),
            }
        });
    }

    fn remove(&self, name: &str, namespace: Option<&str>) {
        self.tx.send_modify(|items| {
            if let Some(index) = items.iter().position(|existing| {
                existing.name_any() == name && existing.namespace().as_deref() == namespace
            }) {
                items.remove(index);
            }
        });
    }

    fn replace_all(&self, items: Vec<K>) {
        self.tx.send_replace(items);
    }
}

/// The full set of mirrored collections handed out to readers.
pub struct Collections {
    pub managed_clusters: Collection<ManagedCluster>,
    pub cluster_deployments: Collection<ClusterDeployment>,
    pub cluster_infos: Collection<ManagedClusterInfo>,
    pub certificate_requests: Collection<CertificateSigningRequest>,
    pub provider_connections: Collection<ProviderConnection>,
}

impl Collections {
    fn new() -> Self {
        Self {
            managed_clusters: Collection::new(),
            cluster_deployments: Collection::new(),
            cluster_infos: Collection::new(),
            certificate_requests: Collection::new(),
            provider_connections: Collection::new(),
        }
    }

    fn apply(&self, action: EventAction, object: KindedObject) {
        match object {
            KindedObject::ManagedCluster(resource) => self.managed_clusters.apply(action, resource),
            KindedObject::ClusterDeployment(resource) => {
                self.cluster_deployments.apply(action, resource)
            }
            KindedObject::ManagedClusterInfo(resource) => {
                self.cluster_infos.apply(action, resource)
            }
            KindedObject::CertificateSigningRequest(resource) => {
                self.certificate_requests.apply(action, resource)
            }
            KindedObject::ProviderConnection(resource) => {
                self.provider_connections.apply(action, resource)
            }
        }
    }

    pub(crate) fn seed_managed_clusters(&self, items: Vec<ManagedCluster>) {
        self.managed_clusters.replace_all(items);
    }

    pub(crate) fn seed_cluster_deployments(&self, items: Vec<ClusterDeployment>) {
        self.cluster_deployments.replace_all(items);
    }

    pub(crate) fn seed_cluster_infos(&self, items: Vec<ManagedClusterInfo>) {
        self.cluster_infos.replace_all(items);
    }

    pub(crate) fn seed_certificate_requests(&self, items: Vec<CertificateSigningRequest>) {
        self.certificate_requests.replace_all(items);
    }

    pub(crate) fn seed_provider_connections(&self, items: Vec<ProviderConnection>) {
        self.provider_connections.replace_all(items);
    }

    /// Current cluster view models joined from the mirrored kinds.
    pub fn clusters(&self) -> Vec<Cluster> {
        map_clusters(
            &self.cluster_deployments.current(),
            &self.cluster_infos.current(),
            &self.certificate_requests.current(),
            &self.managed_clusters.current(),
        )
    }

    /// Item counts per collection, for diagnostics.
    pub fn counts(&self) -> CollectionCounts {
        CollectionCounts {
            managed_clusters: self.managed_clusters.tx.borrow().len(),
            cluster_deployments: self.cluster_deployments.tx.borrow().len(),
            cluster_infos: self.cluster_infos.tx.borrow().len(),
            certificate_requests: self.certificate_requests.tx.borrow().len(),
            provider_connections: self.provider_connections.tx.borrow().len(),
        }
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionCounts {
    pub managed_clusters: usize,
    pub cluster_deployments: usize,
    pub cluster_infos: usize,
    pub certificate_requests: usize,
    pub provider_connections: usize,
}

/// Gate in front of the collections: buffer during snapshot transfer, apply
/// live afterwards.
#[derive(Debug)]
enum Phase {
    Buffering { queue: Vec<BufferedEvent> },
    Live,
}

#[derive(Debug)]
struct BufferedEvent {
    action: EventAction,
    object: KindedObject,
}

pub struct SyncStore {
    collections: Arc<Collections>,
    phase: Phase,
    loading: watch::Sender<bool>,
    metrics: Arc<Metrics>,
}

impl SyncStore {
    pub fn new(metrics: Arc<Metrics>) -> Self {
        Self {
            collections: Arc::new(Collections::new()),
            phase: Phase::Buffering { queue: Vec::new() },
            loading: watch::channel(true).0,
            metrics,
        }
    }

    pub fn collections(&self) -> Arc<Collections> {
        self.collections.clone()
    }

    /// `true` until the first complete snapshot has been applied. Later
    /// snapshot replays do not raise it again.
    pub fn loading(&self) -> watch::Receiver<bool> {
        self.loading.subscribe()
    }

    /// Feeds one stream message through the phase machine.
    pub fn handle(&mut self, message: WatchMessage) {
        match message {
            WatchMessage::Start => {
                // Anything buffered belonged to an abandoned snapshot.
                self.phase = Phase::Buffering { queue: Vec::new() };
            }
            WatchMessage::Loaded => {
                if let Phase::Buffering { queue } =
                    std::mem::replace(&mut self.phase, Phase::Live)
                {
                    for event in queue {
                        self.apply(event.action, event.object);
                    }
                }
                self.loading
                    .send_if_modified(|loading| std::mem::replace(loading, false));
            }
            WatchMessage::Added { object } | WatchMessage::Modified { object } => {
                self.ingest(EventAction::Upsert, object);
            }
            WatchMessage::Deleted { object } => {
                self.ingest(EventAction::Delete, object);
            }
        }
    }

    fn ingest(&mut self, action: EventAction, object: Value) {
        match KindedObject::from_value(object) {
            Ok(Some(object)) => match &mut self.phase {
                Phase::Buffering { queue } => queue.push(BufferedEvent { action, object }),
                Phase::Live => self.apply(action, object),
            },
            Ok(None) => debug!("ignoring event for untracked object"),
            Err(error) => {
                warn!(%error, "failed to decode stream object");
                self.metrics.stream_parse_failures.inc();
            }
        }
    }

    fn apply(&self, action: EventAction, object: KindedObject) {
        self.metrics
            .events_applied
            .with_label_values(&[object.kind(), action.metric_label()])
            .inc();
        self.collections.apply(action, object);
    }
}
