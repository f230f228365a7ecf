//! Cluster lifecycle operations composed over the resource client.
//!
//! Each operation owns its error type; transport and API failures flow
//! through as [`ResourceError`], application-level rules get their own
//! variants so callers can present them distinctly.

use std::collections::BTreeMap;
use std::time::Duration;

use k8s_openapi::api::authorization::v1::ResourceAttributes;
use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::ByteString;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::api::cluster_curator::ClusterCurator;
use crate::api::cluster_deployment::ClusterDeployment;
use crate::api::cluster_pool::{ClusterClaim, ClusterPool};
use crate::api::discovery_config::{DiscoveryConfig, DISCOVERY_CONFIG_NAME};
use crate::api::klusterlet_addon_config::KlusterletAddonConfig;
use crate::api::managed_cluster::ManagedCluster;
use crate::api::managed_cluster_info::ManagedClusterInfo;
use crate::api::managed_cluster_set::CLUSTER_SET_LABEL;
use crate::api::Resource;
use crate::client::{tolerate, Client, ErrorCode, ResourceError, ResourceResult};

/// Key in the generated import secret holding the klusterlet CRD manifest.
static KLUSTERLET_CRD_KEY: &str = "crds.yaml";
/// Key in the generated import secret holding the import manifest.
static IMPORT_MANIFEST_KEY: &str = "import.yaml";

/// Poll cadence for the generated import secret.
#[derive(Clone, Copy, Debug)]
pub struct ImportRetry {
    pub interval: Duration,
    pub attempts: u32,
}

impl Default for ImportRetry {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(500),
            attempts: 20,
        }
    }
}

#[derive(Error, Debug)]
pub enum ImportError {
    #[error(transparent)]
    Resource(#[from] ResourceError),
    #[error("import secret for {cluster} was not generated after {attempts} attempts")]
    RetriesExhausted { cluster: String, attempts: u32 },
    #[error("import secret for {cluster} is missing the {key} key")]
    IncompleteSecret { cluster: String, key: &'static str },
    #[error("import secret key {key} is not UTF-8")]
    BadEncoding {
        key: &'static str,
        #[source]
        source: std::string::FromUtf8Error,
    },
}

pub type ImportResult<T> = std::result::Result<T, ImportError>;

/// Manifests the operator applies on the target cluster to join it.
#[derive(Clone, Debug, PartialEq)]
pub struct ImportManifests {
    pub klusterlet_crd: String,
    pub import: String,
}

/// Registers a cluster on the hub and waits for the generated import secret.
///
/// The registration pair (`ManagedCluster` accepting the client plus a
/// `KlusterletAddonConfig`) is created first; the import controller then
/// materializes a `<name>-import` secret in the cluster namespace. That
/// generation is asynchronous, so the secret is polled on a fixed interval
/// up to a ceiling rather than waited on open-endedly.
#[instrument(skip(client, labels, retry), fields(cluster = %name))]
pub async fn import_cluster(
    client: &Client,
    name: &str,
    labels: BTreeMap<String, String>,
    retry: ImportRetry,
) -> ImportResult<ImportManifests> {
    client
        .create(&ManagedCluster::accepted(name, labels))
        .promise()
        .await?;
    client
        .create(&KlusterletAddonConfig::for_cluster(name))
        .promise()
        .await?;

    let secret_name = format!("{name}-import");
    for attempt in 1..=retry.attempts {
        let found = tolerate(
            client
                .get::<Secret>(Some(name), &secret_name)
                .promise()
                .await,
            &[ErrorCode::NotFound],
        )?;
        match found {
            Some(secret) => {
                info!(attempt, "import secret ready");
                return manifests_from_secret(name, secret);
            }
            None => tokio::time::sleep(retry.interval).await,
        }
    }
    Err(ImportError::RetriesExhausted {
        cluster: name.to_string(),
        attempts: retry.attempts,
    })
}

fn manifests_from_secret(cluster: &str, secret: Secret) -> ImportResult<ImportManifests> {
    let mut data = secret.data.unwrap_or_default();
    Ok(ImportManifests {
        klusterlet_crd: take_manifest(&mut data, cluster, KLUSTERLET_CRD_KEY)?,
        import: take_manifest(&mut data, cluster, IMPORT_MANIFEST_KEY)?,
    })
}

fn take_manifest(
    data: &mut BTreeMap<String, ByteString>,
    cluster: &str,
    key: &'static str,
) -> ImportResult<String> {
    let bytes = data.remove(key).ok_or_else(|| ImportError::IncompleteSecret {
        cluster: cluster.to_string(),
        key,
    })?;
    String::from_utf8(bytes.0).map_err(|source| ImportError::BadEncoding { key, source })
}

/// Removes the cluster from management, leaving the cluster itself running.
/// A registration that is already gone counts as success.
#[instrument(skip(client))]
pub async fn detach_cluster(client: &Client, name: &str) -> ResourceResult<()> {
    client
        .delete_tolerant::<ManagedCluster>(None, name)
        .promise()
        .await?;
    Ok(())
}

/// Detaches the cluster and deprovisions its Hive deployment.
///
/// Both deletes tolerate NotFound so the operation can be retried after a
/// partial failure.
#[instrument(skip(client))]
pub async fn destroy_cluster(client: &Client, name: &str) -> ResourceResult<()> {
    client
        .delete_tolerant::<ManagedCluster>(None, name)
        .promise()
        .await?;
    client
        .delete_tolerant::<ClusterDeployment>(Some(name), name)
        .promise()
        .await?;
    Ok(())
}

#[derive(Error, Debug)]
pub enum UpgradeError {
    #[error(transparent)]
    Resource(#[from] ResourceError),
    #[error("{version} is not an available update for {cluster}")]
    InvalidVersion { cluster: String, version: String },
    #[error("not permitted to create cluster curators in {namespace}")]
    Forbidden { namespace: String },
}

pub type UpgradeResult<T> = std::result::Result<T, UpgradeError>;

/// Starts an upgrade by handing a `ClusterCurator` to the curation operator.
///
/// The requested version must be one the cluster itself advertises, and the
/// session must be allowed to create curators in the cluster namespace; both
/// are rejected before anything is written.
#[instrument(skip(client, info), fields(cluster = %info.name_any()))]
pub async fn upgrade_cluster(
    client: &Client,
    info: &ManagedClusterInfo,
    version: &str,
) -> UpgradeResult<()> {
    let cluster = info.name_any();
    if !info
        .available_updates()
        .iter()
        .any(|candidate| candidate == version)
    {
        return Err(UpgradeError::InvalidVersion {
            cluster,
            version: version.to_string(),
        });
    }

    let allowed = client
        .check_access(ResourceAttributes {
            verb: Some("create".to_string()),
            group: Some("cluster.open-cluster-management.io".to_string()),
            resource: Some(ClusterCurator::PLURAL.to_string()),
            namespace: Some(cluster.clone()),
            ..Default::default()
        })
        .promise()
        .await?;
    if !allowed {
        return Err(UpgradeError::Forbidden { namespace: cluster });
    }

    let curator = ClusterCurator::upgrade(&cluster, version);
    match client.create(&curator).promise().await {
        Ok(_) => Ok(()),
        // A curator left over from an earlier curation; repoint it.
        Err(error) if error.code == ErrorCode::Conflict => {
            let desired = json!({ "spec": curator.spec });
            client
                .patch::<ClusterCurator>(Some(&cluster), &cluster, &desired)
                .promise()
                .await?;
            Ok(())
        }
        Err(error) => Err(error.into()),
    }
}

/// Outcome of a bulk delete. Failures never abort the batch; they are
/// collected per resource name.
#[derive(Debug, Default)]
pub struct BulkResult {
    pub succeeded: usize,
    pub failures: Vec<(String, ResourceError)>,
}

impl BulkResult {
    pub fn all_succeeded(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Deletes a homogeneous batch concurrently, tolerating already-deleted
/// items so a retried batch converges.
#[instrument(skip(client, resources), fields(count = resources.len()))]
pub async fn delete_resources<K: Resource>(client: &Client, resources: &[K]) -> BulkResult {
    let deletes = resources.iter().map(|resource| {
        let name = resource.name_any();
        let namespace = resource.namespace();
        async move {
            let outcome = client
                .delete_tolerant::<K>(namespace.as_deref(), &name)
                .promise()
                .await;
            (name, outcome)
        }
    });

    let mut result = BulkResult::default();
    for (name, outcome) in futures::future::join_all(deletes).await {
        match outcome {
            Ok(_) => result.succeeded += 1,
            Err(error) => {
                warn!(%error, resource = %name, "bulk delete item failed");
                result.failures.push((name, error));
            }
        }
    }
    result
}

#[derive(Error, Debug)]
pub enum DiscoveryError {
    #[error(transparent)]
    Resource(#[from] ResourceError),
    #[error("only one DiscoveryConfig may exist per namespace")]
    AlreadyExists,
}

pub type DiscoveryResult<T> = std::result::Result<T, DiscoveryError>;

/// Creates the discovery singleton for a credential namespace.
#[instrument(skip(client))]
pub async fn create_discovery_config(
    client: &Client,
    namespace: &str,
    credential: &str,
) -> DiscoveryResult<DiscoveryConfig> {
    let existing = tolerate(
        client
            .get::<DiscoveryConfig>(Some(namespace), DISCOVERY_CONFIG_NAME)
            .promise()
            .await,
        &[ErrorCode::NotFound],
    )?;
    if existing.is_some() {
        return Err(DiscoveryError::AlreadyExists);
    }
    Ok(client
        .create(&DiscoveryConfig::new(namespace, credential))
        .promise()
        .await?)
}

/// Claims one running deployment out of a cluster pool.
#[instrument(skip(client, pool), fields(pool = %pool.name_any()))]
pub async fn claim_cluster(
    client: &Client,
    pool: &ClusterPool,
    claim_name: &str,
) -> ResourceResult<ClusterClaim> {
    client
        .create(&ClusterClaim::for_pool(claim_name, pool))
        .promise()
        .await
}

/// Moves a cluster into a managed cluster set, or out of every set when
/// `set` is `None`. A null label value deletes the key under merge-patch
/// semantics.
#[instrument(skip(client))]
pub async fn set_cluster_set(
    client: &Client,
    cluster: &str,
    set: Option<&str>,
) -> ResourceResult<()> {
    let value = match set {
        Some(set) => Value::String(set.to_string()),
        None => Value::Null,
    };
    client
        .patch::<ManagedCluster>(None, cluster, &json!({
            "metadata": { "labels": { CLUSTER_SET_LABEL: value } }
        }))
        .promise()
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use base64::prelude::{Engine, BASE64_STANDARD};
    use serde_json::json;
    use url::Url;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::api::managed_cluster_set::ManagedClusterSet;

    use super::*;

    async fn client_for(server: &MockServer) -> Client {
        Client::new(Url::parse(&server.uri()).unwrap(), None).unwrap()
    }

    fn encoded(text: &str) -> String {
        BASE64_STANDARD.encode(text)
    }

    #[tokio::test]
    async fn import_creates_the_registration_pair_and_returns_manifests() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(
                "/proxy/apis/cluster.open-cluster-management.io/v1/managedclusters",
            ))
            .and(body_partial_json(json!({
                "metadata": { "name": "edge-1" },
                "spec": { "hubAcceptsClient": true },
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "metadata": { "name": "edge-1" },
                "spec": { "hubAcceptsClient": true },
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path(
                "/proxy/apis/agent.open-cluster-management.io/v1/namespaces/edge-1/klusterletaddonconfigs",
            ))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "metadata": { "name": "edge-1", "namespace": "edge-1" },
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/proxy/api/v1/namespaces/edge-1/secrets/edge-1-import"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "metadata": { "name": "edge-1-import", "namespace": "edge-1" },
                "data": {
                    "crds.yaml": encoded("kind: CustomResourceDefinition"),
                    "import.yaml": encoded("kind: Klusterlet"),
                },
            })))
            .mount(&server)
            .await;

        let manifests = import_cluster(
            &client_for(&server).await,
            "edge-1",
            BTreeMap::new(),
            ImportRetry::default(),
        )
        .await
        .unwrap();
        assert_eq!(manifests.klusterlet_crd, "kind: CustomResourceDefinition");
        assert_eq!(manifests.import, "kind: Klusterlet");
    }

    #[tokio::test]
    async fn import_gives_up_after_the_retry_ceiling() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "metadata": { "name": "edge-1" },
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/proxy/api/v1/namespaces/edge-1/secrets/edge-1-import"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "message": "secrets \"edge-1-import\" not found",
            })))
            .expect(3)
            .mount(&server)
            .await;

        let retry = ImportRetry {
            interval: Duration::from_millis(5),
            attempts: 3,
        };
        let error = import_cluster(&client_for(&server).await, "edge-1", BTreeMap::new(), retry)
            .await
            .unwrap_err();
        match error {
            ImportError::RetriesExhausted { cluster, attempts } => {
                assert_eq!(cluster, "edge-1");
                assert_eq!(attempts, 3);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn import_secret_without_manifest_keys_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "metadata": { "name": "edge-1" },
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/proxy/api/v1/namespaces/edge-1/secrets/edge-1-import"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "metadata": { "name": "edge-1-import", "namespace": "edge-1" },
                "data": { "crds.yaml": encoded("kind: CustomResourceDefinition") },
            })))
            .mount(&server)
            .await;

        let error = import_cluster(
            &client_for(&server).await,
            "edge-1",
            BTreeMap::new(),
            ImportRetry::default(),
        )
        .await
        .unwrap_err();
        assert!(matches!(
            error,
            ImportError::IncompleteSecret { key: "import.yaml", .. }
        ));
    }

    #[tokio::test]
    async fn destroy_tolerates_missing_halves() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path(
                "/proxy/apis/cluster.open-cluster-management.io/v1/managedclusters/gone",
            ))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "message": "not found",
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path(
                "/proxy/apis/hive.openshift.io/v1/namespaces/gone/clusterdeployments/gone",
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;

        destroy_cluster(&client_for(&server).await, "gone")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn upgrade_rejects_a_version_the_cluster_does_not_offer() {
        let server = MockServer::start().await;
        let info: ManagedClusterInfo = serde_json::from_value(json!({
            "metadata": { "name": "prod", "namespace": "prod" },
            "status": {
                "distributionInfo": {
                    "type": "OCP",
                    "ocp": { "version": "4.12.1", "availableUpdates": ["4.12.9"] },
                },
            },
        }))
        .unwrap();

        let error = upgrade_cluster(&client_for(&server).await, &info, "9.9.9")
            .await
            .unwrap_err();
        assert!(matches!(error, UpgradeError::InvalidVersion { .. }));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn upgrade_stops_when_access_is_denied() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(
                "/proxy/apis/authorization.k8s.io/v1/selfsubjectaccessreviews",
            ))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "status": { "allowed": false },
            })))
            .expect(1)
            .mount(&server)
            .await;

        let info: ManagedClusterInfo = serde_json::from_value(json!({
            "metadata": { "name": "prod", "namespace": "prod" },
            "status": {
                "distributionInfo": {
                    "type": "OCP",
                    "ocp": { "version": "4.12.1", "availableUpdates": ["4.12.9"] },
                },
            },
        }))
        .unwrap();

        let error = upgrade_cluster(&client_for(&server).await, &info, "4.12.9")
            .await
            .unwrap_err();
        assert!(matches!(error, UpgradeError::Forbidden { .. }));
    }

    #[tokio::test]
    async fn upgrade_creates_the_curator_when_allowed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(
                "/proxy/apis/authorization.k8s.io/v1/selfsubjectaccessreviews",
            ))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "status": { "allowed": true },
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path(
                "/proxy/apis/cluster.open-cluster-management.io/v1beta1/namespaces/prod/clustercurators",
            ))
            .and(body_partial_json(json!({
                "spec": {
                    "desiredCuration": "upgrade",
                    "upgrade": { "desiredUpdate": "4.12.9" },
                },
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "metadata": { "name": "prod", "namespace": "prod" },
            })))
            .expect(1)
            .mount(&server)
            .await;

        let info: ManagedClusterInfo = serde_json::from_value(json!({
            "metadata": { "name": "prod", "namespace": "prod" },
            "status": {
                "distributionInfo": {
                    "type": "OCP",
                    "ocp": { "version": "4.12.1", "availableUpdates": ["4.12.9"] },
                },
            },
        }))
        .unwrap();

        upgrade_cluster(&client_for(&server).await, &info, "4.12.9")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn upgrade_repoints_an_existing_curator_on_conflict() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(
                "/proxy/apis/authorization.k8s.io/v1/selfsubjectaccessreviews",
            ))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "status": { "allowed": true },
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path(
                "/proxy/apis/cluster.open-cluster-management.io/v1beta1/namespaces/prod/clustercurators",
            ))
            .respond_with(ResponseTemplate::new(409).set_body_json(json!({
                "message": "clustercurators.cluster.open-cluster-management.io \"prod\" already exists",
            })))
            .mount(&server)
            .await;
        Mock::given(method("PATCH"))
            .and(path(
                "/proxy/apis/cluster.open-cluster-management.io/v1beta1/namespaces/prod/clustercurators/prod",
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "metadata": { "name": "prod", "namespace": "prod" },
            })))
            .expect(1)
            .mount(&server)
            .await;

        let info: ManagedClusterInfo = serde_json::from_value(json!({
            "metadata": { "name": "prod", "namespace": "prod" },
            "status": {
                "distributionInfo": {
                    "type": "OCP",
                    "ocp": { "version": "4.12.1", "availableUpdates": ["4.12.9"] },
                },
            },
        }))
        .unwrap();

        upgrade_cluster(&client_for(&server).await, &info, "4.12.9")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn bulk_delete_collects_failures_without_aborting() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path(
                "/proxy/apis/cluster.open-cluster-management.io/v1beta1/managedclustersets/ok",
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path(
                "/proxy/apis/cluster.open-cluster-management.io/v1beta1/managedclustersets/already-gone",
            ))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "message": "not found",
            })))
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path(
                "/proxy/apis/cluster.open-cluster-management.io/v1beta1/managedclustersets/locked",
            ))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({
                "message": "denied",
            })))
            .mount(&server)
            .await;

        let sets: Vec<ManagedClusterSet> = ["ok", "already-gone", "locked"]
            .into_iter()
            .map(|name| {
                serde_json::from_value(json!({ "metadata": { "name": name } })).unwrap()
            })
            .collect();

        let result = delete_resources(&client_for(&server).await, &sets).await;
        assert_eq!(result.succeeded, 2);
        assert_eq!(result.failures.len(), 1);
        assert_eq!(result.failures[0].0, "locked");
        assert_eq!(result.failures[0].1.code, ErrorCode::Forbidden);
        assert!(!result.all_succeeded());
    }

    #[tokio::test]
    async fn discovery_config_is_a_singleton() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(
                "/proxy/apis/discovery.open-cluster-management.io/v1alpha1/namespaces/creds/discoveryconfigs/discovery",
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "metadata": { "name": "discovery", "namespace": "creds" },
            })))
            .expect(1)
            .mount(&server)
            .await;

        let error = create_discovery_config(&client_for(&server).await, "creds", "my-credential")
            .await
            .unwrap_err();
        assert!(matches!(error, DiscoveryError::AlreadyExists));
    }

    #[tokio::test]
    async fn discovery_config_is_created_when_absent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(
                "/proxy/apis/discovery.open-cluster-management.io/v1alpha1/namespaces/creds/discoveryconfigs/discovery",
            ))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "message": "not found",
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path(
                "/proxy/apis/discovery.open-cluster-management.io/v1alpha1/namespaces/creds/discoveryconfigs",
            ))
            .and(body_partial_json(json!({
                "metadata": { "name": "discovery", "namespace": "creds" },
                "spec": { "credential": "my-credential" },
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "metadata": { "name": "discovery", "namespace": "creds" },
                "spec": { "credential": "my-credential" },
            })))
            .expect(1)
            .mount(&server)
            .await;

        let config = create_discovery_config(&client_for(&server).await, "creds", "my-credential")
            .await
            .unwrap();
        assert_eq!(config.spec.credential.as_deref(), Some("my-credential"));
    }

    #[tokio::test]
    async fn set_membership_patches_the_label() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path(
                "/proxy/apis/cluster.open-cluster-management.io/v1/managedclusters/prod",
            ))
            .and(body_partial_json(json!({
                "metadata": {
                    "labels": { "cluster.open-cluster-management.io/clusterset": "default" },
                },
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "metadata": { "name": "prod" },
            })))
            .expect(1)
            .mount(&server)
            .await;

        set_cluster_set(&client_for(&server).await, "prod", Some("default"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn claiming_posts_into_the_pool_namespace() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(
                "/proxy/apis/hive.openshift.io/v1/namespaces/pools/clusterclaims",
            ))
            .and(body_partial_json(json!({
                "spec": { "clusterPoolName": "dev-pool" },
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "metadata": { "name": "my-claim", "namespace": "pools" },
                "spec": { "clusterPoolName": "dev-pool" },
            })))
            .expect(1)
            .mount(&server)
            .await;

        let pool: ClusterPool = serde_json::from_value(json!({
            "metadata": { "name": "dev-pool", "namespace": "pools" },
        }))
        .unwrap();
        let claim = claim_cluster(&client_for(&server).await, &pool, "my-claim")
            .await
            .unwrap();
        assert_eq!(claim.spec.cluster_pool_name, "dev-pool");
    }
}
