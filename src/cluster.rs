use std::collections::{BTreeMap, HashSet};
use std::fmt;

use k8s_openapi::api::certificates::v1::CertificateSigningRequest;
use serde::{Deserialize, Serialize};

use crate::api::certificate_signing_request::{certificate_issued, csrs_for_cluster, latest_csr};
use crate::api::cluster_deployment::{
    ClusterDeployment, DEPROVISION_LAUNCH_ERROR_CONDITION, HIVE_PLATFORM_LABEL,
    INSTALL_LAUNCH_ERROR_CONDITION, PROVISION_FAILED_CONDITION,
};
use crate::api::managed_cluster::{
    ManagedCluster, AVAILABLE_CONDITION, CLOUD_LABEL, HUB_ACCEPTED_CONDITION, JOINED_CONDITION,
    OPENSHIFT_VERSION_CLAIM, PLATFORM_CLAIM,
};
use crate::api::managed_cluster_info::{
    ManagedClusterInfo, NodeInfo, OpenShiftDistributionInfo, OCP_DISTRIBUTION,
};
use crate::api::{condition_is_true, find_condition, Resource};

/// Single display status for a cluster, joined from its registration and
/// provisioning lifecycles.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ClusterStatus {
    Pending,
    Creating,
    Destroying,
    Failed,
    Detached,
    Detaching,
    NotAccepted,
    PendingImport,
    NeedsApproval,
    Ready,
    Offline,
}

impl fmt::Display for ClusterStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Pending => "pending",
            Self::Creating => "creating",
            Self::Destroying => "destroying",
            Self::Failed => "failed",
            Self::Detached => "detached",
            Self::Detaching => "detaching",
            Self::NotAccepted => "notaccepted",
            Self::PendingImport => "pendingimport",
            Self::NeedsApproval => "needsapproval",
            Self::Ready => "ready",
            Self::Offline => "offline",
        };
        f.write_str(name)
    }
}

/// Status plus the failure message backing it, when one exists.
#[derive(Clone, Debug, PartialEq)]
pub struct DerivedStatus {
    pub status: ClusterStatus,
    pub message: Option<String>,
}

impl DerivedStatus {
    fn new(status: ClusterStatus) -> Self {
        Self {
            status,
            message: None,
        }
    }
}

/// Provisioning lifecycle as reported by the deployment record alone.
fn deployment_status(deployment: Option<&ClusterDeployment>) -> DerivedStatus {
    let Some(deployment) = deployment else {
        return DerivedStatus::new(ClusterStatus::Pending);
    };
    let conditions = deployment.conditions();

    if deployment.metadata.deletion_timestamp.is_some() {
        return DerivedStatus::new(ClusterStatus::Destroying);
    }

    for launch_error in [
        INSTALL_LAUNCH_ERROR_CONDITION,
        DEPROVISION_LAUNCH_ERROR_CONDITION,
    ] {
        if condition_is_true(launch_error, conditions) {
            return DerivedStatus {
                status: ClusterStatus::Failed,
                message: find_condition(launch_error, conditions)
                    .and_then(|condition| condition.message.clone()),
            };
        }
    }

    if deployment.installed() {
        return DerivedStatus::new(ClusterStatus::Detached);
    }

    // A ProvisionFailed condition can be stale from an earlier attempt; it
    // only counts when its message names the provision currently referenced.
    if condition_is_true(PROVISION_FAILED_CONDITION, conditions) {
        let current_provision = deployment
            .status
            .as_ref()
            .and_then(|status| status.provision_ref.as_ref())
            .map(|reference| reference.name.as_str())
            .unwrap_or_default();
        let failed = find_condition(PROVISION_FAILED_CONDITION, conditions);
        let references_current = failed
            .and_then(|condition| condition.message.as_deref())
            .is_some_and(|message| message.contains(current_provision));
        if references_current {
            return DerivedStatus {
                status: ClusterStatus::Failed,
                message: failed.and_then(|condition| condition.message.clone()),
            };
        }
    }

    DerivedStatus::new(ClusterStatus::Creating)
}

/// Joins the registration and provisioning lifecycles into the one status the
/// console shows.
///
/// Clusters move through two independently-reported lifecycles; this function
/// decides which one is authoritative at each phase. While a cluster is
/// detaching or has not joined, a live deployment speaks for it, unless the
/// deployment has already settled as detached.
pub fn cluster_status(
    deployment: Option<&ClusterDeployment>,
    info: Option<&ManagedClusterInfo>,
    csrs: &[CertificateSigningRequest],
    managed: Option<&ManagedCluster>,
) -> DerivedStatus {
    let cd_status = deployment_status(deployment);

    let (metadata, conditions, name) = match (managed, info) {
        (Some(managed), _) => (&managed.metadata, managed.conditions(), managed.name_any()),
        (None, Some(info)) => (&info.metadata, info.conditions(), info.name_any()),
        (None, None) => return cd_status,
    };

    let joined = condition_is_true(JOINED_CONDITION, conditions);

    let mc_status = if metadata.deletion_timestamp.is_some() {
        ClusterStatus::Detaching
    } else if !condition_is_true(HUB_ACCEPTED_CONDITION, conditions) {
        ClusterStatus::NotAccepted
    } else if !joined {
        let cluster_csrs = csrs_for_cluster(&name, csrs);
        match latest_csr(&cluster_csrs) {
            Some(active) if !certificate_issued(active) => ClusterStatus::NeedsApproval,
            _ => ClusterStatus::PendingImport,
        }
    } else if condition_is_true(AVAILABLE_CONDITION, conditions) {
        ClusterStatus::Ready
    } else {
        ClusterStatus::Offline
    };

    if (mc_status == ClusterStatus::Detaching || !joined)
        && deployment.is_some()
        && cd_status.status != ClusterStatus::Detached
    {
        return cd_status;
    }
    DerivedStatus::new(mc_status)
}

/// Normalized infrastructure provider tag.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Aws,
    Gcp,
    Azure,
    Ibm,
    BareMetal,
    VSphere,
    Other,
}

/// Maps the raw platform markers to a provider tag: the installer's platform
/// label wins, then the platform claim, then the bare `cloud` label.
pub fn provider(
    deployment: Option<&ClusterDeployment>,
    managed: Option<&ManagedCluster>,
    info: Option<&ManagedClusterInfo>,
) -> Option<Provider> {
    let raw = deployment
        .and_then(|deployment| deployment.label(HIVE_PLATFORM_LABEL))
        .or_else(|| managed.and_then(|managed| managed.claim(PLATFORM_CLAIM)))
        .or_else(|| info.and_then(|info| info.label(CLOUD_LABEL)))?;
    match raw {
        "Amazon" | "AWS" | "aws" => Some(Provider::Aws),
        "Google" | "GCP" | "GCE" | "gcp" => Some(Provider::Gcp),
        "Azure" | "azure" => Some(Provider::Azure),
        "IBM" => Some(Provider::Ibm),
        "baremetal" => Some(Provider::BareMetal),
        "vsphere" => Some(Provider::VSphere),
        "auto-detect" => None,
        _ => Some(Provider::Other),
    }
}

/// Resolved distribution facts for display.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DistributionInfo {
    pub k8s_version: String,
    pub ocp: OpenShiftDistributionInfo,
    pub display_version: String,
}

/// Prefers the cluster's own OpenShift version claim; falls back to the
/// agent-reported distribution. Only a fully-resolvable result is returned.
pub fn distribution_info(
    managed: Option<&ManagedCluster>,
    info: Option<&ManagedClusterInfo>,
) -> Option<DistributionInfo> {
    let mut display_version = managed
        .and_then(|managed| managed.claim(OPENSHIFT_VERSION_CLAIM))
        .map(|version| format!("OpenShift {version}"));

    let status = info?.status.as_ref()?;
    let k8s_version = status.version.clone()?;
    let distribution = status.distribution_info.as_ref()?;
    let ocp = distribution.ocp.clone()?;

    if display_version.is_none() {
        display_version = if distribution.type_ == OCP_DISTRIBUTION && !ocp.version.is_empty() {
            Some(format!("OpenShift {}", ocp.version))
        } else {
            Some(k8s_version.clone())
        };
    }

    Some(DistributionInfo {
        k8s_version,
        ocp,
        display_version: display_version?,
    })
}

/// Node health tally from the agent's inventory.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct NodeSummary {
    pub active: usize,
    pub inactive: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub nodes: Vec<NodeInfo>,
}

pub fn nodes(info: Option<&ManagedClusterInfo>) -> Option<NodeSummary> {
    let info = info?;
    let mut summary = NodeSummary::default();
    for node in info.nodes() {
        if node.is_ready() {
            summary.active += 1;
        } else {
            summary.inactive += 1;
        }
    }
    summary.nodes = info.nodes().to_vec();
    Some(summary)
}

/// Names of the access secrets the installer cut for a provisioned cluster.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HiveSecrets {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kubeconfig: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kubeadmin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub install_config: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HiveConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_pool: Option<String>,
    #[serde(default)]
    pub secrets: HiveSecrets,
}

impl HiveConfig {
    fn from_deployment(deployment: Option<&ClusterDeployment>) -> Self {
        let Some(spec) = deployment.and_then(|deployment| deployment.spec.as_ref()) else {
            return Self::default();
        };
        Self {
            cluster_pool: spec
                .cluster_pool_ref
                .as_ref()
                .map(|reference| reference.pool_name.clone()),
            secrets: HiveSecrets {
                kubeconfig: spec
                    .cluster_metadata
                    .as_ref()
                    .and_then(|metadata| metadata.admin_kubeconfig_secret_ref.as_ref())
                    .map(|reference| reference.name.clone()),
                kubeadmin: spec
                    .cluster_metadata
                    .as_ref()
                    .and_then(|metadata| metadata.admin_password_secret_ref.as_ref())
                    .map(|reference| reference.name.clone()),
                install_config: spec
                    .provisioning
                    .as_ref()
                    .and_then(|provisioning| provisioning.install_config_secret_ref.as_ref())
                    .map(|reference| reference.name.clone()),
            },
        }
    }
}

/// Display-oriented join of every record the hub holds about one cluster.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Cluster {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    pub status: ClusterStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<Provider>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distribution: Option<DistributionInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nodes: Option<NodeSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kube_api_server: Option<String>,
    #[serde(default, rename = "consoleURL", skip_serializing_if = "Option::is_none")]
    pub console_url: Option<String>,
    #[serde(default)]
    pub hive: HiveConfig,
    pub is_hive: bool,
    pub is_managed: bool,
}

impl Cluster {
    pub fn from_resources(
        deployment: Option<&ClusterDeployment>,
        info: Option<&ManagedClusterInfo>,
        csrs: &[CertificateSigningRequest],
        managed: Option<&ManagedCluster>,
    ) -> Self {
        let derived = cluster_status(deployment, info, csrs, managed);
        Self {
            name: deployment
                .map(Resource::name_any)
                .or_else(|| managed.map(Resource::name_any))
                .or_else(|| info.map(Resource::name_any))
                .unwrap_or_default(),
            namespace: deployment
                .and_then(Resource::namespace)
                .or_else(|| info.and_then(Resource::namespace)),
            status: derived.status,
            status_message: derived.message,
            provider: provider(deployment, managed, info),
            distribution: distribution_info(managed, info),
            labels: managed
                .and_then(|managed| managed.labels().cloned())
                .or_else(|| info.and_then(|info| info.labels().cloned())),
            nodes: nodes(info),
            kube_api_server: deployment
                .and_then(|deployment| deployment.status.as_ref())
                .and_then(|status| status.api_url.clone())
                .or_else(|| {
                    info.and_then(|info| info.spec.as_ref())
                        .and_then(|spec| spec.master_endpoint.clone())
                }),
            console_url: deployment
                .and_then(|deployment| deployment.status.as_ref())
                .and_then(|status| status.web_console_url.clone())
                .or_else(|| {
                    info.and_then(|info| info.status.as_ref())
                        .and_then(|status| status.console_url.clone())
                }),
            hive: HiveConfig::from_deployment(deployment),
            is_hive: deployment.is_some(),
            is_managed: managed.is_some() || info.is_some(),
        }
    }
}

/// Builds one view model per cluster name seen across the three sources,
/// first-seen order preserved.
pub fn map_clusters(
    deployments: &[ClusterDeployment],
    infos: &[ManagedClusterInfo],
    csrs: &[CertificateSigningRequest],
    managed: &[ManagedCluster],
) -> Vec<Cluster> {
    let mut names = Vec::new();
    let mut seen = HashSet::new();
    let all_names = deployments
        .iter()
        .map(Resource::name_any)
        .chain(infos.iter().map(Resource::name_any))
        .chain(managed.iter().map(Resource::name_any));
    for name in all_names {
        if !name.is_empty() && seen.insert(name.clone()) {
            names.push(name);
        }
    }

    names
        .into_iter()
        .map(|name| {
            Cluster::from_resources(
                deployments
                    .iter()
                    .find(|deployment| deployment.name_any() == name),
                infos.iter().find(|info| info.name_any() == name),
                csrs,
                managed.iter().find(|managed| managed.name_any() == name),
            )
        })
        .collect()
}
