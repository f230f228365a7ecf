use std::collections::BTreeMap;

use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::{Resource, StatusCondition, TypeMeta};

/// Set once the hub has accepted the cluster's join request.
pub static HUB_ACCEPTED_CONDITION: &str = "HubAcceptedManagedCluster";
/// Set once the klusterlet agent has completed the join handshake.
pub static JOINED_CONDITION: &str = "ManagedClusterJoined";
/// Tracks the freshness of the agent lease.
pub static AVAILABLE_CONDITION: &str = "ManagedClusterConditionAvailable";

/// Cluster claim reporting the OpenShift version of the managed cluster.
pub static OPENSHIFT_VERSION_CLAIM: &str = "version.openshift.io";
/// Cluster claim reporting the detected platform.
pub static PLATFORM_CLAIM: &str = "platform.open-cluster-management.io";
/// Label stamped by the import flow before platform detection runs.
pub static CLOUD_LABEL: &str = "cloud";

/// Hub-side registration record for a cluster under management.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct ManagedCluster {
    #[serde(flatten, default)]
    pub types: Option<TypeMeta>,
    #[serde(default)]
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub spec: ManagedClusterSpec,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ManagedClusterStatus>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ManagedClusterSpec {
    /// Whether the hub may establish its half of the registration.
    #[serde(default)]
    pub hub_accepts_client: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lease_duration_seconds: Option<i32>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ManagedClusterStatus {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<StatusCondition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allocatable: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<ManagedClusterVersion>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cluster_claims: Vec<ClusterClaim>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, JsonSchema)]
pub struct ManagedClusterVersion {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kubernetes: Option<String>,
}

/// Name/value fact reported by the agent on the managed cluster.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, JsonSchema)]
pub struct ClusterClaim {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl Resource for ManagedCluster {
    const API_VERSION: &'static str = "cluster.open-cluster-management.io/v1";
    const KIND: &'static str = "ManagedCluster";
    const PLURAL: &'static str = "managedclusters";

    fn metadata(&self) -> &ObjectMeta {
        &self.metadata
    }
}

impl ManagedCluster {
    /// Registration record for the import flow: the hub side accepts the
    /// cluster up front, the agent completes the handshake later.
    pub fn accepted(name: &str, labels: BTreeMap<String, String>) -> Self {
        Self {
            types: Some(TypeMeta::resource::<Self>()),
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                labels: (!labels.is_empty()).then_some(labels),
                ..Default::default()
            },
            spec: ManagedClusterSpec {
                hub_accepts_client: true,
                lease_duration_seconds: None,
            },
            status: None,
        }
    }

    pub fn conditions(&self) -> &[StatusCondition] {
        self.status
            .as_ref()
            .map(|status| status.conditions.as_slice())
            .unwrap_or_default()
    }

    pub fn claim(&self, name: &str) -> Option<&str> {
        self.status
            .as_ref()?
            .cluster_claims
            .iter()
            .find(|claim| claim.name == name)?
            .value
            .as_deref()
    }

    pub fn kubernetes_version(&self) -> Option<&str> {
        self.status
            .as_ref()?
            .version
            .as_ref()?
            .kubernetes
            .as_deref()
    }
}
