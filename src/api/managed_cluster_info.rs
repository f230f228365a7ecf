use std::collections::BTreeMap;

use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::{Resource, StatusCondition, TypeMeta};

/// Node condition consulted when counting node health.
pub static NODE_READY_CONDITION: &str = "Ready";

/// Distribution type reported for OpenShift clusters.
pub static OCP_DISTRIBUTION: &str = "OCP";

/// Agent-reported inventory for a managed cluster: nodes, distribution and
/// the cluster's own endpoints.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct ManagedClusterInfo {
    #[serde(flatten, default)]
    pub types: Option<TypeMeta>,
    #[serde(default)]
    pub metadata: ObjectMeta,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spec: Option<ManagedClusterInfoSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ManagedClusterInfoStatus>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ManagedClusterInfoSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub master_endpoint: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ManagedClusterInfoStatus {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<StatusCondition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distribution_info: Option<ClusterDistributionInfo>,
    #[serde(default, rename = "consoleURL", skip_serializing_if = "Option::is_none")]
    pub console_url: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub node_list: Vec<NodeInfo>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClusterDistributionInfo {
    #[serde(rename = "type", default)]
    pub type_: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ocp: Option<OpenShiftDistributionInfo>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct OpenShiftDistributionInfo {
    #[serde(default)]
    pub version: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub available_updates: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desired_version: Option<String>,
    #[serde(default)]
    pub upgrade_failed: bool,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NodeInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<StatusCondition>,
}

impl Resource for ManagedClusterInfo {
    const API_VERSION: &'static str = "internal.open-cluster-management.io/v1beta1";
    const KIND: &'static str = "ManagedClusterInfo";
    const PLURAL: &'static str = "managedclusterinfos";

    fn metadata(&self) -> &ObjectMeta {
        &self.metadata
    }
}

impl ManagedClusterInfo {
    pub fn conditions(&self) -> &[StatusCondition] {
        self.status
            .as_ref()
            .map(|status| status.conditions.as_slice())
            .unwrap_or_default()
    }

    pub fn nodes(&self) -> &[NodeInfo] {
        self.status
            .as_ref()
            .map(|status| status.node_list.as_slice())
            .unwrap_or_default()
    }

    pub fn is_openshift(&self) -> bool {
        self.status
            .as_ref()
            .and_then(|status| status.distribution_info.as_ref())
            .is_some_and(|info| info.type_ == OCP_DISTRIBUTION)
    }

    /// Versions the cluster may be upgraded to, per its own version operator.
    pub fn available_updates(&self) -> &[String] {
        self.status
            .as_ref()
            .and_then(|status| status.distribution_info.as_ref())
            .and_then(|info| info.ocp.as_ref())
            .map(|ocp| ocp.available_updates.as_slice())
            .unwrap_or_default()
    }

    pub fn upgrade_in_progress(&self) -> bool {
        self.status
            .as_ref()
            .and_then(|status| status.distribution_info.as_ref())
            .and_then(|info| info.ocp.as_ref())
            .is_some_and(|ocp| {
                ocp.desired_version
                    .as_ref()
                    .is_some_and(|desired| *desired != ocp.version)
            })
    }
}

impl NodeInfo {
    pub fn is_ready(&self) -> bool {
        super::condition_is_true(NODE_READY_CONDITION, &self.conditions)
    }
}
