use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use serde::{Deserialize, Serialize};

use super::{Resource, StatusCondition, TypeMeta};

/// Label assigning a managed cluster to a set.
pub static CLUSTER_SET_LABEL: &str = "cluster.open-cluster-management.io/clusterset";

/// Named grouping of managed clusters used for placement and RBAC scoping.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct ManagedClusterSet {
    #[serde(flatten, default)]
    pub types: Option<TypeMeta>,
    #[serde(default)]
    pub metadata: ObjectMeta,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ManagedClusterSetStatus>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct ManagedClusterSetStatus {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<StatusCondition>,
}

impl Resource for ManagedClusterSet {
    const API_VERSION: &'static str = "cluster.open-cluster-management.io/v1beta1";
    const KIND: &'static str = "ManagedClusterSet";
    const PLURAL: &'static str = "managedclustersets";

    fn metadata(&self) -> &ObjectMeta {
        &self.metadata
    }
}
