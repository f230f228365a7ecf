use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::{Resource, TypeMeta};

/// Curation verb that runs the upgrade pipeline.
pub static UPGRADE_CURATION: &str = "upgrade";

/// Automation hook for cluster lifecycle jobs; the console drives upgrades
/// through it.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct ClusterCurator {
    #[serde(flatten, default)]
    pub types: Option<TypeMeta>,
    #[serde(default)]
    pub metadata: ObjectMeta,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spec: Option<ClusterCuratorSpec>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClusterCuratorSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desired_curation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upgrade: Option<UpgradeSpec>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpgradeSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desired_update: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
}

impl Resource for ClusterCurator {
    const API_VERSION: &'static str = "cluster.open-cluster-management.io/v1beta1";
    const KIND: &'static str = "ClusterCurator";
    const PLURAL: &'static str = "clustercurators";

    fn metadata(&self) -> &ObjectMeta {
        &self.metadata
    }
}

impl ClusterCurator {
    /// Curator that moves the named cluster to the given version.
    pub fn upgrade(cluster_name: &str, version: &str) -> Self {
        Self {
            types: Some(TypeMeta::resource::<Self>()),
            metadata: ObjectMeta {
                name: Some(cluster_name.to_string()),
                namespace: Some(cluster_name.to_string()),
                ..Default::default()
            },
            spec: Some(ClusterCuratorSpec {
                desired_curation: Some(UPGRADE_CURATION.to_string()),
                upgrade: Some(UpgradeSpec {
                    desired_update: Some(version.to_string()),
                    channel: None,
                }),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upgrade_curator_targets_the_cluster_namespace() {
        let curator = ClusterCurator::upgrade("staging", "4.12.9");
        assert_eq!(curator.metadata.name.as_deref(), Some("staging"));
        assert_eq!(curator.metadata.namespace.as_deref(), Some("staging"));

        let spec = curator.spec.unwrap();
        assert_eq!(spec.desired_curation.as_deref(), Some(UPGRADE_CURATION));
        assert_eq!(
            spec.upgrade.unwrap().desired_update.as_deref(),
            Some("4.12.9")
        );
    }
}
