use std::collections::BTreeMap;

use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::{Resource, TypeMeta};

/// Per-cluster toggle sheet for the management addons installed alongside the
/// klusterlet.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct KlusterletAddonConfig {
    #[serde(flatten, default)]
    pub types: Option<TypeMeta>,
    #[serde(default)]
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub spec: KlusterletAddonConfigSpec,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct KlusterletAddonConfigSpec {
    #[serde(default)]
    pub cluster_name: String,
    #[serde(default)]
    pub cluster_namespace: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_labels: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub application_manager: AddonToggle,
    #[serde(default)]
    pub cert_policy_controller: AddonToggle,
    #[serde(default)]
    pub policy_controller: AddonToggle,
    #[serde(default)]
    pub search_collector: AddonToggle,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, JsonSchema)]
pub struct AddonToggle {
    pub enabled: bool,
}

impl Default for AddonToggle {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl Resource for KlusterletAddonConfig {
    const API_VERSION: &'static str = "agent.open-cluster-management.io/v1";
    const KIND: &'static str = "KlusterletAddonConfig";
    const PLURAL: &'static str = "klusterletaddonconfigs";

    fn metadata(&self) -> &ObjectMeta {
        &self.metadata
    }
}

impl KlusterletAddonConfig {
    /// Config with every addon enabled, named after the cluster as the agent
    /// expects.
    pub fn for_cluster(cluster_name: &str) -> Self {
        Self {
            types: Some(TypeMeta::resource::<Self>()),
            metadata: ObjectMeta {
                name: Some(cluster_name.to_string()),
                namespace: Some(cluster_name.to_string()),
                ..Default::default()
            },
            spec: KlusterletAddonConfigSpec {
                cluster_name: cluster_name.to_string(),
                cluster_namespace: cluster_name.to_string(),
                cluster_labels: Some(
                    [(
                        super::managed_cluster::CLOUD_LABEL.to_string(),
                        "auto-detect".to_string(),
                    )]
                    .into_iter()
                    .collect(),
                ),
                ..Default::default()
            },
        }
    }
}
