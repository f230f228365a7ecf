use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::{Resource, TypeMeta};

/// The discovery operator only watches a config by this exact name.
pub static DISCOVERY_CONFIG_NAME: &str = "discovery";

/// Singleton wiring a credential into the cluster discovery operator.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct DiscoveryConfig {
    #[serde(flatten, default)]
    pub types: Option<TypeMeta>,
    #[serde(default)]
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub spec: DiscoveryConfigSpec,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveryConfigSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filters: Option<DiscoveryFilters>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveryFilters {
    /// Only surface clusters active within this many days.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_active: Option<i64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub open_shift_versions: Vec<String>,
}

impl Resource for DiscoveryConfig {
    const API_VERSION: &'static str = "discovery.open-cluster-management.io/v1alpha1";
    const KIND: &'static str = "DiscoveryConfig";
    const PLURAL: &'static str = "discoveryconfigs";

    fn metadata(&self) -> &ObjectMeta {
        &self.metadata
    }
}

impl DiscoveryConfig {
    pub fn new(namespace: &str, credential: &str) -> Self {
        Self {
            types: Some(TypeMeta::resource::<Self>()),
            metadata: ObjectMeta {
                name: Some(DISCOVERY_CONFIG_NAME.to_string()),
                namespace: Some(namespace.to_string()),
                ..Default::default()
            },
            spec: DiscoveryConfigSpec {
                credential: Some(credential.to_string()),
                filters: None,
            },
        }
    }
}
