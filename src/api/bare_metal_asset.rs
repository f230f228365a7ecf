use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::{Resource, SecretReference, TypeMeta};

/// Inventory entry for a bare metal host available to cluster installs.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct BareMetalAsset {
    #[serde(flatten, default)]
    pub types: Option<TypeMeta>,
    #[serde(default)]
    pub metadata: ObjectMeta,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spec: Option<BareMetalAssetSpec>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BareMetalAssetSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bmc: Option<Bmc>,
    #[serde(default, rename = "bootMACAddress", skip_serializing_if = "Option::is_none")]
    pub boot_mac_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

/// Out-of-band management controller coordinates.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Bmc {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials_secret_ref: Option<SecretReference>,
}

impl Resource for BareMetalAsset {
    const API_VERSION: &'static str = "inventory.open-cluster-management.io/v1alpha1";
    const KIND: &'static str = "BareMetalAsset";
    const PLURAL: &'static str = "baremetalassets";

    fn metadata(&self) -> &ObjectMeta {
        &self.metadata
    }
}
