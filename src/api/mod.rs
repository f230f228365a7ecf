use std::collections::BTreeMap;

use k8s_openapi::api::authorization::v1::SelfSubjectAccessReview;
use k8s_openapi::api::certificates::v1::CertificateSigningRequest;
use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, Time};
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

pub mod bare_metal_asset;
pub mod certificate_signing_request;
pub mod cluster_curator;
pub mod cluster_deployment;
pub mod cluster_pool;
pub mod discovered_cluster;
pub mod discovery_config;
pub mod klusterlet_addon_config;
pub mod managed_cluster;
pub mod managed_cluster_info;
pub mod managed_cluster_set;
pub mod provider_connection;

/// Static identity of a resource kind as served by the backend proxy.
///
/// Every proxy call is built from the `{apiVersion, kind, metadata}` descriptor
/// of a resource; `PLURAL` is the collection segment in the request path.
pub trait Resource: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    const API_VERSION: &'static str;
    const KIND: &'static str;
    const PLURAL: &'static str;

    fn metadata(&self) -> &ObjectMeta;

    fn name_any(&self) -> String {
        self.metadata().name.clone().unwrap_or_default()
    }

    fn namespace(&self) -> Option<String> {
        self.metadata().namespace.clone()
    }

    fn labels(&self) -> Option<&BTreeMap<String, String>> {
        self.metadata().labels.as_ref()
    }

    fn label(&self, key: &str) -> Option<&str> {
        self.labels().and_then(|labels| labels.get(key)).map(String::as_str)
    }

    fn creation_timestamp(&self) -> Option<&Time> {
        self.metadata().creation_timestamp.as_ref()
    }

    fn deletion_timestamp(&self) -> Option<&Time> {
        self.metadata().deletion_timestamp.as_ref()
    }
}

/// `apiVersion`/`kind` pair carried by every object on the wire.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct TypeMeta {
    #[serde(rename = "apiVersion")]
    pub api_version: String,
    pub kind: String,
}

impl TypeMeta {
    pub fn resource<K: Resource>() -> Self {
        Self {
            api_version: K::API_VERSION.to_string(),
            kind: K::KIND.to_string(),
        }
    }
}

/// Condition entry shared by the hub resource kinds.
///
/// Hive and the registration controllers disagree on which fields they
/// populate, so everything beyond `type`/`status` is optional.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StatusCondition {
    #[serde(rename = "type")]
    pub type_: String,
    #[serde(default)]
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_transition_time: Option<Time>,
}

impl StatusCondition {
    pub fn new(type_: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            type_: type_.into(),
            status: status.into(),
            ..Default::default()
        }
    }

    pub fn is_true(&self) -> bool {
        self.status == "True"
    }
}

/// `true` iff a condition of the given type exists and reports `"True"`.
///
/// An absent condition is never true; callers rely on that for the
/// not-accepted / pending-import defaults.
pub fn condition_is_true(type_: &str, conditions: &[StatusCondition]) -> bool {
    conditions.iter().any(|c| c.type_ == type_ && c.is_true())
}

pub fn find_condition<'a>(
    type_: &str,
    conditions: &'a [StatusCondition],
) -> Option<&'a StatusCondition> {
    conditions.iter().find(|c| c.type_ == type_)
}

/// Reference to a sibling object by bare name.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, JsonSchema)]
pub struct LocalReference {
    pub name: String,
}

/// Reference to a Secret by name; the namespace is implied by the referencing
/// object.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, JsonSchema)]
pub struct SecretReference {
    pub name: String,
}

impl Resource for Secret {
    const API_VERSION: &'static str = "v1";
    const KIND: &'static str = "Secret";
    const PLURAL: &'static str = "secrets";

    fn metadata(&self) -> &ObjectMeta {
        &self.metadata
    }
}

impl Resource for CertificateSigningRequest {
    const API_VERSION: &'static str = "certificates.k8s.io/v1";
    const KIND: &'static str = "CertificateSigningRequest";
    const PLURAL: &'static str = "certificatesigningrequests";

    fn metadata(&self) -> &ObjectMeta {
        &self.metadata
    }
}

impl Resource for SelfSubjectAccessReview {
    const API_VERSION: &'static str = "authorization.k8s.io/v1";
    const KIND: &'static str = "SelfSubjectAccessReview";
    const PLURAL: &'static str = "selfsubjectaccessreviews";

    fn metadata(&self) -> &ObjectMeta {
        &self.metadata
    }
}
