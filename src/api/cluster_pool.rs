use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::{LocalReference, Resource, TypeMeta};

/// Pool of pre-provisioned deployments handed out through claims.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct ClusterPool {
    #[serde(flatten, default)]
    pub types: Option<TypeMeta>,
    #[serde(default)]
    pub metadata: ObjectMeta,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spec: Option<ClusterPoolSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ClusterPoolStatus>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClusterPoolSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_domain: Option<String>,
    #[serde(default)]
    pub size: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_set_ref: Option<LocalReference>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClusterPoolStatus {
    #[serde(default)]
    pub ready: i32,
    #[serde(default)]
    pub size: i32,
}

impl Resource for ClusterPool {
    const API_VERSION: &'static str = "hive.openshift.io/v1";
    const KIND: &'static str = "ClusterPool";
    const PLURAL: &'static str = "clusterpools";

    fn metadata(&self) -> &ObjectMeta {
        &self.metadata
    }
}

/// Claim that pulls one running deployment out of a pool.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct ClusterClaim {
    #[serde(flatten, default)]
    pub types: Option<TypeMeta>,
    #[serde(default)]
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub spec: ClusterClaimSpec,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClusterClaimSpec {
    #[serde(default)]
    pub cluster_pool_name: String,
    /// Filled by the pool controller with the awarded deployment namespace.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

impl Resource for ClusterClaim {
    const API_VERSION: &'static str = "hive.openshift.io/v1";
    const KIND: &'static str = "ClusterClaim";
    const PLURAL: &'static str = "clusterclaims";

    fn metadata(&self) -> &ObjectMeta {
        &self.metadata
    }
}

impl ClusterClaim {
    pub fn for_pool(claim_name: &str, pool: &ClusterPool) -> Self {
        Self {
            types: Some(TypeMeta::resource::<Self>()),
            metadata: ObjectMeta {
                name: Some(claim_name.to_string()),
                namespace: pool.metadata.namespace.clone(),
                ..Default::default()
            },
            spec: ClusterClaimSpec {
                cluster_pool_name: pool.name_any(),
                namespace: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn claim_lands_in_the_pool_namespace() {
        let mut pool = ClusterPool::default();
        pool.metadata.name = Some("dev-pool".into());
        pool.metadata.namespace = Some("pools".into());

        let claim = ClusterClaim::for_pool("my-claim", &pool);
        assert_eq!(claim.metadata.namespace.as_deref(), Some("pools"));
        assert_eq!(claim.spec.cluster_pool_name, "dev-pool");
        assert_eq!(claim.spec.namespace, None);
    }
}
