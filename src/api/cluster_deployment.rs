use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::{LocalReference, Resource, SecretReference, StatusCondition, TypeMeta};

/// Terminal provision failure reported by the install controller.
pub static PROVISION_FAILED_CONDITION: &str = "ProvisionFailed";
/// The install job could not be launched at all.
pub static INSTALL_LAUNCH_ERROR_CONDITION: &str = "InstallLaunchError";
/// The deprovision job could not be launched.
pub static DEPROVISION_LAUNCH_ERROR_CONDITION: &str = "DeprovisionLaunchError";

/// Platform label stamped on deployments provisioned by the installer.
pub static HIVE_PLATFORM_LABEL: &str = "hive.openshift.io/cluster-platform";

/// Installer-side record of a provisioned cluster.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct ClusterDeployment {
    #[serde(flatten, default)]
    pub types: Option<TypeMeta>,
    #[serde(default)]
    pub metadata: ObjectMeta,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spec: Option<ClusterDeploymentSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ClusterDeploymentStatus>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClusterDeploymentSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_domain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_name: Option<String>,
    /// Flipped by the installer once provisioning completes.
    #[serde(default)]
    pub installed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_pool_ref: Option<ClusterPoolReference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_metadata: Option<ClusterMetadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provisioning: Option<Provisioning>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClusterPoolReference {
    pub namespace: String,
    pub pool_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claim_name: Option<String>,
}

/// Post-install facts, including the access secrets cut by the installer.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClusterMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_kubeconfig_secret_ref: Option<SecretReference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_password_secret_ref: Option<SecretReference>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Provisioning {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub install_config_secret_ref: Option<SecretReference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssh_private_key_secret_ref: Option<SecretReference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_set_ref: Option<LocalReference>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClusterDeploymentStatus {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<StatusCondition>,
    #[serde(default, rename = "apiURL", skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
    #[serde(default, rename = "webConsoleURL", skip_serializing_if = "Option::is_none")]
    pub web_console_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provision_ref: Option<LocalReference>,
}

impl Resource for ClusterDeployment {
    const API_VERSION: &'static str = "hive.openshift.io/v1";
    const KIND: &'static str = "ClusterDeployment";
    const PLURAL: &'static str = "clusterdeployments";

    fn metadata(&self) -> &ObjectMeta {
        &self.metadata
    }
}

impl ClusterDeployment {
    pub fn conditions(&self) -> &[StatusCondition] {
        self.status
            .as_ref()
            .map(|status| status.conditions.as_slice())
            .unwrap_or_default()
    }

    pub fn installed(&self) -> bool {
        self.spec.as_ref().is_some_and(|spec| spec.installed)
    }

    pub fn from_cluster_pool(&self) -> bool {
        self.spec
            .as_ref()
            .is_some_and(|spec| spec.cluster_pool_ref.is_some())
    }
}
