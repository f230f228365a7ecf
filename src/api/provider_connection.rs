use std::collections::BTreeMap;

use base64::prelude::*;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use super::{Resource, TypeMeta};

/// Marks a Secret as a provider credential rather than ordinary data.
pub static CLOUD_CONNECTION_LABEL: &str = "cluster.open-cluster-management.io/cloudconnection";
/// Provider tag stamped on credential secrets.
pub static CREDENTIAL_PROVIDER_LABEL: &str = "cluster.open-cluster-management.io/provider";

/// Data key holding the embedded credential document.
pub static CONNECTION_DOCUMENT_KEY: &str = "metadata";

#[derive(Error, Debug)]
pub enum ConnectionError {
    #[error("credential payload is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("credential payload is not utf-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("embedded credential document is invalid: {0}")]
    Document(#[from] serde_json::Error),
}

pub type ConnectionResult<T> = std::result::Result<T, ConnectionError>;

/// Provider credential, stored as a labeled Secret.
///
/// Deserialized from raw Secret JSON so the base64 `data` payload stays
/// untouched until a caller asks for a decoded key.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct ProviderConnection {
    #[serde(flatten, default)]
    pub types: Option<TypeMeta>,
    #[serde(default)]
    pub metadata: ObjectMeta,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<BTreeMap<String, String>>,
    #[serde(default, rename = "stringData", skip_serializing_if = "Option::is_none")]
    pub string_data: Option<BTreeMap<String, String>>,
}

/// The credential document the console editors write under the `metadata`
/// data key. Providers disagree on the exact field set, so unknown fields
/// are retained as-is.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_domain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pull_secret: Option<String>,
    #[serde(default, rename = "sshPublickey", skip_serializing_if = "Option::is_none")]
    pub ssh_public_key: Option<String>,
    #[serde(default, rename = "sshPrivatekey", skip_serializing_if = "Option::is_none")]
    pub ssh_private_key: Option<String>,
    #[serde(flatten)]
    pub other: serde_json::Map<String, Value>,
}

impl Resource for ProviderConnection {
    const API_VERSION: &'static str = "v1";
    const KIND: &'static str = "Secret";
    const PLURAL: &'static str = "secrets";

    fn metadata(&self) -> &ObjectMeta {
        &self.metadata
    }
}

impl ProviderConnection {
    pub fn provider(&self) -> Option<&str> {
        self.label(CREDENTIAL_PROVIDER_LABEL)
    }

    /// Decoded value for a data key, falling back to `stringData` when the
    /// payload was written in clear.
    pub fn decoded(&self, key: &str) -> ConnectionResult<Option<String>> {
        if let Some(encoded) = self.data.as_ref().and_then(|data| data.get(key)) {
            let bytes = BASE64_STANDARD.decode(encoded)?;
            return Ok(Some(String::from_utf8(bytes)?));
        }
        Ok(self
            .string_data
            .as_ref()
            .and_then(|data| data.get(key))
            .cloned())
    }

    pub fn document(&self) -> ConnectionResult<Option<ConnectionDocument>> {
        match self.decoded(CONNECTION_DOCUMENT_KEY)? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn connection_with_data(key: &str, value: &str) -> ProviderConnection {
        let mut connection = ProviderConnection::default();
        connection.metadata.name = Some("aws-creds".into());
        connection.data = Some(
            [(key.to_string(), BASE64_STANDARD.encode(value))]
                .into_iter()
                .collect(),
        );
        connection
    }

    #[test]
    fn decodes_base64_data_keys() {
        let connection = connection_with_data("awsAccessKeyID", "AKIA123");
        assert_eq!(
            connection.decoded("awsAccessKeyID").unwrap().as_deref(),
            Some("AKIA123")
        );
        assert_eq!(connection.decoded("missing").unwrap(), None);
    }

    #[test]
    fn parses_the_embedded_document() {
        let document = serde_json::json!({
            "baseDomain": "example.com",
            "pullSecret": "{\"auths\":{}}",
            "awsAccessKeyID": "AKIA123",
        });
        let connection = connection_with_data(CONNECTION_DOCUMENT_KEY, &document.to_string());

        let parsed = connection.document().unwrap().unwrap();
        assert_eq!(parsed.base_domain.as_deref(), Some("example.com"));
        assert_eq!(parsed.other["awsAccessKeyID"], "AKIA123");
    }

    #[test]
    fn rejects_garbage_base64() {
        let mut connection = ProviderConnection::default();
        connection.data = Some([("metadata".to_string(), "%%%".to_string())].into_iter().collect());
        assert!(matches!(
            connection.document(),
            Err(ConnectionError::Base64(_))
        ));
    }
}
