use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use k8s_openapi::api::authorization::v1::{
    ResourceAttributes, SelfSubjectAccessReview, SelfSubjectAccessReviewSpec,
};
use reqwest::header::ACCEPT;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use url::Url;

use crate::api::Resource;
use crate::metrics::Metrics;

pub mod request;

pub use request::Request;

/// Failure category for a proxy call, stable across retries and suitable as a
/// metric label.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorCode {
    BadRequest,
    Unauthorized,
    Forbidden,
    NotFound,
    Timeout,
    Conflict,
    UnprocessableEntity,
    TooManyRequests,
    InternalServerError,
    NotImplemented,
    BadGateway,
    ServiceUnavailable,
    GatewayTimeout,
    /// The call never produced an HTTP response.
    ConnectionError,
    /// The response body did not match the expected shape.
    Decode,
    /// The caller abandoned the request.
    Aborted,
    Unknown(u16),
}

impl ErrorCode {
    pub fn from_status(status: u16) -> Self {
        match status {
            400 => Self::BadRequest,
            401 => Self::Unauthorized,
            403 => Self::Forbidden,
            404 => Self::NotFound,
            408 => Self::Timeout,
            409 => Self::Conflict,
            422 => Self::UnprocessableEntity,
            429 => Self::TooManyRequests,
            500 => Self::InternalServerError,
            501 => Self::NotImplemented,
            502 => Self::BadGateway,
            503 => Self::ServiceUnavailable,
            504 => Self::GatewayTimeout,
            other => Self::Unknown(other),
        }
    }

    /// Label value for failure counters.
    pub fn metric_label(&self) -> String {
        format!("{self}").to_lowercase()
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BadRequest => write!(f, "BadRequest"),
            Self::Unauthorized => write!(f, "Unauthorized"),
            Self::Forbidden => write!(f, "Forbidden"),
            Self::NotFound => write!(f, "NotFound"),
            Self::Timeout => write!(f, "Timeout"),
            Self::Conflict => write!(f, "Conflict"),
            Self::UnprocessableEntity => write!(f, "UnprocessableEntity"),
            Self::TooManyRequests => write!(f, "TooManyRequests"),
            Self::InternalServerError => write!(f, "InternalServerError"),
            Self::NotImplemented => write!(f, "NotImplemented"),
            Self::BadGateway => write!(f, "BadGateway"),
            Self::ServiceUnavailable => write!(f, "ServiceUnavailable"),
            Self::GatewayTimeout => write!(f, "GatewayTimeout"),
            Self::ConnectionError => write!(f, "ConnectionError"),
            Self::Decode => write!(f, "Decode"),
            Self::Aborted => write!(f, "Aborted"),
            Self::Unknown(status) => write!(f, "Http{status}"),
        }
    }
}

#[derive(Error, Clone, Debug, PartialEq)]
#[error("{code}: {message}")]
pub struct ResourceError {
    pub code: ErrorCode,
    pub message: String,
}

impl ResourceError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn aborted() -> Self {
        Self::new(ErrorCode::Aborted, "request aborted")
    }

    fn connection(error: reqwest::Error) -> Self {
        let code = if error.is_timeout() {
            ErrorCode::Timeout
        } else {
            ErrorCode::ConnectionError
        };
        Self::new(code, error.to_string())
    }

    fn decode(error: impl fmt::Display) -> Self {
        Self::new(ErrorCode::Decode, error.to_string())
    }

    /// Builds the error from a non-success response, preferring the message
    /// the backend put in the status body.
    async fn from_response(response: reqwest::Response) -> Self {
        let status = response.status();
        let code = ErrorCode::from_status(status.as_u16());
        let message = response
            .json::<Value>()
            .await
            .ok()
            .and_then(|body| {
                body.get("message")
                    .and_then(Value::as_str)
                    .map(str::to_string)
            })
            .unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string()
            });
        Self { code, message }
    }
}

pub type ResourceResult<T> = std::result::Result<T, ResourceError>;

/// Maps listed error codes to `Ok(None)`, letting callers treat e.g. a 404 on
/// delete as success.
pub fn tolerate<T>(result: ResourceResult<T>, tolerated: &[ErrorCode]) -> ResourceResult<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(error) if tolerated.contains(&error.code) => Ok(None),
        Err(error) => Err(error),
    }
}

#[derive(Deserialize)]
#[serde(bound(deserialize = "K: Deserialize<'de>"))]
struct ResourceList<K> {
    #[serde(default)]
    items: Vec<K>,
}

/// Options applied to collection listings.
#[derive(Clone, Debug, Default)]
pub struct ListOptions {
    pub label_selectors: Vec<String>,
    /// Ask the backend to restrict the listing to namespaces the session can
    /// see instead of attempting a cluster-wide list.
    pub managed_namespaces_only: bool,
}

impl ListOptions {
    pub fn labeled(selector: impl Into<String>) -> Self {
        Self {
            label_selectors: vec![selector.into()],
            ..Default::default()
        }
    }

    pub fn in_managed_namespaces(mut self) -> Self {
        self.managed_namespaces_only = true;
        self
    }
}

/// Typed client for the console backend: resource calls go through the
/// `/proxy` prefix, session and event endpoints sit beside it.
#[derive(Clone)]
pub struct Client {
    http: reqwest::Client,
    base: String,
    token: Option<String>,
    metrics: Option<Arc<Metrics>>,
}

static REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
static SESSION_TIMEOUT: Duration = Duration::from_secs(10);

impl Client {
    pub fn new(base: Url, token: Option<String>) -> ResourceResult<Self> {
        // No client-wide timeout: the same client carries the long-lived
        // event stream. JSON calls set per-request timeouts instead.
        let http = reqwest::Client::builder()
            .user_agent(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION")
            ))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|error| ResourceError::new(ErrorCode::ConnectionError, error.to_string()))?;
        Ok(Self {
            http,
            base: base.as_str().trim_end_matches('/').to_string(),
            token,
            metrics: None,
        })
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    fn authorized(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    fn proxy_url(&self, path: &str) -> String {
        format!("{}/proxy/{path}", self.base)
    }

    async fn settle<T: DeserializeOwned>(
        builder: reqwest::RequestBuilder,
        metrics: Option<Arc<Metrics>>,
    ) -> ResourceResult<T> {
        let result = Self::exchange(builder).await;
        observe_request(&metrics, &result);
        result
    }

    async fn exchange<T: DeserializeOwned>(builder: reqwest::RequestBuilder) -> ResourceResult<T> {
        let response = builder
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .map_err(ResourceError::connection)?;
        if !response.status().is_success() {
            return Err(ResourceError::from_response(response).await);
        }
        response.json().await.map_err(ResourceError::decode)
    }

    async fn exchange_empty(builder: reqwest::RequestBuilder) -> ResourceResult<()> {
        let response = builder.send().await.map_err(ResourceError::connection)?;
        if !response.status().is_success() {
            return Err(ResourceError::from_response(response).await);
        }
        Ok(())
    }

    /// Lists a collection across all namespaces the session can reach.
    pub fn list<K: Resource>(&self, options: ListOptions) -> Request<Vec<K>> {
        let mut builder = self
            .authorized(self.http.get(self.proxy_url(&collection_path::<K>(None))));
        if !options.label_selectors.is_empty() {
            builder = builder.query(&[("labelSelector", options.label_selectors.join(","))]);
        }
        if options.managed_namespaces_only {
            builder = builder.query(&[("managedNamespacesOnly", "true")]);
        }
        let metrics = self.metrics.clone();
        Request::new(async move {
            let list: ResourceList<K> = Self::settle(builder, metrics).await?;
            Ok(list.items)
        })
    }

    pub fn get<K: Resource>(&self, namespace: Option<&str>, name: &str) -> Request<K> {
        let builder = self
            .authorized(self.http.get(self.proxy_url(&item_path::<K>(namespace, name))));
        let metrics = self.metrics.clone();
        Request::new(async move { Self::settle(builder, metrics).await })
    }

    /// Creates the resource in the namespace named by its metadata, injecting
    /// `apiVersion`/`kind` when the value does not carry them.
    pub fn create<K: Resource>(&self, resource: &K) -> Request<K> {
        let namespace = resource.namespace();
        let body = match typed_body::<K>(resource) {
            Ok(body) => body,
            Err(error) => return Self::failed(error),
        };
        let builder = self
            .authorized(
                self.http
                    .post(self.proxy_url(&collection_path::<K>(namespace.as_deref()))),
            )
            .json(&body);
        let metrics = self.metrics.clone();
        Request::new(async move { Self::settle(builder, metrics).await })
    }

    pub fn replace<K: Resource>(&self, resource: &K) -> Request<K> {
        let name = resource.name_any();
        if name.is_empty() {
            return Self::failed(ResourceError::new(
                ErrorCode::BadRequest,
                "resource has no name",
            ));
        }
        let namespace = resource.namespace();
        let body = match typed_body::<K>(resource) {
            Ok(body) => body,
            Err(error) => return Self::failed(error),
        };
        let builder = self
            .authorized(
                self.http
                    .put(self.proxy_url(&item_path::<K>(namespace.as_deref(), &name))),
            )
            .json(&body);
        let metrics = self.metrics.clone();
        Request::new(async move { Self::settle(builder, metrics).await })
    }

    /// Merge-patches the named resource.
    pub fn patch<K: Resource>(
        &self,
        namespace: Option<&str>,
        name: &str,
        patch: &Value,
    ) -> Request<K> {
        let builder = self
            .authorized(
                self.http
                    .patch(self.proxy_url(&item_path::<K>(namespace, name))),
            )
            .header(reqwest::header::CONTENT_TYPE, "application/merge-patch+json")
            .body(patch.to_string());
        let metrics = self.metrics.clone();
        Request::new(async move { Self::settle(builder, metrics).await })
    }

    pub fn delete<K: Resource>(&self, namespace: Option<&str>, name: &str) -> Request<()> {
        let builder = self
            .authorized(
                self.http
                    .delete(self.proxy_url(&item_path::<K>(namespace, name))),
            )
            .timeout(REQUEST_TIMEOUT);
        let metrics = self.metrics.clone();
        Request::new(async move {
            let result = Self::exchange_empty(builder).await;
            observe_request(&metrics, &result);
            result
        })
    }

    /// Delete that treats an already-gone resource as success.
    pub fn delete_tolerant<K: Resource>(
        &self,
        namespace: Option<&str>,
        name: &str,
    ) -> Request<Option<()>> {
        let request = self.delete::<K>(namespace, name);
        Request::new(async move { tolerate(request.promise().await, &[ErrorCode::NotFound]) })
    }

    /// Asks the backend whether the session may perform the described action.
    pub fn check_access(&self, attributes: ResourceAttributes) -> Request<bool> {
        let review = SelfSubjectAccessReview {
            spec: SelfSubjectAccessReviewSpec {
                resource_attributes: Some(attributes),
                ..Default::default()
            },
            ..Default::default()
        };
        let request = self.create(&review);
        Request::new(async move {
            let review = request.promise().await?;
            Ok(review.status.map(|status| status.allowed).unwrap_or(false))
        })
    }

    /// Probes the session endpoint; an expired token surfaces as
    /// [`ErrorCode::Unauthorized`].
    pub fn check_session(&self) -> Request<()> {
        let builder = self
            .authorized(self.http.get(format!("{}/authenticated", self.base)))
            .timeout(SESSION_TIMEOUT);
        let metrics = self.metrics.clone();
        Request::new(async move {
            let result = Self::exchange_empty(builder).await;
            observe_request(&metrics, &result);
            result
        })
    }

    /// Prepared GET against the event stream endpoint; the sync engine drives
    /// the connection and reconnects.
    pub fn events_request(&self) -> reqwest::RequestBuilder {
        self.authorized(
            self.http
                .get(format!("{}/events", self.base))
                .header(ACCEPT, "text/event-stream"),
        )
    }

    fn failed<T: Send + 'static>(error: ResourceError) -> Request<T> {
        Request::new(async move { Err(error) })
    }
}

fn observe_request<T>(metrics: &Option<Arc<Metrics>>, result: &ResourceResult<T>) {
    if let (Some(metrics), Err(error)) = (metrics, result) {
        metrics
            .request_failures
            .with_label_values(&[&error.code.metric_label()])
            .inc();
    }
}

fn api_path<K: Resource>() -> String {
    if K::API_VERSION.contains('/') {
        format!("apis/{}", K::API_VERSION)
    } else {
        format!("api/{}", K::API_VERSION)
    }
}

fn collection_path<K: Resource>(namespace: Option<&str>) -> String {
    match namespace {
        Some(namespace) => format!("{}/namespaces/{namespace}/{}", api_path::<K>(), K::PLURAL),
        None => format!("{}/{}", api_path::<K>(), K::PLURAL),
    }
}

fn item_path<K: Resource>(namespace: Option<&str>, name: &str) -> String {
    format!("{}/{name}", collection_path::<K>(namespace))
}

/// Serialized body with `apiVersion`/`kind` guaranteed present.
fn typed_body<K: Resource>(resource: &K) -> ResourceResult<Value> {
    let mut body = serde_json::to_value(resource).map_err(ResourceError::decode)?;
    if let Value::Object(map) = &mut body {
        map.entry("apiVersion")
            .or_insert_with(|| K::API_VERSION.into());
        map.entry("kind").or_insert_with(|| K::KIND.into());
    }
    Ok(body)
}
