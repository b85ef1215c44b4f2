//! Core types for Azure Container Instances provisioning.

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ─── Error types ─────────────────────────────────────────────────────

/// Categorised error kinds for Azure operations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AzureErrorKind {
    Auth,
    NotFound,
    Conflict,
    Forbidden,
    RateLimit,
    BadRequest,
    ServerError,
    Timeout,
    Network,
    Parse,
    Validation,
    NotAuthenticated,
    SubscriptionNotSet,
    OperationFailed,
}

impl fmt::Display for AzureErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auth => write!(f, "Authentication error"),
            Self::NotFound => write!(f, "Resource not found"),
            Self::Conflict => write!(f, "Resource conflict"),
            Self::Forbidden => write!(f, "Forbidden"),
            Self::RateLimit => write!(f, "Rate limit exceeded"),
            Self::BadRequest => write!(f, "Bad request"),
            Self::ServerError => write!(f, "Server error"),
            Self::Timeout => write!(f, "Request timeout"),
            Self::Network => write!(f, "Network error"),
            Self::Parse => write!(f, "Parse error"),
            Self::Validation => write!(f, "Validation error"),
            Self::NotAuthenticated => write!(f, "Not authenticated"),
            Self::SubscriptionNotSet => write!(f, "Subscription ID not set"),
            Self::OperationFailed => write!(f, "Long-running operation failed"),
        }
    }
}

/// Provider-level error for a single Azure request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AzureError {
    pub kind: AzureErrorKind,
    pub message: String,
    /// ARM error code (`InvalidImage`, `ResourceNotFound`, ...) when the
    /// response carried the standard error envelope.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
}

impl AzureError {
    pub fn new(kind: AzureErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            code: None,
            status_code: None,
        }
    }

    pub fn with_status(kind: AzureErrorKind, message: impl Into<String>, status: u16) -> Self {
        Self {
            kind,
            message: message.into(),
            code: None,
            status_code: Some(status),
        }
    }

    pub fn from_status(status: u16, body: &str) -> Self {
        let kind = match status {
            400 => AzureErrorKind::BadRequest,
            401 => AzureErrorKind::Auth,
            403 => AzureErrorKind::Forbidden,
            404 => AzureErrorKind::NotFound,
            409 => AzureErrorKind::Conflict,
            429 => AzureErrorKind::RateLimit,
            500..=599 => AzureErrorKind::ServerError,
            _ => AzureErrorKind::Network,
        };
        match ArmErrorResponse::parse(body) {
            Some(detail) => Self {
                kind,
                message: detail.message,
                code: Some(detail.code),
                status_code: Some(status),
            },
            None => Self::with_status(kind, body.to_string(), status),
        }
    }

    /// A long-running operation that ended in `Failed` or `Canceled`.
    pub fn operation_failed(status: &str, detail: Option<ArmErrorDetail>) -> Self {
        match detail {
            Some(d) => Self {
                kind: AzureErrorKind::OperationFailed,
                message: d.message,
                code: Some(d.code),
                status_code: None,
            },
            None => Self::new(
                AzureErrorKind::OperationFailed,
                format!("Operation finished with status {status}"),
            ),
        }
    }

    pub fn not_authenticated() -> Self {
        Self::new(AzureErrorKind::NotAuthenticated, "Not authenticated, acquire a token first")
    }

    pub fn subscription_not_set() -> Self {
        Self::new(AzureErrorKind::SubscriptionNotSet, "Subscription ID not configured")
    }

    pub fn network(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::new(AzureErrorKind::Timeout, format!("{err}"))
        } else {
            Self::new(AzureErrorKind::Network, format!("{err}"))
        }
    }
}

impl fmt::Display for AzureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.code {
            Some(code) => write!(f, "[{}] {}: {}", self.kind, code, self.message),
            None => write!(f, "[{}] {}", self.kind, self.message),
        }
    }
}

impl std::error::Error for AzureError {}

pub type AzureResult<T> = Result<T, AzureError>;

/// Standard ARM error envelope: `{"error":{"code":"...","message":"..."}}`.
#[derive(Debug, Clone, Deserialize)]
pub struct ArmErrorResponse {
    pub error: ArmErrorDetail,
}

impl ArmErrorResponse {
    fn parse(body: &str) -> Option<ArmErrorDetail> {
        serde_json::from_str::<ArmErrorResponse>(body)
            .ok()
            .map(|r| r.error)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ArmErrorDetail {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
}

// ─── OAuth / Auth ────────────────────────────────────────────────────

/// Service-principal credentials for Azure AD.
#[derive(Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct AzureCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub tenant_id: String,
    pub subscription_id: String,
}

impl fmt::Debug for AzureCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AzureCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("tenant_id", &self.tenant_id)
            .field("subscription_id", &self.subscription_id)
            .finish()
    }
}

/// Bearer token obtained from the identity provider.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AzureToken {
    pub access_token: String,
    pub token_type: String,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub resource: Option<String>,
}

/// Raw token endpoint response.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub resource: Option<String>,
}

// ─── Endpoints / client options ─────────────────────────────────────

/// Identity and management endpoints. Overridable for sovereign clouds
/// and local mock servers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AzureEndpoints {
    pub authority_host: String,
    pub resource_manager: String,
}

impl Default for AzureEndpoints {
    fn default() -> Self {
        Self {
            authority_host: AUTHORITY_HOST.into(),
            resource_manager: ARM_BASE.into(),
        }
    }
}

impl AzureEndpoints {
    /// Resource manager base without a trailing slash.
    pub fn arm_base(&self) -> &str {
        self.resource_manager.trim_end_matches('/')
    }

    /// OAuth2 scope for management-plane tokens.
    pub fn management_scope(&self) -> String {
        format!("{}/.default", self.arm_base())
    }
}

/// Per-client tuning applied to every client the service creates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientOptions {
    /// Delay between polls of a long-running operation.
    pub lro_retry_timeout: Duration,
    /// Upper bound on the total time spent waiting for one operation.
    pub lro_max_wait: Duration,
    /// Timeout for each individual HTTP request.
    pub request_timeout: Duration,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            lro_retry_timeout: Duration::from_secs(LRO_RETRY_TIMEOUT_SECS),
            lro_max_wait: Duration::from_secs(30 * 60),
            request_timeout: Duration::from_secs(30),
        }
    }
}

// ─── Container Instances ────────────────────────────────────────────

/// Container group as sent to and returned by the ARM API.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ContainerGroup {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default)]
    pub location: String,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub tags: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<ContainerGroupProperties>,
}

impl ContainerGroup {
    pub fn provisioning_state(&self) -> Option<&str> {
        self.properties
            .as_ref()
            .and_then(|p| p.provisioning_state.as_deref())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ContainerGroupProperties {
    #[serde(default)]
    pub containers: Vec<Container>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_registry_credentials: Option<Vec<ImageRegistryCredential>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provisioning_state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<ContainerIpAddress>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restart_policy: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Container {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<ContainerProperties>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ContainerProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<ContainerResources>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ports: Vec<ContainerPort>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ContainerResources {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requests: Option<ResourceRequests>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResourceRequests {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu: Option<f64>,
    #[serde(rename = "memoryInGB", default, skip_serializing_if = "Option::is_none")]
    pub memory_in_gb: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ContainerPort {
    #[serde(default)]
    pub port: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ContainerIpAddress {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    #[serde(default)]
    pub ports: Vec<ContainerPort>,
    #[serde(default, rename = "type")]
    pub ip_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dns_name_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fqdn: Option<String>,
}

/// Private registry login for pulling the container image.
#[derive(Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ImageRegistryCredential {
    pub server: String,
    pub username: String,
    #[serde(default)]
    pub password: String,
}

impl fmt::Debug for ImageRegistryCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageRegistryCredential")
            .field("server", &self.server)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// How a create call waits on the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeploymentMode {
    /// Return as soon as the provider accepts the request.
    LongRunning,
    /// Wait until the provider reports a terminal state.
    Synchronous,
}

// ─── Long-running operations ────────────────────────────────────────

/// Body of an `Azure-AsyncOperation` status resource.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AsyncOperationStatus {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub error: Option<ArmErrorDetail>,
}

/// Minimal view of any ARM resource for reading its provisioning state.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ProvisioningProbe {
    #[serde(default)]
    pub properties: Option<ProvisioningProbeProperties>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ProvisioningProbeProperties {
    #[serde(default)]
    pub provisioning_state: Option<String>,
}

// ─── Resource tags ──────────────────────────────────────────────────

/// A single tag to merge onto a resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceTag {
    pub name: String,
    pub value: String,
}

impl ResourceTag {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// PATCH body for update-by-id carrying exactly one tag.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TagPatch {
    pub tags: HashMap<String, String>,
}

impl From<&ResourceTag> for TagPatch {
    fn from(tag: &ResourceTag) -> Self {
        Self {
            tags: HashMap::from([(tag.name.clone(), tag.value.clone())]),
        }
    }
}

/// Generic resource returned by update-by-id.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct GenericResource {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "type")]
    pub resource_type: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub tags: HashMap<String, String>,
}

// ─── Azure API version constants ────────────────────────────────────

pub mod api_versions {
    pub const CONTAINER_INSTANCE: &str = "2018-10-01";
    pub const RESOURCES_UPDATE_BY_ID: &str = "2018-10-01";
}

/// Azure management base URL.
pub const ARM_BASE: &str = "https://management.azure.com";

/// Azure AD authority host.
pub const AUTHORITY_HOST: &str = "https://login.microsoftonline.com";

/// Default delay, in seconds, between long-running operation polls.
pub const LRO_RETRY_TIMEOUT_SECS: u64 = 5;

// ─── Tests ──────────────────────────────────────────────────────────
