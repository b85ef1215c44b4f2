//! Settings snapshot read from environment-style key/value sources.

use std::fmt;

use log::warn;
use thiserror::Error;
use url::Url;

use crate::types::{AzureCredentials, AzureEndpoints, AUTHORITY_HOST, ARM_BASE};

/// Configuration errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

/// Immutable settings used by the container service.
#[derive(Clone, Default, PartialEq)]
pub struct ContainerSettings {
    pub credentials: AzureCredentials,
    pub region: String,
    pub resource_group: String,
    pub container_image: String,
    pub container_port: Option<u16>,
    pub container_os: String,
    pub reporting_refresh_interval: String,
    pub container_registry_host: String,
    pub container_registry_username: String,
    pub container_registry_password: String,
    /// Not read by any operation; carried for pool-sizing callers.
    pub pool_minimum_size: Option<u32>,
    pub endpoints: AzureEndpoints,
}

impl ContainerSettings {
    /// Read settings through `lookup`. Missing strings become empty; missing
    /// or malformed integers become `None`.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let text = |key: &str| lookup(key).unwrap_or_default();
        let text_or = |key: &str, default: &str| {
            lookup(key)
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        Self {
            credentials: AzureCredentials {
                tenant_id: text("TENANT_ID"),
                subscription_id: text("SUBSCRIPTION_ID"),
                client_id: text("CLIENT_ID"),
                client_secret: text("CLIENT_SECRET"),
            },
            region: text("REGION"),
            resource_group: text("RESOURCE_GROUP_NAME"),
            container_image: text("CONTAINER_IMAGE"),
            container_port: parse_number(&lookup, "CONTAINER_PORT"),
            container_os: text("CONTAINER_OS_TYPE"),
            reporting_refresh_interval: text("REPORTING_REFRESH_INTERVAL"),
            container_registry_host: text("CONTAINER_REGISTRY_HOST"),
            container_registry_username: text("CONTAINER_REGISTRY_USERNAME"),
            container_registry_password: text("CONTAINER_REGISTRY_PASSWORD"),
            pool_minimum_size: parse_number(&lookup, "POOL_MINIMUM_SIZE"),
            endpoints: AzureEndpoints {
                authority_host: text_or("AZURE_AUTHORITY_HOST", AUTHORITY_HOST),
                resource_manager: text_or("AZURE_RESOURCE_MANAGER_URL", ARM_BASE),
            },
        }
    }

    /// Read settings from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Check that the endpoint overrides are absolute http(s) URLs.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_url("AZURE_AUTHORITY_HOST", &self.endpoints.authority_host)?;
        check_url("AZURE_RESOURCE_MANAGER_URL", &self.endpoints.resource_manager)
    }
}

impl fmt::Debug for ContainerSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContainerSettings")
            .field("credentials", &self.credentials)
            .field("region", &self.region)
            .field("resource_group", &self.resource_group)
            .field("container_image", &self.container_image)
            .field("container_port", &self.container_port)
            .field("container_os", &self.container_os)
            .field("reporting_refresh_interval", &self.reporting_refresh_interval)
            .field("container_registry_host", &self.container_registry_host)
            .field("container_registry_username", &self.container_registry_username)
            .field("container_registry_password", &"<redacted>")
            .field("pool_minimum_size", &self.pool_minimum_size)
            .field("endpoints", &self.endpoints)
            .finish()
    }
}

fn parse_number<T, F>(lookup: &F, key: &str) -> Option<T>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key)?;
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    match raw.parse() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!("{} is not a valid number: {:?}", key, raw);
            None
        }
    }
}

fn check_url(field: &'static str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value).map_err(|e| ConfigError::InvalidValue {
        field,
        reason: e.to_string(),
    })?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(ConfigError::InvalidValue {
            field,
            reason: format!("unsupported scheme {other}"),
        }),
    }
}

/// Source of the settings snapshot.
pub trait ConfigurationProvider: Send + Sync {
    fn configuration(&self) -> ContainerSettings;
}

/// Reads the process environment on every call.
#[derive(Debug, Default, Clone, Copy)]
pub struct EnvConfiguration;

impl ConfigurationProvider for EnvConfiguration {
    fn configuration(&self) -> ContainerSettings {
        ContainerSettings::from_env()
    }
}

/// Hands out a fixed snapshot.
#[derive(Debug, Clone)]
pub struct StaticConfiguration(pub ContainerSettings);

impl ConfigurationProvider for StaticConfiguration {
    fn configuration(&self) -> ContainerSettings {
        self.0.clone()
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
