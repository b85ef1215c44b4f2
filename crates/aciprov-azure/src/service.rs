//! Central service façade for container provisioning.
//!
//! Owns one lazily authenticated client per management API (container
//! instances and generic resources). Each client is initialised at most once
//! per service: concurrent first callers await the same in-flight credential
//! exchange instead of racing. A failed exchange leaves the client
//! uninitialised so a later call can try again.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::OnceCell;

use crate::auth;
use crate::client::{build_http, AzureClient};
use crate::config::{ConfigurationProvider, ContainerSettings};
use crate::container_instances;
use crate::descriptor::{generate_deployment_name, DeploymentDescriptor};
use crate::logger::Logger;
use crate::resources;
use crate::types::{AzureError, ClientOptions, ContainerGroup, DeploymentMode, ResourceTag};

/// Failures surfaced by the container service. The provider error is
/// carried unmodified.
#[derive(Debug, Clone, Error, Serialize, PartialEq)]
#[serde(tag = "kind", content = "error", rename_all = "snake_case")]
pub enum ServiceError {
    #[error("authentication failed: {0}")]
    Authentication(AzureError),
    #[error("deployment failed: {0}")]
    Deployment(AzureError),
    #[error("tag update failed: {0}")]
    TagUpdate(AzureError),
}

impl ServiceError {
    /// JSON form written to the log sink.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| self.to_string())
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// The public contract for creating and tagging deployments.
#[async_trait]
pub trait ContainerDeployments: Send + Sync {
    /// Start a deployment and return once the provider has accepted it.
    async fn create_new_deployment(
        &self,
        cpu: f64,
        memory_in_gb: f64,
        tag: Option<&str>,
    ) -> ServiceResult<ContainerGroup>;

    /// Create a deployment and wait until it reaches a terminal state.
    async fn create_new_deployment_sync(
        &self,
        cpu: f64,
        memory_in_gb: f64,
        tag: Option<&str>,
    ) -> ServiceResult<ContainerGroup>;

    /// Merge one tag onto an existing resource.
    async fn update_deployment_tag(
        &self,
        resource_id: &str,
        tag_name: &str,
        tag_value: &str,
    ) -> ServiceResult<()>;
}

/// Which management API a client talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientKind {
    ContainerInstance,
    ResourceManager,
}

impl fmt::Display for ClientKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ContainerInstance => write!(f, "AciClient"),
            Self::ResourceManager => write!(f, "ArmClient"),
        }
    }
}

pub struct ContainerService {
    logger: Arc<dyn Logger>,
    settings: ContainerSettings,
    options: ClientOptions,
    http: Client,
    aci_client: OnceCell<AzureClient>,
    arm_client: OnceCell<AzureClient>,
}

impl ContainerService {
    pub fn new(logger: Arc<dyn Logger>, config: &dyn ConfigurationProvider) -> Self {
        Self::with_options(logger, config, ClientOptions::default())
    }

    pub fn with_options(
        logger: Arc<dyn Logger>,
        config: &dyn ConfigurationProvider,
        options: ClientOptions,
    ) -> Self {
        Self {
            logger,
            settings: config.configuration(),
            http: build_http(&options),
            options,
            aci_client: OnceCell::new(),
            arm_client: OnceCell::new(),
        }
    }

    pub fn is_ready(&self, kind: ClientKind) -> bool {
        self.cell(kind).initialized()
    }

    fn cell(&self, kind: ClientKind) -> &OnceCell<AzureClient> {
        match kind {
            ClientKind::ContainerInstance => &self.aci_client,
            ClientKind::ResourceManager => &self.arm_client,
        }
    }

    // ── Client initialisation ────────────────────────────────────────

    async fn client(&self, kind: ClientKind) -> ServiceResult<&AzureClient> {
        let cell = self.cell(kind);
        if let Some(client) = cell.get() {
            self.logger.write(&format!("{kind} already initialized..."));
            return Ok(client);
        }
        cell.get_or_try_init(|| self.login(kind)).await
    }

    async fn login(&self, kind: ClientKind) -> ServiceResult<AzureClient> {
        self.logger.write("Beginning SPN login...");

        let creds = &self.settings.credentials;
        let mut client = AzureClient::new(
            self.http.clone(),
            self.settings.endpoints.clone(),
            self.options.clone(),
            creds.subscription_id.clone(),
        );
        let token = auth::acquire_token(&client, creds)
            .await
            .map_err(ServiceError::Authentication)?;
        client.set_token(token);

        self.logger
            .write(&format!("SPN login complete. {kind} ready to use."));
        Ok(client)
    }

    // ── Instrumentation ──────────────────────────────────────────────

    /// Run `op`, logging failures and the elapsed time. The duration line is
    /// written whether or not the operation succeeded.
    async fn instrumented<T, F>(&self, name: &str, op: F) -> ServiceResult<T>
    where
        F: Future<Output = ServiceResult<T>>,
    {
        let start = Instant::now();
        let result = op.await;

        if let Err(err) = &result {
            self.logger.write(&format!("*****Error in ::{name}*****"));
            self.logger.write(&err.to_json());
        }

        self.logger.write(&format!(
            "::{name} duration {} ms",
            start.elapsed().as_millis()
        ));
        result
    }

    // ── Operations ───────────────────────────────────────────────────

    async fn deploy(
        &self,
        cpu: f64,
        memory_in_gb: f64,
        tag: Option<&str>,
        mode: DeploymentMode,
    ) -> ServiceResult<ContainerGroup> {
        let client = self.client(ClientKind::ContainerInstance).await?;

        let descriptor = DeploymentDescriptor::build(
            &self.settings,
            generate_deployment_name(),
            cpu,
            memory_in_gb,
            tag,
        );
        container_instances::create_container_group(
            client,
            &self.settings.resource_group,
            &descriptor,
            mode,
        )
        .await
        .map_err(ServiceError::Deployment)
    }

    async fn tag(&self, resource_id: &str, tag: ResourceTag) -> ServiceResult<()> {
        let client = self.client(ClientKind::ResourceManager).await?;
        resources::update_tag_by_id(client, resource_id, &tag)
            .await
            .map(|_| ())
            .map_err(ServiceError::TagUpdate)
    }
}

#[async_trait]
impl ContainerDeployments for ContainerService {
    async fn create_new_deployment(
        &self,
        cpu: f64,
        memory_in_gb: f64,
        tag: Option<&str>,
    ) -> ServiceResult<ContainerGroup> {
        self.instrumented(
            "create_new_deployment",
            self.deploy(cpu, memory_in_gb, tag, DeploymentMode::LongRunning),
        )
        .await
    }

    async fn create_new_deployment_sync(
        &self,
        cpu: f64,
        memory_in_gb: f64,
        tag: Option<&str>,
    ) -> ServiceResult<ContainerGroup> {
        self.instrumented(
            "create_new_deployment_sync",
            self.deploy(cpu, memory_in_gb, tag, DeploymentMode::Synchronous),
        )
        .await
    }

    async fn update_deployment_tag(
        &self,
        resource_id: &str,
        tag_name: &str,
        tag_value: &str,
    ) -> ServiceResult<()> {
        self.instrumented(
            "update_deployment_tag",
            self.tag(resource_id, ResourceTag::new(tag_name, tag_value)),
        )
        .await
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
