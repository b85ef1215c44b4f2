//! # aciprov – Azure Container Instances provisioning
//!
//! Creates single-container groups on Azure Container Instances and tags
//! them through the generic Resource Manager API, authenticating with a
//! service principal.
//!
//! ## Features
//!
//! - **OAuth2 Authentication** – client-credentials grant against Azure AD
//! - **Container Groups** – create with begin-and-return or wait-to-completion semantics
//! - **Long-running Operations** – `Azure-AsyncOperation`, `Location` and provisioning-state polling
//! - **Resource Tags** – merge a single tag onto any resource by id
//! - **Service Façade** – lazy single-flight clients, timing and error logging per operation

pub mod types;
pub mod config;
pub mod logger;
pub mod client;
pub mod auth;
pub mod lro;
pub mod descriptor;
pub mod container_instances;
pub mod resources;
pub mod service;

pub use config::{ConfigurationProvider, ContainerSettings, EnvConfiguration, StaticConfiguration};
pub use logger::{LogWriter, Logger, MemoryLogger};
pub use service::{ClientKind, ContainerDeployments, ContainerService, ServiceError, ServiceResult};
pub use types::{AzureError, AzureErrorKind, ClientOptions, ContainerGroup, DeploymentMode};
