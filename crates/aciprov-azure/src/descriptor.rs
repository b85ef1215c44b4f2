//! Container group descriptors built from settings and per-call parameters.

use uuid::Uuid;

use crate::config::ContainerSettings;
use crate::types::{
    Container, ContainerGroup, ContainerGroupProperties, ContainerIpAddress, ContainerPort,
    ContainerProperties, ContainerResources, ImageRegistryCredential, ResourceRequests,
};

/// Prefix of every generated deployment name.
pub const DEPLOYMENT_NAME_PREFIX: &str = "aci-inst-";

/// Name of the single container in each group.
pub const DEFAULT_CONTAINER_NAME: &str = "default-container";

/// Groups are never restarted by the platform.
pub const RESTART_POLICY: &str = "Never";

const NAME_SUFFIX_LEN: usize = 12;

/// Generate a fresh deployment name: the prefix plus the last 12
/// characters of a random v4 UUID.
pub fn generate_deployment_name() -> String {
    let id = Uuid::new_v4().to_string();
    format!("{}{}", DEPLOYMENT_NAME_PREFIX, &id[id.len() - NAME_SUFFIX_LEN..])
}

/// `<image>:<tag>` when a tag is given, the bare image otherwise.
pub fn resolve_image(image: &str, tag: Option<&str>) -> String {
    match tag {
        Some(t) if !t.is_empty() => format!("{image}:{t}"),
        _ => image.to_string(),
    }
}

/// One registry credential when both host and username are configured.
pub fn registry_credentials(settings: &ContainerSettings) -> Option<Vec<ImageRegistryCredential>> {
    if settings.container_registry_host.is_empty() || settings.container_registry_username.is_empty()
    {
        return None;
    }
    Some(vec![ImageRegistryCredential {
        server: settings.container_registry_host.clone(),
        username: settings.container_registry_username.clone(),
        password: settings.container_registry_password.clone(),
    }])
}

/// Everything needed to create one single-container group.
#[derive(Debug, Clone, PartialEq)]
pub struct DeploymentDescriptor {
    pub name: String,
    pub location: String,
    pub container_name: String,
    pub image: String,
    pub port: Option<u16>,
    pub cpu: f64,
    pub memory_in_gb: f64,
    pub registry_credentials: Option<Vec<ImageRegistryCredential>>,
    pub os_type: String,
    pub dns_name_label: String,
    pub restart_policy: &'static str,
}

impl DeploymentDescriptor {
    pub fn build(
        settings: &ContainerSettings,
        name: String,
        cpu: f64,
        memory_in_gb: f64,
        tag: Option<&str>,
    ) -> Self {
        Self {
            location: settings.region.clone(),
            container_name: DEFAULT_CONTAINER_NAME.to_string(),
            image: resolve_image(&settings.container_image, tag),
            port: settings.container_port,
            cpu,
            memory_in_gb,
            registry_credentials: registry_credentials(settings),
            os_type: settings.container_os.clone(),
            dns_name_label: name.clone(),
            restart_policy: RESTART_POLICY,
            name,
        }
    }

    /// ARM request body for `containerGroups/{name}`.
    pub fn to_container_group(&self) -> ContainerGroup {
        let ports: Vec<ContainerPort> = self
            .port
            .map(|port| ContainerPort {
                port,
                protocol: None,
            })
            .into_iter()
            .collect();

        ContainerGroup {
            location: self.location.clone(),
            properties: Some(ContainerGroupProperties {
                containers: vec![Container {
                    name: self.container_name.clone(),
                    properties: Some(ContainerProperties {
                        image: Some(self.image.clone()),
                        resources: Some(ContainerResources {
                            requests: Some(ResourceRequests {
                                cpu: Some(self.cpu),
                                memory_in_gb: Some(self.memory_in_gb),
                            }),
                        }),
                        ports: ports.clone(),
                    }),
                }],
                image_registry_credentials: self.registry_credentials.clone(),
                os_type: Some(self.os_type.clone()),
                provisioning_state: None,
                ip_address: Some(ContainerIpAddress {
                    ports,
                    ip_type: "Public".into(),
                    dns_name_label: Some(self.dns_name_label.clone()),
                    ..Default::default()
                }),
                restart_policy: Some(self.restart_policy.to_string()),
            }),
            ..Default::default()
        }
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
