//! Azure Container Instances – container group creation.

use log::debug;

use crate::client::AzureClient;
use crate::descriptor::DeploymentDescriptor;
use crate::lro;
use crate::types::{api_versions, AzureResult, ContainerGroup, DeploymentMode};

/// Resource id of a container group.
fn container_group_id(client: &AzureClient, rg: &str, name: &str) -> AzureResult<String> {
    client.resource_group_id(
        rg,
        &format!("/providers/Microsoft.ContainerInstance/containerGroups/{name}"),
    )
}

/// Create or update the container group described by `descriptor`.
///
/// `LongRunning` returns the provider's acceptance response as-is;
/// `Synchronous` polls until the group reaches a terminal state.
pub async fn create_container_group(
    client: &AzureClient,
    rg: &str,
    descriptor: &DeploymentDescriptor,
    mode: DeploymentMode,
) -> AzureResult<ContainerGroup> {
    let id = container_group_id(client, rg, &descriptor.name)?;
    let url = format!(
        "{}?api-version={}",
        client.arm_url(&id),
        api_versions::CONTAINER_INSTANCE
    );
    debug!("create_container_group({}/{}, {:?}) → {}", rg, descriptor.name, mode, url);

    let initial = client.put_json(&url, &descriptor.to_container_group()).await?;
    match mode {
        // A 202 may carry only polling headers.
        DeploymentMode::LongRunning if !initial.has_body() => Ok(ContainerGroup {
            id,
            name: descriptor.name.clone(),
            location: descriptor.location.clone(),
            ..Default::default()
        }),
        DeploymentMode::LongRunning => initial.json(),
        DeploymentMode::Synchronous => lro::wait_for_completion(client, initial, &url).await,
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
