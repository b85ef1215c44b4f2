//! Generic resource management – tag updates by resource id.

use log::debug;
use url::Url;

use crate::client::AzureClient;
use crate::lro;
use crate::types::{
    api_versions, AzureError, AzureErrorKind, AzureResult, GenericResource, ResourceTag, TagPatch,
};

fn resource_url(client: &AzureClient, resource_id: &str) -> AzureResult<String> {
    if !resource_id.starts_with('/') {
        return Err(AzureError::new(
            AzureErrorKind::Validation,
            format!("resource id must start with '/': {resource_id:?}"),
        ));
    }
    let mut url = Url::parse(&client.arm_url(resource_id)).map_err(|e| {
        AzureError::new(AzureErrorKind::Validation, format!("invalid resource id: {e}"))
    })?;
    url.query_pairs_mut()
        .append_pair("api-version", api_versions::RESOURCES_UPDATE_BY_ID);
    Ok(url.into())
}

/// Merge a single tag onto the resource identified by `resource_id`.
///
/// Existing tags are not read first; merge/replace semantics are those of the
/// provider's update-by-id endpoint.
pub async fn update_tag_by_id(
    client: &AzureClient,
    resource_id: &str,
    tag: &ResourceTag,
) -> AzureResult<GenericResource> {
    let url = resource_url(client, resource_id)?;
    debug!("update_tag_by_id({}={}) → {}", tag.name, tag.value, url);

    let resp = client.patch_json(&url, &TagPatch::from(tag)).await?;
    if resp.is_accepted() && resp.location.is_some() {
        return lro::wait_for_completion(client, resp, &url).await;
    }
    if resp.has_body() {
        resp.json()
    } else {
        Ok(GenericResource {
            id: resource_id.to_string(),
            ..Default::default()
        })
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
