//! Long-running operation polling.
//!
//! ARM signals an operation still in progress in one of three ways: an
//! `Azure-AsyncOperation` status URL, a `Location` URL answering 202, or a
//! non-terminal `provisioningState` on the resource itself. Polls are spaced
//! by the client's `lro_retry_timeout` and bounded by `lro_max_wait`.

use log::debug;
use serde::de::DeserializeOwned;
use tokio::time::{sleep, Instant};

use crate::client::{ArmResponse, AzureClient};
use crate::types::{
    ArmErrorDetail, ArmErrorResponse, AsyncOperationStatus, AzureError, AzureErrorKind,
    AzureResult, ProvisioningProbe,
};

/// Terminal and in-flight states shared by async-operation status and
/// `provisioningState`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationState {
    InProgress,
    Succeeded,
    Failed,
    Canceled,
}

impl OperationState {
    pub fn parse(s: &str) -> Self {
        if s.eq_ignore_ascii_case("succeeded") {
            Self::Succeeded
        } else if s.eq_ignore_ascii_case("failed") {
            Self::Failed
        } else if s.eq_ignore_ascii_case("canceled") || s.eq_ignore_ascii_case("cancelled") {
            Self::Canceled
        } else {
            Self::InProgress
        }
    }
}

/// Provisioning state carried in a response body, if any.
pub fn provisioning_state(resp: &ArmResponse) -> Option<OperationState> {
    if !resp.has_body() {
        return None;
    }
    resp.json::<ProvisioningProbe>()
        .ok()
        .and_then(|p| p.properties)
        .and_then(|p| p.provisioning_state)
        .map(|s| OperationState::parse(&s))
}

/// Error payload carried alongside a failed resource, if any.
fn error_detail(resp: &ArmResponse) -> Option<ArmErrorDetail> {
    resp.json::<ArmErrorResponse>().ok().map(|r| r.error)
}

/// Wait for the operation started by `initial` and return the final state of
/// the resource at `resource_url`.
pub async fn wait_for_completion<T: DeserializeOwned>(
    client: &AzureClient,
    initial: ArmResponse,
    resource_url: &str,
) -> AzureResult<T> {
    match provisioning_state(&initial) {
        Some(OperationState::Succeeded) => return initial.json(),
        Some(state @ (OperationState::Failed | OperationState::Canceled)) => {
            return Err(AzureError::operation_failed(
                &format!("{state:?}"),
                error_detail(&initial),
            ));
        }
        _ => {}
    }

    let deadline = Instant::now() + client.options().lro_max_wait;

    if let Some(op_url) = initial.async_operation.as_deref() {
        poll_async_operation(client, op_url, deadline).await?;
        return client.get_json(resource_url).await;
    }

    if initial.is_accepted() {
        if let Some(location) = initial.location.as_deref() {
            let done = poll_location(client, location, deadline).await?;
            return if done.has_body() {
                done.json()
            } else {
                client.get_json(resource_url).await
            };
        }
    }

    poll_resource(client, resource_url, deadline).await
}

async fn poll_async_operation(
    client: &AzureClient,
    op_url: &str,
    deadline: Instant,
) -> AzureResult<()> {
    loop {
        pause(client, deadline).await?;
        let op: AsyncOperationStatus = client.get_json(op_url).await?;
        debug!("async operation status: {}", op.status);
        match OperationState::parse(&op.status) {
            OperationState::Succeeded => return Ok(()),
            OperationState::InProgress => continue,
            _ => return Err(AzureError::operation_failed(&op.status, op.error)),
        }
    }
}

async fn poll_location(
    client: &AzureClient,
    location: &str,
    deadline: Instant,
) -> AzureResult<ArmResponse> {
    loop {
        pause(client, deadline).await?;
        let resp = client.get(location).await?;
        debug!("location poll → {}", resp.status);
        if !resp.is_accepted() {
            return Ok(resp);
        }
    }
}

async fn poll_resource<T: DeserializeOwned>(
    client: &AzureClient,
    resource_url: &str,
    deadline: Instant,
) -> AzureResult<T> {
    loop {
        pause(client, deadline).await?;
        let resp = client.get(resource_url).await?;
        match provisioning_state(&resp) {
            Some(OperationState::Succeeded) | None => return resp.json(),
            Some(OperationState::InProgress) => {
                debug!("resource still provisioning: {}", resource_url);
            }
            Some(state) => {
                return Err(AzureError::operation_failed(
                    &format!("{state:?}"),
                    error_detail(&resp),
                ));
            }
        }
    }
}

/// Sleep one retry interval, failing if that would pass the deadline.
async fn pause(client: &AzureClient, deadline: Instant) -> AzureResult<()> {
    let interval = client.options().lro_retry_timeout;
    if Instant::now() + interval > deadline {
        return Err(AzureError::new(
            AzureErrorKind::Timeout,
            "Long-running operation did not complete in time",
        ));
    }
    sleep(interval).await;
    Ok(())
}

// ─── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::client::build_http;
    use crate::types::{AzureEndpoints, AzureToken, ClientOptions, ContainerGroup};
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer, max_wait: Duration) -> AzureClient {
        let options = ClientOptions {
            lro_retry_timeout: Duration::from_millis(10),
            lro_max_wait: max_wait,
            ..Default::default()
        };
        let endpoints = AzureEndpoints {
            authority_host: server.uri(),
            resource_manager: server.uri(),
        };
        let mut client = AzureClient::new(build_http(&options), endpoints, options, "sub-1");
        client.set_token(AzureToken {
            access_token: "tok".into(),
            token_type: "Bearer".into(),
            ..Default::default()
        });
        client
    }

    #[test]
    fn state_parsing() {
        assert_eq!(OperationState::parse("Succeeded"), OperationState::Succeeded);
        assert_eq!(OperationState::parse("failed"), OperationState::Failed);
        assert_eq!(OperationState::parse("Canceled"), OperationState::Canceled);
        assert_eq!(OperationState::parse("Creating"), OperationState::InProgress);
        assert_eq!(OperationState::parse("Pending"), OperationState::InProgress);
    }

    #[tokio::test]
    async fn polls_async_operation_then_reads_resource() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/cg"))
            .respond_with(
                ResponseTemplate::new(201)
                    .set_body_json(json!({"name": "cg", "properties": {"provisioningState": "Creating"}}))
                    .insert_header("Azure-AsyncOperation", format!("{}/op", server.uri()).as_str()),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/op"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "InProgress"})))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/op"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "Succeeded"})))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/cg"))
            .respond_with(ResponseTemplate::new(200).set_body_json(
                json!({"id": "/cg", "name": "cg", "properties": {"provisioningState": "Succeeded"}}),
            ))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server, Duration::from_secs(5));
        let url = format!("{}/cg", server.uri());
        let initial = client.put_json(&url, &json!({})).await.unwrap();
        let cg: ContainerGroup = wait_for_completion(&client, initial, &url).await.unwrap();
        assert_eq!(cg.provisioning_state(), Some("Succeeded"));
    }

    #[tokio::test]
    async fn failed_async_operation_carries_provider_error() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/cg"))
            .respond_with(
                ResponseTemplate::new(201)
                    .set_body_json(json!({"properties": {"provisioningState": "Pending"}}))
                    .insert_header("Azure-AsyncOperation", format!("{}/op", server.uri()).as_str()),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/op"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "Failed",
                "error": {"code": "InaccessibleImage", "message": "image not found"}
            })))
            .mount(&server)
            .await;

        let client = client_for(&server, Duration::from_secs(5));
        let url = format!("{}/cg", server.uri());
        let initial = client.put_json(&url, &json!({})).await.unwrap();
        let e = wait_for_completion::<ContainerGroup>(&client, initial, &url)
            .await
            .unwrap_err();
        assert_eq!(e.kind, AzureErrorKind::OperationFailed);
        assert_eq!(e.code.as_deref(), Some("InaccessibleImage"));
    }

    #[tokio::test]
    async fn failed_initial_response_keeps_provider_error() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/cg"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "properties": {"provisioningState": "Failed"},
                "error": {"code": "InvalidOsType", "message": "The 'osType' is invalid."}
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&server)
            .await;

        let client = client_for(&server, Duration::from_secs(5));
        let url = format!("{}/cg", server.uri());
        let initial = client.put_json(&url, &json!({})).await.unwrap();
        let e = wait_for_completion::<ContainerGroup>(&client, initial, &url)
            .await
            .unwrap_err();
        assert_eq!(e.kind, AzureErrorKind::OperationFailed);
        assert_eq!(e.code.as_deref(), Some("InvalidOsType"));
        assert_eq!(e.message, "The 'osType' is invalid.");
    }

    #[tokio::test]
    async fn polls_resource_without_headers() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/cg"))
            .respond_with(ResponseTemplate::new(201).set_body_json(
                json!({"properties": {"provisioningState": "Creating"}}),
            ))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/cg"))
            .respond_with(ResponseTemplate::new(200).set_body_json(
                json!({"name": "cg", "properties": {"provisioningState": "Succeeded"}}),
            ))
            .mount(&server)
            .await;

        let client = client_for(&server, Duration::from_secs(5));
        let url = format!("{}/cg", server.uri());
        let initial = client.put_json(&url, &json!({})).await.unwrap();
        let cg: ContainerGroup = wait_for_completion(&client, initial, &url).await.unwrap();
        assert_eq!(cg.name, "cg");
    }

    #[tokio::test]
    async fn times_out_when_never_terminal() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/cg"))
            .respond_with(ResponseTemplate::new(201).set_body_json(
                json!({"properties": {"provisioningState": "Creating"}}),
            ))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/cg"))
            .respond_with(ResponseTemplate::new(200).set_body_json(
                json!({"properties": {"provisioningState": "Creating"}}),
            ))
            .mount(&server)
            .await;

        let client = client_for(&server, Duration::from_millis(50));
        let url = format!("{}/cg", server.uri());
        let initial = client.put_json(&url, &json!({})).await.unwrap();
        let e = wait_for_completion::<ContainerGroup>(&client, initial, &url)
            .await
            .unwrap_err();
        assert_eq!(e.kind, AzureErrorKind::Timeout);
    }

    #[tokio::test]
    async fn terminal_initial_response_skips_polling() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/cg"))
            .respond_with(ResponseTemplate::new(200).set_body_json(
                json!({"name": "cg", "properties": {"provisioningState": "Succeeded"}}),
            ))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&server)
            .await;

        let client = client_for(&server, Duration::from_secs(5));
        let url = format!("{}/cg", server.uri());
        let initial = client.put_json(&url, &json!({})).await.unwrap();
        let cg: ContainerGroup = wait_for_completion(&client, initial, &url).await.unwrap();
        assert_eq!(cg.name, "cg");
    }
}
