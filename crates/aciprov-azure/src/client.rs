//! HTTP client wrapper for Azure Resource Manager API.
//!
//! Handles bearer-token injection, scoped URL construction and standard ARM
//! error extraction. Every request is sent exactly once; failures surface to
//! the caller without retry.

use log::debug;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, LOCATION};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::types::{
    AzureEndpoints, AzureError, AzureErrorKind, AzureResult, AzureToken, ClientOptions,
};

const AZURE_ASYNC_OPERATION: &str = "azure-asyncoperation";

/// Build the shared HTTP transport used by every client of one service.
pub fn build_http(options: &ClientOptions) -> Client {
    Client::builder()
        .timeout(options.request_timeout)
        .build()
        .unwrap_or_default()
}

/// A successful (2xx) ARM response with the headers that drive polling.
#[derive(Debug, Clone)]
pub struct ArmResponse {
    pub status: u16,
    pub async_operation: Option<String>,
    pub location: Option<String>,
    body: String,
}

impl ArmResponse {
    fn new(status: u16, headers: &HeaderMap, body: String) -> Self {
        Self {
            status,
            async_operation: header_string(headers, AZURE_ASYNC_OPERATION),
            location: header_string(headers, LOCATION.as_str()),
            body,
        }
    }

    pub fn is_accepted(&self) -> bool {
        self.status == 202
    }

    pub fn has_body(&self) -> bool {
        !self.body.trim().is_empty()
    }

    pub fn json<T: DeserializeOwned>(&self) -> AzureResult<T> {
        serde_json::from_str(&self.body)
            .map_err(|e| AzureError::new(AzureErrorKind::Parse, format!("JSON parse: {e}")))
    }
}

/// HTTP client holding one credential for one subscription.
#[derive(Clone)]
pub struct AzureClient {
    http: Client,
    endpoints: AzureEndpoints,
    options: ClientOptions,
    subscription_id: String,
    token: Option<AzureToken>,
}

impl AzureClient {
    pub fn new(
        http: Client,
        endpoints: AzureEndpoints,
        options: ClientOptions,
        subscription_id: impl Into<String>,
    ) -> Self {
        Self {
            http,
            endpoints,
            options,
            subscription_id: subscription_id.into(),
            token: None,
        }
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn endpoints(&self) -> &AzureEndpoints {
        &self.endpoints
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    pub fn set_token(&mut self, token: AzureToken) {
        self.token = Some(token);
    }

    pub fn subscription_id(&self) -> AzureResult<&str> {
        Some(self.subscription_id.as_str())
            .filter(|s| !s.is_empty())
            .ok_or_else(AzureError::subscription_not_set)
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Build a management URL: `{resource_manager}{path}`
    pub fn arm_url(&self, path: &str) -> String {
        format!("{}{}", self.endpoints.arm_base(), path)
    }

    /// Resource id scoped to a resource group of this subscription.
    pub fn resource_group_id(&self, rg: &str, suffix: &str) -> AzureResult<String> {
        let sub = self.subscription_id()?;
        Ok(format!("/subscriptions/{}/resourceGroups/{}{}", sub, rg, suffix))
    }

    // ── Auth header builder ──────────────────────────────────────────

    fn auth_headers(&self) -> AzureResult<HeaderMap> {
        let token = self
            .token
            .as_ref()
            .filter(|t| !t.access_token.is_empty())
            .ok_or_else(AzureError::not_authenticated)?;

        let mut headers = HeaderMap::new();
        let val = format!("Bearer {}", token.access_token);
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&val).map_err(|e| {
                AzureError::new(AzureErrorKind::Auth, format!("Header value error: {e}"))
            })?,
        );
        Ok(headers)
    }

    // ── Core HTTP verbs ──────────────────────────────────────────────

    pub async fn get(&self, url: &str) -> AzureResult<ArmResponse> {
        debug!("Azure GET {}", url);
        self.send(self.http.get(url)).await
    }

    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> AzureResult<T> {
        self.get(url).await?.json()
    }

    pub async fn put_json<B: Serialize + ?Sized>(
        &self,
        url: &str,
        body: &B,
    ) -> AzureResult<ArmResponse> {
        debug!("Azure PUT {}", url);
        self.send(self.http.put(url).json(body)).await
    }

    pub async fn patch_json<B: Serialize + ?Sized>(
        &self,
        url: &str,
        body: &B,
    ) -> AzureResult<ArmResponse> {
        debug!("Azure PATCH {}", url);
        self.send(self.http.patch(url).json(body)).await
    }

    async fn send(&self, request: RequestBuilder) -> AzureResult<ArmResponse> {
        let headers = self.auth_headers()?;
        let resp = request
            .headers(headers)
            .send()
            .await
            .map_err(AzureError::network)?;

        let status = resp.status().as_u16();
        let resp_headers = resp.headers().clone();
        let body = resp.text().await.map_err(AzureError::network)?;

        if (200..300).contains(&status) {
            Ok(ArmResponse::new(status, &resp_headers, body))
        } else {
            Err(AzureError::from_status(status, &body))
        }
    }

    /// POST unauthenticated form data (used by auth module for token exchange).
    pub async fn post_form_unauthenticated<T: DeserializeOwned>(
        &self,
        url: &str,
        form: &[(impl AsRef<str>, impl AsRef<str>)],
    ) -> AzureResult<T> {
        let form_pairs: Vec<(&str, &str)> = form
            .iter()
            .map(|(k, v)| (k.as_ref(), v.as_ref()))
            .collect();

        let resp = self
            .http
            .post(url)
            .form(&form_pairs)
            .send()
            .await
            .map_err(AzureError::network)?;

        if resp.status().is_success() {
            resp.json::<T>().await.map_err(|e| {
                AzureError::new(AzureErrorKind::Parse, format!("JSON parse: {e}"))
            })
        } else {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            Err(identity_error(status, &body))
        }
    }
}

// ── Helpers ─────────────────────────────────────────────────────────

fn header_string(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Identity-platform errors use `{"error":"invalid_client","error_description":"..."}`
/// rather than the ARM envelope. Any rejection of the secret is an auth failure.
fn identity_error(status: u16, body: &str) -> AzureError {
    #[derive(serde::Deserialize)]
    struct IdentityError {
        error: String,
        #[serde(default)]
        error_description: String,
    }

    match serde_json::from_str::<IdentityError>(body) {
        Ok(e) => AzureError {
            kind: AzureErrorKind::Auth,
            message: e.error_description,
            code: Some(e.error),
            status_code: Some(status),
        },
        Err(_) => {
            let mut err = AzureError::from_status(status, body);
            if matches!(status, 400 | 401) {
                err.kind = AzureErrorKind::Auth;
            }
            err
        }
    }
}

// ─── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn client(sub: &str) -> AzureClient {
        let options = ClientOptions::default();
        AzureClient::new(build_http(&options), AzureEndpoints::default(), options, sub)
    }

    #[test]
    fn set_token_supplies_bearer_header() {
        let mut c = client("sub1");
        c.set_token(AzureToken {
            access_token: "abc".into(),
            token_type: "Bearer".into(),
            ..Default::default()
        });
        let headers = c.auth_headers().unwrap();
        assert_eq!(headers.get(AUTHORIZATION).unwrap(), "Bearer abc");
    }

    #[test]
    fn subscription_id_missing() {
        let c = client("");
        assert_eq!(
            c.subscription_id().unwrap_err().kind,
            AzureErrorKind::SubscriptionNotSet
        );
    }

    #[test]
    fn arm_url_construction() {
        let c = client("sub1");
        assert_eq!(
            c.arm_url("/subscriptions/abc"),
            "https://management.azure.com/subscriptions/abc"
        );
    }

    #[test]
    fn resource_group_id_construction() {
        let c = client("sub1");
        let id = c
            .resource_group_id("rg1", "/providers/Microsoft.ContainerInstance/containerGroups/cg")
            .unwrap();
        assert_eq!(
            id,
            "/subscriptions/sub1/resourceGroups/rg1/providers/Microsoft.ContainerInstance/containerGroups/cg"
        );
        assert_eq!(
            c.arm_url(&id),
            "https://management.azure.com/subscriptions/sub1/resourceGroups/rg1/providers/Microsoft.ContainerInstance/containerGroups/cg"
        );
    }

    #[test]
    fn auth_headers_require_token() {
        let c = client("sub1");
        assert_eq!(c.auth_headers().unwrap_err().kind, AzureErrorKind::NotAuthenticated);
    }

    #[test]
    fn arm_response_reads_polling_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "azure-asyncoperation",
            HeaderValue::from_static("https://example/op/1"),
        );
        headers.insert(LOCATION, HeaderValue::from_static(""));
        let r = ArmResponse::new(201, &headers, "{}".into());
        assert_eq!(r.async_operation.as_deref(), Some("https://example/op/1"));
        assert!(r.location.is_none());
        assert!(!r.is_accepted());
        assert!(r.has_body());
    }

    #[test]
    fn identity_error_is_auth() {
        let body = r#"{"error":"invalid_client","error_description":"AADSTS7000215: Invalid client secret provided."}"#;
        let e = identity_error(401, body);
        assert_eq!(e.kind, AzureErrorKind::Auth);
        assert_eq!(e.code.as_deref(), Some("invalid_client"));

        let e = identity_error(400, "garbage");
        assert_eq!(e.kind, AzureErrorKind::Auth);
        let e = identity_error(503, "down");
        assert_eq!(e.kind, AzureErrorKind::ServerError);
    }
}
