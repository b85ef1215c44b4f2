//! Azure AD OAuth2 authentication.
//!
//! Exchanges service-principal credentials for a management-plane bearer
//! token using the Microsoft Identity Platform v2.0 token endpoint. No token
//! is cached here; the caller owns the result.

use chrono::{Duration, Utc};
use log::debug;

use crate::client::AzureClient;
use crate::types::{
    AzureCredentials, AzureError, AzureErrorKind, AzureResult, AzureToken, TokenResponse,
};

/// Token endpoint URL for a given tenant.
fn token_url(authority_host: &str, tenant_id: &str) -> String {
    format!(
        "{}/{}/oauth2/v2.0/token",
        authority_host.trim_end_matches('/'),
        tenant_id
    )
}

/// Acquire a token using the client-credentials grant.
pub async fn acquire_token(
    client: &AzureClient,
    creds: &AzureCredentials,
) -> AzureResult<AzureToken> {
    if creds.client_id.is_empty() || creds.client_secret.is_empty() || creds.tenant_id.is_empty() {
        return Err(AzureError::new(
            AzureErrorKind::Validation,
            "client_id, client_secret, and tenant_id are all required",
        ));
    }

    let endpoints = client.endpoints();
    let url = token_url(&endpoints.authority_host, &creds.tenant_id);
    debug!("Azure token request → {}", url);

    let scope = endpoints.management_scope();
    let form: Vec<(&str, &str)> = vec![
        ("grant_type", "client_credentials"),
        ("client_id", &creds.client_id),
        ("client_secret", &creds.client_secret),
        ("scope", &scope),
    ];

    let resp: TokenResponse = client.post_form_unauthenticated(&url, &form).await?;
    Ok(token_from_response(resp))
}

fn token_from_response(resp: TokenResponse) -> AzureToken {
    let expires_at = resp
        .expires_in
        .map(|secs| Utc::now() + Duration::seconds(secs as i64));

    AzureToken {
        access_token: resp.access_token,
        token_type: resp.token_type,
        expires_at,
        resource: resp.resource,
    }
}

// ─── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::build_http;
    use crate::types::{AzureEndpoints, ClientOptions};
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(authority: &str) -> AzureClient {
        let options = ClientOptions::default();
        let endpoints = AzureEndpoints {
            authority_host: authority.into(),
            resource_manager: "https://management.azure.com".into(),
        };
        AzureClient::new(build_http(&options), endpoints, options, "sub-1")
    }

    fn creds() -> AzureCredentials {
        AzureCredentials {
            client_id: "app-id".into(),
            client_secret: "s3cret".into(),
            tenant_id: "tenant-1".into(),
            subscription_id: "sub-1".into(),
        }
    }

    #[test]
    fn token_url_construction() {
        assert_eq!(
            token_url("https://login.microsoftonline.com", "my-tenant-123"),
            "https://login.microsoftonline.com/my-tenant-123/oauth2/v2.0/token"
        );
        assert_eq!(
            token_url("http://localhost:8080/", "t"),
            "http://localhost:8080/t/oauth2/v2.0/token"
        );
    }

    #[test]
    fn token_from_response_with_expiry() {
        let resp = TokenResponse {
            access_token: "tok123".into(),
            token_type: "Bearer".into(),
            expires_in: Some(3600),
            resource: None,
        };
        let t = token_from_response(resp);
        assert_eq!(t.access_token, "tok123");
        assert!(t.expires_at.is_some_and(|at| at > Utc::now()));
    }

    #[tokio::test]
    async fn acquire_token_validation() {
        let client = client_for("http://127.0.0.1:9");
        let e = acquire_token(&client, &AzureCredentials::default())
            .await
            .unwrap_err();
        assert_eq!(e.kind, AzureErrorKind::Validation);
    }

    #[tokio::test]
    async fn acquire_token_posts_client_credentials() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/tenant-1/oauth2/v2.0/token"))
            .and(body_string_contains("grant_type=client_credentials"))
            .and(body_string_contains("client_id=app-id"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "tok",
                "token_type": "Bearer",
                "expires_in": 3599
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server.uri());
        let token = acquire_token(&client, &creds()).await.unwrap();
        assert_eq!(token.access_token, "tok");
        assert_eq!(token.token_type, "Bearer");
    }

    #[tokio::test]
    async fn rejected_secret_is_auth_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/tenant-1/oauth2/v2.0/token"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "error": "invalid_client",
                "error_description": "AADSTS7000215: Invalid client secret provided."
            })))
            .mount(&server)
            .await;

        let client = client_for(&server.uri());
        let e = acquire_token(&client, &creds()).await.unwrap_err();
        assert_eq!(e.kind, AzureErrorKind::Auth);
        assert_eq!(e.code.as_deref(), Some("invalid_client"));
        assert_eq!(e.status_code, Some(401));
    }
}
