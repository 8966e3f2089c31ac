//! Client-credentials token exchange against the Microsoft identity endpoint

use reqwest::Client;
use serde::{Deserialize, Serialize};
use url::Url;

use super::error::AuthError;
use super::types::BearerToken;
use crate::config::Config;

/// Anything able to hand out a fresh bearer token for the management API.
#[cfg_attr(test, mockall::automock)]
pub trait TokenSource {
    async fn token(&self) -> Result<BearerToken, AuthError>;
}

#[derive(Serialize)]
struct TokenRequest<'a> {
    grant_type: &'static str,
    client_id: &'a str,
    client_secret: &'a str,
    resource: &'a str,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    token_type: Option<String>,
    #[serde(default)]
    access_token: Option<String>,
}

/// Service-principal credentials plus the endpoint they are exchanged at.
///
/// Tokens are never cached: every call performs one token request.
pub struct TokenProvider {
    client: Client,
    token_url: Url,
    client_id: String,
    client_secret: String,
    resource: String,
}

impl TokenProvider {
    pub fn new(client: Client, config: &Config) -> Result<Self, url::ParseError> {
        let token_url = Url::parse(&format!(
            "{}/{}/oauth2/token",
            config.login_endpoint.trim_end_matches('/'),
            config.tenant_id
        ))?;

        Ok(Self {
            client,
            token_url,
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            resource: config.token_resource.clone(),
        })
    }

    /// Exchanges the credentials for a bearer token.
    pub async fn get_token(&self) -> Result<BearerToken, AuthError> {
        let form = TokenRequest {
            grant_type: "client_credentials",
            client_id: &self.client_id,
            client_secret: &self.client_secret,
            resource: &self.resource,
        };

        let response = self
            .client
            .post(self.token_url.clone())
            .form(&form)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status, "Identity endpoint returned non-OK status");
            return Err(AuthError::Rejected { status, body });
        }

        let body = response.bytes().await?;
        let payload: TokenResponse = serde_json::from_slice(&body)?;
        match payload.access_token.as_deref() {
            Some(access_token) if !access_token.is_empty() => {
                let token_type = payload.token_type.as_deref().unwrap_or("Bearer");
                tracing::debug!("Obtained management api token");
                Ok(BearerToken::new(token_type, access_token))
            }
            _ => Err(AuthError::MissingToken),
        }
    }
}

impl TokenSource for TokenProvider {
    async fn token(&self) -> Result<BearerToken, AuthError> {
        self.get_token().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::tests::test_config;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn provider_for(server: &MockServer) -> TokenProvider {
        let mut config = test_config();
        config.login_endpoint = server.uri();
        TokenProvider::new(Client::new(), &config).unwrap()
    }

    #[tokio::test]
    async fn posts_client_credentials_form_to_tenant_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/tenant-1/oauth2/token"))
            .and(body_string_contains("grant_type=client_credentials"))
            .and(body_string_contains("client_id=client-1"))
            .and(body_string_contains("client_secret=s3cret"))
            .and(body_string_contains(
                "resource=https%3A%2F%2Fmanagement.core.windows.net%2F",
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "token_type": "Bearer",
                "access_token": "abc123",
                "expires_in": "3599"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let token = provider_for(&server).await.get_token().await.unwrap();
        assert_eq!(token.header_value(), "Bearer abc123");
    }

    #[tokio::test]
    async fn non_json_token_body_is_a_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/tenant-1/oauth2/token"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>sign in</html>"))
            .mount(&server)
            .await;

        let err = provider_for(&server).await.get_token().await.unwrap_err();
        assert!(matches!(err, AuthError::Decode(_)));
    }

    #[tokio::test]
    async fn missing_access_token_is_an_auth_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "token_type": "Bearer"
            })))
            .mount(&server)
            .await;

        let err = provider_for(&server).await.get_token().await.unwrap_err();
        assert!(matches!(err, AuthError::MissingToken));
    }

    #[tokio::test]
    async fn rejected_credentials_are_an_auth_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid_client"))
            .mount(&server)
            .await;

        let err = provider_for(&server).await.get_token().await.unwrap_err();
        match err {
            AuthError::Rejected { status, body } => {
                assert_eq!(status, 401);
                assert_eq!(body, "invalid_client");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn every_call_requests_a_new_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "token_type": "Bearer",
                "access_token": "abc123"
            })))
            .expect(3)
            .mount(&server)
            .await;

        let provider = provider_for(&server).await;
        for _ in 0..3 {
            provider.token().await.unwrap();
        }
    }
}
