//! SSOReady HTTP API client

use super::{BrokerClient, BrokerError, IdpRedirectUrl};
use crate::handoff::{OneTimeAccessCode, OrganizationIdentifier, RedeemedIdentity};
use async_trait::async_trait;
use log::debug;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// Public SSOReady API endpoint
pub const DEFAULT_BASE_URL: &str = "https://api.ssoready.com";

const REDIRECT_PATH: &str = "v1/saml/redirect";
const REDEEM_PATH: &str = "v1/saml/redeem";

/// Longest broker error body echoed into an error message
const MAX_ERROR_MESSAGE_LEN: usize = 200;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RedirectRequest<'a> {
    organization_external_id: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RedirectResponse {
    redirect_url: Option<String>,
}

// No Debug: the body carries the one-time code
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RedeemRequest {
    saml_access_code: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RedeemResponse {
    email: Option<String>,
    organization_id: Option<String>,
    organization_external_id: Option<String>,
}

/// Broker client speaking the SSOReady JSON API over reqwest
#[derive(Clone)]
pub struct SsoReadyClient {
    http_client: reqwest::Client,
    base_url: Url,
    api_key: String,
}

impl SsoReadyClient {
    /// Create a client for the given API base URL
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL does not parse or the HTTP client
    /// cannot be built
    pub fn new(base_url: &str, api_key: impl Into<String>, timeout: Duration) -> Result<Self, BrokerError> {
        let mut base_url = Url::parse(base_url)
            .map_err(|e| BrokerError::InvalidResponse(format!("invalid broker base URL: {e}")))?;
        // Url::join replaces the last segment unless the path ends in '/'
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BrokerError::Transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http_client,
            base_url,
            api_key: api_key.into(),
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, BrokerError> {
        self.base_url
            .join(path)
            .map_err(|e| BrokerError::InvalidResponse(format!("invalid broker endpoint: {e}")))
    }

    async fn post_json<B, R>(&self, path: &str, body: &B) -> Result<R, BrokerError>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        let url = self.endpoint(path)?;
        debug!("Calling broker endpoint {url}");

        let response = self
            .http_client
            .post(url)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| BrokerError::Transport(e.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(BrokerError::Rejected {
                status: status.as_u16(),
                message: extract_error_message(&text),
            });
        }

        response.json::<R>().await.map_err(|e| {
            if e.is_decode() {
                BrokerError::InvalidResponse(e.without_url().to_string())
            } else {
                BrokerError::Transport(e.without_url().to_string())
            }
        })
    }
}

#[async_trait]
impl BrokerClient for SsoReadyClient {
    async fn resolve_redirect_url(
        &self,
        organization: &OrganizationIdentifier,
    ) -> Result<IdpRedirectUrl, BrokerError> {
        let request = RedirectRequest {
            organization_external_id: organization.as_str(),
        };
        let response: RedirectResponse = self.post_json(REDIRECT_PATH, &request).await?;

        let raw = response
            .redirect_url
            .filter(|url| !url.is_empty())
            .ok_or_else(|| BrokerError::InvalidResponse("response has no redirectUrl".into()))?;
        IdpRedirectUrl::parse(&raw)
    }

    async fn redeem_access_code(
        &self,
        code: OneTimeAccessCode,
    ) -> Result<RedeemedIdentity, BrokerError> {
        let request = RedeemRequest {
            saml_access_code: code.into_secret(),
        };
        let response: RedeemResponse = self.post_json(REDEEM_PATH, &request).await?;

        let email = response
            .email
            .map(|email| email.trim().to_string())
            .filter(|email| !email.is_empty())
            .ok_or_else(|| BrokerError::InvalidResponse("response has no email".into()))?;

        Ok(RedeemedIdentity {
            email,
            organization_id: response.organization_id,
            organization_external_id: response.organization_external_id,
        })
    }

    fn broker_name(&self) -> &'static str {
        "ssoready"
    }
}

/// Pull a readable message out of a broker error body
fn extract_error_message(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        if let Some(message) = value.get("message").and_then(serde_json::Value::as_str) {
            return message.to_string();
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "no error message".to_string();
    }
    trimmed.chars().take(MAX_ERROR_MESSAGE_LEN).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> SsoReadyClient {
        SsoReadyClient::new(base, "sk_test", Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_endpoints_join_onto_base() {
        let c = client(DEFAULT_BASE_URL);
        assert_eq!(
            c.endpoint(REDIRECT_PATH).unwrap().as_str(),
            "https://api.ssoready.com/v1/saml/redirect"
        );

        let c = client("http://127.0.0.1:9000/broker");
        assert_eq!(
            c.endpoint(REDEEM_PATH).unwrap().as_str(),
            "http://127.0.0.1:9000/broker/v1/saml/redeem"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(SsoReadyClient::new("not a url", "sk", Duration::from_secs(1)).is_err());
    }

    #[test]
    fn test_extract_error_message() {
        assert_eq!(
            extract_error_message(r#"{"message":"saml access code expired"}"#),
            "saml access code expired"
        );
        assert_eq!(extract_error_message("  upstream gone "), "upstream gone");
        assert_eq!(extract_error_message(""), "no error message");

        let long = "x".repeat(500);
        assert_eq!(extract_error_message(&long).len(), MAX_ERROR_MESSAGE_LEN);
    }

    #[test]
    fn test_wire_format_is_camel_case() {
        let body = serde_json::to_value(RedirectRequest {
            organization_external_id: "example.com",
        })
        .unwrap();
        assert_eq!(body["organizationExternalId"], "example.com");

        let body = serde_json::to_value(RedeemRequest {
            saml_access_code: "abc123".into(),
        })
        .unwrap();
        assert_eq!(body["samlAccessCode"], "abc123");

        let parsed: RedeemResponse = serde_json::from_str(
            r#"{"email":"john.doe@example.com","organizationId":"org_1","organizationExternalId":"example.com","attributes":{}}"#,
        )
        .unwrap();
        assert_eq!(parsed.email.as_deref(), Some("john.doe@example.com"));
        assert_eq!(parsed.organization_id.as_deref(), Some("org_1"));
    }
}
