//! SSO broker client
//!
//! The broker resolves an organization to its identity provider and mediates
//! one-time access codes. The rest of the crate only sees the two-operation
//! [`BrokerClient`] contract, so tests can swap in a double.

pub mod ssoready;

pub use ssoready::SsoReadyClient;

use crate::handoff::{OneTimeAccessCode, OrganizationIdentifier, RedeemedIdentity};
use async_trait::async_trait;
use std::fmt;
use thiserror::Error;
use url::Url;

/// Broker call failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BrokerError {
    /// Network failure, timeout or unreadable response stream
    #[error("broker unreachable: {0}")]
    Transport(String),

    /// Broker answered with a non-success status
    #[error("broker rejected request with status {status}: {message}")]
    Rejected { status: u16, message: String },

    /// Broker answered successfully but the body was not usable
    #[error("invalid broker response: {0}")]
    InvalidResponse(String),
}

impl BrokerError {
    /// Whether the broker refused the request itself (4xx), as opposed to failing
    #[must_use]
    pub fn is_client_rejection(&self) -> bool {
        matches!(self, BrokerError::Rejected { status, .. } if (400..500).contains(status))
    }
}

/// Operations the handoff controller needs from the broker
#[async_trait]
pub trait BrokerClient: Send + Sync {
    /// Get the identity provider URL to send the browser to
    ///
    /// # Errors
    ///
    /// Returns an error if the broker is unreachable, does not know the
    /// organization, or returns an unusable URL
    async fn resolve_redirect_url(
        &self,
        organization: &OrganizationIdentifier,
    ) -> Result<IdpRedirectUrl, BrokerError>;

    /// Exchange a one-time access code for the verified identity
    ///
    /// # Errors
    ///
    /// Returns an error if the code is invalid, expired or already used, or the
    /// broker cannot be reached
    async fn redeem_access_code(
        &self,
        code: OneTimeAccessCode,
    ) -> Result<RedeemedIdentity, BrokerError>;

    /// Name used in startup logs
    fn broker_name(&self) -> &'static str;
}

/// Identity provider URL returned by the broker
///
/// Validated as an absolute `http`/`https` URL but kept as the exact string
/// the broker sent. Strings that cannot go into a `Location` header verbatim
/// (whitespace, control or non-ASCII characters) fall back to the parsed,
/// percent-encoded form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdpRedirectUrl {
    raw: String,
    url: Url,
}

impl IdpRedirectUrl {
    /// Validate a redirect target returned by the broker
    ///
    /// # Errors
    ///
    /// Returns [`BrokerError::InvalidResponse`] unless the value is an absolute
    /// `http` or `https` URL with a host
    pub fn parse(raw: &str) -> Result<Self, BrokerError> {
        let url = Url::parse(raw).map_err(|e| {
            BrokerError::InvalidResponse(format!("redirect URL does not parse: {e}"))
        })?;

        match url.scheme() {
            "http" | "https" if url.host_str().is_some() => {}
            scheme => {
                return Err(BrokerError::InvalidResponse(format!(
                    "redirect URL has unsupported scheme or no host: {scheme}"
                )))
            }
        }

        let raw = if raw.bytes().all(|b| b.is_ascii_graphic()) {
            raw.to_string()
        } else {
            url.to_string()
        };
        Ok(Self { raw, url })
    }

    /// The value to send as `Location`
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }
}

impl fmt::Display for IdpRedirectUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
