//! SAML login handoff
//!
//! This module owns the handoff state machine: resolving an organization from
//! user input, sending the browser to the broker-chosen identity provider and
//! redeeming the one-time code the broker hands back on the callback.

pub mod controller;
pub mod organization;
pub mod state;

pub use controller::{EstablishedSession, HandoffController, HandoffRedirect};
pub use organization::{
    EmailDomainResolver, FixedOrganizationResolver, OrganizationError, OrganizationResolver,
};
pub use state::{HandoffEvent, HandoffState};

use crate::broker::BrokerError;
use crate::session::SessionError;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Identifier telling the broker which identity provider configuration to use
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrganizationIdentifier(String);

impl OrganizationIdentifier {
    /// Build an identifier, rejecting blank values
    ///
    /// # Errors
    ///
    /// Returns an error if the value is empty after trimming
    pub fn new(value: impl AsRef<str>) -> Result<Self, OrganizationError> {
        let trimmed = value.as_ref().trim();
        if trimmed.is_empty() {
            return Err(OrganizationError::Empty);
        }
        Ok(Self(trimmed.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrganizationIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Single-use code issued by the broker on the callback
///
/// The value is consumed by redemption and never shows up in `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct OneTimeAccessCode(String);

impl OneTimeAccessCode {
    /// Extract a code from an optional query value
    ///
    /// # Errors
    ///
    /// Returns [`HandoffError::MissingAccessCode`] when the value is absent or blank
    pub fn from_query(value: Option<&str>) -> Result<Self, HandoffError> {
        match value.map(str::trim) {
            Some(code) if !code.is_empty() => Ok(Self(code.to_string())),
            _ => Err(HandoffError::MissingAccessCode),
        }
    }

    /// Consume the code, yielding the raw value for the broker request
    #[must_use]
    pub fn into_secret(self) -> String {
        self.0
    }
}

impl fmt::Debug for OneTimeAccessCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("OneTimeAccessCode(<redacted>)")
    }
}

/// Verified identity returned by a successful code redemption
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedeemedIdentity {
    pub email: String,
    pub organization_id: Option<String>,
    pub organization_external_id: Option<String>,
}

impl RedeemedIdentity {
    #[must_use]
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            organization_id: None,
            organization_external_id: None,
        }
    }
}

/// Failures of the handoff flow
///
/// Every variant is terminal for the request that produced it: no redirect to
/// the identity provider and no session cookie is issued.
#[derive(Debug, Error)]
pub enum HandoffError {
    #[error("invalid organization input: {0}")]
    InvalidOrganizationInput(#[from] OrganizationError),

    #[error("failed to initiate SAML handoff")]
    HandoffInitiationFailed(#[source] BrokerError),

    #[error("callback is missing the SAML access code")]
    MissingAccessCode,

    #[error("failed to redeem SAML access code")]
    CodeRedemptionFailed(#[source] BrokerError),

    #[error("failed to establish session")]
    Session(#[from] SessionError),
}

impl HandoffError {
    /// The broker error behind this failure, if any
    #[must_use]
    pub fn broker_error(&self) -> Option<&BrokerError> {
        match self {
            HandoffError::HandoffInitiationFailed(err) | HandoffError::CodeRedemptionFailed(err) => {
                Some(err)
            }
            _ => None,
        }
    }

    /// Short machine-readable reason, used in logs and error pages
    #[must_use]
    pub fn reason(&self) -> &'static str {
        match self {
            HandoffError::InvalidOrganizationInput(_) => "invalid_organization_input",
            HandoffError::HandoffInitiationFailed(_) => "handoff_initiation_failed",
            HandoffError::MissingAccessCode => "missing_access_code",
            HandoffError::CodeRedemptionFailed(_) => "code_redemption_failed",
            HandoffError::Session(_) => "session_error",
        }
    }
}
