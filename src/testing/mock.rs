//! Mock broker for isolated testing
//!
//! Behaves like the real broker where the handoff cares: unknown organizations
//! are rejected, codes are single-use, and an unavailable broker fails every
//! call with a transport error. Calls are recorded for assertions.

use crate::broker::{BrokerClient, BrokerError, IdpRedirectUrl};
use crate::handoff::{OneTimeAccessCode, OrganizationIdentifier, RedeemedIdentity};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Message the mock returns for unknown, expired or replayed codes
pub const INVALID_CODE_MESSAGE: &str = "saml access code is invalid, expired, or already redeemed";

#[derive(Default)]
pub struct MockBrokerClient {
    organizations: HashMap<String, String>,
    codes: Mutex<HashMap<String, RedeemedIdentity>>,
    unavailable: bool,
    resolve_calls: Mutex<Vec<String>>,
    redeem_count: AtomicUsize,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MockBrokerClient {
    /// Broker that knows no organizations and no codes
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Broker whose every call fails as if the network were down
    #[must_use]
    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }

    /// Register the IdP redirect URL for an organization
    #[must_use]
    pub fn with_organization(mut self, organization: &str, redirect_url: &str) -> Self {
        self.organizations
            .insert(organization.to_string(), redirect_url.to_string());
        self
    }

    /// Register a single-use code that redeems to `email`
    #[must_use]
    pub fn with_access_code(self, code: &str, email: &str) -> Self {
        self.issue_access_code(code, email);
        self
    }

    /// Issue a new single-use code on an existing broker
    pub fn issue_access_code(&self, code: &str, email: &str) {
        let organization = email.split_once('@').map(|(_, domain)| domain.to_string());
        lock(&self.codes).insert(
            code.to_string(),
            RedeemedIdentity {
                email: email.to_string(),
                organization_id: organization.as_ref().map(|org| format!("org_{org}")),
                organization_external_id: organization,
            },
        );
    }

    /// Organizations passed to `resolve_redirect_url`, in call order
    #[must_use]
    pub fn resolve_calls(&self) -> Vec<String> {
        lock(&self.resolve_calls).clone()
    }

    /// Number of `redeem_access_code` calls, successful or not
    #[must_use]
    pub fn redeem_count(&self) -> usize {
        self.redeem_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BrokerClient for MockBrokerClient {
    async fn resolve_redirect_url(
        &self,
        organization: &OrganizationIdentifier,
    ) -> Result<IdpRedirectUrl, BrokerError> {
        lock(&self.resolve_calls).push(organization.as_str().to_string());
        if self.unavailable {
            return Err(BrokerError::Transport("connection refused".into()));
        }

        match self.organizations.get(organization.as_str()) {
            Some(url) => IdpRedirectUrl::parse(url),
            None => Err(BrokerError::Rejected {
                status: 404,
                message: format!("organization {organization} not found"),
            }),
        }
    }

    async fn redeem_access_code(
        &self,
        code: OneTimeAccessCode,
    ) -> Result<RedeemedIdentity, BrokerError> {
        self.redeem_count.fetch_add(1, Ordering::SeqCst);
        if self.unavailable {
            return Err(BrokerError::Transport("connection refused".into()));
        }

        lock(&self.codes)
            .remove(&code.into_secret())
            .ok_or_else(|| BrokerError::Rejected {
                status: 400,
                message: INVALID_CODE_MESSAGE.to_string(),
            })
    }

    fn broker_name(&self) -> &'static str {
        "mock"
    }
}
