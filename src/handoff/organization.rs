//! Organization resolution strategies
//!
//! The broker needs to know which company's identity provider a login belongs
//! to. How that is derived from user input is a policy decision, so it sits
//! behind [`OrganizationResolver`].

use super::OrganizationIdentifier;
use thiserror::Error;

/// Reasons user input could not be mapped to an organization
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrganizationError {
    #[error("organization identifier is empty")]
    Empty,
    #[error("input has no '@' separated domain")]
    MissingDomain,
    #[error("domain contains invalid characters")]
    InvalidDomain,
}

/// Maps raw user input to an [`OrganizationIdentifier`]
pub trait OrganizationResolver: Send + Sync {
    /// Resolve the organization for the given input
    ///
    /// # Errors
    ///
    /// Returns an error if the input contains no resolvable organization
    fn resolve(&self, user_input: &str) -> Result<OrganizationIdentifier, OrganizationError>;

    /// Name used in startup logs
    fn strategy_name(&self) -> &'static str;
}

/// Uses the email domain as the organization, e.g. `john.doe@example.com` -> `example.com`
#[derive(Debug, Clone, Copy, Default)]
pub struct EmailDomainResolver;

impl OrganizationResolver for EmailDomainResolver {
    fn resolve(&self, user_input: &str) -> Result<OrganizationIdentifier, OrganizationError> {
        let (_, domain) = user_input
            .trim()
            .split_once('@')
            .ok_or(OrganizationError::MissingDomain)?;

        if domain.is_empty() {
            return Err(OrganizationError::MissingDomain);
        }
        if domain.contains('@') || domain.chars().any(char::is_whitespace) {
            return Err(OrganizationError::InvalidDomain);
        }

        // Domains are case-insensitive; normalize so one organization has one id
        OrganizationIdentifier::new(domain.to_ascii_lowercase())
    }

    fn strategy_name(&self) -> &'static str {
        "email_domain"
    }
}

/// Sends every login to one configured organization
#[derive(Debug, Clone)]
pub struct FixedOrganizationResolver {
    organization: OrganizationIdentifier,
}

impl FixedOrganizationResolver {
    #[must_use]
    pub fn new(organization: OrganizationIdentifier) -> Self {
        Self { organization }
    }
}

impl OrganizationResolver for FixedOrganizationResolver {
    fn resolve(&self, _user_input: &str) -> Result<OrganizationIdentifier, OrganizationError> {
        Ok(self.organization.clone())
    }

    fn strategy_name(&self) -> &'static str {
        "fixed"
    }
}
