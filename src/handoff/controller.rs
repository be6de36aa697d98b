//! Login handoff controller
//!
//! Each operation is one self-contained unit of work with at most one broker
//! call. Nothing is written to the browser until the whole operation has
//! succeeded, so a failed broker call never leaves a partial redirect or a
//! half-established session behind.

use super::{
    HandoffError, HandoffEvent, HandoffState, OneTimeAccessCode, OrganizationIdentifier,
    OrganizationResolver, RedeemedIdentity,
};
use crate::broker::{BrokerClient, IdpRedirectUrl};
use crate::session::SessionStore;
use crate::utils::logging::LoggingHelper;
use actix_web::{cookie::Cookie, HttpRequest};
use std::sync::Arc;

/// Successful handoff initiation: where to send the browser
#[derive(Debug, Clone)]
pub struct HandoffRedirect {
    pub organization: OrganizationIdentifier,
    pub location: IdpRedirectUrl,
}

/// Successful callback: the verified identity and the cookie binding it
#[derive(Debug)]
pub struct EstablishedSession {
    pub identity: RedeemedIdentity,
    pub cookie: Cookie<'static>,
}

/// Drives the redirect-out / redirect-back cycle against an injected broker
#[derive(Clone)]
pub struct HandoffController {
    broker: Arc<dyn BrokerClient>,
    resolver: Arc<dyn OrganizationResolver>,
    sessions: Arc<dyn SessionStore>,
}

impl HandoffController {
    #[must_use]
    pub fn new(
        broker: Arc<dyn BrokerClient>,
        resolver: Arc<dyn OrganizationResolver>,
        sessions: Arc<dyn SessionStore>,
    ) -> Self {
        Self {
            broker,
            resolver,
            sessions,
        }
    }

    #[must_use]
    pub fn broker(&self) -> &dyn BrokerClient {
        self.broker.as_ref()
    }

    #[must_use]
    pub fn resolver(&self) -> &dyn OrganizationResolver {
        self.resolver.as_ref()
    }

    #[must_use]
    pub fn sessions(&self) -> &dyn SessionStore {
        self.sessions.as_ref()
    }

    /// Start a handoff for raw user input (e.g. an email address)
    ///
    /// # Errors
    ///
    /// Returns [`HandoffError::InvalidOrganizationInput`] if no organization can
    /// be derived from the input, and [`HandoffError::HandoffInitiationFailed`]
    /// if the broker call fails
    pub async fn initiate_handoff(&self, user_input: &str) -> Result<HandoffRedirect, HandoffError> {
        let organization = self.resolver.resolve(user_input).map_err(|e| {
            LoggingHelper::log_transition(HandoffState::Anonymous, HandoffEvent::Failure);
            HandoffError::from(e)
        })?;

        match self.broker.resolve_redirect_url(&organization).await {
            Ok(location) => {
                LoggingHelper::log_transition(HandoffState::Anonymous, HandoffEvent::RedirectResolved);
                LoggingHelper::log_handoff_initiated(&organization, &location);
                Ok(HandoffRedirect {
                    organization,
                    location,
                })
            }
            Err(e) => {
                LoggingHelper::log_transition(HandoffState::Anonymous, HandoffEvent::Failure);
                LoggingHelper::log_broker_failure("resolve redirect URL", &e);
                Err(HandoffError::HandoffInitiationFailed(e))
            }
        }
    }

    /// Finish a handoff from the callback's `saml_access_code` query value
    ///
    /// The code is redeemed exactly once. Replays are ordinary redemption
    /// failures reported by the broker.
    ///
    /// # Errors
    ///
    /// Returns [`HandoffError::MissingAccessCode`] for an absent or blank code,
    /// [`HandoffError::CodeRedemptionFailed`] if the broker refuses or cannot be
    /// reached, and [`HandoffError::Session`] if the session cookie cannot be built
    pub async fn complete_handoff(
        &self,
        access_code: Option<&str>,
    ) -> Result<EstablishedSession, HandoffError> {
        let code = OneTimeAccessCode::from_query(access_code).inspect_err(|_| {
            LoggingHelper::log_transition(HandoffState::AwaitingCallback, HandoffEvent::Failure);
        })?;

        let identity = match self.broker.redeem_access_code(code).await {
            Ok(identity) => identity,
            Err(e) => {
                LoggingHelper::log_transition(HandoffState::AwaitingCallback, HandoffEvent::Failure);
                LoggingHelper::log_broker_failure("redeem access code", &e);
                return Err(HandoffError::CodeRedemptionFailed(e));
            }
        };

        let cookie = self.sessions.establish(&identity).map_err(|e| {
            LoggingHelper::log_transition(HandoffState::AwaitingCallback, HandoffEvent::Failure);
            log::error!("Failed to build session cookie: {e}");
            HandoffError::from(e)
        })?;

        LoggingHelper::log_transition(HandoffState::AwaitingCallback, HandoffEvent::CodeRedeemed);
        LoggingHelper::log_session_created(&identity);
        Ok(EstablishedSession { identity, cookie })
    }

    /// Cookie that ends the session; safe to send for anonymous browsers too
    #[must_use]
    pub fn logout(&self) -> Cookie<'static> {
        LoggingHelper::log_transition(HandoffState::Authenticated, HandoffEvent::Logout);
        self.sessions.destroy()
    }

    /// Identity carried by the request's session, if any
    #[must_use]
    pub fn current_identity(&self, req: &HttpRequest) -> Option<String> {
        self.sessions.identity(req)
    }
}
