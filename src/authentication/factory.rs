//! Service factory for creating the configured handoff controller
//!
//! This module turns `SamlgateSettings` into a `HandoffController` with its
//! broker client, organization resolver and session store wired in.

use crate::broker::{BrokerClient, SsoReadyClient};
use crate::handoff::{
    EmailDomainResolver, FixedOrganizationResolver, HandoffController, OrganizationIdentifier,
    OrganizationResolver,
};
use crate::session::{PlaintextCookieSession, SessionStore, SignedCookieSession};
use crate::settings::{OrganizationStrategy, SamlgateSettings, SessionMode, SettingsError};
use crate::utils::logging::LoggingHelper;
use std::sync::Arc;
use std::time::Duration;

/// Configuration for creating the handoff services
#[derive(Debug, Clone)]
pub struct HandoffConfig {
    pub broker_base_url: String,
    pub broker_timeout: Duration,
    pub session_mode: SessionMode,
    pub session_secret: Vec<u8>,
    pub session_duration_hours: u64,
    pub cookie_secure: bool,
}

impl HandoffConfig {
    /// Create handoff configuration from settings
    #[must_use]
    pub fn from_settings(settings: &SamlgateSettings) -> Self {
        Self {
            broker_base_url: settings.broker.base_url.clone(),
            broker_timeout: Duration::from_secs(settings.broker.timeout_seconds),
            session_mode: settings.session.mode,
            session_secret: settings.session.session_secret.as_bytes().to_vec(),
            session_duration_hours: settings.session.session_duration_hours,
            cookie_secure: settings.cookies.secure,
        }
    }
}

/// Factory for creating the handoff controller with dependency injection
pub struct HandoffServiceFactory;

impl HandoffServiceFactory {
    /// Create a fully configured controller backed by the SSOReady API
    ///
    /// # Errors
    ///
    /// Returns an error if the settings are invalid or the broker client or
    /// session store cannot be built
    pub fn create_controller(settings: &SamlgateSettings) -> Result<HandoffController, SettingsError> {
        log::info!("🏭 Starting handoff service factory...");
        settings.validate()?;

        let config = HandoffConfig::from_settings(settings);
        let api_key = settings
            .broker_api_key()
            .ok_or_else(|| SettingsError::MissingApiKey {
                env: settings.broker.api_key_env.clone(),
            })?;

        let broker = SsoReadyClient::new(&config.broker_base_url, api_key, config.broker_timeout)
            .map_err(|e| SettingsError::InvalidBrokerUrl {
                url: config.broker_base_url.clone(),
                reason: e.to_string(),
            })?;

        let controller = Self::create_controller_with_broker(settings, &config, Arc::new(broker))?;
        log::info!("🏭 Handoff service factory completed successfully");
        Ok(controller)
    }

    /// Create a controller around an already-built broker client
    ///
    /// # Errors
    ///
    /// Returns an error if the organization strategy or session store is misconfigured
    pub fn create_controller_with_broker(
        settings: &SamlgateSettings,
        config: &HandoffConfig,
        broker: Arc<dyn BrokerClient>,
    ) -> Result<HandoffController, SettingsError> {
        let resolver = Self::create_resolver(settings)?;
        let sessions = Self::create_session_store(config)?;

        LoggingHelper::log_controller_configured(
            broker.broker_name(),
            resolver.strategy_name(),
            sessions.store_name(),
        );
        Ok(HandoffController::new(broker, resolver, sessions))
    }

    fn create_resolver(
        settings: &SamlgateSettings,
    ) -> Result<Arc<dyn OrganizationResolver>, SettingsError> {
        match settings.organization.strategy {
            OrganizationStrategy::EmailDomain => Ok(Arc::new(EmailDomainResolver)),
            OrganizationStrategy::Fixed => {
                let organization = settings
                    .organization
                    .fixed_external_id
                    .as_deref()
                    .ok_or(SettingsError::MissingFixedOrganization)
                    .and_then(|id| {
                        OrganizationIdentifier::new(id)
                            .map_err(|_| SettingsError::MissingFixedOrganization)
                    })?;
                Ok(Arc::new(FixedOrganizationResolver::new(organization)))
            }
        }
    }

    fn create_session_store(config: &HandoffConfig) -> Result<Arc<dyn SessionStore>, SettingsError> {
        match config.session_mode {
            SessionMode::Plaintext => Ok(Arc::new(PlaintextCookieSession::new(config.cookie_secure))),
            SessionMode::Signed => {
                let store = SignedCookieSession::new(
                    &config.session_secret,
                    config.cookie_secure,
                    config.session_duration_hours,
                )
                .map_err(|e| SettingsError::Session(e.to_string()))?;
                Ok(Arc::new(store))
            }
        }
    }
}
