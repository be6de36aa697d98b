// Centralized logging for the handoff flow. One-time access codes never reach these helpers.
use crate::broker::{BrokerError, IdpRedirectUrl};
use crate::handoff::{HandoffEvent, HandoffState, OrganizationIdentifier, RedeemedIdentity};
use log::{debug, error, info, warn};

pub struct LoggingHelper;

impl LoggingHelper {
    /// Log a state machine transition driven by the controller
    pub fn log_transition(from: HandoffState, event: HandoffEvent) {
        match from.transition(event) {
            Some(to) => debug!("Handoff transition {from} --{event:?}--> {to}"),
            None => warn!("Unexpected handoff event {event:?} in state {from}"),
        }
    }

    /// Log the IdP redirect chosen for an organization
    pub fn log_handoff_initiated(organization: &OrganizationIdentifier, location: &IdpRedirectUrl) {
        info!(
            "Redirecting organization {organization} to identity provider at {}",
            location.url().host_str().unwrap_or("<unknown host>")
        );
        debug!("Full identity provider redirect: {location}");
    }

    /// Log a failed broker call
    pub fn log_broker_failure(operation: &str, err: &BrokerError) {
        if err.is_client_rejection() {
            warn!("Broker refused to {operation}: {err}");
        } else {
            error!("Broker failed to {operation}: {err}");
        }
    }

    /// Log session creation success
    pub fn log_session_created(identity: &RedeemedIdentity) {
        info!(
            "Established session for {} (organization: {})",
            identity.email,
            identity
                .organization_external_id
                .as_deref()
                .unwrap_or("unknown")
        );
    }

    /// Log the collaborators wired into the controller at startup
    pub fn log_controller_configured(broker: &str, resolver: &str, session_store: &str) {
        info!("🔧 Handoff controller configured");
        info!("   ├─ broker: {broker}");
        info!("   ├─ organization resolution: {resolver}");
        info!("   └─ session store: {session_store}");
        if session_store == "plaintext" {
            warn!("⚠️  Sessions are unsigned cleartext cookies; set session.mode = \"signed\" outside of demos");
        }
    }
}
