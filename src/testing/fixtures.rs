//! Test fixtures shared by unit and integration tests

use crate::handoff::{EmailDomainResolver, HandoffController};
use crate::session::{PlaintextCookieSession, SignedCookieSession, SESSION_COOKIE_NAME};
use crate::settings::{BrokerSettings, SamlgateSettings};
use crate::testing::mock::MockBrokerClient;
use actix_web::cookie::Cookie;
use actix_web::{test, HttpRequest};
use std::sync::Arc;

/// Secret used by signed-session fixtures
pub const TEST_SESSION_SECRET: &[u8] = b"test-session-secret-0123456789abcdef";

/// IdP URL the standard mock broker hands out for `example.com`
pub const EXAMPLE_IDP_URL: &str = "https://idp.example/login?SAMLRequest=fZJNT8MwDIbv";

/// Create test settings that pass validation without touching the network
#[must_use]
pub fn create_test_settings() -> SamlgateSettings {
    SamlgateSettings {
        broker: BrokerSettings {
            base_url: "http://127.0.0.1:9".to_string(),
            api_key: Some("ssoready_sk_test".to_string()),
            timeout_seconds: 5,
            ..Default::default()
        },
        ..Default::default()
    }
}

/// Mock broker that knows `example.com` / `example.org` and one code, `abc123`
#[must_use]
pub fn create_standard_broker() -> MockBrokerClient {
    MockBrokerClient::new()
        .with_organization("example.com", EXAMPLE_IDP_URL)
        .with_organization("example.org", "https://idp.example.org/sso")
        .with_access_code("abc123", "john.doe@example.com")
}

/// Controller with email-domain resolution and plaintext sessions
#[must_use]
pub fn create_test_controller(broker: Arc<MockBrokerClient>) -> HandoffController {
    HandoffController::new(
        broker,
        Arc::new(EmailDomainResolver),
        Arc::new(PlaintextCookieSession::new(false)),
    )
}

/// Controller with email-domain resolution and signed sessions
///
/// # Panics
///
/// Never in practice; the fixture secret is non-empty
#[must_use]
pub fn create_signed_test_controller(broker: Arc<MockBrokerClient>) -> HandoffController {
    let sessions = SignedCookieSession::new(TEST_SESSION_SECRET, false, 24)
        .unwrap_or_else(|e| panic!("fixture session store: {e}"));
    HandoffController::new(broker, Arc::new(EmailDomainResolver), Arc::new(sessions))
}

/// Create a test HTTP request carrying a session cookie value
#[must_use]
pub fn create_request_with_session(value: &str) -> HttpRequest {
    test::TestRequest::default()
        .cookie(Cookie::new(SESSION_COOKIE_NAME, value.to_string()))
        .to_http_request()
}
