//! Browser-carried sessions
//!
//! A session maps a browser to the identity it redeemed. The server keeps no
//! session table; the artifact lives in the `email` cookie and a
//! [`SessionStore`] decides how that cookie is written and trusted.

pub mod cookie;
pub mod plaintext;
pub mod signed;

pub use cookie::{create_expired_cookie, CookieOptions, SESSION_COOKIE_NAME};
pub use plaintext::PlaintextCookieSession;
pub use signed::SignedCookieSession;

use crate::handoff::RedeemedIdentity;
use actix_web::{cookie::Cookie, HttpRequest};
use thiserror::Error;

/// Session artifact failures
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("identity cannot be stored in a cookie: {0}")]
    InvalidIdentity(String),

    #[error("failed to sign session: {0}")]
    Signing(String),
}

/// Creates, reads and destroys the browser session artifact
pub trait SessionStore: Send + Sync {
    /// Build the cookie that binds the browser to `identity`
    ///
    /// # Errors
    ///
    /// Returns an error if the identity cannot be encoded into a cookie
    fn establish(&self, identity: &RedeemedIdentity) -> Result<Cookie<'static>, SessionError>;

    /// Identity carried by the request, `None` for anonymous or untrusted cookies
    fn identity(&self, req: &HttpRequest) -> Option<String>;

    /// Cookie that removes the session from the browser
    fn destroy(&self) -> Cookie<'static>;

    /// Name used in startup logs
    fn store_name(&self) -> &'static str;
}

/// Reject identities that cannot be carried by a cookie at all
///
/// Cookie values are percent-encoded on the wire (see
/// [`crate::utils::response_builder::ResponseBuilder`]), so any non-empty
/// identity without control characters round-trips.
///
/// # Errors
///
/// Returns an error for empty values or values with control characters
pub(crate) fn validate_cookie_value(value: &str) -> Result<(), SessionError> {
    if value.is_empty() {
        return Err(SessionError::InvalidIdentity("identity is empty".into()));
    }
    if value.chars().any(char::is_control) {
        return Err(SessionError::InvalidIdentity(
            "identity contains control characters".into(),
        ));
    }
    Ok(())
}
