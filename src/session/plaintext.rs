//! Cleartext identity cookie
//!
//! The identity is written to the cookie as-is and trusted on the way back.
//! Anyone can forge it; use [`super::SignedCookieSession`] outside of demos.

use super::cookie::{create_expired_cookie, extract_cookie_value, CookieOptions, SESSION_COOKIE_NAME};
use super::{validate_cookie_value, SessionError, SessionStore};
use crate::handoff::RedeemedIdentity;
use actix_web::{cookie::Cookie, HttpRequest};

#[derive(Debug, Clone)]
pub struct PlaintextCookieSession {
    cookie_secure: bool,
}

impl PlaintextCookieSession {
    #[must_use]
    pub fn new(cookie_secure: bool) -> Self {
        Self { cookie_secure }
    }
}

impl SessionStore for PlaintextCookieSession {
    fn establish(&self, identity: &RedeemedIdentity) -> Result<Cookie<'static>, SessionError> {
        validate_cookie_value(&identity.email)?;
        Ok(CookieOptions {
            secure: self.cookie_secure,
            ..Default::default()
        }
        .build(SESSION_COOKIE_NAME, identity.email.clone()))
    }

    fn identity(&self, req: &HttpRequest) -> Option<String> {
        extract_cookie_value(req, SESSION_COOKIE_NAME)
    }

    fn destroy(&self) -> Cookie<'static> {
        create_expired_cookie(SESSION_COOKIE_NAME, self.cookie_secure)
    }

    fn store_name(&self) -> &'static str {
        "plaintext"
    }
}
