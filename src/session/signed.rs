//! HMAC-signed identity cookie
//!
//! Cookie value: `base64url(json claims) "." base64url(HMAC-SHA256(claims))`.
//! The claims carry the identity and an expiry; anything that fails
//! verification reads as anonymous.

use super::cookie::{create_expired_cookie, extract_cookie_value, CookieOptions, SESSION_COOKIE_NAME};
use super::{SessionError, SessionStore};
use crate::handoff::RedeemedIdentity;
use actix_web::{cookie::Cookie, HttpRequest};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use log::debug;
use serde::{Deserialize, Serialize};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Upper bound on session lifetime, keeps duration arithmetic in range
const MAX_SESSION_HOURS: u64 = 24 * 366;

#[derive(Debug, Serialize, Deserialize)]
struct SessionClaims {
    sub: String,
    exp: i64,
}

#[derive(Clone)]
pub struct SignedCookieSession {
    key: Vec<u8>,
    cookie_secure: bool,
    session_duration_hours: i64,
}

impl SignedCookieSession {
    /// Create a signed session store
    ///
    /// # Errors
    ///
    /// Returns an error if the secret is empty or the duration is zero
    pub fn new(
        secret: &[u8],
        cookie_secure: bool,
        session_duration_hours: u64,
    ) -> Result<Self, SessionError> {
        if secret.is_empty() {
            return Err(SessionError::Signing("session secret is empty".into()));
        }
        if session_duration_hours == 0 {
            return Err(SessionError::Signing(
                "session duration must be at least one hour".into(),
            ));
        }
        Ok(Self {
            key: secret.to_vec(),
            cookie_secure,
            session_duration_hours: i64::try_from(session_duration_hours.min(MAX_SESSION_HOURS))
                .unwrap_or(24),
        })
    }

    fn mac(&self) -> Result<HmacSha256, SessionError> {
        HmacSha256::new_from_slice(&self.key).map_err(|e| SessionError::Signing(e.to_string()))
    }

    /// Produce the signed cookie value for `identity`, expiring relative to `now`
    ///
    /// # Errors
    ///
    /// Returns an error if the claims cannot be serialized or signed
    pub fn encode(&self, identity: &str, now: DateTime<Utc>) -> Result<String, SessionError> {
        let claims = SessionClaims {
            sub: identity.to_string(),
            exp: (now + chrono::Duration::hours(self.session_duration_hours)).timestamp(),
        };
        let json = serde_json::to_vec(&claims).map_err(|e| SessionError::Signing(e.to_string()))?;
        let payload = URL_SAFE_NO_PAD.encode(json);

        let mut mac = self.mac()?;
        mac.update(payload.as_bytes());
        let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

        Ok(format!("{payload}.{signature}"))
    }

    /// Verify a cookie value, returning the identity if it is authentic and unexpired
    #[must_use]
    pub fn decode(&self, value: &str, now: DateTime<Utc>) -> Option<String> {
        let (payload, signature) = value.split_once('.')?;
        let signature = URL_SAFE_NO_PAD.decode(signature).ok()?;

        let mut mac = self.mac().ok()?;
        mac.update(payload.as_bytes());
        mac.verify_slice(&signature).ok()?;

        let json = URL_SAFE_NO_PAD.decode(payload).ok()?;
        let claims: SessionClaims = serde_json::from_slice(&json).ok()?;
        if claims.exp <= now.timestamp() || claims.sub.is_empty() {
            return None;
        }
        Some(claims.sub)
    }
}

impl SessionStore for SignedCookieSession {
    fn establish(&self, identity: &RedeemedIdentity) -> Result<Cookie<'static>, SessionError> {
        if identity.email.is_empty() {
            return Err(SessionError::InvalidIdentity("identity is empty".into()));
        }
        let value = self.encode(&identity.email, Utc::now())?;
        Ok(CookieOptions {
            secure: self.cookie_secure,
            max_age: Some(actix_web::cookie::time::Duration::hours(
                self.session_duration_hours,
            )),
            ..Default::default()
        }
        .build(SESSION_COOKIE_NAME, value))
    }

    fn identity(&self, req: &HttpRequest) -> Option<String> {
        let value = extract_cookie_value(req, SESSION_COOKIE_NAME)?;
        let identity = self.decode(&value, Utc::now());
        if identity.is_none() {
            debug!("Ignoring session cookie that failed verification or has expired");
        }
        identity
    }

    fn destroy(&self) -> Cookie<'static> {
        create_expired_cookie(SESSION_COOKIE_NAME, self.cookie_secure)
    }

    fn store_name(&self) -> &'static str {
        "signed"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test as actix_test;

    const SECRET: &[u8] = b"test-session-secret-0123456789abcdef";

    fn store() -> SignedCookieSession {
        SignedCookieSession::new(SECRET, false, 24).unwrap()
    }

    #[test]
    fn test_round_trip() {
        let store = store();
        let cookie = store
            .establish(&RedeemedIdentity::new("john.doe@example.com"))
            .unwrap();
        assert_eq!(cookie.name(), "email");
        assert_ne!(cookie.value(), "john.doe@example.com");
        assert_eq!(
            cookie.max_age(),
            Some(actix_web::cookie::time::Duration::hours(24))
        );

        let req = actix_test::TestRequest::default().cookie(cookie).to_http_request();
        assert_eq!(
            store.identity(&req).as_deref(),
            Some("john.doe@example.com")
        );
    }

    #[test]
    fn test_cleartext_cookie_is_not_trusted() {
        let req = actix_test::TestRequest::default()
            .cookie(Cookie::new(SESSION_COOKIE_NAME, "admin@example.com"))
            .to_http_request();
        assert_eq!(store().identity(&req), None);
    }

    #[test]
    fn test_swapped_payload_is_rejected() {
        let store = store();
        let now = Utc::now();
        let victim = store.encode("victim@example.com", now).unwrap();
        let attacker = store.encode("attacker@example.com", now).unwrap();

        let (victim_payload, _) = victim.split_once('.').unwrap();
        let (_, attacker_signature) = attacker.split_once('.').unwrap();
        let forged = format!("{victim_payload}.{attacker_signature}");

        assert_eq!(store.decode(&forged, now), None);
        assert_eq!(
            store.decode(&victim, now).as_deref(),
            Some("victim@example.com")
        );
    }

    #[test]
    fn test_other_key_is_rejected() {
        let now = Utc::now();
        let value = store().encode("john.doe@example.com", now).unwrap();
        let other = SignedCookieSession::new(b"another-secret", false, 24).unwrap();
        assert_eq!(other.decode(&value, now), None);
    }

    #[test]
    fn test_expired_session_is_rejected() {
        let store = store();
        let issued = Utc::now();
        let value = store.encode("john.doe@example.com", issued).unwrap();

        assert!(store
            .decode(&value, issued + chrono::Duration::hours(23))
            .is_some());
        assert_eq!(
            store.decode(&value, issued + chrono::Duration::hours(25)),
            None
        );
    }

    #[test]
    fn test_garbage_is_rejected() {
        let store = store();
        let now = Utc::now();
        assert_eq!(store.decode("", now), None);
        assert_eq!(store.decode("no-dot-here", now), None);
        assert_eq!(store.decode("!!!.###", now), None);
    }

    #[test]
    fn test_empty_secret_is_rejected() {
        assert!(SignedCookieSession::new(b"", false, 24).is_err());
    }

    #[test]
    fn test_zero_duration_is_rejected() {
        assert!(matches!(
            SignedCookieSession::new(SECRET, false, 0),
            Err(SessionError::Signing(_))
        ));
        assert!(SignedCookieSession::new(SECRET, false, 1).is_ok());
    }
}
