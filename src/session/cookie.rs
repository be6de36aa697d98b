use actix_web::cookie::{time::Duration, Cookie, SameSite};
use actix_web::HttpRequest;

/// Cookie carrying the session artifact
pub const SESSION_COOKIE_NAME: &str = "email";

/// Options for cookie creation
pub struct CookieOptions {
    pub http_only: bool,
    pub secure: bool,
    pub same_site: SameSite,
    pub path: String,
    /// `None` keeps the cookie for the browser session only
    pub max_age: Option<Duration>,
}

impl Default for CookieOptions {
    fn default() -> Self {
        Self {
            http_only: true,
            secure: true,
            // Lax so the cookie survives the top-level redirect back from the broker
            same_site: SameSite::Lax,
            path: "/".to_string(),
            max_age: None,
        }
    }
}

impl CookieOptions {
    /// Build a cookie with these options
    #[must_use]
    pub fn build(self, name: &str, value: String) -> Cookie<'static> {
        let mut builder = Cookie::build(name.to_owned(), value)
            .http_only(self.http_only)
            .secure(self.secure)
            .same_site(self.same_site)
            .path(self.path);
        if let Some(max_age) = self.max_age {
            builder = builder.max_age(max_age);
        }
        builder.finish()
    }
}

/// Create an expired cookie to clear a specific cookie
#[must_use]
pub fn create_expired_cookie(name: &str, secure: bool) -> Cookie<'static> {
    Cookie::build(name.to_owned(), "")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(Duration::seconds(-1))
        .finish()
}

/// Extract a non-empty cookie value from the request
#[must_use]
pub fn extract_cookie_value(req: &HttpRequest, cookie_name: &str) -> Option<String> {
    req.cookie(cookie_name)
        .map(|cookie| cookie.value().to_string())
        .filter(|value| !value.is_empty())
}
