use actix_web::{
    cookie::Cookie,
    http::{header, StatusCode},
    HttpResponse,
};

use crate::handoff::HandoffError;
use crate::utils::html::render_error_page;

pub struct ResponseBuilder;

impl ResponseBuilder {
    /// Create a redirect response with optional cookies
    ///
    /// Cookie values are percent-encoded, matching how actix decodes the
    /// `Cookie` header on the way back in.
    #[must_use]
    pub fn redirect(location: &str, cookies: Option<Vec<Cookie<'static>>>) -> HttpResponse {
        let mut builder = HttpResponse::Found();

        if let Some(cookies_vec) = cookies {
            for cookie in cookies_vec {
                builder.append_header((header::SET_COOKIE, cookie.encoded().to_string()));
            }
        }

        builder
            .append_header(("Location", location))
            .finish()
    }

    /// Create a success redirect response with cookie
    #[must_use]
    pub fn success_redirect_with_cookie(location: &str, cookie: Cookie<'static>) -> HttpResponse {
        Self::redirect(location, Some(vec![cookie]))
    }

    /// HTML page response
    #[must_use]
    pub fn html(body: String) -> HttpResponse {
        HttpResponse::Ok()
            .content_type("text/html; charset=utf-8")
            .body(body)
    }

    /// Convert a handoff failure into the user-visible error page
    ///
    /// Never sets cookies, so an existing session survives a failed callback.
    #[must_use]
    pub fn handoff_error(err: &HandoffError) -> HttpResponse {
        let status = Self::status_for(err);
        HttpResponse::build(status)
            .content_type("text/html; charset=utf-8")
            .body(render_error_page(status, err.reason(), &err.to_string()))
    }

    /// HTTP status for a handoff failure
    #[must_use]
    pub fn status_for(err: &HandoffError) -> StatusCode {
        match err {
            HandoffError::InvalidOrganizationInput(_) | HandoffError::MissingAccessCode => {
                StatusCode::BAD_REQUEST
            }
            HandoffError::HandoffInitiationFailed(_) => StatusCode::BAD_GATEWAY,
            HandoffError::CodeRedemptionFailed(broker_err) if broker_err.is_client_rejection() => {
                StatusCode::UNAUTHORIZED
            }
            HandoffError::CodeRedemptionFailed(_) => StatusCode::BAD_GATEWAY,
            HandoffError::Session(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
