// Handoff initiation and sign-out handlers
use crate::handoff::HandoffController;
use crate::utils::response_builder::ResponseBuilder;
use actix_web::{web, HttpResponse, Result};
use log::debug;
use serde::Deserialize;

#[derive(Deserialize)]
pub struct SamlRedirectQuery {
    pub email: Option<String>,
}

/// Start a SAML login for the organization behind the submitted email
///
/// Redirects to the identity provider URL the broker returns. Bad input and
/// broker failures produce an error page and leave any session untouched.
///
/// # Errors
///
/// Never fails at the actix level; handoff errors become error pages
pub async fn saml_redirect(
    query: web::Query<SamlRedirectQuery>,
    controller: web::Data<HandoffController>,
) -> Result<HttpResponse> {
    let email = query.email.as_deref().unwrap_or_default();

    match controller.initiate_handoff(email).await {
        Ok(redirect) => {
            debug!("Handoff started for organization {}", redirect.organization);
            Ok(ResponseBuilder::redirect(redirect.location.as_str(), None))
        }
        Err(e) => Ok(ResponseBuilder::handoff_error(&e)),
    }
}

/// Clear the session cookie and return to the landing page
///
/// # Errors
///
/// Never fails; signing out without a session is a no-op redirect
pub async fn logout(controller: web::Data<HandoffController>) -> Result<HttpResponse> {
    let clear_cookie = controller.logout();
    Ok(ResponseBuilder::success_redirect_with_cookie("/", clear_cookie))
}
