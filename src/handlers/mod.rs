// HTTP request handlers for the SAML login handoff
pub mod auth;
pub mod callback;
pub mod pages;

use actix_web::web;

// Re-export the main handler functions
pub use auth::{logout, saml_redirect};
pub use callback::ssoready_callback;
pub use pages::{health, index};

/// Register every route of the demo application
pub fn configure_services(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(index))
        .route("/logout", web::get().to(logout))
        .route("/saml-redirect", web::get().to(saml_redirect))
        .route("/ssoready-callback", web::get().to(ssoready_callback))
        // Health endpoint
        .route("/ping", web::get().to(health));
}
