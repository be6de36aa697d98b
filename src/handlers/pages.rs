// Landing page and health check
use crate::handoff::HandoffController;
use crate::models::HealthResponse;
use crate::utils::html::render_landing_page;
use crate::utils::response_builder::ResponseBuilder;
use actix_web::{web, HttpRequest, HttpResponse, Result};

/// Landing page greeting the current session identity
///
/// # Errors
///
/// Never fails; anonymous visitors get the logged-out greeting
pub async fn index(
    req: HttpRequest,
    controller: web::Data<HandoffController>,
) -> Result<HttpResponse> {
    let identity = controller.current_identity(&req);
    Ok(ResponseBuilder::html(render_landing_page(identity.as_deref())))
}

/// Health check endpoint
///
/// # Errors
///
/// Returns an error if health status cannot be determined
pub async fn health() -> Result<HttpResponse> {
    let response = HealthResponse {
        status: "ok".to_string(),
        message: "SAML handoff demo is running".to_string(),
    };
    Ok(HttpResponse::Ok().json(response))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures::{create_request_with_session, create_test_controller};
    use crate::testing::mock::MockBrokerClient;
    use actix_web::{body::to_bytes, http::StatusCode};
    use std::sync::Arc;

    #[actix_web::test]
    async fn test_index_greets_session_identity() {
        let controller = web::Data::new(create_test_controller(Arc::new(MockBrokerClient::new())));
        let req = create_request_with_session("john.doe@example.com");

        let response = index(req, controller).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body()).await.unwrap();
        assert!(String::from_utf8_lossy(&body).contains("Hello, john.doe@example.com!"));
    }

    #[actix_web::test]
    async fn test_health() {
        let response = health().await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "ok");
    }
}
