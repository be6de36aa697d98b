// Broker callback handler
use crate::handoff::HandoffController;
use crate::utils::response_builder::ResponseBuilder;
use actix_web::{web, HttpResponse, Result};
use serde::Deserialize;

/// Query sent by the broker on the way back from the identity provider
///
/// No `Debug`: the code is a bearer credential until redeemed.
#[derive(Deserialize)]
pub struct CallbackQuery {
    pub saml_access_code: Option<String>,
}

/// Redeem the one-time access code and bind the identity to the browser
///
/// On success the session cookie is set and the browser goes back to `/`.
/// Any failure renders an error page without touching existing cookies.
///
/// # Errors
///
/// Never fails at the actix level; handoff errors become error pages
pub async fn ssoready_callback(
    query: web::Query<CallbackQuery>,
    controller: web::Data<HandoffController>,
) -> Result<HttpResponse> {
    let query = query.into_inner();

    match controller
        .complete_handoff(query.saml_access_code.as_deref())
        .await
    {
        Ok(session) => Ok(ResponseBuilder::success_redirect_with_cookie(
            "/",
            session.cookie,
        )),
        Err(e) => Ok(ResponseBuilder::handoff_error(&e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures::{create_standard_broker, create_test_controller};
    use crate::testing::mock::MockBrokerClient;
    use actix_web::http::StatusCode;
    use std::sync::Arc;

    fn query(code: Option<&str>) -> web::Query<CallbackQuery> {
        web::Query(CallbackQuery {
            saml_access_code: code.map(str::to_string),
        })
    }

    #[actix_web::test]
    async fn test_callback_sets_session_cookie() {
        let controller = web::Data::new(create_test_controller(Arc::new(create_standard_broker())));

        let response = ssoready_callback(query(Some("abc123")), controller)
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers().get("Location").unwrap(), "/");

        let cookie = response.cookies().next().unwrap();
        assert_eq!(cookie.name(), "email");
        assert_eq!(cookie.value(), "john.doe@example.com");
    }

    #[actix_web::test]
    async fn test_callback_replay_is_unauthorized() {
        let controller = web::Data::new(create_test_controller(Arc::new(create_standard_broker())));

        let first = ssoready_callback(query(Some("abc123")), controller.clone())
            .await
            .unwrap();
        assert_eq!(first.status(), StatusCode::FOUND);

        let replay = ssoready_callback(query(Some("abc123")), controller)
            .await
            .unwrap();
        assert_eq!(replay.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(replay.cookies().count(), 0);
    }

    #[actix_web::test]
    async fn test_callback_missing_code() {
        let broker = Arc::new(MockBrokerClient::new());
        let controller = web::Data::new(create_test_controller(broker.clone()));

        let response = ssoready_callback(query(None), controller).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(broker.redeem_count(), 0);
    }

    #[actix_web::test]
    async fn test_callback_broker_outage_is_bad_gateway() {
        let controller = web::Data::new(create_test_controller(Arc::new(MockBrokerClient::unavailable())));

        let response = ssoready_callback(query(Some("abc123")), controller)
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }
}
