#![warn(clippy::pedantic)]
#![warn(clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use actix_web::{middleware::Logger, web, App, HttpServer};
use anyhow::Context;
use samlgate::{
    authentication::HandoffServiceFactory, configure_services, handoff::HandoffController,
    settings::SamlgateSettings, VERSION,
};

/// Access log format; `%U` is the path without the query string so access
/// codes and emails never reach the logs
const ACCESS_LOG_FORMAT: &str = r#"%a "%{METHOD}xi %U" %s %b %T"#;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration from Settings.toml and environment variables
    // This also loads .env file and initializes the logger
    let settings = SamlgateSettings::load().context("Failed to load settings")?;

    let controller = HandoffServiceFactory::create_controller(&settings)
        .context("Failed to initialize handoff controller")?;

    start_server(controller, &settings)
        .await
        .context("HTTP server failed")
}

/// Start the server
///
/// # Errors
///
/// Returns an error if:
/// - Server binding fails
/// - Server fails to start
async fn start_server(
    controller: HandoffController,
    settings: &SamlgateSettings,
) -> std::io::Result<()> {
    let bind_address = settings.get_bind_address();
    print_startup_info(&bind_address, &controller, settings);

    let controller = web::Data::new(controller);

    HttpServer::new(move || {
        App::new()
            .app_data(controller.clone())
            .wrap(
                Logger::new(ACCESS_LOG_FORMAT)
                    .custom_request_replace("METHOD", |req| req.method().to_string()),
            )
            .configure(configure_services)
    })
    .bind(&bind_address)?
    .run()
    .await
}

fn print_startup_info(bind_address: &str, controller: &HandoffController, settings: &SamlgateSettings) {
    println!("Starting samlgate {VERSION} on http://{bind_address}");
    println!("Broker: {} ({})", controller.broker().broker_name(), settings.broker.base_url);
    println!("Organization resolution: {}", controller.resolver().strategy_name());
    println!("Session store: {}", controller.sessions().store_name());
    println!();
    println!("Endpoints:");
    println!("  GET  /                  - Landing page");
    println!("  GET  /saml-redirect     - Start SAML login (?email=)");
    println!("  GET  /ssoready-callback - Broker callback (?saml_access_code=)");
    println!("  GET  /logout            - Clear session");
    println!("  GET  /ping              - Health check");
    println!();
    println!("Configure the broker redirect URL as:");
    println!("  http://{bind_address}/ssoready-callback");
}
