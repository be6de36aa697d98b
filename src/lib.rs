#![warn(clippy::pedantic)]
#![warn(clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

/// Version of the samlgate application
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod authentication;
pub mod broker;
pub mod handlers;
pub mod handoff;
pub mod models;
pub mod session;
pub mod settings;
pub mod utils;

// Testing utilities - available for unit tests and integration tests
#[cfg(any(test, feature = "testing"))]
pub mod testing;

/// Re-export commonly used items
pub use authentication::HandoffServiceFactory;
pub use broker::{BrokerClient, BrokerError, IdpRedirectUrl, SsoReadyClient};
pub use handlers::configure_services;
pub use handoff::{HandoffController, HandoffError};
pub use settings::SamlgateSettings;
