//! Testing utilities
//!
//! Available to unit tests and, with the `testing` feature, to integration
//! tests. Provides a mock broker and ready-made controllers.

pub mod fixtures;
pub mod mock;

pub use fixtures::{
    create_request_with_session, create_signed_test_controller, create_standard_broker,
    create_test_controller, create_test_settings, EXAMPLE_IDP_URL, TEST_SESSION_SECRET,
};
pub use mock::{MockBrokerClient, INVALID_CODE_MESSAGE};
