//! Service factory wiring the handoff controller from configuration

pub mod factory;

pub use factory::{HandoffConfig, HandoffServiceFactory};
