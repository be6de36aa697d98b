pub mod html;
pub mod logging;
pub mod response_builder;
