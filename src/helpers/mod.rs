pub mod auth;
pub mod auth_extractor;
pub mod handler_404;
pub mod request_logger;
