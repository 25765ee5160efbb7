// Presentation layer - HTTP trigger endpoints
pub mod app_state;
pub mod handlers;
