// Presentation layer - HTTP routes and page rendering
pub mod app_state;
pub mod handlers;
pub mod render;
pub mod routes;
