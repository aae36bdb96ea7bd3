// Application layer - Refresh pipeline and scheduling
pub mod dashboard_service;
pub mod fetch_service;
pub mod refresh_scheduler;
