// Application state for HTTP handlers
use crate::application::refresh_scheduler::{PageFeeds, PageIntervals};

#[derive(Clone)]
pub struct AppState {
    pub title: String,
    pub feeds: PageFeeds,
    pub intervals: PageIntervals,
}
