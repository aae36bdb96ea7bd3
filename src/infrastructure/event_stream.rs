// Server-sent event stream of page snapshots
use crate::domain::dashboard::PageSnapshot;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::Stream;
use std::convert::Infallible;
use std::time::Duration;
use tokio::sync::watch;

const KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(15);

/// Yield the current snapshot, then one event per published tick until the
/// scheduler goes away.
pub fn snapshot_events(
    mut rx: watch::Receiver<PageSnapshot>,
) -> impl Stream<Item = Result<Event, Infallible>> {
    async_stream::stream! {
        loop {
            let snapshot = rx.borrow_and_update().clone();
            match Event::default().event("snapshot").json_data(&snapshot) {
                Ok(event) => yield Ok(event),
                Err(e) => tracing::error!("Failed to encode {} snapshot: {}", snapshot.page.slug(), e),
            }

            if rx.changed().await.is_err() {
                break;
            }
        }
    }
}

pub fn sse_response(
    rx: watch::Receiver<PageSnapshot>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    Sse::new(snapshot_events(rx)).keep_alive(KeepAlive::new().interval(KEEP_ALIVE_INTERVAL))
}
