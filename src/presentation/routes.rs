// Router assembly
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{
    health_check, index, not_found, page, page_snapshot, page_stream,
};
use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

// Compression is handled in the JSON response builder, so no CompressionLayer here
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(health_check))
        .route("/", get(index))
        .route("/:page", get(page))
        .route("/api/pages/:page", get(page_snapshot))
        .route("/api/pages/:page/stream", get(page_stream))
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::refresh_scheduler::{PageFeeds, PageIntervals};
    use crate::domain::bus::BusDeparture;
    use crate::domain::dashboard::{Page, PageSnapshot, PageView};
    use crate::infrastructure::config::PageSettings;
    use async_compression::tokio::bufread::BrotliDecoder;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use chrono::{TimeZone, Utc};
    use tokio::io::AsyncReadExt;
    use tower::ServiceExt;

    fn router() -> Router {
        let at = Utc.with_ymd_and_hms(2024, 6, 1, 10, 0, 0).unwrap();
        let feeds = PageFeeds::fixed([
            PageSnapshot::pending(Page::CurrentWeather),
            PageSnapshot::new(
                Page::Forecast,
                1,
                at,
                PageView::Unavailable {
                    reason: "request to http://weather.test failed after 6 attempts: timeout"
                        .into(),
                },
            ),
            PageSnapshot::new(
                Page::BusTimes,
                7,
                at,
                PageView::BusTable {
                    rows: vec![BusDeparture::new("X".into(), 5, "10:05".into())],
                },
            ),
        ]);

        build_router(Arc::new(AppState {
            title: "Home Dashboard".to_string(),
            feeds,
            intervals: PageIntervals::from_settings(&PageSettings::default()),
        }))
    }

    async fn get(uri: &str) -> (StatusCode, String) {
        let response = router()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_known_routes_render() {
        for uri in ["/", "/page-1", "/page-2", "/page-3"] {
            let (status, body) = get(uri).await;
            assert_eq!(status, StatusCode::OK, "{}", uri);
            assert!(body.contains("Home Dashboard"), "{}", uri);
        }

        let (_, body) = get("/page-3").await;
        assert!(body.contains("<td>X</td>"));
        assert!(body.contains(r#"content="60""#));

        let (_, body) = get("/").await;
        assert!(body.contains(r#"content="3600""#));
    }

    #[tokio::test]
    async fn test_unknown_routes_are_not_found() {
        for uri in ["/page-4", "/settings/advanced", "/api/pages/page-9"] {
            let (status, body) = get(uri).await;
            assert_eq!(status, StatusCode::NOT_FOUND, "{}", uri);
            assert!(body.contains("404 Page Not Found"), "{}", uri);
        }
    }

    #[tokio::test]
    async fn test_health_check() {
        assert_eq!(get("/healthz").await, (StatusCode::OK, "ok".to_string()));
    }

    #[tokio::test]
    async fn test_snapshot_json() {
        let (status, body) = get("/api/pages/page-2").await;
        assert_eq!(status, StatusCode::OK);

        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["page"], "page-2");
        assert_eq!(json["tick"], 1);
        assert_eq!(json["view"]["kind"], "unavailable");
    }

    #[tokio::test]
    async fn test_snapshot_json_is_brotli_when_accepted() {
        let response = router()
            .oneshot(
                Request::builder()
                    .uri("/api/pages/page-3")
                    .header(header::ACCEPT_ENCODING, "gzip, br")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.headers()[header::CONTENT_ENCODING], "br");

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let mut decoded = Vec::new();
        BrotliDecoder::new(std::io::Cursor::new(body.to_vec()))
            .read_to_end(&mut decoded)
            .await
            .unwrap();

        let json: serde_json::Value = serde_json::from_slice(&decoded).unwrap();
        assert_eq!(json["view"]["rows"][0]["service_name"], "X");
    }

    #[tokio::test]
    async fn test_stream_sends_current_snapshot() {
        let (status, body) = get("/api/pages/page-3/stream").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("event: snapshot"));
        assert!(body.contains(r#""tick":7"#));
    }
}
