// HTTP fetch service with a TTL response cache and retry with backoff
use crate::application::fetch_service::{FetchError, FetchRequest, FetchService};
use crate::infrastructure::config::FetchSettings;
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, StatusCode};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

#[derive(Debug, Clone)]
struct CachedBody {
    body: Bytes,
    stored_at: Instant,
}

/// Shared HTTP client for both upstreams. Successful bodies are cached by full
/// URL for `ttl`; failed requests are retried `retries` times, waiting
/// `backoff_factor * 2^n` seconds before retry `n`.
pub struct HttpFetchService {
    client: Client,
    cache: Mutex<HashMap<String, CachedBody>>,
    ttl: Duration,
    retries: u32,
    backoff_factor: f64,
}

impl HttpFetchService {
    pub fn new(settings: &FetchSettings) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(settings.timeout())
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;

        Ok(Self {
            client,
            cache: Mutex::new(HashMap::new()),
            ttl: settings.cache_ttl(),
            retries: settings.retries,
            backoff_factor: settings.backoff_factor,
        })
    }

    async fn cached(&self, url: &str) -> Option<Bytes> {
        let mut cache = self.cache.lock().await;
        match cache.get(url) {
            Some(entry) if entry.stored_at.elapsed() < self.ttl => Some(entry.body.clone()),
            Some(_) => {
                cache.remove(url);
                None
            }
            None => None,
        }
    }

    async fn store(&self, url: &str, body: Bytes) {
        if self.ttl.is_zero() {
            return;
        }
        let mut cache = self.cache.lock().await;
        cache.insert(
            url.to_string(),
            CachedBody {
                body,
                stored_at: Instant::now(),
            },
        );
    }

    fn backoff(&self, retry: u32) -> Duration {
        Duration::from_secs_f64(self.backoff_factor * 2f64.powi(retry as i32))
    }

    async fn get_with_retry(&self, url: &str) -> Result<Bytes, FetchError> {
        let mut retry = 0;
        loop {
            let failure = match self.client.get(url).send().await {
                Ok(response) if response.status().is_success() => {
                    match response.bytes().await {
                        Ok(body) => return Ok(body),
                        Err(e) => format!("failed to read body: {}", e),
                    }
                }
                Ok(response) if is_retryable(response.status()) => {
                    format!("status {}", response.status())
                }
                Ok(response) => {
                    return Err(FetchError::Status {
                        url: url.to_string(),
                        status: response.status().as_u16(),
                    });
                }
                Err(e) => e.to_string(),
            };

            if retry >= self.retries {
                return Err(FetchError::Exhausted {
                    url: url.to_string(),
                    attempts: retry + 1,
                    message: failure,
                });
            }

            let delay = self.backoff(retry);
            tracing::warn!(
                "Request to {} failed (attempt {}): {}; retrying in {:?}",
                url,
                retry + 1,
                failure,
                delay
            );
            tokio::time::sleep(delay).await;
            retry += 1;
        }
    }
}

fn is_retryable(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::TOO_MANY_REQUESTS
            | StatusCode::INTERNAL_SERVER_ERROR
            | StatusCode::BAD_GATEWAY
            | StatusCode::SERVICE_UNAVAILABLE
            | StatusCode::GATEWAY_TIMEOUT
    )
}

#[async_trait]
impl FetchService for HttpFetchService {
    async fn fetch_text(&self, request: &FetchRequest) -> Result<String, FetchError> {
        let url = request.to_url();

        if let Some(body) = self.cached(&url).await {
            tracing::debug!("Cache hit for {}", url);
            return Ok(String::from_utf8_lossy(&body).into_owned());
        }

        tracing::debug!("Fetching {}", url);
        let body = self.get_with_retry(&url).await?;
        self.store(&url, body.clone()).await;

        Ok(String::from_utf8_lossy(&body).into_owned())
    }
}
