// Fetch service trait for upstream data access
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed after {attempts} attempts: {message}")]
    Exhausted {
        url: String,
        attempts: u32,
        message: String,
    },

    #[error("request to {url} returned status {status}")]
    Status { url: String, status: u16 },

    #[error("failed to build HTTP client: {0}")]
    Client(String),
}

/// A GET request: base URL plus ordered query parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    base_url: String,
    params: Vec<(String, String)>,
}

impl FetchRequest {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            params: Vec::new(),
        }
    }

    pub fn param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.params.push((key.into(), value.to_string()));
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Full URL with encoded query string; also the cache key.
    pub fn to_url(&self) -> String {
        if self.params.is_empty() {
            return self.base_url.clone();
        }

        let query: Vec<String> = self
            .params
            .iter()
            .map(|(key, value)| {
                format!("{}={}", urlencoding::encode(key), urlencoding::encode(value))
            })
            .collect();
        format!("{}?{}", self.base_url, query.join("&"))
    }
}

#[async_trait]
pub trait FetchService: Send + Sync {
    /// GET the request and return the response body as text.
    async fn fetch_text(&self, request: &FetchRequest) -> Result<String, FetchError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_encodes_params_in_order() {
        let request = FetchRequest::new("https://api.example.com/v1/forecast/")
            .param("latitude", 55.5)
            .param("current", "temperature_2m,cloud_cover")
            .param("timezone", "Europe/London");

        assert_eq!(
            request.to_url(),
            "https://api.example.com/v1/forecast?latitude=55.5&current=temperature_2m%2Ccloud_cover&timezone=Europe%2FLondon"
        );
    }

    #[test]
    fn test_url_without_params() {
        let request = FetchRequest::new("http://localhost:9000/board");
        assert_eq!(request.to_url(), "http://localhost:9000/board");
        assert_eq!(request.base_url(), "http://localhost:9000/board");
    }
}
