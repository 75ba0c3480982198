//! HTTP client shared by the HTTP backends.

use std::time::Duration;

use bytes::Bytes;
use reqwest::{
    header::{HeaderMap, HeaderValue, USER_AGENT},
    Client as ReqwestClient, RequestBuilder, Response,
};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::ProviderError;

/// Default request timeout for HTTP backends.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Thin wrapper over reqwest bound to one base URL.
///
/// Non-2xx answers are reported as [`ProviderError::Status`], separate from
/// transport failures ([`ProviderError::Http`]). No request is retried.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: ReqwestClient,
    base_url: String,
}

impl HttpClient {
    /// Creates a client for `base_url` with a per-request timeout.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ProviderError> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static("jptts-rust/0.1"));

        let client = ReqwestClient::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Joins `path` onto the base URL. An empty path is the base URL itself.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn get(&self, path: &str) -> RequestBuilder {
        self.client.get(self.url(path))
    }

    pub fn post(&self, path: &str) -> RequestBuilder {
        self.client.post(self.url(path))
    }

    /// Sends a request and returns the body of a 2xx response.
    pub async fn send(&self, request: RequestBuilder) -> Result<Bytes, ProviderError> {
        let response = request.send().await?;
        let response = check_status(response).await?;
        Ok(response.bytes().await?)
    }

    /// Sends a request and decodes a 2xx JSON response.
    pub async fn send_json<R>(&self, request: RequestBuilder) -> Result<R, ProviderError>
    where
        R: DeserializeOwned,
    {
        let body = self.send(request).await?;
        serde_json::from_slice(&body).map_err(ProviderError::from)
    }

    /// GETs `path` and reports whether it answered with a 2xx status.
    pub async fn is_reachable(&self, path: &str) -> bool {
        match self.get(path).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                debug!(url = %self.url(path), error = %e, "http: probe failed");
                false
            }
        }
    }
}

/// Turns a non-2xx response into [`ProviderError::Status`].
async fn check_status(response: Response) -> Result<Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = match response.bytes().await {
        Ok(body) => String::from_utf8_lossy(&body).to_string(),
        Err(e) => return Err(ProviderError::Http(e)),
    };
    Err(ProviderError::Status {
        status: status.as_u16(),
        body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_join_strips_trailing_slash() {
        let client = HttpClient::new("http://localhost:50021/", DEFAULT_TIMEOUT).unwrap();
        assert_eq!(client.base_url(), "http://localhost:50021");
        assert_eq!(client.url("/speakers"), "http://localhost:50021/speakers");
        assert_eq!(client.url(""), "http://localhost:50021");
    }

    #[tokio::test]
    async fn test_unreachable_host_is_not_reachable() {
        // port 9 (discard) on loopback is closed in test environments
        let client = HttpClient::new("http://127.0.0.1:9", Duration::from_secs(2)).unwrap();
        assert!(!client.is_reachable("").await);
    }
}
