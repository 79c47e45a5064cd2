//! HTTP client shared by the Cognitive Services clients.

use std::time::Duration;

use bytes::Bytes;
use reqwest::{
    header::{HeaderMap, HeaderValue, CONTENT_TYPE, USER_AGENT},
    Client as ReqwestClient, Method, RequestBuilder, Response,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

/// Header carrying the subscription key on every request.
pub const SUBSCRIPTION_KEY_HEADER: &str = "Ocp-Apim-Subscription-Key";

/// Header pointing at the status resource of a long-running operation.
pub const OPERATION_LOCATION_HEADER: &str = "Operation-Location";

/// HTTP client bound to one endpoint and subscription key.
pub struct HttpClient {
    client: ReqwestClient,
    base_url: String,
    subscription_key: String,
    max_retries: u32,
}

impl HttpClient {
    /// Creates a new HTTP client.
    pub fn new(
        base_url: String,
        subscription_key: String,
        timeout: Duration,
        max_retries: u32,
    ) -> Result<Self> {
        HeaderValue::from_str(&subscription_key)
            .map_err(|_| Error::Config("subscription key is not a valid header value".into()))?;

        let client = ReqwestClient::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            subscription_key,
            max_retries,
        })
    }

    /// Returns the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the subscription key.
    pub fn subscription_key(&self) -> &str {
        &self.subscription_key
    }

    /// Resolves a path against the base URL. Absolute URLs are returned unchanged.
    pub fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            format!("{}{}", self.base_url, path)
        }
    }

    /// Sends a JSON request and decodes a JSON response.
    pub async fn request<T, R>(&self, method: Method, path: &str, body: Option<&T>) -> Result<R>
    where
        T: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = self.url(path);
        let response = self
            .send_with_retry(|| {
                let mut req = self.client.request(method.clone(), &url);
                if let Some(body) = body {
                    req = req.json(body);
                }
                req
            })
            .await?;

        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(Error::from)
    }

    /// Sends a request whose response carries no payload.
    pub async fn request_empty(&self, method: Method, path: &str) -> Result<()> {
        let url = self.url(path);
        self.send_with_retry(|| self.client.request(method.clone(), &url))
            .await?;
        Ok(())
    }

    /// Uploads audio and returns the `Operation-Location` of the created job.
    pub async fn post_audio(&self, path: &str, audio: Bytes) -> Result<String> {
        let url = self.url(path);
        let response = self
            .send_with_retry(|| {
                self.client
                    .post(&url)
                    .header(CONTENT_TYPE, "application/octet-stream")
                    .body(audio.clone())
            })
            .await?;

        response
            .headers()
            .get(OPERATION_LOCATION_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| Error::Other("response is missing the Operation-Location header".into()))
    }

    /// Sends a single request with a caller-built body. Not retried, since
    /// streamed bodies cannot be replayed.
    pub async fn send_once(&self, request: RequestBuilder) -> Result<Response> {
        let response = request.headers(self.default_headers()).send().await?;
        if !response.status().is_success() {
            return Err(self.error_from_response(response).await);
        }
        Ok(response)
    }

    /// Returns a raw request builder for callers that need a custom body.
    pub fn post(&self, path: &str) -> RequestBuilder {
        self.client.post(self.url(path))
    }

    /// Sends a request with retry on rate limits and server errors.
    async fn send_with_retry<F>(&self, build: F) -> Result<Response>
    where
        F: Fn() -> RequestBuilder,
    {
        let mut last_err = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                // Exponential backoff: 1s, 2s, 4s, ...
                let backoff = Duration::from_secs(1 << (attempt - 1));
                debug!("retrying request in {:?} (attempt {})", backoff, attempt);
                tokio::time::sleep(backoff).await;
            }

            let result = build().headers(self.default_headers()).send().await;
            let response = match result {
                Ok(response) => response,
                Err(e) => return Err(Error::Http(e)),
            };

            if response.status().is_success() {
                return Ok(response);
            }

            let err = self.error_from_response(response).await;
            if err.is_retryable() {
                last_err = Some(err);
                continue;
            }
            return Err(err);
        }

        Err(last_err.unwrap_or_else(|| Error::Other("max retries exceeded".to_string())))
    }

    fn default_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Ok(key) = HeaderValue::from_str(&self.subscription_key) {
            headers.insert(SUBSCRIPTION_KEY_HEADER, key);
        }
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static("habot-cognitive-rust/1.0"),
        );
        headers
    }

    async fn error_from_response(&self, response: Response) -> Error {
        let status = response.status().as_u16();
        match response.bytes().await {
            Ok(body) => parse_error(&body, status),
            Err(e) => Error::Http(e),
        }
    }
}

/// Parses an error response body.
pub(crate) fn parse_error(body: &[u8], http_status: u16) -> Error {
    if let Ok(envelope) = serde_json::from_slice::<ErrorEnvelope>(body) {
        return Error::api(envelope.error.code, envelope.error.message, http_status);
    }

    Error::api(
        http_status.to_string(),
        String::from_utf8_lossy(body).to_string(),
        http_status,
    )
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}
