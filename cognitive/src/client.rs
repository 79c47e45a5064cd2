//! Cognitive Services API client.

use std::sync::Arc;
use std::time::Duration;

use crate::{
    error::{Error, Result},
    http::HttpClient,
    identification::IdentificationService,
    sentiment::SentimentService,
    speech::SpeechService,
};

/// Default Speaker Recognition endpoint.
pub const DEFAULT_SPEAKER_URL: &str = "https://westus.api.cognitive.microsoft.com";

/// Default Text Analytics endpoint.
pub const DEFAULT_TEXT_ANALYTICS_URL: &str = "https://westus.api.cognitive.microsoft.com";

/// Default Bing Speech REST endpoint.
pub const DEFAULT_SPEECH_URL: &str = "https://speech.platform.bing.com";

/// Default Bing Speech WebSocket endpoint.
pub const DEFAULT_SPEECH_WS_URL: &str = "wss://speech.platform.bing.com";

/// Default maximum number of retries.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// Client bound to one Cognitive Services endpoint and subscription key.
///
/// Each Azure resource has its own key, so a bot usually holds one client per
/// service:
///
/// ```rust,no_run
/// use habot_cognitive::{Client, DEFAULT_SPEAKER_URL};
///
/// # async fn run() -> habot_cognitive::Result<()> {
/// let client = Client::builder("speaker-key")
///     .base_url(DEFAULT_SPEAKER_URL)
///     .build()?;
///
/// let profiles = client.identification().list_profiles().await?;
/// println!("{} profiles", profiles.len());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Client {
    http: Arc<HttpClient>,
    ws_url: String,
}

impl Client {
    /// Creates a new client builder.
    pub fn builder(subscription_key: impl Into<String>) -> ClientBuilder {
        ClientBuilder::new(subscription_key)
    }

    /// Returns the configured base URL.
    pub fn base_url(&self) -> &str {
        self.http.base_url()
    }

    /// Returns the Speaker Identification service.
    pub fn identification(&self) -> IdentificationService {
        IdentificationService::new(self.http.clone())
    }

    /// Returns the Text Analytics sentiment service.
    pub fn sentiment(&self) -> SentimentService {
        SentimentService::new(self.http.clone())
    }

    /// Returns the speech recognition service.
    pub fn speech(&self) -> SpeechService {
        SpeechService::new(self.http.clone(), self.ws_url.clone())
    }

    /// Returns a reference to the internal HTTP client.
    pub fn http(&self) -> &Arc<HttpClient> {
        &self.http
    }
}

/// Builder for creating a [`Client`].
pub struct ClientBuilder {
    subscription_key: String,
    base_url: String,
    ws_url: String,
    timeout: Duration,
    max_retries: u32,
}

impl ClientBuilder {
    /// Creates a new client builder.
    pub fn new(subscription_key: impl Into<String>) -> Self {
        Self {
            subscription_key: subscription_key.into(),
            base_url: DEFAULT_SPEAKER_URL.to_string(),
            ws_url: DEFAULT_SPEECH_WS_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    /// Sets the REST endpoint.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Sets the WebSocket endpoint used by streaming speech recognition.
    pub fn ws_url(mut self, url: impl Into<String>) -> Self {
        self.ws_url = url.into();
        self
    }

    /// Sets the per-request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the maximum number of retries for transient errors.
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Builds the client.
    pub fn build(self) -> Result<Client> {
        if self.subscription_key.trim().is_empty() {
            return Err(Error::Config("subscription key must be non-empty".to_string()));
        }
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(Error::Config(format!(
                "base url must be http(s): {}",
                self.base_url
            )));
        }

        let http = HttpClient::new(
            self.base_url,
            self.subscription_key,
            self.timeout,
            self.max_retries,
        )?;

        Ok(Client {
            http: Arc::new(http),
            ws_url: self.ws_url.trim_end_matches('/').to_string(),
        })
    }
}

/// Generates a unique request ID.
pub fn generate_request_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_requires_key() {
        assert!(matches!(Client::builder("  ").build(), Err(Error::Config(_))));
    }

    #[test]
    fn test_builder_requires_http_url() {
        let err = Client::builder("key").base_url("ftp://nope").build();
        assert!(matches!(err, Err(Error::Config(_))));
    }

    #[test]
    fn test_builder_defaults() {
        let client = Client::builder("key").build().unwrap();
        assert_eq!(client.base_url(), DEFAULT_SPEAKER_URL);
        assert_eq!(generate_request_id().len(), 32);
    }
}
