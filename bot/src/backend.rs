//! External collaborators of the bot and their Cognitive Services adapters.

use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use futures::{Stream, StreamExt, TryStreamExt};
use habot_cognitive::{
    EnrollmentResult, IdentificationService, Operation, Profile, RecognitionStream,
    SentimentService, SpeechService, StreamConfig, StreamResult,
};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

/// Errors reported by backends.
#[derive(Error, Debug)]
pub enum BackendError {
    #[error(transparent)]
    Cognitive(#[from] habot_cognitive::Error),

    #[error("download failed: {0}")]
    Fetch(#[from] reqwest::Error),

    #[error("{0}")]
    Other(String),
}

/// Streamed attachment content.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, BackendError>> + Send>>;

/// Speaker profile management, enrollment and recognition.
#[async_trait]
pub trait SpeakerBackend: Send + Sync {
    async fn create_profile(&self, locale: &str) -> Result<Uuid, BackendError>;

    async fn delete_profile(&self, profile_id: Uuid) -> Result<(), BackendError>;

    async fn get_profile(&self, profile_id: Uuid) -> Result<Profile, BackendError>;

    async fn list_profiles(&self) -> Result<Vec<Profile>, BackendError>;

    /// Submits enrollment audio and returns the polling handle.
    async fn submit_enrollment(&self, profile_id: Uuid, audio: Bytes) -> Result<String, BackendError>;

    async fn poll_enrollment(&self, handle: &str) -> Result<Operation<EnrollmentResult>, BackendError>;

    /// Opens a recognition session that reports results through `sink`.
    async fn open_recognition(
        &self,
        config: StreamConfig,
        sink: mpsc::UnboundedSender<StreamResult>,
    ) -> Result<Box<dyn RecognitionSession>, BackendError>;
}

/// An open streaming recognition session. Owned by one workflow run.
#[async_trait]
pub trait RecognitionSession: Send {
    async fn push(&mut self, chunk: &[u8]) -> Result<(), BackendError>;

    /// Signals end of audio; the final result is delivered before this returns.
    async fn end(&mut self) -> Result<(), BackendError>;

    async fn close(self: Box<Self>);
}

/// Speech-to-text of an audio attachment.
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, audio_url: &str) -> Result<String, BackendError>;
}

/// Sentiment of a short text, `0.0..=1.0`.
#[async_trait]
pub trait SentimentScorer: Send + Sync {
    async fn score(&self, text: &str) -> Result<f64, BackendError>;
}

/// Downloads attachment content.
#[async_trait]
pub trait AttachmentFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<ByteStream, BackendError>;
}

/// Reads a [`ByteStream`] in fixed-size chunks.
pub struct ChunkReader {
    stream: ByteStream,
    buffer: BytesMut,
    done: bool,
}

impl ChunkReader {
    pub fn new(stream: ByteStream) -> Self {
        Self {
            stream,
            buffer: BytesMut::new(),
            done: false,
        }
    }

    /// Returns the next chunk of exactly `size` bytes, a shorter last chunk,
    /// or `None` at the end of the stream.
    pub async fn next_chunk(&mut self, size: usize) -> Result<Option<Bytes>, BackendError> {
        while !self.done && self.buffer.len() < size {
            match self.stream.next().await {
                Some(piece) => self.buffer.extend_from_slice(&piece?),
                None => self.done = true,
            }
        }
        if self.buffer.is_empty() {
            return Ok(None);
        }
        let take = size.min(self.buffer.len());
        Ok(Some(self.buffer.split_to(take).freeze()))
    }

    /// Reads the rest of the stream into one buffer.
    pub async fn read_to_end(mut self) -> Result<Bytes, BackendError> {
        while let Some(piece) = self.stream.next().await {
            self.buffer.extend_from_slice(&piece?);
        }
        Ok(self.buffer.freeze())
    }
}

// ================== Cognitive Services adapters ==================

#[async_trait]
impl SpeakerBackend for IdentificationService {
    async fn create_profile(&self, locale: &str) -> Result<Uuid, BackendError> {
        Ok(IdentificationService::create_profile(self, locale).await?)
    }

    async fn delete_profile(&self, profile_id: Uuid) -> Result<(), BackendError> {
        Ok(IdentificationService::delete_profile(self, profile_id).await?)
    }

    async fn get_profile(&self, profile_id: Uuid) -> Result<Profile, BackendError> {
        Ok(IdentificationService::get_profile(self, profile_id).await?)
    }

    async fn list_profiles(&self) -> Result<Vec<Profile>, BackendError> {
        Ok(IdentificationService::list_profiles(self).await?)
    }

    async fn submit_enrollment(&self, profile_id: Uuid, audio: Bytes) -> Result<String, BackendError> {
        Ok(self.enroll(profile_id, audio).await?)
    }

    async fn poll_enrollment(&self, handle: &str) -> Result<Operation<EnrollmentResult>, BackendError> {
        Ok(self.enrollment_operation(handle).await?)
    }

    async fn open_recognition(
        &self,
        config: StreamConfig,
        sink: mpsc::UnboundedSender<StreamResult>,
    ) -> Result<Box<dyn RecognitionSession>, BackendError> {
        Ok(Box::new(self.open_stream(config, sink)?))
    }
}

#[async_trait]
impl RecognitionSession for RecognitionStream {
    async fn push(&mut self, chunk: &[u8]) -> Result<(), BackendError> {
        Ok(RecognitionStream::push(self, chunk)?)
    }

    async fn end(&mut self) -> Result<(), BackendError> {
        Ok(RecognitionStream::end(self).await?)
    }

    async fn close(self: Box<Self>) {
        RecognitionStream::close(*self)
    }
}

/// Sentiment scoring in one language.
pub struct CognitiveSentiment {
    service: SentimentService,
    language: String,
}

impl CognitiveSentiment {
    pub fn new(service: SentimentService, language: impl Into<String>) -> Self {
        Self {
            service,
            language: language.into(),
        }
    }
}

#[async_trait]
impl SentimentScorer for CognitiveSentiment {
    async fn score(&self, text: &str) -> Result<f64, BackendError> {
        Ok(self.service.score(text, &self.language).await?)
    }
}

/// How speech-to-text reaches the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SttTransport {
    /// Probe the WebSocket endpoint once and fall back to HTTP.
    #[default]
    Auto,
    WebSocket,
    Http,
}

impl SttTransport {
    /// Resolves `Auto` into a concrete transport.
    pub async fn resolve(self, speech: &SpeechService) -> SttTransport {
        match self {
            SttTransport::Auto => match speech.probe_websocket().await {
                Ok(()) => {
                    info!("speech websocket available");
                    SttTransport::WebSocket
                }
                Err(e) => {
                    warn!("speech websocket unavailable, using http: {}", e);
                    SttTransport::Http
                }
            },
            other => other,
        }
    }
}

/// Speech-to-text over a transport chosen at startup.
pub struct CognitiveTranscriber {
    speech: SpeechService,
    fetcher: Arc<dyn AttachmentFetcher>,
    transport: SttTransport,
    language: String,
}

impl CognitiveTranscriber {
    /// Creates a transcriber. `Auto` is resolved here, once.
    pub async fn new(
        speech: SpeechService,
        fetcher: Arc<dyn AttachmentFetcher>,
        transport: SttTransport,
        language: impl Into<String>,
    ) -> Self {
        let transport = transport.resolve(&speech).await;
        Self {
            speech,
            fetcher,
            transport,
            language: language.into(),
        }
    }

    pub fn transport(&self) -> SttTransport {
        self.transport
    }
}

#[async_trait]
impl Transcriber for CognitiveTranscriber {
    async fn transcribe(&self, audio_url: &str) -> Result<String, BackendError> {
        let audio = ChunkReader::new(self.fetcher.fetch(audio_url).await?)
            .read_to_end()
            .await?;
        let text = match self.transport {
            SttTransport::WebSocket => self.speech.transcribe_streaming(audio, &self.language).await?,
            SttTransport::Http | SttTransport::Auto => self.speech.transcribe(audio, &self.language).await?,
        };
        Ok(text)
    }
}

/// Downloads attachments over HTTP.
#[derive(Clone, Default)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl AttachmentFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<ByteStream, BackendError> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        Ok(Box::pin(response.bytes_stream().map_err(BackendError::from)))
    }
}
