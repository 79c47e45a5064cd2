//! Bing speech-to-text.
//!
//! Two transports are available. The WebSocket protocol streams audio and
//! reports hypotheses while the speaker is talking; the REST endpoint takes a
//! chunked upload and answers once. Environments that block WebSocket
//! upgrades can only use REST, see [`SpeechService::probe_websocket`].

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use chrono::Utc;
use futures::{SinkExt, StreamExt};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde::Deserialize;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tracing::{debug, info};

use crate::{
    client::generate_request_id,
    error::{Error, Result},
    http::{HttpClient, SUBSCRIPTION_KEY_HEADER},
};

const RECOGNITION_PATH: &str = "/speech/recognition/interactive/cognitiveservices/v1";

/// Content type of the uploaded audio.
pub const WAV_CONTENT_TYPE: &str = "audio/wav; codec=audio/pcm; samplerate=16000";

/// Chunk size of the REST upload.
pub const UPLOAD_CHUNK_SIZE: usize = 1024;

const WS_AUDIO_CHUNK_SIZE: usize = 8192;
const WS_READ_TIMEOUT: Duration = Duration::from_secs(30);

/// Default recognition language.
pub const DEFAULT_LANGUAGE: &str = "en-US";

/// Speech-to-text service.
#[derive(Clone)]
pub struct SpeechService {
    http: Arc<HttpClient>,
    ws_url: String,
}

impl SpeechService {
    pub(crate) fn new(http: Arc<HttpClient>, ws_url: String) -> Self {
        Self { http, ws_url }
    }

    /// Transcribes a WAV file through the REST endpoint.
    ///
    /// The audio is uploaded with chunked transfer encoding in
    /// [`UPLOAD_CHUNK_SIZE`] pieces. Returns the display text of the best
    /// hypothesis.
    pub async fn transcribe(&self, audio: Bytes, language: &str) -> Result<String> {
        let path = format!("{}?language={}&format=detailed", RECOGNITION_PATH, language);

        let chunks: Vec<std::result::Result<Bytes, std::io::Error>> = (0..audio.len())
            .step_by(UPLOAD_CHUNK_SIZE)
            .map(|start| Ok(audio.slice(start..(start + UPLOAD_CHUNK_SIZE).min(audio.len()))))
            .collect();
        let body = reqwest::Body::wrap_stream(futures::stream::iter(chunks));

        let request = self
            .http
            .post(&path)
            .header(ACCEPT, "application/json;text/xml")
            .header(CONTENT_TYPE, WAV_CONTENT_TYPE)
            .body(body);

        let response = self.http.send_once(request).await?;
        let body = response.bytes().await?;
        let detailed: DetailedResponse = serde_json::from_slice(&body)?;
        detailed.best_display()
    }

    /// Transcribes a WAV file through the WebSocket protocol.
    ///
    /// Hypotheses are logged as they arrive. Returns the recognized phrases
    /// joined by spaces.
    pub async fn transcribe_streaming(&self, audio: Bytes, language: &str) -> Result<String> {
        let connection_id = generate_request_id();
        let request_id = generate_request_id();
        let url = format!(
            "{}{}?language={}&format=simple",
            self.ws_url, RECOGNITION_PATH, language
        );
        let (ws, _) = connect_async(self.ws_request(&url, &connection_id)?).await?;
        let (mut write, mut read) = ws.split();

        write
            .send(WsMessage::Text(speech_config_message(&request_id).into()))
            .await?;
        for start in (0..audio.len()).step_by(WS_AUDIO_CHUNK_SIZE) {
            let end = (start + WS_AUDIO_CHUNK_SIZE).min(audio.len());
            let frame = audio_message(&request_id, &audio[start..end]);
            write.send(WsMessage::Binary(frame.into())).await?;
        }
        // An empty audio body marks the end of the stream.
        write
            .send(WsMessage::Binary(audio_message(&request_id, &[]).into()))
            .await?;

        let mut phrases = Vec::new();
        loop {
            let msg = match tokio::time::timeout(WS_READ_TIMEOUT, read.next()).await {
                Ok(Some(msg)) => msg?,
                Ok(None) => break,
                Err(_) => return Err(Error::Other("speech service stopped responding".into())),
            };

            let text = match msg {
                WsMessage::Text(text) => text.as_str().to_string(),
                WsMessage::Close(_) => break,
                _ => continue,
            };

            let Some((path, body)) = parse_text_message(&text) else {
                continue;
            };
            match path {
                "speech.hypothesis" => {
                    if let Ok(h) = serde_json::from_str::<Hypothesis>(body) {
                        debug!("partial result: {}", h.text);
                    }
                }
                "speech.phrase" => {
                    let phrase: Phrase = serde_json::from_str(body)?;
                    info!("phrase result: status={}", phrase.recognition_status);
                    if phrase.recognition_status == "Success" && !phrase.display_text.is_empty() {
                        phrases.push(phrase.display_text);
                    }
                }
                "turn.end" => break,
                _ => {}
            }
        }

        let _ = write.close().await;
        Ok(phrases.join(" "))
    }

    /// Checks whether a WebSocket connection to the speech endpoint can be
    /// established.
    pub async fn probe_websocket(&self) -> Result<()> {
        let url = format!(
            "{}{}?language={}&format=simple",
            self.ws_url, RECOGNITION_PATH, DEFAULT_LANGUAGE
        );
        let (mut ws, _) = connect_async(self.ws_request(&url, &generate_request_id())?).await?;
        let _ = ws.close(None).await;
        Ok(())
    }

    fn ws_request(
        &self,
        url: &str,
        connection_id: &str,
    ) -> Result<tokio_tungstenite::tungstenite::handshake::client::Request> {
        let mut request = url
            .into_client_request()
            .map_err(|e| Error::Other(format!("build ws request: {}", e)))?;

        let headers = request.headers_mut();
        headers.insert(
            SUBSCRIPTION_KEY_HEADER,
            self.http
                .subscription_key()
                .parse()
                .map_err(|_| Error::Config("invalid subscription key".into()))?,
        );
        headers.insert(
            "X-ConnectionId",
            connection_id
                .parse()
                .map_err(|_| Error::Other("invalid connection id".into()))?,
        );
        Ok(request)
    }
}

// ================== WebSocket framing ==================

fn timestamp() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

fn speech_config_message(request_id: &str) -> String {
    let config = serde_json::json!({
        "context": {
            "system": { "version": "1.0.00000" },
            "os": { "platform": "Linux", "name": "habot", "version": env!("CARGO_PKG_VERSION") },
            "device": { "manufacturer": "habot", "model": "habot", "version": env!("CARGO_PKG_VERSION") }
        }
    });
    format!(
        "Path: speech.config\r\nX-RequestId: {}\r\nX-Timestamp: {}\r\nContent-Type: application/json; charset=utf-8\r\n\r\n{}",
        request_id,
        timestamp(),
        config
    )
}

/// Builds a binary audio frame: a big-endian u16 header length, the header
/// text, then the audio bytes.
fn audio_message(request_id: &str, audio: &[u8]) -> Vec<u8> {
    let header = format!(
        "Path: audio\r\nX-RequestId: {}\r\nX-Timestamp: {}\r\nContent-Type: audio/x-wav\r\n",
        request_id,
        timestamp()
    );
    let mut frame = Vec::with_capacity(2 + header.len() + audio.len());
    frame.extend_from_slice(&(header.len() as u16).to_be_bytes());
    frame.extend_from_slice(header.as_bytes());
    frame.extend_from_slice(audio);
    frame
}

/// Splits a text message into its `Path` header value and body.
fn parse_text_message(text: &str) -> Option<(&str, &str)> {
    let (headers, body) = text.split_once("\r\n\r\n")?;
    let path = headers.lines().find_map(|line| {
        let (name, value) = line.split_once(':')?;
        name.trim()
            .eq_ignore_ascii_case("path")
            .then(|| value.trim())
    })?;
    Some((path, body))
}

// ================== Responses ==================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DetailedResponse {
    #[serde(default)]
    recognition_status: String,
    #[serde(default, rename = "NBest")]
    n_best: Vec<NBest>,
}

impl DetailedResponse {
    fn best_display(self) -> Result<String> {
        self.n_best
            .into_iter()
            .next()
            .map(|n| n.display)
            .ok_or_else(|| {
                Error::Other(format!(
                    "no recognition result (status {})",
                    self.recognition_status
                ))
            })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct NBest {
    #[serde(default)]
    display: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Hypothesis {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Phrase {
    #[serde(default)]
    recognition_status: String,
    #[serde(default)]
    display_text: String,
}
