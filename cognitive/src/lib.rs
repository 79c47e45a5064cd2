//! Cognitive Services SDK for Rust.
//!
//! Clients for the three services HaBot talks to:
//!
//! - Speaker Identification: profiles, enrollment, identification and
//!   windowed streaming recognition
//! - Text Analytics: sentiment scoring
//! - Bing Speech: speech-to-text over REST or WebSocket
//!
//! Every service authenticates with an `Ocp-Apim-Subscription-Key` header.
//! Long-running jobs (enrollment, identification) answer with an
//! `Operation-Location` that is polled until it reaches a terminal state.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use habot_cognitive::Client;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = Client::builder("your-speaker-key").build()?;
//!
//!     let profile_id = client.identification().create_profile("en-US").await?;
//!     println!("created {}", profile_id);
//!
//!     Ok(())
//! }
//! ```

mod client;
mod error;
pub mod http;
mod identification;
pub mod sentiment;
pub mod speech;
mod streaming;
mod types;

pub use client::{
    generate_request_id, Client, ClientBuilder, DEFAULT_MAX_RETRIES, DEFAULT_SPEAKER_URL,
    DEFAULT_SPEECH_URL, DEFAULT_SPEECH_WS_URL, DEFAULT_TEXT_ANALYTICS_URL, DEFAULT_TIMEOUT,
};
pub use error::{Error, Result};
pub use identification::{IdentificationService, MAX_IDENTIFY_CANDIDATES};
pub use sentiment::{format_score, SentimentService};
pub use speech::{SpeechService, UPLOAD_CHUNK_SIZE, WAV_CONTENT_TYPE};
pub use streaming::{RecognitionStream, StreamConfig, StreamResult};
pub use types::{
    wav_data_offset, AudioContainer, AudioEncoding, AudioFormat, Confidence, EnrollmentResult,
    EnrollmentStatus, Identification, Operation, OperationStatus, Profile,
};
