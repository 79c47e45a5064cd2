//! HaBot: a menu-driven voice profile bot.
//!
//! The bot routes each inbound message through the dialog graph in
//! [`flows`]. Two leaf flows drive long-running work against the speaker
//! recognition backend:
//!
//! - enrollment ([`EnrollmentSupervisor`]): submit a voice sample, then poll
//!   the job with a fixed delay until it succeeds, fails or times out;
//! - recognition ([`recognition::analyze`]): stream an attachment in paced
//!   chunks into a recognition session and report every result.
//!
//! Backends are reached through the traits in [`backend`]; the
//! `habot-cognitive` services implement them.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use habot_bot::{
//!     Bot, CognitiveSentiment, CognitiveTranscriber, HttpFetcher, Services,
//!     StaticIdentityTable, WorkflowConfig,
//! };
//! use habot_cognitive::Client;
//! use habot_dialog::Activity;
//! use habot_store::MemoryStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Client::builder("subscription-key").build()?;
//! let workflow = WorkflowConfig::default();
//! let fetcher = Arc::new(HttpFetcher::default());
//! let transcriber = CognitiveTranscriber::new(
//!     client.speech(),
//!     fetcher.clone(),
//!     workflow.stt_transport,
//!     workflow.stt_language.clone(),
//! )
//! .await;
//!
//! let services = Services {
//!     speaker: Arc::new(client.identification()),
//!     transcriber: Arc::new(transcriber),
//!     sentiment: Arc::new(CognitiveSentiment::new(client.sentiment(), "en")),
//!     fetcher,
//!     identities: Arc::new(StaticIdentityTable::builtin()),
//!     workflow,
//! };
//! let bot = Bot::new(services, Arc::new(MemoryStore::new()))?;
//!
//! for reply in bot.on_turn(Activity::message("conversation-1", "hi")).await? {
//!     println!("{}", reply.text);
//! }
//! # Ok(())
//! # }
//! ```

pub mod backend;
mod bot;
pub mod config;
pub mod enrollment;
pub mod flows;
pub mod recognition;
pub mod state;

#[cfg(test)]
mod testing;

pub use backend::{
    AttachmentFetcher, BackendError, ByteStream, ChunkReader, CognitiveSentiment,
    CognitiveTranscriber, HttpFetcher, RecognitionSession, SentimentScorer, SpeakerBackend,
    SttTransport, Transcriber,
};
pub use bot::{Bot, BotError, APOLOGY};
pub use config::WorkflowConfig;
pub use enrollment::{
    EnrollmentError, EnrollmentJob, EnrollmentOutcome, EnrollmentSupervisor, TIMEOUT_MESSAGE,
};
pub use flows::Services;
pub use state::{ConversationRecord, ConversationState, IdentityResolver, StaticIdentityTable};
