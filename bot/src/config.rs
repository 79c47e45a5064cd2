//! Workflow tuning values.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::backend::SttTransport;

/// Timing and sizing of the bot's long-running workflows.
///
/// Durations are configured in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    /// Delay before each enrollment status poll.
    pub poll_interval_secs: f64,
    /// Enrollment polls before giving up.
    pub max_attempts: u32,
    /// Bytes pushed to a recognition session at a time.
    pub chunk_size: usize,
    /// Delay after each pushed chunk.
    pub chunk_pacing_secs: f64,
    /// New audio that triggers a partial recognition result.
    pub recognition_step_secs: f64,
    /// Trailing audio identified per recognition request.
    pub recognition_window_secs: f64,
    /// Locale of created profiles.
    pub profile_locale: String,
    /// Language of speech-to-text.
    pub stt_language: String,
    pub stt_transport: SttTransport,
    /// Language of sentiment analysis.
    pub sentiment_language: String,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 5.0,
            max_attempts: 10,
            chunk_size: 32000,
            chunk_pacing_secs: 1.0,
            recognition_step_secs: 5.0,
            recognition_window_secs: 10.0,
            profile_locale: "en-US".to_string(),
            stt_language: habot_cognitive::speech::DEFAULT_LANGUAGE.to_string(),
            stt_transport: SttTransport::Auto,
            sentiment_language: habot_cognitive::sentiment::DEFAULT_LANGUAGE.to_string(),
        }
    }
}

impl WorkflowConfig {
    pub fn poll_interval(&self) -> Duration {
        secs(self.poll_interval_secs)
    }

    pub fn chunk_pacing(&self) -> Duration {
        secs(self.chunk_pacing_secs)
    }

    pub fn recognition_step(&self) -> Duration {
        secs(self.recognition_step_secs)
    }

    pub fn recognition_window(&self) -> Duration {
        secs(self.recognition_window_secs)
    }
}

fn secs(value: f64) -> Duration {
    Duration::try_from_secs_f64(value).unwrap_or_default()
}
