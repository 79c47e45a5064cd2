//! Common types for the Cognitive Services APIs.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ================== Speaker Profiles ==================

/// Enrollment state of a speaker profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnrollmentStatus {
    /// More speech is needed before the profile can be used.
    Enrolling,
    /// Enough speech was collected, the model is being trained.
    Training,
    /// The profile can be used for identification.
    Enrolled,
}

impl EnrollmentStatus {
    /// Returns the status as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            EnrollmentStatus::Enrolling => "Enrolling",
            EnrollmentStatus::Training => "Training",
            EnrollmentStatus::Enrolled => "Enrolled",
        }
    }
}

impl fmt::Display for EnrollmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Speaker identification profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    /// Profile identifier.
    #[serde(rename = "identificationProfileId")]
    pub profile_id: Uuid,
    /// Locale the profile was created for.
    #[serde(default)]
    pub locale: String,
    /// Seconds of speech used for enrollment so far.
    #[serde(default)]
    pub enrollment_speech_time: f64,
    /// Seconds of speech still required.
    #[serde(default)]
    pub remaining_enrollment_speech_time: f64,
    /// Creation timestamp.
    #[serde(default)]
    pub created_date_time: Option<String>,
    /// Last modification timestamp.
    #[serde(default)]
    pub last_action_date_time: Option<String>,
    /// Enrollment status.
    pub enrollment_status: EnrollmentStatus,
}

// ================== Operations ==================

/// Status of a long-running operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationStatus {
    #[serde(rename = "notstarted")]
    NotStarted,
    Running,
    Succeeded,
    Failed,
}

impl OperationStatus {
    /// Returns true if the operation will not change state anymore.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OperationStatus::Succeeded | OperationStatus::Failed)
    }
}

/// Snapshot of a long-running operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation<T> {
    pub status: OperationStatus,
    #[serde(default)]
    pub created_date_time: Option<String>,
    #[serde(default)]
    pub last_action_date_time: Option<String>,
    /// Failure message when `status` is failed.
    #[serde(default)]
    pub message: Option<String>,
    /// Result payload when `status` is succeeded.
    #[serde(default = "Option::default")]
    pub processing_result: Option<T>,
}

/// Result of a finished enrollment operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentResult {
    pub enrollment_status: EnrollmentStatus,
    #[serde(default)]
    pub remaining_enrollment_speech_time: f64,
    #[serde(default)]
    pub speech_time: f64,
    #[serde(default)]
    pub enrollment_speech_time: f64,
}

/// Identification confidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Confidence {
    Low,
    Normal,
    High,
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Confidence::Low => "Low",
            Confidence::Normal => "Normal",
            Confidence::High => "High",
        })
    }
}

/// Result of a finished identification operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identification {
    /// Matched profile, or the nil UUID when nobody matched.
    pub identified_profile_id: Uuid,
    pub confidence: Confidence,
}

// ================== Audio ==================

/// Audio container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AudioContainer {
    #[default]
    Wav,
    Raw,
}

/// Audio encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AudioEncoding {
    #[default]
    Pcm,
}

/// Format of the audio pushed into a recognition stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioFormat {
    pub encoding: AudioEncoding,
    pub channels: u16,
    pub sample_rate: u32,
    pub bits_per_sample: u16,
    pub container: AudioContainer,
}

impl Default for AudioFormat {
    /// PCM, mono, 16 kHz, 16 bit, in a WAV container.
    fn default() -> Self {
        Self {
            encoding: AudioEncoding::Pcm,
            channels: 1,
            sample_rate: 16_000,
            bits_per_sample: 16,
            container: AudioContainer::Wav,
        }
    }
}

impl AudioFormat {
    /// Bytes of audio per second.
    pub fn byte_rate(&self) -> u32 {
        self.sample_rate * u32::from(self.channels) * u32::from(self.bits_per_sample) / 8
    }

    /// Bytes per sample frame.
    pub fn block_align(&self) -> u16 {
        self.channels * self.bits_per_sample / 8
    }

    /// Wraps raw samples into a canonical 44-byte-header WAV file.
    pub fn to_wav(&self, samples: &[u8]) -> Vec<u8> {
        let data_len = samples.len() as u32;
        let mut out = Vec::with_capacity(44 + samples.len());
        out.extend_from_slice(b"RIFF");
        out.extend_from_slice(&(36 + data_len).to_le_bytes());
        out.extend_from_slice(b"WAVE");
        out.extend_from_slice(b"fmt ");
        out.extend_from_slice(&16u32.to_le_bytes());
        out.extend_from_slice(&1u16.to_le_bytes());
        out.extend_from_slice(&self.channels.to_le_bytes());
        out.extend_from_slice(&self.sample_rate.to_le_bytes());
        out.extend_from_slice(&self.byte_rate().to_le_bytes());
        out.extend_from_slice(&self.block_align().to_le_bytes());
        out.extend_from_slice(&self.bits_per_sample.to_le_bytes());
        out.extend_from_slice(b"data");
        out.extend_from_slice(&data_len.to_le_bytes());
        out.extend_from_slice(samples);
        out
    }
}

/// Returns the offset of the sample data in a RIFF/WAVE file, or `None` when
/// `data` does not start with a complete header.
pub fn wav_data_offset(data: &[u8]) -> Option<usize> {
    if data.len() < 12 || &data[0..4] != b"RIFF" || &data[8..12] != b"WAVE" {
        return None;
    }

    let mut pos = 12;
    while pos + 8 <= data.len() {
        let id = &data[pos..pos + 4];
        let size = u32::from_le_bytes([data[pos + 4], data[pos + 5], data[pos + 6], data[pos + 7]])
            as usize;
        if id == b"data" {
            return Some(pos + 8);
        }
        // Chunks are word aligned.
        pos += 8 + size + (size & 1);
    }
    None
}
