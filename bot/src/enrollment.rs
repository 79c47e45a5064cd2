//! Enrollment supervision: submit audio, then poll the job with a fixed
//! delay until it succeeds, fails or runs out of attempts.

use std::time::Duration;

use bytes::Bytes;
use habot_cognitive::{EnrollmentResult, OperationStatus};
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    backend::{BackendError, SpeakerBackend},
    config::WorkflowConfig,
};

/// Message of a job that never reached a terminal state.
pub const TIMEOUT_MESSAGE: &str = "Enrollment operation timeout.";

/// Terminal state of an enrollment job.
#[derive(Debug, Clone, PartialEq)]
pub enum EnrollmentOutcome {
    Success(EnrollmentResult),
    /// The job failed; carries the service's message.
    Failed(String),
    /// Attempts ran out while the job was still pending.
    TimedOut,
}

/// Enrollment could not be supervised to a terminal state.
#[derive(Debug, Error)]
pub enum EnrollmentError {
    /// Submitting the audio failed. Not retried.
    #[error("{0}")]
    Submission(BackendError),

    /// A status poll failed.
    #[error("{0}")]
    Poll(BackendError),
}

/// An in-flight enrollment.
#[derive(Debug, Clone)]
pub struct EnrollmentJob {
    pub profile_id: Uuid,
    pub polling_handle: String,
    pub remaining_attempts: u32,
    pub status: Option<OperationStatus>,
}

/// Runs enrollment jobs against a speaker backend.
pub struct EnrollmentSupervisor<'a> {
    backend: &'a dyn SpeakerBackend,
    poll_interval: Duration,
    max_attempts: u32,
}

impl<'a> EnrollmentSupervisor<'a> {
    pub fn new(backend: &'a dyn SpeakerBackend, config: &WorkflowConfig) -> Self {
        Self {
            backend,
            poll_interval: config.poll_interval(),
            max_attempts: config.max_attempts,
        }
    }

    /// Submits `audio` for `profile_id` and waits for the job.
    ///
    /// Every attempt sleeps `poll_interval` before polling, so a job that
    /// stays pending ends after `max_attempts` polls and
    /// `max_attempts * poll_interval`.
    pub async fn enroll(
        &self,
        profile_id: Uuid,
        audio: Bytes,
    ) -> Result<EnrollmentOutcome, EnrollmentError> {
        info!("enrolling profile {} with {} bytes", profile_id, audio.len());
        let polling_handle = self
            .backend
            .submit_enrollment(profile_id, audio)
            .await
            .map_err(EnrollmentError::Submission)?;

        let mut job = EnrollmentJob {
            profile_id,
            polling_handle,
            remaining_attempts: self.max_attempts,
            status: None,
        };

        while job.remaining_attempts > 0 {
            tokio::time::sleep(self.poll_interval).await;

            let operation = self
                .backend
                .poll_enrollment(&job.polling_handle)
                .await
                .map_err(EnrollmentError::Poll)?;
            job.status = Some(operation.status);

            match operation.status {
                OperationStatus::Succeeded => {
                    let result = operation.processing_result.ok_or_else(|| {
                        EnrollmentError::Poll(BackendError::Other(
                            "succeeded enrollment carries no result".into(),
                        ))
                    })?;
                    info!(
                        "profile {} enrollment succeeded: {}",
                        job.profile_id, result.enrollment_status
                    );
                    return Ok(EnrollmentOutcome::Success(result));
                }
                OperationStatus::Failed => {
                    let message = operation.message.unwrap_or_default();
                    warn!("profile {} enrollment failed: {}", job.profile_id, message);
                    return Ok(EnrollmentOutcome::Failed(message));
                }
                OperationStatus::NotStarted | OperationStatus::Running => {
                    job.remaining_attempts -= 1;
                    debug!(
                        "profile {} enrollment pending, {} attempts left",
                        job.profile_id, job.remaining_attempts
                    );
                }
            }
        }

        warn!("profile {} enrollment timed out", job.profile_id);
        Ok(EnrollmentOutcome::TimedOut)
    }
}
