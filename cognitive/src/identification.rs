//! Speaker Identification service.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use reqwest::Method;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::{
    error::{Error, Result},
    http::HttpClient,
    streaming::{RecognitionStream, StreamConfig, StreamResult},
    types::{EnrollmentResult, Identification, Operation, OperationStatus, Profile},
};

const PROFILES_PATH: &str = "/spid/v1.0/identificationProfiles";
const IDENTIFY_PATH: &str = "/spid/v1.0/identify";

/// Maximum number of candidate profiles per identification request.
pub const MAX_IDENTIFY_CANDIDATES: usize = 10;

/// Speaker Identification service: profile management, enrollment and
/// text-independent identification.
///
/// API Documentation: https://westus.dev.cognitive.microsoft.com/docs/services/563309b6778daf02acc0a508
#[derive(Clone)]
pub struct IdentificationService {
    http: Arc<HttpClient>,
}

impl IdentificationService {
    pub(crate) fn new(http: Arc<HttpClient>) -> Self {
        Self { http }
    }

    /// Creates a new profile for the given locale (e.g. `en-US`).
    pub async fn create_profile(&self, locale: &str) -> Result<Uuid> {
        let body = CreateProfileRequest {
            locale: locale.to_string(),
        };
        let response: CreateProfileResponse = self
            .http
            .request(Method::POST, PROFILES_PATH, Some(&body))
            .await?;
        debug!("created identification profile {}", response.identification_profile_id);
        Ok(response.identification_profile_id)
    }

    /// Deletes a profile and its enrollment data.
    pub async fn delete_profile(&self, profile_id: Uuid) -> Result<()> {
        let path = format!("{}/{}", PROFILES_PATH, profile_id);
        self.http.request_empty(Method::DELETE, &path).await
    }

    /// Fetches one profile.
    pub async fn get_profile(&self, profile_id: Uuid) -> Result<Profile> {
        let path = format!("{}/{}", PROFILES_PATH, profile_id);
        self.http.request(Method::GET, &path, None::<&()>).await
    }

    /// Lists all profiles of the subscription.
    pub async fn list_profiles(&self) -> Result<Vec<Profile>> {
        self.http
            .request(Method::GET, PROFILES_PATH, None::<&()>)
            .await
    }

    /// Submits enrollment audio and returns the operation location to poll.
    ///
    /// Audio requirements: WAV container, PCM 16 kHz mono 16 bit.
    pub async fn enroll(&self, profile_id: Uuid, audio: Bytes) -> Result<String> {
        let path = format!("{}/{}/enroll?shortAudio=true", PROFILES_PATH, profile_id);
        self.http.post_audio(&path, audio).await
    }

    /// Fetches the state of an enrollment operation.
    pub async fn enrollment_operation(&self, location: &str) -> Result<Operation<EnrollmentResult>> {
        self.operation(location).await
    }

    /// Submits audio for identification against `candidates` and returns the
    /// operation location to poll.
    pub async fn identify(&self, candidates: &[Uuid], audio: Bytes) -> Result<String> {
        if candidates.is_empty() {
            return Err(Error::Config("at least one candidate profile is required".into()));
        }
        if candidates.len() > MAX_IDENTIFY_CANDIDATES {
            return Err(Error::Config(format!(
                "at most {} candidate profiles are allowed, got {}",
                MAX_IDENTIFY_CANDIDATES,
                candidates.len()
            )));
        }

        let ids = candidates
            .iter()
            .map(Uuid::to_string)
            .collect::<Vec<_>>()
            .join(",");
        let path = format!(
            "{}?identificationProfileIds={}&shortAudio=true",
            IDENTIFY_PATH, ids
        );
        self.http.post_audio(&path, audio).await
    }

    /// Fetches the state of an identification operation.
    pub async fn identification_operation(&self, location: &str) -> Result<Operation<Identification>> {
        self.operation(location).await
    }

    /// Identifies a speaker and waits for the operation to finish.
    pub async fn identify_and_wait(
        &self,
        candidates: &[Uuid],
        audio: Bytes,
        interval: Duration,
        max_polls: u32,
    ) -> Result<Identification> {
        let location = self.identify(candidates, audio).await?;
        self.wait(&location, interval, max_polls).await
    }

    /// Polls an operation until it reaches a terminal state.
    pub async fn wait<T>(&self, location: &str, interval: Duration, max_polls: u32) -> Result<T>
    where
        T: DeserializeOwned,
    {
        for _ in 0..max_polls {
            tokio::time::sleep(interval).await;
            let op: Operation<T> = self.operation(location).await?;
            match op.status {
                OperationStatus::Succeeded => {
                    return op.processing_result.ok_or_else(|| {
                        Error::Other("succeeded operation carries no result".into())
                    });
                }
                OperationStatus::Failed => {
                    return Err(Error::TaskFailed(op.message.unwrap_or_default()));
                }
                OperationStatus::NotStarted | OperationStatus::Running => {}
            }
        }
        Err(Error::Timeout(max_polls))
    }

    /// Opens a windowed recognition stream. See [`RecognitionStream`].
    pub fn open_stream(
        &self,
        config: StreamConfig,
        sink: tokio::sync::mpsc::UnboundedSender<StreamResult>,
    ) -> Result<RecognitionStream> {
        RecognitionStream::open(self.clone(), config, sink)
    }

    async fn operation<T>(&self, location: &str) -> Result<Operation<T>>
    where
        T: DeserializeOwned,
    {
        self.http.request(Method::GET, location, None::<&()>).await
    }
}

// ================== Internal Request/Response Types ==================

#[derive(Debug, Serialize)]
struct CreateProfileRequest {
    locale: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateProfileResponse {
    identification_profile_id: Uuid,
}
