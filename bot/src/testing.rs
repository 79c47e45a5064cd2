//! Hand-written backends for tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use habot_cognitive::{
    Confidence, EnrollmentResult, EnrollmentStatus, Identification, Operation, OperationStatus,
    Profile, StreamConfig, StreamResult,
};
use parking_lot::Mutex;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::backend::{
    AttachmentFetcher, BackendError, ByteStream, RecognitionSession, SentimentScorer,
    SpeakerBackend, Transcriber,
};

/// Call counters shared between a [`MockSpeaker`] and its sessions.
#[derive(Debug, Default)]
pub struct Calls {
    pub created: AtomicUsize,
    pub deleted: AtomicUsize,
    pub listed: AtomicUsize,
    pub submits: AtomicUsize,
    pub polls: AtomicUsize,
    pub opens: AtomicUsize,
    pub pushes: AtomicUsize,
    pub ends: AtomicUsize,
    pub closes: AtomicUsize,
}

impl Calls {
    pub fn get(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

pub fn operation(status: OperationStatus) -> Operation<EnrollmentResult> {
    Operation {
        status,
        created_date_time: None,
        last_action_date_time: None,
        message: None,
        processing_result: None,
    }
}

pub fn profile(id: Uuid, status: EnrollmentStatus, remaining: f64) -> Profile {
    Profile {
        profile_id: id,
        locale: "en-US".to_string(),
        enrollment_speech_time: 0.0,
        remaining_enrollment_speech_time: remaining,
        created_date_time: None,
        last_action_date_time: None,
        enrollment_status: status,
    }
}

/// Scriptable speaker backend. Polls pop `poll_script` and report
/// "running" once it is empty.
#[derive(Default)]
pub struct MockSpeaker {
    pub calls: Arc<Calls>,
    pub profiles: Mutex<Vec<Profile>>,
    pub poll_script: Mutex<VecDeque<Operation<EnrollmentResult>>>,
    pub new_profile: Mutex<Option<Uuid>>,
    pub fail_submit: AtomicBool,
    pub fail_push: AtomicBool,
    pub partial_per_push: AtomicBool,
    pub identify_as: Mutex<Option<Uuid>>,
    pub opened_with: Mutex<Vec<Vec<Uuid>>>,
}

#[async_trait]
impl SpeakerBackend for MockSpeaker {
    async fn create_profile(&self, locale: &str) -> Result<Uuid, BackendError> {
        self.calls.created.fetch_add(1, Ordering::SeqCst);
        if locale.is_empty() {
            return Err(BackendError::Other("locale is required".into()));
        }
        let preset = *self.new_profile.lock();
        let id = preset.unwrap_or_else(Uuid::new_v4);
        self.profiles
            .lock()
            .push(profile(id, EnrollmentStatus::Enrolling, 30.0));
        Ok(id)
    }

    async fn delete_profile(&self, profile_id: Uuid) -> Result<(), BackendError> {
        self.calls.deleted.fetch_add(1, Ordering::SeqCst);
        self.profiles.lock().retain(|p| p.profile_id != profile_id);
        Ok(())
    }

    async fn get_profile(&self, profile_id: Uuid) -> Result<Profile, BackendError> {
        self.profiles
            .lock()
            .iter()
            .find(|p| p.profile_id == profile_id)
            .cloned()
            .ok_or_else(|| BackendError::Other("profile not found".into()))
    }

    async fn list_profiles(&self) -> Result<Vec<Profile>, BackendError> {
        self.calls.listed.fetch_add(1, Ordering::SeqCst);
        Ok(self.profiles.lock().clone())
    }

    async fn submit_enrollment(&self, profile_id: Uuid, _audio: Bytes) -> Result<String, BackendError> {
        self.calls.submits.fetch_add(1, Ordering::SeqCst);
        if self.fail_submit.load(Ordering::SeqCst) {
            return Err(BackendError::Other("audio too short".into()));
        }
        Ok(format!("/operations/{profile_id}"))
    }

    async fn poll_enrollment(&self, _handle: &str) -> Result<Operation<EnrollmentResult>, BackendError> {
        self.calls.polls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .poll_script
            .lock()
            .pop_front()
            .unwrap_or_else(|| operation(OperationStatus::Running)))
    }

    async fn open_recognition(
        &self,
        config: StreamConfig,
        sink: mpsc::UnboundedSender<StreamResult>,
    ) -> Result<Box<dyn RecognitionSession>, BackendError> {
        self.calls.opens.fetch_add(1, Ordering::SeqCst);
        self.opened_with.lock().push(config.speakers.clone());
        Ok(Box::new(MockSession {
            calls: Arc::clone(&self.calls),
            client_id: config.client_id,
            sink,
            fail_push: self.fail_push.load(Ordering::SeqCst),
            partial_per_push: self.partial_per_push.load(Ordering::SeqCst),
            identify_as: *self.identify_as.lock(),
            next_request: 0,
        }))
    }
}

struct MockSession {
    calls: Arc<Calls>,
    client_id: Uuid,
    sink: mpsc::UnboundedSender<StreamResult>,
    fail_push: bool,
    partial_per_push: bool,
    identify_as: Option<Uuid>,
    next_request: u32,
}

impl MockSession {
    fn report(&mut self, is_final: bool) {
        let outcome = match self.identify_as {
            Some(id) => Ok(Identification {
                identified_profile_id: id,
                confidence: Confidence::High,
            }),
            None => Err("no match".to_string()),
        };
        let _ = self.sink.send(StreamResult {
            client_id: self.client_id,
            request_id: self.next_request,
            is_final,
            outcome,
        });
        self.next_request += 1;
    }
}

#[async_trait]
impl RecognitionSession for MockSession {
    async fn push(&mut self, _chunk: &[u8]) -> Result<(), BackendError> {
        self.calls.pushes.fetch_add(1, Ordering::SeqCst);
        if self.fail_push {
            return Err(BackendError::Other("session dropped".into()));
        }
        if self.partial_per_push {
            self.report(false);
        }
        Ok(())
    }

    async fn end(&mut self) -> Result<(), BackendError> {
        self.calls.ends.fetch_add(1, Ordering::SeqCst);
        self.report(true);
        Ok(())
    }

    async fn close(self: Box<Self>) {
        self.calls.closes.fetch_add(1, Ordering::SeqCst);
    }
}

/// Serves a fixed number of zero bytes for every URL.
pub struct MockFetcher {
    pub len: usize,
    pub fetches: AtomicUsize,
}

impl MockFetcher {
    pub fn new(len: usize) -> Self {
        Self {
            len,
            fetches: AtomicUsize::new(0),
        }
    }
}

pub fn zero_stream(len: usize, piece: usize) -> ByteStream {
    let mut pieces: Vec<Result<Bytes, BackendError>> = Vec::new();
    let mut left = len;
    while left > 0 {
        let n = left.min(piece);
        pieces.push(Ok(Bytes::from(vec![0u8; n])));
        left -= n;
    }
    Box::pin(futures::stream::iter(pieces))
}

#[async_trait]
impl AttachmentFetcher for MockFetcher {
    async fn fetch(&self, _url: &str) -> Result<ByteStream, BackendError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        Ok(zero_stream(self.len, 4096))
    }
}

pub struct MockTranscriber {
    pub result: Result<String, String>,
}

#[async_trait]
impl Transcriber for MockTranscriber {
    async fn transcribe(&self, _audio_url: &str) -> Result<String, BackendError> {
        self.result.clone().map_err(BackendError::Other)
    }
}

pub struct MockSentiment(pub f64);

#[async_trait]
impl SentimentScorer for MockSentiment {
    async fn score(&self, _text: &str) -> Result<f64, BackendError> {
        Ok(self.0)
    }
}
