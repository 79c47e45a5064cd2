//! Windowed streaming speaker recognition.
//!
//! The identification API only accepts complete audio files, so streaming is
//! emulated on the client: pushed audio is buffered, and every `step` of new
//! audio the trailing `window` is submitted for identification. Those results
//! are partial. Ending the stream waits for in-flight windows and identifies
//! the trailing window once more; that result is the final one.

use std::time::Duration;

use bytes::Bytes;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{
    error::{Error, Result},
    identification::IdentificationService,
    types::{wav_data_offset, AudioContainer, AudioFormat, Identification},
};

/// Largest WAV header accepted before the `data` chunk must have started.
const MAX_WAV_HEADER: usize = 4096;

/// Configuration of a recognition stream.
#[derive(Debug, Clone)]
pub struct StreamConfig {
    /// Correlation id reported with every result.
    pub client_id: Uuid,
    /// Candidate profiles. Copied when the stream opens.
    pub speakers: Vec<Uuid>,
    /// Amount of new audio that triggers a partial identification.
    pub step: Duration,
    /// Amount of trailing audio submitted per identification.
    pub window: Duration,
    /// Format of the pushed audio.
    pub audio_format: AudioFormat,
    /// Delay between operation status polls.
    pub poll_interval: Duration,
    /// Operation polls before a window is reported as timed out.
    pub max_polls: u32,
}

impl StreamConfig {
    /// Creates a configuration with 5 s steps and 10 s windows.
    pub fn new(client_id: Uuid, speakers: Vec<Uuid>) -> Self {
        Self {
            client_id,
            speakers,
            step: Duration::from_secs(5),
            window: Duration::from_secs(10),
            audio_format: AudioFormat::default(),
            poll_interval: Duration::from_secs(1),
            max_polls: 10,
        }
    }
}

/// One identification outcome delivered through the result sink.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamResult {
    pub client_id: Uuid,
    /// Sequence number of the identification request within the stream.
    pub request_id: u32,
    /// True for the single result produced by [`RecognitionStream::end`].
    pub is_final: bool,
    pub outcome: std::result::Result<Identification, String>,
}

/// Splits a PCM byte stream into overlapping identification windows.
#[derive(Debug)]
pub(crate) struct Windower {
    step: usize,
    window: usize,
    samples: Vec<u8>,
    /// Absolute stream offset of `samples[0]`.
    base: usize,
    next_boundary: usize,
}

impl Windower {
    pub(crate) fn new(step: usize, window: usize) -> Self {
        let step = step.max(1);
        Self {
            step,
            window: window.max(step),
            samples: Vec::new(),
            base: 0,
            next_boundary: step,
        }
    }

    /// Total PCM bytes pushed so far.
    pub(crate) fn total(&self) -> usize {
        self.base + self.samples.len()
    }

    /// Appends audio and returns every window whose step boundary was crossed.
    pub(crate) fn push(&mut self, pcm: &[u8]) -> Vec<Vec<u8>> {
        self.samples.extend_from_slice(pcm);
        let end = self.total();

        let mut ready = Vec::new();
        while self.next_boundary <= end {
            let boundary = self.next_boundary;
            let start = boundary.saturating_sub(self.window).max(self.base);
            ready.push(self.samples[start - self.base..boundary - self.base].to_vec());
            self.next_boundary += self.step;
        }

        let keep_from = self
            .next_boundary
            .saturating_sub(self.window)
            .max(self.base)
            .min(end);
        self.samples.drain(..keep_from - self.base);
        self.base = keep_from;
        ready
    }

    /// Returns the trailing window, or `None` when nothing was pushed.
    pub(crate) fn finish(&self) -> Option<Vec<u8>> {
        if self.total() == 0 {
            return None;
        }
        let start = self.samples.len().saturating_sub(self.window);
        Some(self.samples[start..].to_vec())
    }
}

/// An open recognition stream.
///
/// Dropping the stream aborts identifications still in flight.
pub struct RecognitionStream {
    service: IdentificationService,
    config: StreamConfig,
    sink: mpsc::UnboundedSender<StreamResult>,
    header: Option<Vec<u8>>,
    windower: Windower,
    next_request: u32,
    tasks: JoinSet<()>,
    ended: bool,
}

impl RecognitionStream {
    pub(crate) fn open(
        service: IdentificationService,
        config: StreamConfig,
        sink: mpsc::UnboundedSender<StreamResult>,
    ) -> Result<Self> {
        if config.speakers.is_empty() {
            return Err(Error::Config("recognition stream needs candidate profiles".into()));
        }

        let byte_rate = f64::from(config.audio_format.byte_rate());
        let step = (config.step.as_secs_f64() * byte_rate) as usize;
        let window = (config.window.as_secs_f64() * byte_rate) as usize;
        let header = match config.audio_format.container {
            AudioContainer::Wav => Some(Vec::new()),
            AudioContainer::Raw => None,
        };

        debug!(
            "opened recognition stream {} with {} candidates",
            config.client_id,
            config.speakers.len()
        );

        Ok(Self {
            service,
            config,
            sink,
            header,
            windower: Windower::new(step, window),
            next_request: 0,
            tasks: JoinSet::new(),
            ended: false,
        })
    }

    /// Returns the correlation id of this stream.
    pub fn client_id(&self) -> Uuid {
        self.config.client_id
    }

    /// Pushes the next piece of audio.
    pub fn push(&mut self, chunk: &[u8]) -> Result<()> {
        if self.ended {
            return Err(Error::Other("recognition stream already ended".into()));
        }

        let pcm = match self.header.as_mut() {
            Some(header) => {
                header.extend_from_slice(chunk);
                match wav_data_offset(header) {
                    Some(offset) => {
                        let pcm = header.split_off(offset);
                        self.header = None;
                        pcm
                    }
                    None if header.len() > MAX_WAV_HEADER => {
                        return Err(Error::Config("audio is not a WAV stream".into()));
                    }
                    None => return Ok(()),
                }
            }
            None => chunk.to_vec(),
        };

        for window in self.windower.push(&pcm) {
            self.spawn_identify(window);
        }
        Ok(())
    }

    /// Signals end of audio, waits for pending windows and reports the final
    /// result.
    pub async fn end(&mut self) -> Result<()> {
        if self.ended {
            return Ok(());
        }
        self.ended = true;

        while let Some(joined) = self.tasks.join_next().await {
            if let Err(e) = joined {
                warn!("recognition window task failed: {}", e);
            }
        }

        let request_id = self.take_request_id();
        let outcome = match self.windower.finish() {
            Some(window) => {
                let audio = Bytes::from(self.config.audio_format.to_wav(&window));
                self.service
                    .identify_and_wait(
                        &self.config.speakers,
                        audio,
                        self.config.poll_interval,
                        self.config.max_polls,
                    )
                    .await
                    .map_err(|e| e.to_string())
            }
            None => Err("no audio was streamed".to_string()),
        };

        let _ = self.sink.send(StreamResult {
            client_id: self.config.client_id,
            request_id,
            is_final: true,
            outcome,
        });
        Ok(())
    }

    /// Releases the stream. Pending identifications are aborted.
    pub fn close(mut self) {
        self.tasks.abort_all();
        debug!("closed recognition stream {}", self.config.client_id);
    }

    fn take_request_id(&mut self) -> u32 {
        let id = self.next_request;
        self.next_request += 1;
        id
    }

    fn spawn_identify(&mut self, window: Vec<u8>) {
        let request_id = self.take_request_id();
        let service = self.service.clone();
        let sink = self.sink.clone();
        let client_id = self.config.client_id;
        let speakers = self.config.speakers.clone();
        let interval = self.config.poll_interval;
        let max_polls = self.config.max_polls;
        let audio = Bytes::from(self.config.audio_format.to_wav(&window));

        self.tasks.spawn(async move {
            let outcome = service
                .identify_and_wait(&speakers, audio, interval, max_polls)
                .await
                .map_err(|e| e.to_string());
            let _ = sink.send(StreamResult {
                client_id,
                request_id,
                is_final: false,
                outcome,
            });
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_windower_emits_on_step_boundaries() {
        let mut w = Windower::new(4, 8);
        assert!(w.push(&[0, 1, 2]).is_empty());

        let ready = w.push(&[3, 4]);
        assert_eq!(ready, vec![vec![0, 1, 2, 3]]);

        let ready = w.push(&[5, 6, 7, 8, 9, 10, 11]);
        assert_eq!(ready, vec![vec![0, 1, 2, 3, 4, 5, 6, 7], vec![4, 5, 6, 7, 8, 9, 10, 11]]);
        assert_eq!(w.total(), 12);
    }

    #[test]
    fn test_windower_trims_buffer() {
        let mut w = Windower::new(2, 4);
        for i in 0..100u8 {
            w.push(&[i]);
        }
        assert!(w.samples.len() <= 4);
        assert_eq!(w.finish(), Some(vec![96, 97, 98, 99]));
    }

    #[test]
    fn test_windower_finish_empty() {
        let w = Windower::new(2, 4);
        assert_eq!(w.finish(), None);
    }

    #[test]
    fn test_windower_short_stream() {
        let mut w = Windower::new(10, 20);
        assert!(w.push(&[1, 2, 3]).is_empty());
        assert_eq!(w.finish(), Some(vec![1, 2, 3]));
    }
}
