//! Paced streaming of an audio attachment into a recognition session.

use habot_cognitive::{StreamConfig, StreamResult};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    backend::{BackendError, ByteStream, ChunkReader, RecognitionSession, SpeakerBackend},
    config::WorkflowConfig,
};

/// Streams `audio` to a new recognition session against `candidates`.
///
/// Audio is pushed in `chunk_size` pieces with `chunk_pacing` after each,
/// then the stream is ended. Partial and final results are handed to
/// `on_result` as they arrive; the final one arrives before this returns.
/// The session is closed on every path. Returns the number of chunks pushed.
pub async fn analyze<F>(
    backend: &dyn SpeakerBackend,
    audio: ByteStream,
    candidates: &[Uuid],
    config: &WorkflowConfig,
    mut on_result: F,
) -> Result<usize, BackendError>
where
    F: FnMut(StreamResult) + Send,
{
    let mut stream_config = StreamConfig::new(Uuid::new_v4(), candidates.to_vec());
    stream_config.step = config.recognition_step();
    stream_config.window = config.recognition_window();
    let client_id = stream_config.client_id;

    let (sink, mut results) = mpsc::unbounded_channel();
    let mut session = backend.open_recognition(stream_config, sink).await?;
    info!(
        "recognition session {} opened with {} candidates",
        client_id,
        candidates.len()
    );

    let pumped = pump(session.as_mut(), audio, config, &mut results, &mut on_result).await;
    let ended = match pumped {
        Ok(chunks) => session.end().await.map(|()| chunks),
        Err(e) => Err(e),
    };
    session.close().await;

    while let Ok(result) = results.try_recv() {
        deliver(&mut on_result, result);
    }

    match &ended {
        Ok(chunks) => debug!("recognition session {} ended after {} chunks", client_id, chunks),
        Err(e) => warn!("recognition session {} failed: {}", client_id, e),
    }
    ended
}

async fn pump<F>(
    session: &mut dyn RecognitionSession,
    audio: ByteStream,
    config: &WorkflowConfig,
    results: &mut mpsc::UnboundedReceiver<StreamResult>,
    on_result: &mut F,
) -> Result<usize, BackendError>
where
    F: FnMut(StreamResult) + Send,
{
    let mut reader = ChunkReader::new(audio);
    let pacing = config.chunk_pacing();
    let mut chunks = 0;

    while let Some(chunk) = reader.next_chunk(config.chunk_size.max(1)).await? {
        session.push(&chunk).await?;
        chunks += 1;
        tokio::time::sleep(pacing).await;

        while let Ok(result) = results.try_recv() {
            deliver(on_result, result);
        }
    }
    Ok(chunks)
}

fn deliver<F: FnMut(StreamResult)>(on_result: &mut F, result: StreamResult) {
    if result.is_final {
        debug!("final recognition result {}", result.request_id);
    } else {
        debug!("partial recognition result {}", result.request_id);
    }
    on_result(result);
}
