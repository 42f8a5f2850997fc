use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};
use lumen_audio_utils::{
    AudioBuffer, SPEECH_CHANNELS, SPEECH_SAMPLE_RATE, base64_to_bytes, concat_audio_buffers,
    pcm_to_audio_buffer,
};
use lumen_script::{PlaylistItem, sanitize_for_speech, split_into_speech_chunks};
use lumen_speech_interface::SpeechSynthesizer;

pub(crate) type Prepared = Result<Arc<AudioBuffer>, String>;
pub(crate) type TrackFuture = Shared<BoxFuture<'static, Prepared>>;

#[derive(Default)]
struct CacheState {
    ready: HashMap<usize, Arc<AudioBuffer>>,
    pending: HashMap<usize, TrackFuture>,
    /// `0..=1` per track that is loading or loaded.
    progress: HashMap<usize, f64>,
}

/// Lazily prepared, decoded tracks. Concurrent requests for one index share
/// a single fetch; failures are not cached.
pub(crate) struct TrackCache {
    items: Arc<[PlaylistItem]>,
    synthesizer: Arc<dyn SpeechSynthesizer>,
    max_chunk_len: usize,
    state: Arc<Mutex<CacheState>>,
}

fn lock(state: &Mutex<CacheState>) -> MutexGuard<'_, CacheState> {
    state.lock().unwrap_or_else(|e| e.into_inner())
}

impl TrackCache {
    pub fn new(
        items: Vec<PlaylistItem>,
        synthesizer: Arc<dyn SpeechSynthesizer>,
        max_chunk_len: usize,
    ) -> Self {
        Self {
            items: items.into(),
            synthesizer,
            max_chunk_len,
            state: Arc::new(Mutex::new(CacheState::default())),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn item(&self, index: usize) -> Option<&PlaylistItem> {
        self.items.get(index)
    }

    pub fn is_ready(&self, index: usize) -> bool {
        lock(&self.state).ready.contains_key(&index)
    }

    pub fn is_loading(&self, index: usize) -> bool {
        lock(&self.state).pending.contains_key(&index)
    }

    pub fn progress(&self, index: usize) -> f64 {
        lock(&self.state).progress.get(&index).copied().unwrap_or(0.0)
    }

    /// The cached buffer, the fetch already in flight, or a new fetch.
    ///
    /// The caller must check `index < len()`.
    pub fn get(&self, index: usize) -> TrackFuture {
        let mut state = lock(&self.state);

        if let Some(buffer) = state.ready.get(&index) {
            return futures_util::future::ready(Ok(buffer.clone()))
                .boxed()
                .shared();
        }
        if let Some(pending) = state.pending.get(&index) {
            return pending.clone();
        }

        let text = self.items[index].text.clone();
        let synthesizer = self.synthesizer.clone();
        let shared_state = self.state.clone();
        let max_chunk_len = self.max_chunk_len;

        let fetch = async move {
            tracing::debug!(index, "track_fetch_started");
            let progress_state = shared_state.clone();
            let result = prepare_track(synthesizer.as_ref(), &text, max_chunk_len, |done, total| {
                lock(&progress_state)
                    .progress
                    .insert(index, done as f64 / total as f64);
            })
            .await
            .map(Arc::new);

            let mut state = lock(&shared_state);
            state.pending.remove(&index);
            match &result {
                Ok(buffer) => {
                    tracing::debug!(index, duration_secs = buffer.duration(), "track_ready");
                    state.ready.insert(index, buffer.clone());
                    state.progress.insert(index, 1.0);
                }
                Err(reason) => {
                    tracing::warn!(index, %reason, "track_fetch_failed");
                    state.progress.remove(&index);
                }
            }
            result
        }
        .boxed()
        .shared();

        state.pending.insert(index, fetch.clone());
        state.progress.insert(index, 0.0);
        fetch
    }

    /// Starts fetching `index` in the background if it is neither cached nor
    /// in flight.
    pub fn prefetch(&self, index: usize) {
        if index >= self.len() || self.is_ready(index) || self.is_loading(index) {
            return;
        }
        tracing::debug!(index, "track_prefetch");
        let fetch = self.get(index);
        tokio::spawn(async move {
            let _ = fetch.await;
        });
    }
}

/// Sanitizes, chunks, synthesizes and stitches one track.
async fn prepare_track(
    synthesizer: &dyn SpeechSynthesizer,
    text: &str,
    max_chunk_len: usize,
    mut on_chunk: impl FnMut(usize, usize),
) -> Result<AudioBuffer, String> {
    let chunks = split_into_speech_chunks(&sanitize_for_speech(text), max_chunk_len);
    if chunks.is_empty() {
        return Err("track has nothing to narrate".to_string());
    }

    let total = chunks.len();
    let mut buffers = Vec::with_capacity(total);
    for (index, chunk) in chunks.iter().enumerate() {
        match synthesizer.synthesize(chunk).await.map_err(|e| e.to_string())? {
            Some(encoded) if !encoded.trim().is_empty() => {
                let pcm = base64_to_bytes(&encoded).map_err(|e| e.to_string())?;
                let buffer = pcm_to_audio_buffer(&pcm, SPEECH_SAMPLE_RATE, SPEECH_CHANNELS)
                    .map_err(|e| e.to_string())?;
                buffers.push(buffer);
            }
            _ => tracing::warn!(chunk = index, "track_chunk_without_audio"),
        }
        on_chunk(index + 1, total);
    }

    if buffers.is_empty() {
        return Err("empty audio response".to_string());
    }
    Ok(concat_audio_buffers(&buffers))
}
