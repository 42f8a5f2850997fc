use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::SystemTime;

use lumen_audio_utils::{AudioBuffer, audio_buffer_to_wav};
use lumen_script::{DEFAULT_MAX_CHUNK_LEN, PlaylistItem};
use lumen_speech_interface::SpeechSynthesizer;
use lumen_storage::{AudioBlob, unix_millis};

use crate::tracks::TrackCache;
use crate::{
    ArtifactExporter, AudioOutput, Error, MediaElement, MediaError, PlayerEvent, PlayerRuntime,
    ScheduledSource, SpeechActivity, SpeechClaim, track_file_name,
};

/// A drained source counts as a natural end only this close to the track's
/// end.
const TRACK_END_TOLERANCE_SECS: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackState {
    #[default]
    Idle,
    Playing,
    Paused,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerMode {
    /// Short tracks decoded into memory.
    Buffer,
    /// One finalized long-form file.
    Blob,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct PlayerSnapshot {
    pub mode: PlayerMode,
    pub state: PlaybackState,
    pub position_seconds: f64,
    pub duration_seconds: f64,
    pub active_index: Option<usize>,
    /// The active track is being prepared.
    pub loading: bool,
    /// `0..=1` for the active track.
    pub buffering_progress: f64,
    pub error: Option<String>,
}

pub struct PlayerBuilder {
    runtime: Arc<dyn PlayerRuntime>,
    exporter: Arc<dyn ArtifactExporter>,
    activity: SpeechActivity,
    max_chunk_len: usize,
}

impl PlayerBuilder {
    pub fn speech_activity(mut self, activity: SpeechActivity) -> Self {
        self.activity = activity;
        self
    }

    pub fn max_chunk_len(mut self, max_chunk_len: usize) -> Self {
        self.max_chunk_len = max_chunk_len;
        self
    }

    /// A player streaming one finalized file through `element`.
    pub fn blob(self, blob: AudioBlob, element: Box<dyn MediaElement>) -> Player {
        let duration = blob.duration();
        self.build(
            Backend::Blob(blob),
            Transport::Element {
                element,
                loaded: false,
            },
            duration,
        )
    }

    /// A player over playlist tracks, each synthesized on first use.
    pub fn tracks(
        self,
        items: Vec<PlaylistItem>,
        synthesizer: Arc<dyn SpeechSynthesizer>,
        output: Arc<dyn AudioOutput>,
    ) -> Player {
        let cache = TrackCache::new(items, synthesizer, self.max_chunk_len);
        self.build(
            Backend::Tracks { cache, output },
            Transport::Buffers { live: None },
            0.0,
        )
    }

    fn build(self, backend: Backend, transport: Transport, duration: f64) -> Player {
        Player {
            backend,
            runtime: self.runtime,
            exporter: self.exporter,
            activity: self.activity,
            session: Mutex::new(Session {
                state: PlaybackState::Idle,
                position: 0.0,
                duration,
                active_index: None,
                continuous: false,
                error: None,
                claim: None,
                transport,
            }),
            requests: AtomicU64::new(0),
        }
    }
}

enum Backend {
    Blob(AudioBlob),
    Tracks {
        cache: TrackCache,
        output: Arc<dyn AudioOutput>,
    },
}

struct LiveSource {
    source: Box<dyn ScheduledSource>,
    started_at: f64,
    offset: f64,
}

impl LiveSource {
    fn elapsed(&self, now: f64) -> f64 {
        self.offset + (now - self.started_at).max(0.0)
    }
}

enum Transport {
    Element {
        element: Box<dyn MediaElement>,
        loaded: bool,
    },
    Buffers {
        live: Option<LiveSource>,
    },
}

struct Session {
    state: PlaybackState,
    position: f64,
    duration: f64,
    active_index: Option<usize>,
    continuous: bool,
    error: Option<String>,
    claim: Option<SpeechClaim>,
    transport: Transport,
}

impl Session {
    /// Applies `state`, holding a speech claim exactly while playing.
    fn set_state(&mut self, state: PlaybackState, activity: &SpeechActivity) -> bool {
        if self.state == state {
            return false;
        }
        self.state = state;
        if state == PlaybackState::Playing {
            self.claim.get_or_insert_with(|| activity.claim());
        } else {
            self.claim = None;
        }
        true
    }

    fn stop_source(&mut self) {
        if let Transport::Buffers { live } = &mut self.transport
            && let Some(mut live) = live.take()
        {
            live.source.stop();
        }
    }
}

/// Playback over either in-memory tracks or one long-form file.
///
/// Every user-initiated transition takes a new request token; async work
/// started under an older token finishes without touching the session.
pub struct Player {
    backend: Backend,
    runtime: Arc<dyn PlayerRuntime>,
    exporter: Arc<dyn ArtifactExporter>,
    activity: SpeechActivity,
    session: Mutex<Session>,
    requests: AtomicU64,
}

impl Player {
    pub fn builder(
        runtime: Arc<dyn PlayerRuntime>,
        exporter: Arc<dyn ArtifactExporter>,
    ) -> PlayerBuilder {
        PlayerBuilder {
            runtime,
            exporter,
            activity: SpeechActivity::new(),
            max_chunk_len: DEFAULT_MAX_CHUNK_LEN,
        }
    }

    pub fn mode(&self) -> PlayerMode {
        match self.backend {
            Backend::Blob(_) => PlayerMode::Blob,
            Backend::Tracks { .. } => PlayerMode::Buffer,
        }
    }

    pub fn speech_activity(&self) -> &SpeechActivity {
        &self.activity
    }

    /// Zero in blob mode.
    pub fn track_count(&self) -> usize {
        match &self.backend {
            Backend::Blob(_) => 0,
            Backend::Tracks { cache, .. } => cache.len(),
        }
    }

    pub fn track(&self, index: usize) -> Option<&PlaylistItem> {
        match &self.backend {
            Backend::Blob(_) => None,
            Backend::Tracks { cache, .. } => cache.item(index),
        }
    }

    pub fn is_track_loading(&self, index: usize) -> bool {
        match &self.backend {
            Backend::Blob(_) => false,
            Backend::Tracks { cache, .. } => cache.is_loading(index),
        }
    }

    pub fn snapshot(&self) -> PlayerSnapshot {
        let session = self.lock_session();
        let (loading, buffering_progress) = match (&self.backend, session.active_index) {
            (Backend::Tracks { cache, .. }, Some(index)) => {
                (cache.is_loading(index), cache.progress(index))
            }
            (Backend::Tracks { .. }, None) => (false, 0.0),
            (Backend::Blob(_), _) => (false, 1.0),
        };
        PlayerSnapshot {
            mode: self.mode(),
            state: session.state,
            position_seconds: session.position,
            duration_seconds: session.duration,
            active_index: session.active_index,
            loading,
            buffering_progress,
            error: session.error.clone(),
        }
    }

    /// Idle starts from the top (continuous in buffer mode), playing pauses,
    /// paused resumes from the recorded position.
    pub async fn toggle_play_pause(&self) -> crate::Result<()> {
        let output = match &self.backend {
            Backend::Blob(blob) => return self.toggle_element(blob.path()),
            Backend::Tracks { output, .. } => output,
        };

        let (state, active, continuous, position) = self.session_cursor();
        match state {
            PlaybackState::Playing => {
                self.pause_tracks(output.as_ref());
                Ok(())
            }
            PlaybackState::Paused => {
                let index = active.ok_or(Error::NoActiveTrack)?;
                self.play_track(index, continuous, position).await
            }
            PlaybackState::Idle => self.play_track(active.unwrap_or(0), true, 0.0).await,
        }
    }

    /// Clicking the active track toggles it; any other track plays alone.
    /// In blob mode the index is ignored.
    pub async fn track_clicked(&self, index: usize) -> crate::Result<()> {
        let output = match &self.backend {
            Backend::Blob(blob) => return self.toggle_element(blob.path()),
            Backend::Tracks { output, .. } => output,
        };

        let (state, active, continuous, position) = self.session_cursor();
        if active == Some(index) {
            match state {
                PlaybackState::Playing => {
                    self.pause_tracks(output.as_ref());
                    return Ok(());
                }
                PlaybackState::Paused => return self.play_track(index, continuous, position).await,
                PlaybackState::Idle => {}
            }
        }
        self.play_track(index, false, 0.0).await
    }

    /// Stops whatever is live and plays track `index` from `offset` seconds.
    ///
    /// With `continuous`, the next track is prefetched and playback advances
    /// to it when this one ends; a track that cannot be prepared is skipped.
    /// Without it, a preparation failure stops playback.
    pub async fn play_track(
        &self,
        index: usize,
        continuous: bool,
        offset: f64,
    ) -> crate::Result<()> {
        let Backend::Tracks { cache, output } = &self.backend else {
            return Err(Error::TrackOutOfRange { index, len: 0 });
        };
        if index >= cache.len() {
            return Err(Error::TrackOutOfRange {
                index,
                len: cache.len(),
            });
        }

        let request = self.next_request();
        let mut index = index;
        let mut offset = offset.max(0.0);

        loop {
            {
                let mut guard = self.lock_session();
                let session = &mut *guard;
                session.stop_source();
                if session.active_index != Some(index) {
                    session.duration = 0.0;
                }
                session.active_index = Some(index);
                session.continuous = continuous;
                session.position = offset;
            }
            if !cache.is_ready(index) {
                self.runtime.emit(PlayerEvent::TrackLoading { index });
            }

            let prepared = cache.get(index).await;
            if !self.is_current(request) {
                tracing::debug!(index, request, "stale_play_request_ignored");
                return Ok(());
            }

            let reason = match prepared {
                Ok(buffer) => {
                    return self.start_buffer(
                        output.as_ref(),
                        cache,
                        request,
                        index,
                        buffer,
                        offset,
                        continuous,
                    );
                }
                Err(reason) => reason,
            };

            self.runtime.emit(PlayerEvent::TrackFailed {
                index,
                error: reason.clone(),
            });
            let message = format!("Track {} could not be prepared.", index + 1);

            if continuous && index + 1 < cache.len() {
                tracing::warn!(index, %reason, "track_skipped");
                self.lock_session().error = Some(message);
                index += 1;
                offset = 0.0;
                continue;
            }

            tracing::error!(index, %reason, "track_unavailable");
            {
                let mut guard = self.lock_session();
                let session = &mut *guard;
                session.error = Some(message);
                session.position = 0.0;
                self.transition(session, PlaybackState::Idle);
            }
            return Err(Error::TrackUnavailable { index, reason });
        }
    }

    /// Jumps to `seconds`, clamped to the known duration. A playing track
    /// restarts at the new offset.
    pub async fn seek(&self, seconds: f64) -> crate::Result<()> {
        let target = if seconds.is_finite() {
            seconds.max(0.0)
        } else {
            0.0
        };

        if let Backend::Blob(_) = &self.backend {
            let mut guard = self.lock_session();
            let session = &mut *guard;
            let target = if session.duration > 0.0 {
                target.min(session.duration)
            } else {
                target
            };
            if let Transport::Element {
                element,
                loaded: true,
            } = &mut session.transport
            {
                element
                    .set_current_time(target)
                    .map_err(|e| Error::Media(e.to_string()))?;
            }
            session.position = target;
            return Ok(());
        }

        let (state, active, continuous, _) = self.session_cursor();
        let Some(index) = active else {
            return Ok(());
        };
        let target = {
            let session = self.lock_session();
            if session.duration > 0.0 {
                target.min(session.duration)
            } else {
                target
            }
        };

        if state == PlaybackState::Playing {
            self.play_track(index, continuous, target).await
        } else {
            self.lock_session().position = target;
            Ok(())
        }
    }

    /// Stops playback and rewinds to the start.
    pub fn stop(&self) {
        self.next_request();
        let mut guard = self.lock_session();
        let session = &mut *guard;
        match &mut session.transport {
            Transport::Element { element, loaded } => {
                element.pause();
                if *loaded && let Err(e) = element.set_current_time(0.0) {
                    tracing::warn!(error = %e, "media_rewind_failed");
                }
            }
            Transport::Buffers { live } => {
                if let Some(mut live) = live.take() {
                    live.source.stop();
                }
            }
        }
        session.position = 0.0;
        self.transition(session, PlaybackState::Idle);
    }

    /// Advances the wall-clock position while playing and handles the end of
    /// the file or track. Drive it from a periodic timer.
    pub async fn tick(&self) -> crate::Result<()> {
        let (cache, output) = match &self.backend {
            Backend::Blob(_) => {
                self.tick_element();
                return Ok(());
            }
            Backend::Tracks { cache, output } => (cache, output),
        };

        let next = {
            let mut guard = self.lock_session();
            let session = &mut *guard;
            if session.state != PlaybackState::Playing {
                return Ok(());
            }
            let Transport::Buffers { live: Some(live) } = &session.transport else {
                return Ok(());
            };

            let elapsed = live.elapsed(output.now());
            session.position = elapsed.min(session.duration);
            if !live.source.ended() {
                return Ok(());
            }
            if elapsed < session.duration - TRACK_END_TOLERANCE_SECS {
                tracing::debug!(elapsed, duration = session.duration, "source_drained_early");
                return Ok(());
            }

            session.stop_source();
            let next = session
                .active_index
                .map(|index| index + 1)
                .filter(|&next| session.continuous && next < cache.len());
            if next.is_none() {
                session.active_index = None;
                self.finish(session);
            }
            next
        };

        match next {
            Some(index) => {
                tracing::debug!(index, "track_advance");
                self.play_track(index, true, 0.0).await
            }
            None => Ok(()),
        }
    }

    /// Exports the finalized file (blob mode) or track `index`, defaulting to
    /// the active track (buffer mode).
    pub async fn download(&self, index: Option<usize>) -> crate::Result<PathBuf> {
        let (bytes, name) = match &self.backend {
            Backend::Blob(blob) => (
                blob.read().await?,
                format!("session_{}.wav", unix_millis(SystemTime::now())),
            ),
            Backend::Tracks { cache, .. } => {
                let index = match index {
                    Some(index) => index,
                    None => self
                        .lock_session()
                        .active_index
                        .ok_or(Error::NoActiveTrack)?,
                };
                let item = cache.item(index).ok_or(Error::TrackOutOfRange {
                    index,
                    len: cache.len(),
                })?;
                let buffer = cache
                    .get(index)
                    .await
                    .map_err(|reason| Error::TrackUnavailable { index, reason })?;
                (audio_buffer_to_wav(&buffer), track_file_name(&item.title))
            }
        };

        let path = self
            .exporter
            .export_blob(bytes, &name)
            .await
            .map_err(Error::Export)?;
        tracing::info!(path = %path.display(), "download_exported");
        self.runtime.emit(PlayerEvent::Exported {
            path: path.display().to_string(),
        });
        Ok(path)
    }

    fn toggle_element(&self, path: &Path) -> crate::Result<()> {
        self.next_request();
        let mut guard = self.lock_session();
        let session = &mut *guard;
        let Transport::Element { element, loaded } = &mut session.transport else {
            return Ok(());
        };

        if session.state == PlaybackState::Playing {
            element.pause();
            session.position = element.current_time();
            self.transition(session, PlaybackState::Paused);
            return Ok(());
        }

        match start_element(element.as_mut(), loaded, path, session.position) {
            Ok(()) => {
                let duration = element.duration();
                if duration.is_finite() && duration > 0.0 {
                    session.duration = duration;
                }
                session.error = None;
                self.transition(session, PlaybackState::Playing);
                Ok(())
            }
            Err(e) => {
                let message = e.to_string();
                tracing::error!(error = %message, "media_start_failed");
                session.error = Some(message.clone());
                self.transition(session, PlaybackState::Idle);
                Err(Error::Media(message))
            }
        }
    }

    fn tick_element(&self) {
        let mut guard = self.lock_session();
        let session = &mut *guard;
        if session.state != PlaybackState::Playing {
            return;
        }
        let Transport::Element { element, .. } = &session.transport else {
            return;
        };

        let duration = element.duration();
        if duration.is_finite() && duration > 0.0 {
            session.duration = duration;
        }
        if element.ended() {
            self.finish(session);
        } else {
            session.position = element.current_time();
        }
    }

    fn pause_tracks(&self, output: &dyn AudioOutput) {
        self.next_request();
        let mut guard = self.lock_session();
        let session = &mut *guard;
        if let Transport::Buffers { live: Some(live) } = &session.transport {
            session.position = live.elapsed(output.now()).min(session.duration);
        }
        session.stop_source();
        self.transition(session, PlaybackState::Paused);
    }

    #[allow(clippy::too_many_arguments)]
    fn start_buffer(
        &self,
        output: &dyn AudioOutput,
        cache: &TrackCache,
        request: u64,
        index: usize,
        buffer: Arc<AudioBuffer>,
        offset: f64,
        continuous: bool,
    ) -> crate::Result<()> {
        let duration = buffer.duration();
        let offset = offset.min(duration);

        {
            let mut guard = self.lock_session();
            let session = &mut *guard;
            if !self.is_current(request) {
                return Ok(());
            }
            session.stop_source();

            let source = match output.start(buffer, offset) {
                Ok(source) => source,
                Err(e) => {
                    let message = e.to_string();
                    tracing::error!(index, error = %message, "output_start_failed");
                    session.error = Some(message.clone());
                    session.position = 0.0;
                    self.transition(session, PlaybackState::Idle);
                    return Err(Error::Media(message));
                }
            };
            if let Transport::Buffers { live } = &mut session.transport {
                *live = Some(LiveSource {
                    source,
                    started_at: output.now(),
                    offset,
                });
            }
            session.duration = duration;
            session.position = offset;
            session.error = None;
            self.transition(session, PlaybackState::Playing);
        }

        tracing::info!(index, offset, duration_secs = duration, "track_started");
        self.runtime.emit(PlayerEvent::TrackStarted {
            index,
            offset_secs: offset,
            duration_secs: duration,
        });
        if continuous {
            cache.prefetch(index + 1);
        }
        Ok(())
    }

    fn finish(&self, session: &mut Session) {
        session.position = 0.0;
        self.transition(session, PlaybackState::Idle);
        tracing::info!("playback_ended");
        self.runtime.emit(PlayerEvent::Ended);
    }

    fn transition(&self, session: &mut Session, state: PlaybackState) {
        if session.set_state(state, &self.activity) {
            tracing::debug!(?state, "player_state_changed");
            self.runtime.emit(PlayerEvent::StateChanged { state });
        }
    }

    fn session_cursor(&self) -> (PlaybackState, Option<usize>, bool, f64) {
        let session = self.lock_session();
        (
            session.state,
            session.active_index,
            session.continuous,
            session.position,
        )
    }

    fn next_request(&self) -> u64 {
        self.requests.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn is_current(&self, request: u64) -> bool {
        self.requests.load(Ordering::SeqCst) == request
    }

    fn lock_session(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Drop for Player {
    fn drop(&mut self) {
        let session = self.session.get_mut().unwrap_or_else(|e| e.into_inner());
        match &mut session.transport {
            Transport::Element { element, .. } => element.pause(),
            Transport::Buffers { live } => {
                if let Some(mut live) = live.take() {
                    live.source.stop();
                }
            }
        }
        session.claim = None;
    }
}

fn start_element(
    element: &mut dyn MediaElement,
    loaded: &mut bool,
    path: &Path,
    position: f64,
) -> Result<(), MediaError> {
    if !*loaded {
        element.load(path)?;
        *loaded = true;
    }
    element.set_current_time(position)?;
    element.play()
}
