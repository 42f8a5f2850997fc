use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use futures_util::future::BoxFuture;
use lumen_audio_utils::{AudioBuffer, SPEECH_SAMPLE_RATE, bytes_to_base64};
use lumen_script::PlaylistItem;
use lumen_speech_interface::SpeechSynthesizer;

use crate::{
    ArtifactExporter, AudioOutput, MediaElement, MediaError, PlayerEvent, PlayerRuntime,
    ScheduledSource,
};

pub(crate) fn item(title: &str, text: &str) -> PlaylistItem {
    PlaylistItem::new(title, text)
}

/// Answers every chunk with `seconds` of constant-level speech.
pub(crate) struct ScriptedSynthesizer {
    seconds: f64,
    fail_first: usize,
    fail_on: Vec<String>,
    delay: Duration,
    calls: Mutex<Vec<String>>,
}

impl ScriptedSynthesizer {
    pub fn seconds(seconds: f64) -> Self {
        Self {
            seconds,
            fail_first: 0,
            fail_on: Vec::new(),
            delay: Duration::ZERO,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_first(calls: usize, seconds: f64) -> Self {
        Self {
            fail_first: calls,
            ..Self::seconds(seconds)
        }
    }

    pub fn failing_on(mut self, text: &str) -> Self {
        self.fail_on.push(text.to_string());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl SpeechSynthesizer for ScriptedSynthesizer {
    fn synthesize<'a>(
        &'a self,
        text: &'a str,
    ) -> lumen_speech_interface::BoxFuture<'a, lumen_speech_interface::Result<Option<String>>>
    {
        Box::pin(async move {
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            let call = {
                let mut calls = self.calls.lock().unwrap();
                calls.push(text.to_string());
                calls.len() - 1
            };
            if call < self.fail_first || self.fail_on.iter().any(|t| t == text) {
                return Err("synthesis unavailable".into());
            }
            let frames = (self.seconds * SPEECH_SAMPLE_RATE as f64) as usize;
            let pcm: Vec<u8> = std::iter::repeat_n(1000i16.to_le_bytes(), frames)
                .flatten()
                .collect();
            Ok(Some(bytes_to_base64(&pcm)))
        })
    }
}

#[derive(Default)]
pub(crate) struct TestRuntime {
    events: Mutex<Vec<PlayerEvent>>,
}

impl TestRuntime {
    pub fn events(&self) -> Vec<PlayerEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl PlayerRuntime for TestRuntime {
    fn emit(&self, event: PlayerEvent) {
        self.events.lock().unwrap().push(event);
    }
}

#[derive(Default)]
pub(crate) struct RecordingExporter {
    exported: Mutex<Vec<(String, Bytes)>>,
}

impl RecordingExporter {
    pub fn exported(&self) -> Vec<(String, Bytes)> {
        self.exported.lock().unwrap().clone()
    }
}

impl ArtifactExporter for RecordingExporter {
    fn export_blob<'a>(
        &'a self,
        bytes: Bytes,
        suggested_name: &'a str,
    ) -> BoxFuture<'a, std::io::Result<PathBuf>> {
        Box::pin(async move {
            self.exported
                .lock()
                .unwrap()
                .push((suggested_name.to_string(), bytes));
            Ok(PathBuf::from(suggested_name))
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Started {
    pub frames: usize,
    pub offset: f64,
}

#[derive(Default)]
struct OutputState {
    clock: f64,
    started: Vec<Started>,
}

/// A hand-cranked output clock that records every scheduled source.
#[derive(Default)]
pub(crate) struct FakeOutput {
    state: Arc<Mutex<OutputState>>,
    live: Arc<AtomicUsize>,
    max_live: Arc<AtomicUsize>,
}

impl FakeOutput {
    pub fn advance(&self, seconds: f64) {
        self.state.lock().unwrap().clock += seconds;
    }

    pub fn started(&self) -> Vec<Started> {
        self.state.lock().unwrap().started.clone()
    }

    pub fn live(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    pub fn max_live(&self) -> usize {
        self.max_live.load(Ordering::SeqCst)
    }
}

impl AudioOutput for FakeOutput {
    fn now(&self) -> f64 {
        self.state.lock().unwrap().clock
    }

    fn start(
        &self,
        buffer: Arc<AudioBuffer>,
        offset: f64,
    ) -> Result<Box<dyn ScheduledSource>, MediaError> {
        let ends_at = {
            let mut state = self.state.lock().unwrap();
            state.started.push(Started {
                frames: buffer.len(),
                offset,
            });
            state.clock + (buffer.duration() - offset).max(0.0)
        };
        let live = self.live.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_live.fetch_max(live, Ordering::SeqCst);
        Ok(Box::new(FakeSource {
            output: self.state.clone(),
            ends_at,
            live: self.live.clone(),
            stopped: false,
        }))
    }
}

/// Drains once the output clock passes the end of its buffer.
struct FakeSource {
    output: Arc<Mutex<OutputState>>,
    ends_at: f64,
    live: Arc<AtomicUsize>,
    stopped: bool,
}

impl ScheduledSource for FakeSource {
    fn stop(&mut self) {
        if !self.stopped {
            self.stopped = true;
            self.live.fetch_sub(1, Ordering::SeqCst);
        }
    }

    fn ended(&self) -> bool {
        !self.stopped && self.output.lock().unwrap().clock >= self.ends_at
    }
}

#[derive(Debug, Default)]
pub(crate) struct ElementState {
    pub loaded: Option<PathBuf>,
    pub playing: bool,
    pub time: f64,
    pub ended: bool,
    media_duration: f64,
}

/// A media element whose clock only moves through [`ElementHandle::advance`].
/// The duration is unknown (`NaN`) until a file is loaded.
pub(crate) struct FakeElement {
    state: Arc<Mutex<ElementState>>,
}

#[derive(Clone)]
pub(crate) struct ElementHandle {
    state: Arc<Mutex<ElementState>>,
}

impl FakeElement {
    pub fn new(duration: f64) -> (Self, ElementHandle) {
        let state = Arc::new(Mutex::new(ElementState {
            media_duration: duration,
            ..Default::default()
        }));
        (
            Self {
                state: state.clone(),
            },
            ElementHandle { state },
        )
    }
}

impl ElementHandle {
    /// Moves the clock forward while playing; reaching the end stops it.
    pub fn advance(&self, seconds: f64) {
        let mut state = self.state.lock().unwrap();
        if !state.playing {
            return;
        }
        state.time += seconds;
        if state.time >= state.media_duration {
            state.time = state.media_duration;
            state.playing = false;
            state.ended = true;
        }
    }

    pub fn with<T>(&self, f: impl FnOnce(&ElementState) -> T) -> T {
        f(&self.state.lock().unwrap())
    }
}

impl MediaElement for FakeElement {
    fn load(&mut self, path: &Path) -> Result<(), MediaError> {
        if !path.exists() {
            return Err(format!("no such file: {}", path.display()).into());
        }
        let mut state = self.state.lock().unwrap();
        state.loaded = Some(path.to_path_buf());
        state.time = 0.0;
        state.ended = false;
        Ok(())
    }

    fn play(&mut self) -> Result<(), MediaError> {
        let mut state = self.state.lock().unwrap();
        if state.loaded.is_none() {
            return Err("nothing loaded".into());
        }
        state.playing = true;
        state.ended = false;
        Ok(())
    }

    fn pause(&mut self) {
        self.state.lock().unwrap().playing = false;
    }

    fn set_current_time(&mut self, seconds: f64) -> Result<(), MediaError> {
        let mut state = self.state.lock().unwrap();
        state.time = seconds.clamp(0.0, state.media_duration);
        state.ended = false;
        Ok(())
    }

    fn current_time(&self) -> f64 {
        self.state.lock().unwrap().time
    }

    fn duration(&self) -> f64 {
        let state = self.state.lock().unwrap();
        if state.loaded.is_some() {
            state.media_duration
        } else {
            f64::NAN
        }
    }

    fn ended(&self) -> bool {
        self.state.lock().unwrap().ended
    }
}
