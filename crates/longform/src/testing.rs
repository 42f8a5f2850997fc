use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use lumen_audio_utils::bytes_to_base64;
use lumen_speech_interface::{BoxFuture, SpeechSynthesizer};

use crate::{LongFormEvent, LongFormRuntime};

pub(crate) struct TestRuntime {
    base: PathBuf,
    events: Mutex<Vec<LongFormEvent>>,
}

impl TestRuntime {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self {
            base: base.into(),
            events: Mutex::new(Vec::new()),
        }
    }

    pub fn events(&self) -> Vec<LongFormEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn retries(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, LongFormEvent::Retrying { .. }))
            .count()
    }
}

impl lumen_storage::StorageRuntime for TestRuntime {
    fn audio_base(&self) -> Result<PathBuf, lumen_storage::Error> {
        Ok(self.base.clone())
    }
}

impl LongFormRuntime for TestRuntime {
    fn emit(&self, event: LongFormEvent) {
        self.events.lock().unwrap().push(event);
    }
}

type Respond = dyn Fn(&str, usize) -> Result<Option<String>, String> + Send + Sync;

/// Scripted synthesizer. `respond` gets the text and the zero-based call
/// number across all texts.
pub(crate) struct MockSynthesizer {
    respond: Box<Respond>,
    delay: Duration,
    calls: Mutex<Vec<String>>,
}

impl MockSynthesizer {
    pub fn new(
        respond: impl Fn(&str, usize) -> Result<Option<String>, String> + Send + Sync + 'static,
    ) -> Self {
        Self {
            respond: Box::new(respond),
            delay: Duration::ZERO,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Answers every call with [`pcm_for`] of the text.
    pub fn echo() -> Self {
        Self::new(|text, _| Ok(Some(bytes_to_base64(&pcm_for(text)))))
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl SpeechSynthesizer for MockSynthesizer {
    fn synthesize<'a>(
        &'a self,
        text: &'a str,
    ) -> BoxFuture<'a, lumen_speech_interface::Result<Option<String>>> {
        Box::pin(async move {
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            let call = {
                let mut calls = self.calls.lock().unwrap();
                calls.push(text.to_string());
                calls.len() - 1
            };
            (self.respond)(text, call).map_err(Into::into)
        })
    }
}

/// Deterministic PCM for a text: one 16-bit sample of value 1000 per byte.
pub(crate) fn pcm_for(text: &str) -> Vec<u8> {
    std::iter::repeat_n(1000i16.to_le_bytes(), text.len())
        .flatten()
        .collect()
}
