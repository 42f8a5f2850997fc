use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::SystemTime;

use lumen_audio_utils::{SPEECH_CHANNELS, SPEECH_SAMPLE_RATE, base64_to_bytes, validate_pcm16};
use lumen_script::{
    AudioOperation, DEFAULT_MAX_CHUNK_LEN, OperationPlan, generate_silence_pcm,
    parse_script_to_blocks, plan_operations,
};
use lumen_speech_interface::SpeechSynthesizer;
use lumen_storage::{AudioBlob, StreamingWavWriter, destination_name};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::{Error, LongFormEvent, LongFormRuntime, RetryOutcome, RetryPolicy};

const DESTINATION_PURPOSE: &str = "longform";
const DIAGNOSTIC_CHUNK_CHARS: usize = 80;

/// Observable state of the orchestrator.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LongFormState {
    pub is_generating: bool,
    /// `0..=100`, non-decreasing within one run.
    pub progress: u8,
    pub audio_blob: Option<AudioBlob>,
    pub error: Option<String>,
}

struct ActiveRun {
    id: u64,
    token: CancellationToken,
}

pub struct LongFormAudioBuilder {
    runtime: Arc<dyn LongFormRuntime>,
    synthesizer: Arc<dyn SpeechSynthesizer>,
    retry: RetryPolicy,
    max_chunk_len: usize,
}

impl LongFormAudioBuilder {
    pub fn retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn max_chunk_len(mut self, max_chunk_len: usize) -> Self {
        self.max_chunk_len = max_chunk_len;
        self
    }

    pub fn build(self) -> LongFormAudio {
        let (state, _) = watch::channel(LongFormState::default());
        LongFormAudio {
            runtime: self.runtime,
            synthesizer: self.synthesizer,
            retry: self.retry,
            max_chunk_len: self.max_chunk_len,
            state,
            active: Mutex::new(None),
            next_run: AtomicU64::new(0),
        }
    }
}

/// Turns a script into one finalized WAV file, chunk by chunk.
pub struct LongFormAudio {
    runtime: Arc<dyn LongFormRuntime>,
    synthesizer: Arc<dyn SpeechSynthesizer>,
    retry: RetryPolicy,
    max_chunk_len: usize,
    state: watch::Sender<LongFormState>,
    active: Mutex<Option<ActiveRun>>,
    next_run: AtomicU64,
}

impl LongFormAudio {
    pub fn builder(
        runtime: Arc<dyn LongFormRuntime>,
        synthesizer: Arc<dyn SpeechSynthesizer>,
    ) -> LongFormAudioBuilder {
        LongFormAudioBuilder {
            runtime,
            synthesizer,
            retry: RetryPolicy::default(),
            max_chunk_len: DEFAULT_MAX_CHUNK_LEN,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<LongFormState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> LongFormState {
        self.state.borrow().clone()
    }

    /// Generates audio for `script` into a fresh destination named after
    /// `destination_prefix`.
    ///
    /// Any run still in flight is cancelled first. Returns `Ok(None)` when
    /// this run is cancelled; cancellation never sets `error`.
    pub async fn generate(
        &self,
        script: &str,
        destination_prefix: &str,
    ) -> crate::Result<Option<AudioBlob>> {
        let run_id = self.next_run.fetch_add(1, Ordering::Relaxed) + 1;
        let token = CancellationToken::new();

        {
            let mut active = self.lock_active();
            if let Some(previous) = active.replace(ActiveRun {
                id: run_id,
                token: token.clone(),
            }) {
                tracing::info!(previous = previous.id, run_id, "longform_superseded");
                previous.token.cancel();
            }
            self.state.send_replace(LongFormState {
                is_generating: true,
                ..Default::default()
            });
        }

        let span = tracing::info_span!("longform_generate", run_id, prefix = %destination_prefix);
        let result = self
            .run(run_id, script, destination_prefix, &token)
            .instrument(span)
            .await;

        self.settle(run_id, result).await
    }

    /// Publishes the outcome of `run_id` if it is still the active run. A
    /// blob finalized after its run was cancelled or superseded is deleted.
    async fn settle(
        &self,
        run_id: u64,
        result: crate::Result<Option<AudioBlob>>,
    ) -> crate::Result<Option<AudioBlob>> {
        match result {
            Ok(Some(blob)) => {
                let published = self.publish_if_active(run_id, true, |state| {
                    state.is_generating = false;
                    state.progress = 100;
                    state.audio_blob = Some(blob.clone());
                    state.error = None;
                    true
                });
                if !published {
                    tracing::info!(run_id, path = %blob.path().display(), "longform_cancelled_after_finalize");
                    blob.remove().await;
                    self.runtime.emit(LongFormEvent::Cancelled { run_id });
                    return Ok(None);
                }
                self.runtime.emit(LongFormEvent::Finished {
                    run_id,
                    path: blob.path().display().to_string(),
                    bytes: blob.len(),
                });
                Ok(Some(blob))
            }
            Ok(None) => {
                self.publish_if_active(run_id, true, |state| {
                    std::mem::replace(&mut state.is_generating, false)
                });
                tracing::info!(run_id, "longform_cancelled");
                self.runtime.emit(LongFormEvent::Cancelled { run_id });
                Ok(None)
            }
            Err(e) => {
                tracing::error!(run_id, error = %e, "longform_failed");
                let message = e.user_message();
                self.publish_if_active(run_id, true, |state| {
                    state.is_generating = false;
                    state.progress = 0;
                    state.audio_blob = None;
                    state.error = Some(message);
                    true
                });
                self.runtime.emit(LongFormEvent::Failed {
                    run_id,
                    error: e.to_string(),
                });
                Err(e)
            }
        }
    }

    /// Applies `publish` to the state while holding the active-run slot, so a
    /// cancelled or superseded run can never write into a newer run's state.
    /// With `release`, the slot is cleared as well.
    fn publish_if_active(
        &self,
        run_id: u64,
        release: bool,
        publish: impl FnOnce(&mut LongFormState) -> bool,
    ) -> bool {
        let mut active = self.lock_active();
        if !active.as_ref().is_some_and(|run| run.id == run_id) {
            return false;
        }
        if release {
            *active = None;
        }
        self.state.send_if_modified(publish);
        true
    }

    fn lock_active(&self) -> std::sync::MutexGuard<'_, Option<ActiveRun>> {
        self.active.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Stops the in-flight run at its next checkpoint.
    pub fn cancel(&self) {
        let run = {
            let mut active = self.lock_active();
            self.state.send_modify(|state| state.is_generating = false);
            active.take()
        };
        if let Some(run) = run {
            tracing::info!(run_id = run.id, "longform_cancel_requested");
            run.token.cancel();
        }
    }

    /// Clears blob, progress and error. Does not cancel a running generation.
    pub fn reset(&self) {
        self.state.send_replace(LongFormState::default());
    }

    async fn run(
        &self,
        run_id: u64,
        script: &str,
        prefix: &str,
        token: &CancellationToken,
    ) -> crate::Result<Option<AudioBlob>> {
        let blocks = parse_script_to_blocks(script);
        if blocks.is_empty() {
            return Err(Error::EmptyScript);
        }

        let plan = plan_operations(&blocks, self.max_chunk_len);
        if plan.is_empty() {
            return Err(Error::EmptyScript);
        }
        if token.is_cancelled() {
            return Ok(None);
        }

        let destination = destination_name(prefix, DESTINATION_PURPOSE, SystemTime::now());
        let mut writer = StreamingWavWriter::create(&*self.runtime, &destination).await?;

        tracing::info!(
            destination = %destination,
            operations = plan.len(),
            speech_chunks = plan.synthesize_count(),
            silence_secs = plan.total_silence_seconds(),
            "longform_started"
        );
        self.runtime.emit(LongFormEvent::Started {
            run_id,
            destination,
            operations: plan.len(),
        });

        let outcome = match self.execute(run_id, &plan, &mut writer, token).await {
            Ok(true) if !token.is_cancelled() => writer.finalize().await.map(Some).map_err(Error::from),
            Ok(_) => Ok(None),
            Err(e) => Err(e),
        };

        if !matches!(outcome, Ok(Some(_))) {
            writer.abort();
            writer.cleanup().await;
        }
        outcome
    }

    /// Appends every operation in order. `Ok(false)` means cancelled.
    async fn execute(
        &self,
        run_id: u64,
        plan: &OperationPlan,
        writer: &mut StreamingWavWriter,
        token: &CancellationToken,
    ) -> crate::Result<bool> {
        let total = plan.len();

        for (index, operation) in plan.iter().enumerate() {
            if token.is_cancelled() {
                return Ok(false);
            }

            let pcm = match operation {
                AudioOperation::Silence { seconds } => {
                    generate_silence_pcm(*seconds as f64, SPEECH_SAMPLE_RATE)
                }
                AudioOperation::Synthesize { text } => {
                    match self.fetch_chunk(run_id, index, text, token).await? {
                        Some(pcm) => pcm,
                        None => return Ok(false),
                    }
                }
            };

            writer.append_chunk(&pcm).await?;

            let completed = index + 1;
            let percent = plan.progress_percent(completed);
            self.publish_if_active(run_id, false, |state| {
                if percent > state.progress {
                    state.progress = percent;
                    true
                } else {
                    false
                }
            });
            tracing::debug!(completed, total, bytes = pcm.len(), "longform_operation_done");
            self.runtime.emit(LongFormEvent::Progress {
                run_id,
                completed,
                total,
                percent,
            });
        }

        Ok(true)
    }

    /// Synthesizes one chunk with retry. `Ok(None)` means cancelled.
    async fn fetch_chunk(
        &self,
        run_id: u64,
        index: usize,
        text: &str,
        token: &CancellationToken,
    ) -> crate::Result<Option<Vec<u8>>> {
        let mut attempt = 0;

        let outcome = self
            .retry
            .run(
                token,
                || synthesize_pcm(self.synthesizer.as_ref(), text),
                |error: &String, delay| {
                    attempt += 1;
                    tracing::warn!(
                        index,
                        attempt,
                        retry_delay_ms = delay.as_millis() as u64,
                        error = %error,
                        "longform_chunk_retrying"
                    );
                    self.runtime.emit(LongFormEvent::Retrying {
                        run_id,
                        index,
                        attempt,
                        delay_ms: delay.as_millis() as u64,
                        error: error.clone(),
                    });
                },
            )
            .await;

        match outcome {
            RetryOutcome::Done(pcm) => Ok(Some(pcm)),
            RetryOutcome::Cancelled => Ok(None),
            RetryOutcome::Exhausted(reason) => Err(Error::SynthesisFailed {
                index,
                chunk: text.chars().take(DIAGNOSTIC_CHUNK_CHARS).collect(),
                reason,
            }),
        }
    }
}

/// One synthesis attempt: call, decode, and validate as 16-bit PCM.
async fn synthesize_pcm(synthesizer: &dyn SpeechSynthesizer, text: &str) -> Result<Vec<u8>, String> {
    let encoded = synthesizer
        .synthesize(text)
        .await
        .map_err(|e| e.to_string())?
        .filter(|encoded| !encoded.trim().is_empty())
        .ok_or_else(|| "empty audio response".to_string())?;

    let pcm = base64_to_bytes(&encoded).map_err(|e| e.to_string())?;
    validate_pcm16(&pcm, SPEECH_CHANNELS).map_err(|e| e.to_string())?;
    Ok(pcm)
}
