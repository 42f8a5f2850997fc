use std::path::PathBuf;

use lumen_longform::{LongFormEvent, LongFormRuntime};
use lumen_player::{PlayerEvent, PlayerRuntime};

/// Host runtime for the command line: a fixed output directory and events
/// routed to the log.
pub struct CliRuntime {
    base: PathBuf,
}

impl CliRuntime {
    pub fn new(base: PathBuf) -> Self {
        Self { base }
    }

    pub fn base(&self) -> &std::path::Path {
        &self.base
    }
}

impl lumen_storage::StorageRuntime for CliRuntime {
    fn audio_base(&self) -> Result<PathBuf, lumen_storage::Error> {
        lumen_storage::global::ensure_base_dir(&self.base)?;
        Ok(self.base.clone())
    }
}

impl LongFormRuntime for CliRuntime {
    fn emit(&self, event: LongFormEvent) {
        match &event {
            LongFormEvent::Retrying {
                index,
                attempt,
                error,
                ..
            } => tracing::warn!(index, attempt, %error, "chunk_retrying"),
            LongFormEvent::Failed { error, .. } => tracing::error!(%error, "generation_failed"),
            _ => tracing::debug!(event = ?event, "longform_event"),
        }
    }
}

impl PlayerRuntime for CliRuntime {
    fn emit(&self, event: PlayerEvent) {
        match &event {
            PlayerEvent::TrackFailed { index, error } => {
                tracing::warn!(index, %error, "track_failed")
            }
            PlayerEvent::TrackStarted { index, .. } => tracing::info!(index, "track_started"),
            _ => tracing::debug!(event = ?event, "player_event"),
        }
    }
}
