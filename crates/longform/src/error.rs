#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("script has nothing to synthesize")]
    EmptyScript,
    #[error("speech synthesis failed for part {} ({chunk:?}): {reason}", index + 1)]
    SynthesisFailed {
        index: usize,
        chunk: String,
        reason: String,
    },
    #[error(transparent)]
    Storage(#[from] lumen_storage::Error),
    #[error(transparent)]
    Codec(#[from] lumen_audio_utils::Error),
}

impl Error {
    /// The single message shown to a user when a run fails.
    pub fn user_message(&self) -> String {
        match self {
            Error::EmptyScript => "There is nothing to narrate in this script.".to_string(),
            Error::SynthesisFailed { index, .. } => {
                format!("Audio generation failed for part {}. Check your connection.", index + 1)
            }
            Error::Storage(_) | Error::Codec(_) => {
                "Audio materialization failed. Check your connection.".to_string()
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
