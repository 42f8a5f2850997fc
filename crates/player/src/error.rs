#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("track {index} is out of range ({len} tracks)")]
    TrackOutOfRange { index: usize, len: usize },
    #[error("track {index} could not be prepared: {reason}")]
    TrackUnavailable { index: usize, reason: String },
    #[error("no track is selected")]
    NoActiveTrack,
    #[error("media playback failed: {0}")]
    Media(String),
    #[error("export failed: {0}")]
    Export(#[source] std::io::Error),
    #[error(transparent)]
    Codec(#[from] lumen_audio_utils::Error),
    #[error(transparent)]
    Storage(#[from] lumen_storage::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
