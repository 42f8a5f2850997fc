#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid base64 payload: {0}")]
    Decode(#[from] base64::DecodeError),
    #[error("malformed pcm: {len} bytes is not a whole number of {channels}-channel 16-bit frames")]
    MalformedAudio { len: usize, channels: u16 },
    #[error("unsupported wav format: {0}")]
    UnsupportedFormat(String),
    #[error(transparent)]
    Wav(#[from] hound::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
