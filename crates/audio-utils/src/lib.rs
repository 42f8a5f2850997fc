mod buffer;
mod encoding;
mod error;
mod pcm;
mod wav;

pub use buffer::*;
pub use encoding::*;
pub use error::*;
pub use pcm::*;
pub use wav::*;

const I16_SCALE: f32 = 32768.0;

/// Sample rate of raw PCM returned by the speech synthesizer.
pub const SPEECH_SAMPLE_RATE: u32 = 24_000;
pub const SPEECH_CHANNELS: u16 = 1;
