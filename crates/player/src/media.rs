use std::path::Path;
use std::sync::Arc;

use lumen_audio_utils::AudioBuffer;

pub type MediaError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A streaming player for one file, modelled on an HTML media element.
pub trait MediaElement: Send {
    fn load(&mut self, path: &Path) -> Result<(), MediaError>;
    fn play(&mut self) -> Result<(), MediaError>;
    fn pause(&mut self);
    fn set_current_time(&mut self, seconds: f64) -> Result<(), MediaError>;
    fn current_time(&self) -> f64;
    /// `NaN` while unknown.
    fn duration(&self) -> f64;
    fn ended(&self) -> bool;
}

/// Schedules decoded buffers on an output device.
pub trait AudioOutput: Send + Sync {
    /// The output clock, in seconds.
    fn now(&self) -> f64;

    /// Starts playing `buffer` from `offset` seconds, right away.
    fn start(
        &self,
        buffer: Arc<AudioBuffer>,
        offset: f64,
    ) -> Result<Box<dyn ScheduledSource>, MediaError>;
}

/// A buffer playing on an [`AudioOutput`].
pub trait ScheduledSource: Send {
    fn stop(&mut self);
    /// The buffer played out to its last sample.
    fn ended(&self) -> bool;
}
