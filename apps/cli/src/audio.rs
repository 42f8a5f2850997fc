use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use lumen_audio_utils::{AudioBuffer, wav_file_duration};
use lumen_player::{AudioOutput, MediaElement, MediaError, ScheduledSource};
use rodio::buffer::SamplesBuffer;
use rodio::mixer::Mixer;
use rodio::{Decoder, Sink, Source};

/// Plays decoded buffers on the default device, one sink per source.
pub struct RodioOutput {
    mixer: Mixer,
    epoch: Instant,
}

impl RodioOutput {
    pub fn new(mixer: Mixer) -> Self {
        Self {
            mixer,
            epoch: Instant::now(),
        }
    }
}

impl AudioOutput for RodioOutput {
    fn now(&self) -> f64 {
        self.epoch.elapsed().as_secs_f64()
    }

    fn start(
        &self,
        buffer: Arc<AudioBuffer>,
        offset: f64,
    ) -> Result<Box<dyn ScheduledSource>, MediaError> {
        let samples: Vec<f32> = buffer.interleaved().collect();
        let source = SamplesBuffer::new(
            buffer.number_of_channels(),
            buffer.sample_rate(),
            samples,
        )
        .skip_duration(Duration::from_secs_f64(offset.max(0.0)));

        let sink = Sink::connect_new(&self.mixer);
        sink.append(source);
        Ok(Box::new(RodioSource(sink)))
    }
}

struct RodioSource(Sink);

impl ScheduledSource for RodioSource {
    fn stop(&mut self) {
        self.0.stop();
    }

    fn ended(&self) -> bool {
        self.0.empty()
    }
}

/// Streams one WAV file from disk through a seekable sink.
pub struct RodioElement {
    mixer: Mixer,
    sink: Option<Sink>,
    path: Option<PathBuf>,
    duration: f64,
}

impl RodioElement {
    pub fn new(mixer: Mixer) -> Self {
        Self {
            mixer,
            sink: None,
            path: None,
            duration: f64::NAN,
        }
    }

    /// A drained sink cannot be rewound, so it is rebuilt from the file.
    fn ensure_sink(&mut self) -> Result<&Sink, MediaError> {
        if self.sink.as_ref().is_none_or(|sink| sink.empty()) {
            let path = self.path.as_ref().ok_or("nothing loaded")?;
            let decoder = Decoder::try_from(File::open(path)?)?;
            let sink = Sink::connect_new(&self.mixer);
            sink.pause();
            sink.append(decoder);
            if let Some(old) = self.sink.replace(sink) {
                old.stop();
            }
        }
        self.sink.as_ref().ok_or_else(|| "nothing loaded".into())
    }
}

impl MediaElement for RodioElement {
    fn load(&mut self, path: &Path) -> Result<(), MediaError> {
        self.duration = wav_file_duration(path)?;
        self.path = Some(path.to_path_buf());
        if let Some(old) = self.sink.take() {
            old.stop();
        }
        self.ensure_sink()?;
        Ok(())
    }

    fn play(&mut self) -> Result<(), MediaError> {
        self.ensure_sink()?.play();
        Ok(())
    }

    fn pause(&mut self) {
        if let Some(sink) = &self.sink {
            sink.pause();
        }
    }

    fn set_current_time(&mut self, seconds: f64) -> Result<(), MediaError> {
        self.ensure_sink()?
            .try_seek(Duration::from_secs_f64(seconds.max(0.0)))
            .map_err(|e| e.to_string())?;
        Ok(())
    }

    fn current_time(&self) -> f64 {
        self.sink
            .as_ref()
            .map(|sink| sink.get_pos().as_secs_f64())
            .unwrap_or(0.0)
    }

    fn duration(&self) -> f64 {
        self.duration
    }

    fn ended(&self) -> bool {
        self.sink.as_ref().is_some_and(|sink| sink.empty())
    }
}
