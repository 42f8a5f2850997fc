/// Planar floating-point audio, one `Vec<f32>` per channel, samples in `[-1, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    sample_rate: u32,
    channels: Vec<Vec<f32>>,
}

impl AudioBuffer {
    /// Panics if `channels` is empty or the channels differ in length.
    pub fn new(sample_rate: u32, channels: Vec<Vec<f32>>) -> Self {
        assert!(!channels.is_empty(), "audio buffer needs at least one channel");
        let frames = channels[0].len();
        assert!(
            channels.iter().all(|c| c.len() == frames),
            "all channels must have the same length"
        );
        Self {
            sample_rate,
            channels,
        }
    }

    pub fn empty(channels: u16, sample_rate: u32) -> Self {
        Self::new(sample_rate, vec![Vec::new(); channels.max(1) as usize])
    }

    pub fn from_mono(sample_rate: u32, samples: Vec<f32>) -> Self {
        Self::new(sample_rate, vec![samples])
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn number_of_channels(&self) -> u16 {
        self.channels.len() as u16
    }

    /// Length in frames.
    pub fn len(&self) -> usize {
        self.channels[0].len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn duration(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.len() as f64 / self.sample_rate as f64
    }

    pub fn channel_data(&self, channel: usize) -> &[f32] {
        &self.channels[channel]
    }

    pub fn interleaved(&self) -> impl Iterator<Item = f32> + '_ {
        (0..self.len()).flat_map(move |frame| self.channels.iter().map(move |c| c[frame]))
    }
}

/// Concatenates buffers sample-for-sample in input order.
///
/// All inputs must share channel count and sample rate; a mismatch is a
/// caller bug and panics.
pub fn concat_audio_buffers(buffers: &[AudioBuffer]) -> AudioBuffer {
    let Some(first) = buffers.first() else {
        return AudioBuffer::empty(crate::SPEECH_CHANNELS, crate::SPEECH_SAMPLE_RATE);
    };

    let sample_rate = first.sample_rate();
    let channel_count = first.number_of_channels();
    let total: usize = buffers.iter().map(AudioBuffer::len).sum();

    let mut channels = vec![Vec::with_capacity(total); channel_count as usize];
    for buffer in buffers {
        assert_eq!(buffer.sample_rate(), sample_rate, "sample rate mismatch");
        assert_eq!(
            buffer.number_of_channels(),
            channel_count,
            "channel count mismatch"
        );
        for (out, data) in channels.iter_mut().zip(buffer.channels.iter()) {
            out.extend_from_slice(data);
        }
    }

    AudioBuffer::new(sample_rate, channels)
}
