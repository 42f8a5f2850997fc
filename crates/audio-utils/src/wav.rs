use std::io::Cursor;
use std::path::Path;

use bytes::{BufMut, Bytes, BytesMut};

use crate::{AudioBuffer, Error, f32_to_pcm16, i16_to_f32_samples};

pub const WAV_HEADER_LEN: usize = 44;

const PCM_FORMAT: u16 = 1;
const BITS_PER_SAMPLE: u16 = 16;

/// The canonical 44-byte RIFF/WAVE header for 16-bit PCM.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavHeader {
    pub channels: u16,
    pub sample_rate: u32,
    pub data_len: u32,
}

impl WavHeader {
    pub fn new(channels: u16, sample_rate: u32, data_len: u32) -> Self {
        Self {
            channels,
            sample_rate,
            data_len,
        }
    }

    /// Value of the RIFF size field: total file length minus 8.
    pub fn riff_len(&self) -> u32 {
        self.data_len.saturating_add(WAV_HEADER_LEN as u32 - 8)
    }

    pub fn block_align(&self) -> u16 {
        self.channels * (BITS_PER_SAMPLE / 8)
    }

    pub fn byte_rate(&self) -> u32 {
        self.sample_rate * self.block_align() as u32
    }

    pub fn to_bytes(&self) -> [u8; WAV_HEADER_LEN] {
        let mut buf = BytesMut::with_capacity(WAV_HEADER_LEN);
        buf.put_slice(b"RIFF");
        buf.put_u32_le(self.riff_len());
        buf.put_slice(b"WAVE");

        buf.put_slice(b"fmt ");
        buf.put_u32_le(16);
        buf.put_u16_le(PCM_FORMAT);
        buf.put_u16_le(self.channels);
        buf.put_u32_le(self.sample_rate);
        buf.put_u32_le(self.byte_rate());
        buf.put_u16_le(self.block_align());
        buf.put_u16_le(BITS_PER_SAMPLE);

        buf.put_slice(b"data");
        buf.put_u32_le(self.data_len);

        let mut out = [0u8; WAV_HEADER_LEN];
        out.copy_from_slice(&buf);
        out
    }

    /// Reads back a canonical header. Returns `None` for anything that is not
    /// a plain 16-bit PCM layout with the data chunk at offset 36.
    pub fn parse(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < WAV_HEADER_LEN
            || &bytes[0..4] != b"RIFF"
            || &bytes[8..12] != b"WAVE"
            || &bytes[12..16] != b"fmt "
            || &bytes[36..40] != b"data"
        {
            return None;
        }

        let u16_at = |pos: usize| u16::from_le_bytes([bytes[pos], bytes[pos + 1]]);
        let u32_at = |pos: usize| {
            u32::from_le_bytes([bytes[pos], bytes[pos + 1], bytes[pos + 2], bytes[pos + 3]])
        };

        if u16_at(20) != PCM_FORMAT || u16_at(34) != BITS_PER_SAMPLE {
            return None;
        }

        Some(Self {
            channels: u16_at(22),
            sample_rate: u32_at(24),
            data_len: u32_at(40),
        })
    }
}

/// Encodes a buffer as a canonical 16-bit PCM WAV file.
pub fn audio_buffer_to_wav(buffer: &AudioBuffer) -> Bytes {
    let data_len = buffer.len() * buffer.number_of_channels() as usize * 2;
    let header = WavHeader::new(
        buffer.number_of_channels(),
        buffer.sample_rate(),
        data_len as u32,
    );

    let mut out = BytesMut::with_capacity(WAV_HEADER_LEN + data_len);
    out.put_slice(&header.to_bytes());
    for sample in buffer.interleaved() {
        out.put_i16_le(f32_to_pcm16(sample));
    }
    out.freeze()
}

/// Decodes a 16-bit integer PCM WAV into a planar buffer.
pub fn wav_to_audio_buffer(bytes: &[u8]) -> crate::Result<AudioBuffer> {
    let mut reader = hound::WavReader::new(Cursor::new(bytes))?;
    let spec = reader.spec();
    if spec.bits_per_sample != 16 || spec.sample_format != hound::SampleFormat::Int {
        return Err(Error::UnsupportedFormat(format!(
            "{}-bit {:?}",
            spec.bits_per_sample, spec.sample_format
        )));
    }

    let samples = reader
        .samples::<i16>()
        .collect::<Result<Vec<_>, _>>()?;
    let channel_count = spec.channels.max(1) as usize;

    let mut planar = vec![Vec::with_capacity(samples.len() / channel_count); channel_count];
    for frame in samples.chunks_exact(channel_count) {
        for (channel, value) in planar.iter_mut().zip(i16_to_f32_samples(frame)) {
            channel.push(value);
        }
    }

    Ok(AudioBuffer::new(spec.sample_rate, planar))
}

/// Playback length of a WAV file on disk, in seconds.
pub fn wav_file_duration(path: impl AsRef<Path>) -> crate::Result<f64> {
    let reader = hound::WavReader::open(path.as_ref())?;
    let spec = reader.spec();
    if spec.sample_rate == 0 {
        return Err(Error::UnsupportedFormat("zero sample rate".to_string()));
    }
    Ok(reader.duration() as f64 / spec.sample_rate as f64)
}
