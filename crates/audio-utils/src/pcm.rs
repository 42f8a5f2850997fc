use crate::{AudioBuffer, Error, I16_SCALE};

/// Checks that `bytes` holds whole 16-bit frames for `channels` channels.
pub fn validate_pcm16(bytes: &[u8], channels: u16) -> crate::Result<()> {
    let frame_bytes = channels as usize * 2;
    if channels == 0 || bytes.len() % frame_bytes != 0 {
        return Err(Error::MalformedAudio {
            len: bytes.len(),
            channels,
        });
    }
    Ok(())
}

/// Decodes interleaved little-endian signed 16-bit PCM into planar floats.
pub fn pcm_to_audio_buffer(
    bytes: &[u8],
    sample_rate: u32,
    channels: u16,
) -> crate::Result<AudioBuffer> {
    validate_pcm16(bytes, channels)?;

    let channel_count = channels as usize;
    let frames = bytes.len() / (channel_count * 2);
    let mut planar = vec![Vec::with_capacity(frames); channel_count];

    for frame in bytes.chunks_exact(channel_count * 2) {
        for (channel, sample) in planar.iter_mut().zip(frame.chunks_exact(2)) {
            channel.push(i16::from_le_bytes([sample[0], sample[1]]) as f32 / I16_SCALE);
        }
    }

    Ok(AudioBuffer::new(sample_rate, planar))
}

/// Scales one float sample to 16-bit. The input is clamped to `[-1, 1]` and
/// scaled asymmetrically so both full-scale ends are reachable.
pub fn f32_to_pcm16(sample: f32) -> i16 {
    let clamped = sample.clamp(-1.0, 1.0);
    if clamped < 0.0 {
        (clamped * I16_SCALE) as i16
    } else {
        (clamped * (I16_SCALE - 1.0)) as i16
    }
}

pub fn i16_to_f32_samples(samples: &[i16]) -> Vec<f32> {
    samples
        .iter()
        .map(|&sample| sample as f32 / I16_SCALE)
        .collect()
}
