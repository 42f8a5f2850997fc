use bytes::Bytes;
use lumen_audio_utils::{
    AudioBuffer, SPEECH_CHANNELS, SPEECH_SAMPLE_RATE, audio_buffer_to_wav, base64_to_bytes,
    concat_audio_buffers, pcm_to_audio_buffer,
};
use lumen_speech_interface::SpeechSynthesizer;

use crate::Error;

/// Renders a short script fully in memory: one synthesis call per non-blank
/// line, stitched into a single WAV.
///
/// Lines the synthesizer answers without audio are skipped. `on_progress`
/// receives `round(100 * done / total)` after each line. Returns `Ok(None)`
/// when no line produced audio.
pub async fn render_draft(
    script: &str,
    synthesizer: &dyn SpeechSynthesizer,
    mut on_progress: impl FnMut(u8),
) -> crate::Result<Option<Bytes>> {
    let lines: Vec<&str> = script
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();
    if lines.is_empty() {
        return Err(Error::EmptyScript);
    }

    let total = lines.len();
    let mut buffers: Vec<AudioBuffer> = Vec::with_capacity(total);

    for (index, line) in lines.iter().enumerate() {
        let encoded = synthesizer
            .synthesize(line)
            .await
            .map_err(|e| Error::SynthesisFailed {
                index,
                chunk: line.chars().take(80).collect(),
                reason: e.to_string(),
            })?;

        match encoded {
            Some(encoded) => {
                let pcm = base64_to_bytes(&encoded)?;
                buffers.push(pcm_to_audio_buffer(
                    &pcm,
                    SPEECH_SAMPLE_RATE,
                    SPEECH_CHANNELS,
                )?);
            }
            None => tracing::warn!(index, "draft_line_without_audio"),
        }

        on_progress((((index + 1) as f64 / total as f64) * 100.0).round() as u8);
    }

    if buffers.is_empty() {
        return Ok(None);
    }

    let merged = concat_audio_buffers(&buffers);
    tracing::info!(
        lines = total,
        rendered = buffers.len(),
        duration_secs = merged.duration(),
        "draft_rendered"
    );
    Ok(Some(audio_buffer_to_wav(&merged)))
}
