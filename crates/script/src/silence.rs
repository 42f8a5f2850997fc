/// Zeroed 16-bit mono PCM lasting `seconds` at `sample_rate`.
pub fn generate_silence_pcm(seconds: f64, sample_rate: u32) -> Vec<u8> {
    if !(seconds > 0.0) {
        return Vec::new();
    }
    let frames = (seconds * sample_rate as f64).round() as usize;
    vec![0u8; frames * 2]
}
