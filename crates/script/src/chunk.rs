use std::sync::LazyLock;

use regex::Regex;

/// Upper bound on characters sent to the synthesizer in one request.
pub const DEFAULT_MAX_CHUNK_LEN: usize = 500;

static PARAGRAPH_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n\s*\n").expect("invalid paragraph regex"));

static SENTENCE_END: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.!?]+(?:\s+|$)").expect("invalid sentence regex"));

/// Splits text into pieces of at most `max_len` characters.
///
/// Paragraphs are kept whole when they fit. Longer paragraphs are packed
/// sentence by sentence, and a sentence that is still too long is cut at the
/// character limit. Every returned chunk is trimmed and non-empty.
pub fn split_into_speech_chunks(text: &str, max_len: usize) -> Vec<String> {
    let max_len = max_len.max(1);
    let mut chunks = Vec::new();

    for paragraph in PARAGRAPH_BREAK.split(text) {
        let paragraph = paragraph.trim();
        if paragraph.is_empty() {
            continue;
        }

        if char_len(paragraph) <= max_len {
            chunks.push(paragraph.to_string());
        } else {
            pack_sentences(paragraph, max_len, &mut chunks);
        }
    }

    chunks
}

fn pack_sentences(paragraph: &str, max_len: usize, chunks: &mut Vec<String>) {
    let mut current = String::new();

    for sentence in sentences(paragraph) {
        let trimmed = sentence.trim();
        if trimmed.is_empty() {
            continue;
        }

        if char_len(trimmed) > max_len {
            flush(&mut current, chunks);
            force_split(trimmed, max_len, chunks);
            continue;
        }

        let candidate_len = char_len(current.trim_start()) + char_len(sentence.trim_end());
        if !current.trim().is_empty() && candidate_len > max_len {
            flush(&mut current, chunks);
        }
        current.push_str(sentence);
    }

    flush(&mut current, chunks);
}

fn sentences(paragraph: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut cursor = 0;
    for end in SENTENCE_END.find_iter(paragraph) {
        out.push(&paragraph[cursor..end.end()]);
        cursor = end.end();
    }
    if cursor < paragraph.len() {
        out.push(&paragraph[cursor..]);
    }
    out
}

fn force_split(sentence: &str, max_len: usize, chunks: &mut Vec<String>) {
    let chars: Vec<char> = sentence.chars().collect();
    for piece in chars.chunks(max_len) {
        let piece: String = piece.iter().collect();
        let piece = piece.trim();
        if !piece.is_empty() {
            chunks.push(piece.to_string());
        }
    }
}

fn flush(current: &mut String, chunks: &mut Vec<String>) {
    let trimmed = current.trim();
    if !trimmed.is_empty() {
        chunks.push(trimmed.to_string());
    }
    current.clear();
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}
