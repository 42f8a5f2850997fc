use std::sync::LazyLock;

use regex::Regex;

static PAUSE_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\[\s*pause\s*:\s*(\d+)\s*\]").expect("invalid pause marker regex")
});

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ScriptBlock {
    Text { content: String },
    Pause { seconds: u32 },
}

impl ScriptBlock {
    pub fn text(content: impl Into<String>) -> Self {
        Self::Text {
            content: content.into(),
        }
    }

    pub fn pause(seconds: u32) -> Self {
        Self::Pause { seconds }
    }
}

/// Splits a script into spoken text and `[PAUSE: n]` blocks, in order.
///
/// Markers whose duration is zero or does not fit a `u32` stay in the
/// surrounding text verbatim.
pub fn parse_script_to_blocks(script: &str) -> Vec<ScriptBlock> {
    let mut blocks = Vec::new();
    let mut cursor = 0;

    for caps in PAUSE_MARKER.captures_iter(script) {
        let seconds = match caps[1].parse::<u32>() {
            Ok(seconds) if seconds > 0 => seconds,
            _ => continue,
        };

        let Some(marker) = caps.get(0) else {
            continue;
        };
        push_text(&mut blocks, &script[cursor..marker.start()]);
        blocks.push(ScriptBlock::pause(seconds));
        cursor = marker.end();
    }

    push_text(&mut blocks, &script[cursor..]);
    blocks
}

fn push_text(blocks: &mut Vec<ScriptBlock>, segment: &str) {
    let trimmed = segment.trim();
    if !trimmed.is_empty() {
        blocks.push(ScriptBlock::text(trimmed));
    }
}
