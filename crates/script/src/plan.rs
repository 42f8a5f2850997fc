use crate::{ScriptBlock, parse_script_to_blocks, sanitize_for_speech, split_into_speech_chunks};

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum AudioOperation {
    Synthesize { text: String },
    Silence { seconds: u32 },
}

impl AudioOperation {
    pub fn synthesize(text: impl Into<String>) -> Self {
        Self::Synthesize { text: text.into() }
    }

    pub fn silence(seconds: u32) -> Self {
        Self::Silence { seconds }
    }
}

/// The fixed, ordered list of work for one long-form run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OperationPlan {
    operations: Vec<AudioOperation>,
}

impl OperationPlan {
    pub fn operations(&self) -> &[AudioOperation] {
        &self.operations
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, AudioOperation> {
        self.operations.iter()
    }

    pub fn synthesize_count(&self) -> usize {
        self.iter()
            .filter(|op| matches!(op, AudioOperation::Synthesize { .. }))
            .count()
    }

    pub fn total_silence_seconds(&self) -> u64 {
        self.iter()
            .map(|op| match op {
                AudioOperation::Silence { seconds } => *seconds as u64,
                AudioOperation::Synthesize { .. } => 0,
            })
            .sum()
    }

    /// `round(100 * completed / total)`, clamped to 100.
    pub fn progress_percent(&self, completed: usize) -> u8 {
        if self.is_empty() {
            return 0;
        }
        let completed = completed.min(self.len());
        ((completed as f64 / self.len() as f64) * 100.0).round() as u8
    }
}

impl<'a> IntoIterator for &'a OperationPlan {
    type Item = &'a AudioOperation;
    type IntoIter = std::slice::Iter<'a, AudioOperation>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Flattens blocks into operations: one `Silence` per pause, one
/// `Synthesize` per speech chunk of each sanitized text block.
pub fn plan_operations(blocks: &[ScriptBlock], max_len: usize) -> OperationPlan {
    let mut operations = Vec::new();

    for block in blocks {
        match block {
            ScriptBlock::Pause { seconds } => operations.push(AudioOperation::silence(*seconds)),
            ScriptBlock::Text { content } => {
                let clean = sanitize_for_speech(content);
                operations.extend(
                    split_into_speech_chunks(&clean, max_len)
                        .into_iter()
                        .map(AudioOperation::synthesize),
                );
            }
        }
    }

    OperationPlan { operations }
}

pub fn plan_script(script: &str, max_len: usize) -> OperationPlan {
    plan_operations(&parse_script_to_blocks(script), max_len)
}
