#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(tag = "type")]
pub enum LongFormEvent {
    #[serde(rename = "generationStarted")]
    Started {
        run_id: u64,
        destination: String,
        operations: usize,
    },
    #[serde(rename = "generationProgress")]
    Progress {
        run_id: u64,
        completed: usize,
        total: usize,
        percent: u8,
    },
    #[serde(rename = "chunkRetrying")]
    Retrying {
        run_id: u64,
        index: usize,
        attempt: usize,
        delay_ms: u64,
        error: String,
    },
    #[serde(rename = "generationFinished")]
    Finished {
        run_id: u64,
        path: String,
        bytes: u64,
    },
    #[serde(rename = "generationFailed")]
    Failed { run_id: u64, error: String },
    #[serde(rename = "generationCancelled")]
    Cancelled { run_id: u64 },
}

impl LongFormEvent {
    pub fn run_id(&self) -> u64 {
        match self {
            LongFormEvent::Started { run_id, .. }
            | LongFormEvent::Progress { run_id, .. }
            | LongFormEvent::Retrying { run_id, .. }
            | LongFormEvent::Finished { run_id, .. }
            | LongFormEvent::Failed { run_id, .. }
            | LongFormEvent::Cancelled { run_id } => *run_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_type_tag() {
        let event = LongFormEvent::Progress {
            run_id: 1,
            completed: 2,
            total: 4,
            percent: 50,
        };
        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            serde_json::json!({
                "type": "generationProgress",
                "run_id": 1,
                "completed": 2,
                "total": 4,
                "percent": 50
            })
        );
        assert_eq!(LongFormEvent::Cancelled { run_id: 9 }.run_id(), 9);
    }
}
