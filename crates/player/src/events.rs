use crate::PlaybackState;

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(tag = "type")]
pub enum PlayerEvent {
    #[serde(rename = "playerStateChanged")]
    StateChanged { state: PlaybackState },
    #[serde(rename = "trackLoading")]
    TrackLoading { index: usize },
    #[serde(rename = "trackStarted")]
    TrackStarted {
        index: usize,
        offset_secs: f64,
        duration_secs: f64,
    },
    #[serde(rename = "trackFailed")]
    TrackFailed { index: usize, error: String },
    #[serde(rename = "playbackEnded")]
    Ended,
    #[serde(rename = "artifactExported")]
    Exported { path: String },
}
