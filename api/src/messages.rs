use serde::{Deserialize, Serialize};
use shared::{
    beatmap::Beatmap,
    relocation::{MoveRequest, MoveSummary},
    scan::ScanProgress,
};

/// Messages a front end sends, keyed by channel name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "channel", content = "payload", rename_all = "kebab-case")]
pub enum Request {
    ChooseSourceFolder,
    ChooseDestinationFolder,
    /// Root folder to scan
    SearchBeatmaps(String),
    MoveBeatmaps(MoveRequest),
}

/// Messages pushed back to the front end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "channel", content = "payload", rename_all = "kebab-case")]
pub enum Reply {
    SourceFolderSelected(String),
    DestinationFolderSelected(String),
    BeatmapsProgress(ScanProgress),
    BeatmapsFound { beatmaps: Vec<Beatmap> },
    BeatmapsMoved(MoveSummary),
    /// Human readable, ready for display.
    Error(String),
}

impl Reply {
    pub fn error(context: &str, e: impl std::fmt::Display) -> Self {
        Reply::Error(format!("{context}: {e}"))
    }
}
