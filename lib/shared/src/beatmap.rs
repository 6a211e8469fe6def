use serde::{Deserialize, Serialize};

/// A beatmap folder discovered by a scan, along with the metadata read
/// from the first `.osu` file found inside it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Beatmap {
    /// Absolute path of the beatmap folder. Unique within one scan.
    pub id: String,
    pub path: String,
    /// Absolute path of the `.osu` file the metadata was read from
    pub descriptor_file: String,
    pub artist: String,
    pub title: String,
    pub creator: String,
    pub version: String,
    pub bpm: u32,
    pub total_time_seconds: u32,
}

impl Beatmap {
    /// Key used to drop duplicates inside a single scan.
    pub fn identity_key(&self) -> String {
        identity_key(&self.artist, &self.title, &self.path)
    }
}

/// Builds the `artist|title|folder` identity used for deduplication.
pub fn identity_key(artist: &str, title: &str, folder: &str) -> String {
    format!("{artist}|{title}|{folder}")
}
