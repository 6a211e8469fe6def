use serde::{Deserialize, Serialize};

/// Request to move beatmap folders into `destination_folder`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveRequest {
    pub beatmap_ids: Vec<String>,
    pub destination_folder: String,
    /// Root the beatmaps were scanned from. Empty parents are only pruned
    /// inside this folder, and the folder itself is never removed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_folder: Option<String>,
}

/// Reply to a finished move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveSummary {
    pub moved: usize,
    pub destination: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_folder_is_optional() {
        let request: MoveRequest = serde_json::from_str(
            r#"{"beatmapIds":["/songs/a"],"destinationFolder":"/archive"}"#,
        )
        .unwrap();
        assert_eq!(request.beatmap_ids, vec!["/songs/a".to_string()]);
        assert_eq!(request.destination_folder, "/archive");
        assert!(request.source_folder.is_none());
    }
}
