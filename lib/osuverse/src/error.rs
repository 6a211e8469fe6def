use std::{io, path::PathBuf, time::Duration};

use thiserror::Error;

pub type Result<T, E = ScanError> = std::result::Result<T, E>;

/// Failure to read a single `.osu` file. Never fatal to a scan.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Folder does not exist: {}", .0.display())]
    RootNotFound(PathBuf),

    #[error("Not a folder: {}", .0.display())]
    RootNotDirectory(PathBuf),

    #[error("Cannot access folder {}: {source}", path.display())]
    RootUnreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(
        "Scan exceeded the {} limit. The folder may be too large or contain too many files.",
        describe_budget(.0)
    )]
    TimedOut(Duration),

    #[error("Scan was cancelled")]
    Cancelled,

    #[error("Scan task failed: {0}")]
    Task(String),
}

#[derive(Debug, Error)]
pub enum RelocationError {
    #[error("No beatmaps selected to move")]
    NothingToMove,

    #[error("Beatmap folder has no name: {}", .0.display())]
    InvalidSource(PathBuf),

    #[error("Beatmap folder does not exist: {}", .0.display())]
    SourceMissing(PathBuf),

    #[error("Cannot move the scanned folder itself: {}", .0.display())]
    SourceIsScanRoot(PathBuf),

    #[error("Destination already exists: {}", .0.display())]
    DestinationExists(PathBuf),

    #[error("Cannot create destination folder {}: {source}", path.display())]
    CreateDestination {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Cannot move {} to {}: {source}", from.display(), to.display())]
    Rename {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Move was cancelled after {} folder(s)", moved.len())]
    Cancelled { moved: Vec<String> },

    /// Stop-on-first-error policy hit a failure. `moved` lists the folders
    /// that were already relocated before `id` failed.
    #[error("Failed to move {id} ({} moved before the failure): {source}", moved.len())]
    Aborted {
        id: String,
        moved: Vec<String>,
        #[source]
        source: Box<RelocationError>,
    },
}

impl RelocationError {
    /// Folders that were fully moved before the error was raised.
    pub fn moved(&self) -> &[String] {
        match self {
            RelocationError::Cancelled { moved } | RelocationError::Aborted { moved, .. } => moved,
            _ => &[],
        }
    }
}

fn describe_budget(budget: &Duration) -> String {
    let secs = budget.as_secs();
    if secs >= 60 && secs % 60 == 0 {
        format!("{} minute", secs / 60)
    } else {
        format!("{}s", budget.as_secs_f32())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_message_mentions_folder_size() {
        let message = ScanError::TimedOut(Duration::from_secs(300)).to_string();
        assert_eq!(
            message,
            "Scan exceeded the 5 minute limit. The folder may be too large or contain too many files."
        );

        let message = ScanError::TimedOut(Duration::from_millis(1500)).to_string();
        assert!(message.starts_with("Scan exceeded the 1.5s limit."));
    }

    #[test]
    fn aborted_exposes_already_moved() {
        let err = RelocationError::Aborted {
            id: "/songs/b".to_string(),
            moved: vec!["/songs/a".to_string()],
            source: Box::new(RelocationError::SourceMissing(PathBuf::from("/songs/b"))),
        };
        assert_eq!(err.moved(), ["/songs/a".to_string()]);
        assert!(err.to_string().contains("1 moved before the failure"));
    }
}
