use std::{
    io,
    path::{Path, PathBuf},
    str::FromStr,
};

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::error::RelocationError;

/// What to do when one folder cannot be moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MovePolicy {
    /// Fail the whole call. Folders moved before the failure stay moved and
    /// are listed in the error.
    #[default]
    StopOnFirstError,
    /// Record the failure and carry on with the next folder.
    ContinueOnError,
}

impl FromStr for MovePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stop" | "stop-on-first-error" => Ok(MovePolicy::StopOnFirstError),
            "continue" | "continue-on-error" => Ok(MovePolicy::ContinueOnError),
            other => Err(format!("unknown move policy: {other}")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MoveContext {
    pub destination: PathBuf,
    /// Folder the beatmaps were scanned from. It is never moved, and neither
    /// is any folder containing it. Pruning walks up from the source's
    /// parent through every emptied ancestor below this folder, not just
    /// the direct parent. Without it nothing is pruned.
    pub scan_root: Option<PathBuf>,
    pub policy: MovePolicy,
    pub cancel: CancellationToken,
}

impl MoveContext {
    pub fn new(destination: impl Into<PathBuf>) -> Self {
        Self {
            destination: destination.into(),
            scan_root: None,
            policy: MovePolicy::default(),
            cancel: CancellationToken::new(),
        }
    }

    pub fn scan_root(mut self, root: impl AsRef<Path>) -> Self {
        self.scan_root = Some(absolute_or_same(root.as_ref()));
        self
    }

    pub fn policy(mut self, policy: MovePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveFailure {
    pub id: String,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MoveOutcome {
    /// Ids that were fully moved, in request order.
    pub moved: Vec<String>,
    /// Only populated under [`MovePolicy::ContinueOnError`].
    pub failed: Vec<MoveFailure>,
}

/// Moves each beatmap folder in `ids` into `ctx.destination`, in order.
pub async fn relocate(ids: &[String], ctx: &MoveContext) -> Result<MoveOutcome, RelocationError> {
    if ids.is_empty() {
        return Err(RelocationError::NothingToMove);
    }

    info!(
        "Moving {} beatmap folders to {} ({:?})",
        ids.len(),
        ctx.destination.display(),
        ctx.policy
    );

    let mut outcome = MoveOutcome::default();
    for id in ids {
        if ctx.cancel.is_cancelled() {
            warn!("Move cancelled after {} folders", outcome.moved.len());
            return Err(RelocationError::Cancelled {
                moved: outcome.moved,
            });
        }

        match move_folder(id, ctx).await {
            Ok(()) => outcome.moved.push(id.clone()),
            Err(e) => match ctx.policy {
                MovePolicy::StopOnFirstError => {
                    error!("Failed to move {}: {}", id, e);
                    return Err(RelocationError::Aborted {
                        id: id.clone(),
                        moved: outcome.moved,
                        source: Box::new(e),
                    });
                }
                MovePolicy::ContinueOnError => {
                    warn!("Failed to move {}, continuing: {}", id, e);
                    outcome.failed.push(MoveFailure {
                        id: id.clone(),
                        error: e.to_string(),
                    });
                }
            },
        }
    }

    info!(
        "Moved {}/{} beatmap folders to {}",
        outcome.moved.len(),
        ids.len(),
        ctx.destination.display()
    );
    Ok(outcome)
}

async fn move_folder(id: &str, ctx: &MoveContext) -> Result<(), RelocationError> {
    let source = absolute_or_same(Path::new(id));
    if let Some(root) = ctx.scan_root.as_deref() {
        if root.starts_with(&source) {
            return Err(RelocationError::SourceIsScanRoot(source));
        }
    }
    let name = source
        .file_name()
        .ok_or_else(|| RelocationError::InvalidSource(source.clone()))?;
    let target = ctx.destination.join(name);

    match tokio::fs::metadata(&source).await {
        Ok(meta) if meta.is_dir() => {}
        _ => return Err(RelocationError::SourceMissing(source)),
    }

    if let Some(parent) = target.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|source| RelocationError::CreateDestination {
                path: parent.to_path_buf(),
                source,
            })?;
    }

    // rename() would silently replace an empty directory on some platforms.
    if tokio::fs::symlink_metadata(&target).await.is_ok() {
        return Err(RelocationError::DestinationExists(target));
    }

    tokio::fs::rename(&source, &target)
        .await
        .map_err(|e| RelocationError::Rename {
            from: source.clone(),
            to: target.clone(),
            source: e,
        })?;
    info!("Moved {} to {}", source.display(), target.display());

    if let Some(parent) = source.parent() {
        prune_empty_parents(parent, ctx.scan_root.as_deref()).await;
    }
    Ok(())
}

/// Removes `start` and its ancestors while they are empty and strictly
/// inside `root`. Failures are logged and end the pruning.
async fn prune_empty_parents(start: &Path, root: Option<&Path>) {
    let Some(root) = root else {
        debug!("No scan root known, leaving {} in place", start.display());
        return;
    };

    let mut current = Some(start);
    while let Some(dir) = current {
        if dir == root || !dir.starts_with(root) {
            break;
        }

        match is_empty_dir(dir).await {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) => {
                warn!("Cannot inspect {}: {}", dir.display(), e);
                break;
            }
        }

        if let Err(e) = tokio::fs::remove_dir(dir).await {
            warn!("Failed to remove empty folder {}: {}", dir.display(), e);
            break;
        }
        info!("Removed empty folder {}", dir.display());
        current = dir.parent();
    }
}

async fn is_empty_dir(dir: &Path) -> io::Result<bool> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    Ok(entries.next_entry().await?.is_none())
}

fn absolute_or_same(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_policy_names() {
        assert_eq!("stop".parse::<MovePolicy>(), Ok(MovePolicy::StopOnFirstError));
        assert_eq!(" Continue ".parse::<MovePolicy>(), Ok(MovePolicy::ContinueOnError));
        assert!("sometimes".parse::<MovePolicy>().is_err());
    }

    #[tokio::test]
    async fn prunes_nested_empty_parents_but_not_root() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        let nested = root.join("a/b/c");
        std::fs::create_dir_all(&nested).unwrap();

        prune_empty_parents(&nested, Some(root)).await;

        assert!(!root.join("a").exists());
        assert!(root.exists());
    }

    #[tokio::test]
    async fn stops_pruning_at_first_non_empty_folder() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        std::fs::create_dir_all(root.join("a/b")).unwrap();
        std::fs::write(root.join("a/keep.txt"), "x").unwrap();

        prune_empty_parents(&root.join("a/b"), Some(root)).await;

        assert!(!root.join("a/b").exists());
        assert!(root.join("a/keep.txt").exists());
    }

    #[tokio::test]
    async fn never_prunes_outside_root_or_without_one() {
        let dir = tempfile::tempdir().unwrap();
        let outside = dir.path().join("outside");
        let root = dir.path().join("root");
        std::fs::create_dir_all(&outside).unwrap();
        std::fs::create_dir_all(&root).unwrap();

        prune_empty_parents(&outside, Some(&root)).await;
        prune_empty_parents(&outside, None).await;
        prune_empty_parents(&root, Some(&root)).await;

        assert!(outside.exists());
        assert!(root.exists());
    }
}
