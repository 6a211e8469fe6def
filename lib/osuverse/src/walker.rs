use std::{
    io,
    path::{Component, Path, PathBuf},
};

use tracing::{info, warn};
use walkdir::{DirEntry, WalkDir};

use crate::{
    config::WalkOptions,
    error::{Result, ScanError},
};

/// A descriptor found during the walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescriptorFile {
    /// Absolute path, used for identity and reporting.
    pub path: PathBuf,
    /// Path to hand to the filesystem when opening the file. Differs from
    /// `path` only when the absolute form is over the path length ceiling.
    pub open_path: PathBuf,
}

impl DescriptorFile {
    /// The beatmap folder this descriptor belongs to.
    pub fn folder(&self) -> &Path {
        self.path.parent().unwrap_or(&self.path)
    }
}

#[derive(Debug, Default)]
pub struct Discovery {
    pub files: Vec<DescriptorFile>,
    /// Entries that could not be read. The walk carried on past them.
    pub errors: Vec<String>,
}

/// Recursively lists every descriptor under `root`, hidden entries included.
///
/// The root itself must be a readable directory; anything below it that
/// cannot be read is logged and skipped.
pub async fn find_descriptors(root: impl AsRef<Path>, options: &WalkOptions) -> Result<Discovery> {
    let root = std::path::absolute(root.as_ref()).map_err(|source| ScanError::RootUnreadable {
        path: root.as_ref().to_path_buf(),
        source,
    })?;
    check_root(&root).await?;

    let options = options.clone();
    let discovery = tokio::task::spawn_blocking(move || walk(&root, &options))
        .await
        .map_err(|e| ScanError::Task(e.to_string()))??;

    info!(
        "Found {} descriptor files ({} unreadable entries)",
        discovery.files.len(),
        discovery.errors.len()
    );
    Ok(discovery)
}

async fn check_root(root: &Path) -> Result<()> {
    match tokio::fs::metadata(root).await {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(ScanError::RootNotDirectory(root.to_path_buf())),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            Err(ScanError::RootNotFound(root.to_path_buf()))
        }
        Err(source) => Err(ScanError::RootUnreadable {
            path: root.to_path_buf(),
            source,
        }),
    }
}

fn walk(root: &Path, options: &WalkOptions) -> Result<Discovery> {
    let cwd = std::env::current_dir().ok();
    let mut discovery = Discovery::default();

    let walker = WalkDir::new(root)
        .follow_links(options.follow_links)
        .sort_by_file_name();

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.depth() == 0 => {
                let message = e.to_string();
                return Err(ScanError::RootUnreadable {
                    path: root.to_path_buf(),
                    source: e.into_io_error().unwrap_or_else(|| io::Error::other(message)),
                });
            }
            Err(e) => {
                let path = e
                    .path()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "<unknown>".to_string());
                warn!("Skipping unreadable entry {}: {}", path, e);
                discovery.errors.push(format!("Cannot read {path}: {e}"));
                continue;
            }
        };

        if !is_descriptor(&entry, &options.extension) {
            continue;
        }

        let path = entry.into_path();
        match open_path_for(&path, options.max_path_len, cwd.as_deref()) {
            Ok(open_path) => discovery.files.push(DescriptorFile { path, open_path }),
            Err(message) => {
                warn!("{}", message);
                discovery.errors.push(message);
            }
        }
    }

    Ok(discovery)
}

fn is_descriptor(entry: &DirEntry, extension: &str) -> bool {
    let is_file = entry.file_type().is_file()
        || (entry.path_is_symlink() && entry.path().is_file());
    is_file
        && entry
            .path()
            .extension()
            .is_some_and(|ext| ext.to_string_lossy().eq_ignore_ascii_case(extension))
}

/// Picks the form of `path` to open under a path length ceiling.
///
/// Over the ceiling, a path relative to `cwd` is tried since it resolves
/// to the same file without a process-wide directory change.
fn open_path_for(
    path: &Path,
    max_len: Option<usize>,
    cwd: Option<&Path>,
) -> std::result::Result<PathBuf, String> {
    let Some(max_len) = max_len else {
        return Ok(path.to_path_buf());
    };
    let len = path_len(path);
    if len <= max_len {
        return Ok(path.to_path_buf());
    }

    warn!("Long descriptor path ({} characters): {}", len, path.display());
    if let Some(relative) = cwd.and_then(|cwd| relative_to(path, cwd)) {
        if path_len(&relative) <= max_len {
            return Ok(relative);
        }
    }

    Err(format!(
        "Path is too long ({} characters): {}. Try moving the files to a folder with a shorter name.",
        len,
        path.display()
    ))
}

fn path_len(path: &Path) -> usize {
    path.to_string_lossy().chars().count()
}

/// Relative path from `base` to `path`. Both must be absolute and share a
/// root (same drive on Windows).
fn relative_to(path: &Path, base: &Path) -> Option<PathBuf> {
    if !path.is_absolute() || !base.is_absolute() {
        return None;
    }

    let mut path_parts = path.components().peekable();
    let mut base_parts = base.components().peekable();

    match (path_parts.peek(), base_parts.peek()) {
        (Some(Component::Prefix(a)), Some(Component::Prefix(b))) if a != b => return None,
        _ => {}
    }

    while let (Some(a), Some(b)) = (path_parts.peek(), base_parts.peek()) {
        if a != b {
            break;
        }
        path_parts.next();
        base_parts.next();
    }

    let mut relative = PathBuf::new();
    for part in base_parts {
        match part {
            Component::Normal(_) => relative.push(".."),
            Component::CurDir => {}
            _ => return None,
        }
    }
    relative.extend(path_parts);

    if relative.as_os_str().is_empty() {
        relative.push(".");
    }
    Some(relative)
}
