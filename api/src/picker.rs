use async_trait::async_trait;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FolderPurpose {
    /// Folder to scan for beatmaps
    Source,
    /// Folder beatmaps will be moved into
    Destination,
}

impl FolderPurpose {
    pub fn title(&self) -> &'static str {
        match self {
            FolderPurpose::Source => "Choose the osu! beatmap folder",
            FolderPurpose::Destination => "Choose a destination folder for beatmaps",
        }
    }
}

/// Native folder selection, provided by whatever hosts the backend.
#[async_trait]
pub trait FolderPicker: Send + Sync {
    /// `Ok(None)` when the user dismissed the dialog.
    async fn pick_folder(&self, purpose: FolderPurpose) -> Result<Option<PathBuf>, String>;
}

/// Picker for headless hosts: every dialog is treated as dismissed.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFolderPicker;

#[async_trait]
impl FolderPicker for NoFolderPicker {
    async fn pick_folder(&self, purpose: FolderPurpose) -> Result<Option<PathBuf>, String> {
        tracing::debug!("No folder picker available for '{}'", purpose.title());
        Ok(None)
    }
}
