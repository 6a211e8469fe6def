use tokio::sync::mpsc;
use tracing::{debug, info};

use super::send;
use crate::{backend::Backend, messages::Reply, picker::FolderPurpose};

pub async fn choose_folder(backend: &Backend, purpose: FolderPurpose, replies: &mpsc::Sender<Reply>) {
    match backend.picker().pick_folder(purpose).await {
        Ok(Some(path)) => {
            info!("Selected {:?} folder {}", purpose, path.display());
            backend
                .update_session(|session| match purpose {
                    FolderPurpose::Source => session.source_folder = Some(path.clone()),
                    FolderPurpose::Destination => session.destination_folder = Some(path.clone()),
                })
                .await;

            let path = path.to_string_lossy().into_owned();
            let reply = match purpose {
                FolderPurpose::Source => Reply::SourceFolderSelected(path),
                FolderPurpose::Destination => Reply::DestinationFolderSelected(path),
            };
            send(replies, reply).await;
        }
        Ok(None) => debug!("Folder selection cancelled ({:?})", purpose),
        Err(e) => {
            send(replies, Reply::error("Error while choosing a folder", e)).await;
        }
    }
}
