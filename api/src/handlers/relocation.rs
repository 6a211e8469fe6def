use std::path::PathBuf;

use osuverse::{relocate, MoveContext};
use shared::relocation::{MoveRequest, MoveSummary};
use tokio::sync::mpsc;

use super::send;
use crate::{backend::Backend, messages::Reply};

const MOVE_ERROR: &str = "Error while moving beatmaps";

/// Moves the requested beatmap folders.
///
/// The scan root that must survive pruning comes from the request, or
/// failing that from the last search of this session.
pub async fn move_beatmaps(backend: &Backend, request: MoveRequest, replies: &mpsc::Sender<Reply>) {
    let destination = PathBuf::from(&request.destination_folder);
    let scan_root = match request.source_folder.as_deref() {
        Some(root) => Some(PathBuf::from(root)),
        None => backend.session().await.source_folder,
    };
    backend
        .update_session(|session| session.destination_folder = Some(destination.clone()))
        .await;

    let mut ctx = MoveContext::new(destination)
        .policy(backend.config().move_policy())
        .cancellation(backend.shutdown_token().child_token());
    if let Some(root) = scan_root {
        ctx = ctx.scan_root(root);
    }

    match relocate(&request.beatmap_ids, &ctx).await {
        Ok(outcome) => {
            let summary = MoveSummary {
                moved: outcome.moved.len(),
                destination: request.destination_folder,
            };
            if !send(replies, Reply::BeatmapsMoved(summary)).await {
                return;
            }
            if !outcome.failed.is_empty() {
                let details = outcome
                    .failed
                    .iter()
                    .map(|failure| format!("{} ({})", failure.id, failure.error))
                    .collect::<Vec<_>>()
                    .join("; ");
                let message = format!(
                    "{} beatmap(s) could not be moved: {}",
                    outcome.failed.len(),
                    details
                );
                send(replies, Reply::error(MOVE_ERROR, message)).await;
            }
        }
        Err(e) => {
            send(replies, Reply::error(MOVE_ERROR, e)).await;
        }
    }
}
