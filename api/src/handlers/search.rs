use std::path::PathBuf;

use osuverse::{ScanContext, ScanEvent, Scanner};
use tokio::sync::mpsc;
use tracing::{info, warn};

use super::send;
use crate::{backend::Backend, messages::Reply};

const SEARCH_ERROR: &str = "Error while searching for beatmaps";

/// Scans `root`, streaming progress replies followed by either the found
/// beatmaps or one error reply.
pub async fn search_beatmaps(backend: &Backend, root: String, replies: &mpsc::Sender<Reply>) {
    let root = PathBuf::from(root);
    backend
        .update_session(|session| session.source_folder = Some(root.clone()))
        .await;

    let scanner = Scanner::new(backend.config().scan().clone());
    let ctx = ScanContext::with_cancellation(root, backend.shutdown_token().child_token());
    let mut handle = scanner.spawn(ctx);

    while let Some(event) = handle.next_event().await {
        let reply = match event {
            ScanEvent::Progress(progress) => Reply::BeatmapsProgress(progress),
            ScanEvent::Finished(report) => {
                if !report.complete {
                    warn!(
                        "Returning partial results: {} beatmaps from {} files",
                        report.beatmaps.len(),
                        report.files_found
                    );
                }
                info!("Found {} beatmaps", report.beatmaps.len());
                Reply::BeatmapsFound {
                    beatmaps: report.beatmaps,
                }
            }
            ScanEvent::Failed(message) => Reply::error(SEARCH_ERROR, message),
        };

        let terminal = !matches!(reply, Reply::BeatmapsProgress(_));
        if !send(replies, reply).await {
            handle.cancel();
            return;
        }
        if terminal {
            return;
        }
    }

    send(replies, Reply::error(SEARCH_ERROR, "scan stopped unexpectedly")).await;
}
