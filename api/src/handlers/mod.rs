use tokio::sync::mpsc;
use tracing::debug;

use crate::messages::Reply;

pub mod folder;
pub mod relocation;
pub mod search;

pub use folder::choose_folder;
pub use relocation::move_beatmaps;
pub use search::search_beatmaps;

/// Pushes a reply. Returns false once the front end stopped listening.
pub(crate) async fn send(replies: &mpsc::Sender<Reply>, reply: Reply) -> bool {
    match replies.send(reply).await {
        Ok(()) => true,
        Err(_) => {
            debug!("Dropping reply, receiver closed");
            false
        }
    }
}
