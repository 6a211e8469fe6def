use std::{path::PathBuf, sync::Arc};

use tokio::sync::{mpsc, RwLock};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::{
    config::AppConfig,
    handlers,
    messages::{Reply, Request},
    picker::{FolderPicker, FolderPurpose},
};

/// Folders chosen so far by the connected front end.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    /// Last folder chosen or searched. Never pruned by a move.
    pub source_folder: Option<PathBuf>,
    pub destination_folder: Option<PathBuf>,
}

/// Dispatches requests from one front end.
pub struct Backend {
    config: AppConfig,
    picker: Arc<dyn FolderPicker>,
    session: RwLock<Session>,
    /// Cancelled on shutdown, which stops running scans and moves.
    shutdown: CancellationToken,
}

impl Backend {
    pub fn new(config: AppConfig, picker: impl FolderPicker + 'static) -> Self {
        Self {
            config,
            picker: Arc::new(picker),
            session: RwLock::new(Session::default()),
            shutdown: CancellationToken::new(),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn picker(&self) -> &dyn FolderPicker {
        self.picker.as_ref()
    }

    pub async fn session(&self) -> Session {
        self.session.read().await.clone()
    }

    pub(crate) async fn update_session(&self, update: impl FnOnce(&mut Session)) {
        update(&mut *self.session.write().await);
    }

    pub fn shutdown_token(&self) -> &CancellationToken {
        &self.shutdown
    }

    pub fn shutdown(&self) {
        info!("Shutting down backend");
        self.shutdown.cancel();
    }

    /// Handles one request, sending every reply it produces to `replies`.
    pub async fn handle(&self, request: Request, replies: &mpsc::Sender<Reply>) {
        debug!("Handling {:?}", request);
        match request {
            Request::ChooseSourceFolder => {
                handlers::choose_folder(self, FolderPurpose::Source, replies).await
            }
            Request::ChooseDestinationFolder => {
                handlers::choose_folder(self, FolderPurpose::Destination, replies).await
            }
            Request::SearchBeatmaps(root) => handlers::search_beatmaps(self, root, replies).await,
            Request::MoveBeatmaps(request) => handlers::move_beatmaps(self, request, replies).await,
        }
    }

    /// Reads requests until the channel closes or the backend shuts down.
    /// Each request runs on its own task so a long scan does not hold up
    /// folder selection.
    pub async fn serve(self: Arc<Self>, mut requests: mpsc::Receiver<Request>, replies: mpsc::Sender<Reply>) {
        loop {
            let request = tokio::select! {
                _ = self.shutdown.cancelled() => break,
                request = requests.recv() => match request {
                    Some(request) => request,
                    None => break,
                },
            };

            let backend = Arc::clone(&self);
            let replies = replies.clone();
            tokio::spawn(async move {
                backend.handle(request, &replies).await;
            });
        }
        debug!("Request loop finished");
    }
}
