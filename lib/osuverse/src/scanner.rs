//! Scan orchestration: walk, parse in bounded batches, deduplicate, report.

use std::{collections::HashSet, path::PathBuf};

use futures::{future::join_all, Stream};
use serde::Serialize;
use shared::{
    beatmap::{identity_key, Beatmap},
    scan::ScanProgress,
};
use tokio::{
    sync::mpsc,
    time::{sleep_until, Instant},
};
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, error, info, warn};

use crate::{
    collate::locale_cmp,
    config::{ScanConfig, MAX_SCAN_TIMEOUT},
    error::{ParseError, Result, ScanError},
    parser::{parse_descriptor, DescriptorMetadata},
    walker::{find_descriptors, DescriptorFile},
};

/// Buffered events between a spawned scan and its consumer.
const EVENT_BUFFER: usize = 64;

/// What a scan needs to know about the caller's request.
#[derive(Debug, Clone)]
pub struct ScanContext {
    pub root: PathBuf,
    pub cancel: CancellationToken,
}

impl ScanContext {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_cancellation(root, CancellationToken::new())
    }

    pub fn with_cancellation(root: impl Into<PathBuf>, cancel: CancellationToken) -> Self {
        Self {
            root: root.into(),
            cancel,
        }
    }
}

/// Result of a finished scan.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanReport {
    /// Accepted beatmaps, sorted by artist.
    pub beatmaps: Vec<Beatmap>,
    /// Every per-file and per-directory failure seen during the scan.
    pub errors: Vec<String>,
    pub files_found: usize,
    /// False when the time budget ran out and partial results were kept.
    pub complete: bool,
}

impl ScanReport {
    fn empty(errors: Vec<String>) -> Self {
        Self {
            beatmaps: Vec::new(),
            errors,
            files_found: 0,
            complete: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ScanEvent {
    Progress(ScanProgress),
    Finished(ScanReport),
    Failed(String),
}

impl ScanEvent {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ScanEvent::Progress(_))
    }
}

/// Running scan started with [`Scanner::spawn`]. Dropping the handle
/// cancels the scan.
#[derive(Debug)]
pub struct ScanHandle {
    events: mpsc::Receiver<ScanEvent>,
    cancel: CancellationToken,
    guard: DropGuard,
}

impl ScanHandle {
    /// Next progress or terminal event. `None` once the scan is over.
    pub async fn next_event(&mut self) -> Option<ScanEvent> {
        self.events.recv().await
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn into_stream(self) -> impl Stream<Item = ScanEvent> {
        let ScanHandle { events, guard, .. } = self;
        futures::stream::unfold((events, guard), |(mut events, guard)| async move {
            events.recv().await.map(|event| (event, (events, guard)))
        })
    }

    /// Drains progress events and returns the terminal outcome.
    pub async fn finish(mut self) -> std::result::Result<ScanReport, String> {
        while let Some(event) = self.next_event().await {
            match event {
                ScanEvent::Progress(_) => continue,
                ScanEvent::Finished(report) => return Ok(report),
                ScanEvent::Failed(message) => return Err(message),
            }
        }
        Err("Scan stopped unexpectedly".to_string())
    }
}

/// Mutable bookkeeping of one scan. Only touched between awaits by the
/// coordinating task.
#[derive(Debug, Default)]
struct ScanState {
    seen_folders: HashSet<PathBuf>,
    seen_keys: HashSet<String>,
    beatmaps: Vec<Beatmap>,
    errors: Vec<String>,
    unreported: Vec<String>,
    processed: usize,
    total: usize,
}

impl ScanState {
    fn record_error(&mut self, message: String) {
        self.unreported.push(message.clone());
        self.errors.push(message);
    }

    fn merge(&mut self, file: &DescriptorFile, parsed: std::result::Result<DescriptorMetadata, ParseError>) {
        let folder = file.folder();
        if self.seen_folders.contains(folder) {
            return;
        }

        let metadata = match parsed {
            Ok(metadata) => metadata,
            Err(ParseError::Io { source, .. }) => {
                warn!("Skipping {}: {}", file.path.display(), source);
                self.record_error(format!(
                    "Failed to process {}: {}",
                    file.path.display(),
                    source
                ));
                return;
            }
        };

        self.seen_folders.insert(folder.to_path_buf());
        let folder = folder.to_string_lossy().into_owned();
        if !self
            .seen_keys
            .insert(identity_key(&metadata.artist, &metadata.title, &folder))
        {
            return;
        }

        self.beatmaps.push(Beatmap {
            id: folder.clone(),
            path: folder,
            descriptor_file: file.path.to_string_lossy().into_owned(),
            artist: metadata.artist,
            title: metadata.title,
            creator: metadata.creator,
            version: metadata.version,
            bpm: metadata.bpm,
            total_time_seconds: metadata.total_time_seconds,
        });
    }

    fn progress(&mut self) -> ScanProgress {
        ScanProgress::new(self.processed, self.total, std::mem::take(&mut self.unreported))
    }

    fn into_report(mut self, complete: bool) -> ScanReport {
        self.beatmaps.sort_by(|a, b| locale_cmp(&a.artist, &b.artist));
        ScanReport {
            beatmaps: self.beatmaps,
            errors: self.errors,
            files_found: self.total,
            complete,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Scanner {
    config: ScanConfig,
}

impl Scanner {
    pub fn new(config: ScanConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Scans without progress reporting.
    pub async fn scan(&self, ctx: &ScanContext) -> Result<ScanReport> {
        self.run(ctx, None).await
    }

    /// Scans, sending throttled [`ScanEvent::Progress`] events to `progress`.
    /// The terminal event is left to the caller.
    pub async fn scan_with_progress(
        &self,
        ctx: &ScanContext,
        progress: &mpsc::Sender<ScanEvent>,
    ) -> Result<ScanReport> {
        self.run(ctx, Some(progress)).await
    }

    /// Runs the scan on a background task and returns its event stream,
    /// which ends with exactly one `Finished` or `Failed` event.
    pub fn spawn(&self, ctx: ScanContext) -> ScanHandle {
        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        let cancel = ctx.cancel.clone();
        let scanner = self.clone();

        tokio::spawn(async move {
            let terminal = match scanner.run(&ctx, Some(&tx)).await {
                Ok(report) => ScanEvent::Finished(report),
                Err(e) => {
                    error!("Scan of {} failed: {}", ctx.root.display(), e);
                    ScanEvent::Failed(e.to_string())
                }
            };
            let _ = tx.send(terminal).await;
        });

        ScanHandle {
            events: rx,
            guard: cancel.clone().drop_guard(),
            cancel,
        }
    }

    async fn run(
        &self,
        ctx: &ScanContext,
        progress: Option<&mpsc::Sender<ScanEvent>>,
    ) -> Result<ScanReport> {
        let started = Instant::now();
        let deadline = started
            .checked_add(self.config.timeout)
            .unwrap_or_else(|| started + MAX_SCAN_TIMEOUT);
        info!("Scanning {} for beatmaps", ctx.root.display());

        let discovery = tokio::select! {
            biased;
            _ = ctx.cancel.cancelled() => return Err(ScanError::Cancelled),
            _ = sleep_until(deadline) => return self.timed_out(ScanState::default()),
            found = find_descriptors(&ctx.root, &self.config.walk) => found?,
        };

        let mut state = ScanState {
            total: discovery.files.len(),
            ..ScanState::default()
        };
        for message in discovery.errors {
            state.record_error(message);
        }

        if state.total == 0 {
            info!("No beatmaps found in {}", ctx.root.display());
            return Ok(ScanReport::empty(state.errors));
        }

        let mut last_emit = started;
        let mut last_reported = 0;

        for (index, batch) in discovery.files.chunks(self.config.batch_size).enumerate() {
            if ctx.cancel.is_cancelled() {
                return Err(ScanError::Cancelled);
            }
            if Instant::now() >= deadline {
                return self.timed_out(state);
            }

            let pending: Vec<&DescriptorFile> = batch
                .iter()
                .filter(|file| !state.seen_folders.contains(file.folder()))
                .collect();
            let parses = join_all(
                pending
                    .iter()
                    .map(|file| async move { (*file, parse_descriptor(&file.open_path).await) }),
            );

            let results = tokio::select! {
                biased;
                _ = ctx.cancel.cancelled() => return Err(ScanError::Cancelled),
                _ = sleep_until(deadline) => return self.timed_out(state),
                results = parses => results,
            };

            for (file, parsed) in results {
                state.merge(file, parsed);
            }
            state.processed += batch.len();
            debug!(
                "Batch {} done: {}/{} files, {} beatmaps",
                index + 1,
                state.processed,
                state.total,
                state.beatmaps.len()
            );

            if last_emit.elapsed() >= self.config.progress_interval {
                last_reported = state.processed;
                emit(progress, state.progress()).await;
                last_emit = Instant::now();
            }
        }

        if last_reported != state.processed || !state.unreported.is_empty() {
            emit(progress, state.progress()).await;
        }

        if !state.errors.is_empty() {
            warn!(
                "{} errors while scanning {}:",
                state.errors.len(),
                ctx.root.display()
            );
            for message in &state.errors {
                warn!("{}", message);
            }
        }

        let report = state.into_report(true);
        info!(
            "Scan of {} finished in {:.1?}: {} beatmaps from {} files",
            ctx.root.display(),
            started.elapsed(),
            report.beatmaps.len(),
            report.files_found
        );
        Ok(report)
    }

    fn timed_out(&self, state: ScanState) -> Result<ScanReport> {
        warn!(
            "Scan timed out after {:?} ({}/{} files processed)",
            self.config.timeout, state.processed, state.total
        );
        if self.config.partial_on_timeout {
            Ok(state.into_report(false))
        } else {
            Err(ScanError::TimedOut(self.config.timeout))
        }
    }
}

async fn emit(sink: Option<&mpsc::Sender<ScanEvent>>, progress: ScanProgress) {
    if let Some(sink) = sink {
        // A consumer that went away does not stop the scan.
        let _ = sink.send(ScanEvent::Progress(progress)).await;
    }
}
