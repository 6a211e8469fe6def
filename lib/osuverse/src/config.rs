use std::time::Duration;

/// Number of descriptor files parsed concurrently before merging results.
pub const DEFAULT_BATCH_SIZE: usize = 50;

/// Minimum time between two progress events (1 second).
pub const DEFAULT_PROGRESS_INTERVAL: Duration = Duration::from_secs(1);

/// Wall-clock budget for a whole scan (5 minutes).
pub const DEFAULT_SCAN_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// Longest accepted scan budget (one year). Larger values are clamped.
pub const MAX_SCAN_TIMEOUT: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Path length ceiling on platforms that have a short one.
pub const WINDOWS_MAX_PATH: usize = 255;

/// Tunables for the directory walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkOptions {
    /// Descriptor extension, compared case-insensitively.
    pub extension: String,
    /// Absolute paths longer than this are shortened to a relative form or
    /// reported as unreadable. `None` disables the check.
    pub max_path_len: Option<usize>,
    pub follow_links: bool,
}

impl Default for WalkOptions {
    fn default() -> Self {
        Self {
            extension: "osu".to_string(),
            max_path_len: cfg!(windows).then_some(WINDOWS_MAX_PATH),
            follow_links: false,
        }
    }
}

/// Tunables for a scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanConfig {
    pub batch_size: usize,
    pub progress_interval: Duration,
    pub timeout: Duration,
    /// Return what was found so far instead of failing when the timeout hits.
    pub partial_on_timeout: bool,
    pub walk: WalkOptions,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            timeout: DEFAULT_SCAN_TIMEOUT,
            partial_on_timeout: false,
            walk: WalkOptions::default(),
        }
    }
}

impl ScanConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// A zero batch size is bumped to one.
    pub fn batch_size(mut self, size: usize) -> Self {
        self.batch_size = size.max(1);
        self
    }

    pub fn progress_interval(mut self, interval: Duration) -> Self {
        self.progress_interval = interval;
        self
    }

    /// Clamped to [`MAX_SCAN_TIMEOUT`].
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout.min(MAX_SCAN_TIMEOUT);
        self
    }

    pub fn partial_on_timeout(mut self, enabled: bool) -> Self {
        self.partial_on_timeout = enabled;
        self
    }

    pub fn max_path_len(mut self, limit: Option<usize>) -> Self {
        self.walk.max_path_len = limit;
        self
    }

    pub fn walk_options(mut self, walk: WalkOptions) -> Self {
        self.walk = walk;
        self
    }
}
