use serde::{Deserialize, Serialize};

/// Periodic progress of a running scan.
///
/// `errors` only carries the failures recorded since the previous progress
/// event, so a consumer that keeps every event sees each error exactly once.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScanProgress {
    pub loaded: usize,
    pub total: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
}

impl ScanProgress {
    pub fn new(loaded: usize, total: usize, errors: Vec<String>) -> Self {
        Self {
            loaded,
            total,
            errors: if errors.is_empty() { None } else { Some(errors) },
        }
    }

    pub fn is_done(&self) -> bool {
        self.loaded >= self.total
    }
}
