use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// One file selected by the collector.
///
/// `content` is only populated when the policy embeds content; the
/// enumerate-only mode leaves it as `None` and never opens the file.
#[derive(Debug, Clone)]
pub struct FileEntry {
    pub path: PathBuf,
    pub relative_path: String,
    pub content: Option<String>,
}

/// Counters accumulated over one collector run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub included: usize,
    pub excluded: usize,
    pub read_failures: usize,
}

/// Result of a successful archive pass.
#[derive(Debug, Clone)]
pub struct ArchiveSummary {
    pub destination: PathBuf,
    pub entries: usize,
    pub uncompressed_bytes: u64,
}

/// Cooperative cancellation checked between file visits, so a caller
/// embedding the pipeline can bound latency on very large trees.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}
