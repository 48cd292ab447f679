use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by the collect/archive pipeline.
///
/// `InvalidRoot` and `PolicyLoad` abort a run before any tree I/O happens.
/// `FileRead` is only returned when strict reads are enabled; the default
/// policy is to skip the offending file and count it in the run summary.
/// `ArchiveWrite` is fatal for the archive step only, the snapshot artifact
/// is produced independently.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("root path '{}' does not exist or is not a directory", .path.display())]
    InvalidRoot { path: PathBuf },

    #[error("cannot load exclusion patterns from '{}': {source}", .path.display())]
    PolicyLoad {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("cannot read '{}': {source}", .path.display())]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot write archive '{}': {source}", .path.display())]
    ArchiveWrite {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}
