use std::path::Path;

use log::{info, warn};
use walkdir::WalkDir;

use crate::domain::errors::ScanError;
use crate::domain::models::{CancelFlag, FileEntry, RunSummary};
use crate::domain::policy::SelectionPolicy;
use crate::infra::file_system::{read_text_file, to_unix_path};
use crate::infra::progress::ProgressObserver;

/// Selected entries plus the skip/include counters for the run.
#[derive(Debug)]
pub struct CollectOutcome {
    pub entries: Vec<FileEntry>,
    pub summary: RunSummary,
}

fn relative_unix(root: &Path, path: &Path) -> String {
    to_unix_path(path.strip_prefix(root).unwrap_or(path))
}

/// Walks `root` and returns every file admitted by `policy`, in lexical
/// order of relative path. Content is embedded when the policy says so.
///
/// Excluded and hidden directories are pruned before descent: nothing inside
/// them is ever opened, even if it is unreadable. Read failures on individual
/// files are skipped and counted unless the policy demands strict reads.
pub fn collect(
    root: &Path,
    policy: &SelectionPolicy,
    progress: &mut dyn ProgressObserver,
    cancel: &CancelFlag,
) -> Result<CollectOutcome, ScanError> {
    collect_entries(root, policy, policy.embed_content, progress, cancel)
}

/// The enumerate-only capability: the same walk and filter as [`collect`],
/// but no file content is ever read. Used by the archiver and the reporter.
pub fn enumerate(
    root: &Path,
    policy: &SelectionPolicy,
    progress: &mut dyn ProgressObserver,
    cancel: &CancelFlag,
) -> Result<CollectOutcome, ScanError> {
    collect_entries(root, policy, false, progress, cancel)
}

fn collect_entries(
    root: &Path,
    policy: &SelectionPolicy,
    embed_content: bool,
    progress: &mut dyn ProgressObserver,
    cancel: &CancelFlag,
) -> Result<CollectOutcome, ScanError> {
    if !root.is_dir() {
        return Err(ScanError::InvalidRoot {
            path: root.to_path_buf(),
        });
    }

    let mut entries = Vec::new();
    let mut summary = RunSummary::default();

    let walker = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| {
            if e.depth() == 0 || !e.file_type().is_dir() {
                return true;
            }
            let rel = relative_unix(root, e.path());
            policy.admits_dir(&e.file_name().to_string_lossy(), &rel)
        });

    for entry in walker {
        if cancel.is_cancelled() {
            info!("Scan cancelled after {} files", summary.included);
            break;
        }

        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!("Skipping unreadable directory entry: {}", err);
                summary.read_failures += 1;
                continue;
            }
        };

        if entry.file_type().is_dir() {
            continue;
        }

        let path = entry.path();
        let name = entry.file_name().to_string_lossy().into_owned();
        let rel = relative_unix(root, path);

        if policy.skip_symlinks && entry.path_is_symlink() {
            summary.excluded += 1;
            progress.file_visited(false);
            continue;
        }

        if !policy.admits_file(&name, &rel) {
            summary.excluded += 1;
            progress.file_visited(false);
            continue;
        }

        let content = if embed_content {
            match read_text_file(path) {
                Ok(text) => Some(text),
                Err(err) => {
                    if policy.strict_reads {
                        return Err(ScanError::FileRead {
                            path: path.to_path_buf(),
                            source: err,
                        });
                    }
                    warn!("Skipping unreadable file {}: {}", path.display(), err);
                    summary.read_failures += 1;
                    progress.file_visited(false);
                    continue;
                }
            }
        } else {
            None
        };

        progress.file_visited(true);
        summary.included += 1;
        entries.push(FileEntry {
            path: entry.into_path(),
            relative_path: rel,
            content,
        });
    }

    entries.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
    progress.finish();

    info!(
        "Collected {} files ({} excluded, {} read failures)",
        summary.included, summary.excluded, summary.read_failures
    );
    Ok(CollectOutcome { entries, summary })
}
