use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use log::{debug, info};
use zip::CompressionMethod;
use zip::write::{SimpleFileOptions, ZipWriter};

use crate::core::collector::enumerate;
use crate::domain::errors::ScanError;
use crate::domain::models::{ArchiveSummary, CancelFlag};
use crate::domain::policy::SelectionPolicy;
use crate::infra::progress::{ProgressObserver, SilentProgress};

fn write_error(
    destination: &Path,
    source: impl std::error::Error + Send + Sync + 'static,
) -> ScanError {
    ScanError::ArchiveWrite {
        path: destination.to_path_buf(),
        source: Box::new(source),
    }
}

/// Packs every file admitted by `policy` into a deflate ZIP at `destination`,
/// entry names relative to `root` with forward-slash separators.
///
/// The filter is the same one the collector applies, so the archive's entry
/// set always equals the snapshot's path set for matching inputs. The archive
/// is written to a temporary sibling and renamed into place: on any entry
/// failure the temporary file is removed and no output is left behind. A
/// pre-existing destination is deleted and fully rewritten, with a notice.
pub fn archive(
    root: &Path,
    policy: &SelectionPolicy,
    destination: &Path,
    progress: &mut dyn ProgressObserver,
    cancel: &CancelFlag,
) -> Result<ArchiveSummary, ScanError> {
    let outcome = enumerate(root, policy, &mut SilentProgress, cancel)?;

    if destination.exists() {
        info!(
            "Destination '{}' already exists and will be overwritten",
            destination.display()
        );
    }

    let mut tmp_os = destination.as_os_str().to_owned();
    tmp_os.push(".tmp");
    let tmp_path = PathBuf::from(tmp_os);

    match write_entries(&outcome.entries, &tmp_path, destination, progress) {
        Ok(uncompressed_bytes) => {
            if destination.exists() {
                fs::remove_file(destination).map_err(|e| write_error(destination, e))?;
            }
            fs::rename(&tmp_path, destination).map_err(|e| write_error(destination, e))?;
            progress.finish();
            info!(
                "Archived {} files ({} bytes) to {}",
                outcome.entries.len(),
                uncompressed_bytes,
                destination.display()
            );
            Ok(ArchiveSummary {
                destination: destination.to_path_buf(),
                entries: outcome.entries.len(),
                uncompressed_bytes,
            })
        }
        Err(err) => {
            let _ = fs::remove_file(&tmp_path);
            Err(err)
        }
    }
}

fn write_entries(
    entries: &[crate::domain::models::FileEntry],
    tmp_path: &Path,
    destination: &Path,
    progress: &mut dyn ProgressObserver,
) -> Result<u64, ScanError> {
    let file = fs::File::create(tmp_path).map_err(|e| write_error(destination, e))?;
    let mut zip = ZipWriter::new(io::BufWriter::new(file));
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .unix_permissions(0o644);

    let mut total = 0u64;
    for entry in entries {
        debug!("Archiving entry: {}", entry.relative_path);
        zip.start_file(entry.relative_path.as_str(), options)
            .map_err(|e| write_error(destination, e))?;
        let mut reader = fs::File::open(&entry.path).map_err(|e| write_error(destination, e))?;
        // Streams in bounded chunks; one file's bytes in memory at a time.
        total += io::copy(&mut reader, &mut zip).map_err(|e| write_error(destination, e))?;
        progress.file_archived(&entry.relative_path);
    }

    zip.finish()
        .map_err(|e| write_error(destination, e))?
        .flush()
        .map_err(|e| write_error(destination, e))?;
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::collector::collect;
    use crate::domain::policy::PolicyConfig;
    use std::collections::BTreeSet;
    use std::io::Read;
    use tempfile::TempDir;

    fn write_file(root: &Path, rel: &str, bytes: &[u8]) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, bytes).unwrap();
    }

    fn default_policy() -> SelectionPolicy {
        SelectionPolicy::compile(PolicyConfig::default()).unwrap()
    }

    fn entry_names(path: &Path) -> BTreeSet<String> {
        let zip = zip::ZipArchive::new(fs::File::open(path).unwrap()).unwrap();
        zip.file_names().map(str::to_string).collect()
    }

    #[test]
    fn test_archive_set_equals_snapshot_set() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        write_file(root, "app/models/user.rb", b"class User\nend\n");
        write_file(root, "app/assets/logo.png", &[0x89, 0x50, 0x4E, 0x47]);
        write_file(root, ".git/config", b"[core]\n");
        write_file(root, "lib/file.rb", b"lib\n");

        let policy = default_policy();
        let dest = temp_dir.path().join("out.zip");
        let cancel = CancelFlag::new();

        let collected = collect(root, &policy, &mut SilentProgress, &cancel).unwrap();
        let summary = archive(root, &policy, &dest, &mut SilentProgress, &cancel).unwrap();

        let snapshot_set: BTreeSet<String> = collected
            .entries
            .iter()
            .map(|e| e.relative_path.clone())
            .collect();
        assert_eq!(entry_names(&dest), snapshot_set);
        assert_eq!(summary.entries, snapshot_set.len());
    }

    #[test]
    fn test_entry_names_use_forward_slashes() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        write_file(root, "app/models/user.rb", b"class User\nend\n");

        let dest = temp_dir.path().join("out.zip");
        archive(root, &default_policy(), &dest, &mut SilentProgress, &CancelFlag::new()).unwrap();

        let names = entry_names(&dest);
        assert!(names.contains("app/models/user.rb"));
    }

    #[test]
    fn test_existing_destination_is_overwritten() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("project");
        write_file(&root, "lib/file.rb", b"lib\n");

        let dest = temp_dir.path().join("out.zip");
        fs::write(&dest, b"stale bytes, not a zip").unwrap();

        let summary =
            archive(&root, &default_policy(), &dest, &mut SilentProgress, &CancelFlag::new())
                .unwrap();
        assert_eq!(summary.entries, 1);
        assert!(entry_names(&dest).contains("lib/file.rb"));
    }

    #[test]
    fn test_no_temporary_file_left_behind() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("project");
        write_file(&root, "lib/file.rb", b"lib\n");

        let dest = temp_dir.path().join("out.zip");
        archive(&root, &default_policy(), &dest, &mut SilentProgress, &CancelFlag::new()).unwrap();

        let mut tmp_os = dest.as_os_str().to_owned();
        tmp_os.push(".tmp");
        assert!(!PathBuf::from(tmp_os).exists());
    }

    #[test]
    fn test_invalid_root_fails_before_touching_destination() {
        let temp_dir = TempDir::new().unwrap();
        let dest = temp_dir.path().join("out.zip");

        let err = archive(
            &temp_dir.path().join("missing"),
            &default_policy(),
            &dest,
            &mut SilentProgress,
            &CancelFlag::new(),
        )
        .unwrap_err();
        assert!(matches!(err, ScanError::InvalidRoot { .. }));
        assert!(!dest.exists());
    }

    #[test]
    fn test_entry_content_round_trips() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("project");
        write_file(&root, "lib/file.rb", b"puts 'hi'\n");

        let dest = temp_dir.path().join("out.zip");
        archive(&root, &default_policy(), &dest, &mut SilentProgress, &CancelFlag::new()).unwrap();

        let mut zip = zip::ZipArchive::new(fs::File::open(&dest).unwrap()).unwrap();
        let mut content = String::new();
        zip.by_name("lib/file.rb")
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        assert_eq!(content, "puts 'hi'\n");
    }
}
