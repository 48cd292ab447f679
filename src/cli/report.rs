use std::io::{self, Write};
use std::path::Path;

use crossterm::{
    ExecutableCommand,
    style::{Color, ResetColor, SetForegroundColor},
};
use log::{debug, warn};

use crate::core::collector::enumerate;
use crate::domain::errors::ScanError;
use crate::domain::models::CancelFlag;
use crate::domain::policy::{PolicyConfig, SelectionPolicy};
use crate::infra::file_system::read_text_file;
use crate::infra::progress::SilentProgress;

/// Well-known files dumped verbatim when present.
const KNOWN_FILES: &[&str] = &["config/routes.rb", "Gemfile"];

/// Well-known subdirectories whose file names are listed.
const KNOWN_DIRS: &[&str] = &["app/controllers", "app/models", "app/views"];

/// Prints a structural summary of a Rails-style project: the routes file and
/// dependency manifest, plus file listings for the conventional app
/// subdirectories. Everything is best effort; absent pieces are skipped.
pub fn run_report(root: &Path) -> anyhow::Result<()> {
    if !root.is_dir() {
        return Err(ScanError::InvalidRoot {
            path: root.to_path_buf(),
        }
        .into());
    }

    let name = root
        .canonicalize()
        .unwrap_or_else(|_| root.to_path_buf())
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "project".to_string());

    let mut stdout = io::stdout();
    stdout.execute(SetForegroundColor(Color::Cyan))?;
    writeln!(stdout, "Analyzing Ruby on Rails project: {name}")?;
    stdout.execute(ResetColor)?;
    writeln!(stdout)?;

    for rel in KNOWN_FILES {
        let path = root.join(rel);
        if !path.is_file() {
            debug!("Well-known file absent, skipping: {}", path.display());
            continue;
        }
        match read_text_file(&path) {
            Ok(contents) => {
                writeln!(stdout, "--- {rel} ---")?;
                writeln!(stdout, "{contents}")?;
            }
            Err(err) => warn!("Cannot read {}: {}", path.display(), err),
        }
    }

    for rel in KNOWN_DIRS {
        let dir = root.join(rel);
        if !dir.is_dir() {
            debug!("Well-known directory absent, skipping: {}", dir.display());
            continue;
        }

        let policy = SelectionPolicy::compile(PolicyConfig {
            embed_content: false,
            ..PolicyConfig::default()
        })?;
        let outcome = enumerate(&dir, &policy, &mut SilentProgress, &CancelFlag::new())?;

        writeln!(stdout, "{rel}:")?;
        for entry in &outcome.entries {
            writeln!(stdout, "  {}", entry.relative_path)?;
        }
        writeln!(stdout)?;
    }

    Ok(())
}
