use std::fs;
use std::io::BufRead;
use std::path::{Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};
use log::{debug, info};

use crate::domain::errors::ScanError;

/// Plain configuration assembled once from CLI input, then compiled into a
/// [`SelectionPolicy`].
#[derive(Debug, Clone)]
pub struct PolicyConfig {
    /// Allowed extensions without a leading dot; empty means allow all.
    pub extensions: Vec<String>,
    /// Exclusion patterns, see [`SelectionPolicy`] for the dialect.
    pub exclude_patterns: Vec<String>,
    pub skip_hidden: bool,
    pub skip_binary: bool,
    pub skip_symlinks: bool,
    /// File-name suffixes that are always excluded, e.g. `.local.yml`.
    pub deny_suffixes: Vec<String>,
    pub embed_content: bool,
    /// Abort the run on an unreadable file instead of skipping it.
    pub strict_reads: bool,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            extensions: Vec::new(),
            exclude_patterns: Vec::new(),
            skip_hidden: true,
            skip_binary: true,
            skip_symlinks: true,
            deny_suffixes: Vec::new(),
            embed_content: true,
            strict_reads: false,
        }
    }
}

/// The inclusion/exclusion rule set applied uniformly by the collector and
/// the archiver. Immutable once compiled.
///
/// Exclusion patterns are shell globs (the `globset` dialect) matched against
/// the forward-slash path relative to the scan root. A pattern without glob
/// metacharacters is treated as a path prefix at a component boundary:
/// `vendor` matches `vendor` and everything below `vendor/`, but never
/// `vendor2/`.
#[derive(Debug)]
pub struct SelectionPolicy {
    extensions: Vec<String>,
    exclude: GlobSet,
    pub skip_hidden: bool,
    pub skip_binary: bool,
    pub skip_symlinks: bool,
    deny_suffixes: Vec<String>,
    pub embed_content: bool,
    pub strict_reads: bool,
}

fn is_literal_pattern(pattern: &str) -> bool {
    !pattern.chars().any(|c| matches!(c, '*' | '?' | '[' | ']' | '{' | '}'))
}

fn compile_patterns(patterns: &[String]) -> Result<GlobSet, globset::Error> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let pattern = pattern.trim().trim_end_matches('/');
        if pattern.is_empty() {
            continue;
        }
        if is_literal_pattern(pattern) {
            builder.add(Glob::new(pattern)?);
            builder.add(Glob::new(&format!("{pattern}/**"))?);
        } else {
            builder.add(Glob::new(pattern)?);
        }
    }
    builder.build()
}

impl SelectionPolicy {
    pub fn compile(config: PolicyConfig) -> Result<Self, ScanError> {
        debug!("Compiling selection policy: {:?}", config);
        let exclude =
            compile_patterns(&config.exclude_patterns).map_err(|e| ScanError::PolicyLoad {
                path: PathBuf::from("<exclude patterns>"),
                source: Box::new(e),
            })?;

        let extensions = config
            .extensions
            .iter()
            .map(|e| e.trim().trim_start_matches('.').to_string())
            .filter(|e| !e.is_empty())
            .collect();

        Ok(Self {
            extensions,
            exclude,
            skip_hidden: config.skip_hidden,
            skip_binary: config.skip_binary,
            skip_symlinks: config.skip_symlinks,
            deny_suffixes: config.deny_suffixes,
            embed_content: config.embed_content,
            strict_reads: config.strict_reads,
        })
    }

    pub fn is_excluded(&self, relative_path: &str) -> bool {
        self.exclude.is_match(Path::new(relative_path))
    }

    /// Whether the walk may descend into a directory. Excluded and hidden
    /// directories are pruned here, before anything inside them is opened.
    pub fn admits_dir(&self, name: &str, relative_path: &str) -> bool {
        if self.skip_hidden && name.starts_with('.') {
            debug!("Pruning hidden directory: {}", relative_path);
            return false;
        }
        if self.is_excluded(relative_path) {
            debug!("Pruning excluded directory: {}", relative_path);
            return false;
        }
        true
    }

    /// Per-file inclusion check; directory-level rules have already pruned
    /// the path's ancestors by the time this runs.
    pub fn admits_file(&self, name: &str, relative_path: &str) -> bool {
        if self.skip_hidden && name.starts_with('.') {
            debug!("Skipping hidden file: {}", relative_path);
            return false;
        }
        if self.is_excluded(relative_path) {
            debug!("Skipping excluded file: {}", relative_path);
            return false;
        }
        if self.deny_suffixes.iter().any(|s| name.ends_with(s.as_str())) {
            debug!("Skipping denylisted suffix: {}", relative_path);
            return false;
        }
        if !self.extensions.is_empty() {
            let matched = Path::new(name)
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| self.extensions.iter().any(|allowed| allowed == e))
                .unwrap_or(false);
            if !matched {
                debug!("Skipping by extension: {}", relative_path);
                return false;
            }
        }
        if self.skip_binary && is_binary_name(name) {
            debug!("Skipping binary file: {}", relative_path);
            return false;
        }
        true
    }
}

/// Binary classification by file-name-derived media type: binary iff a media
/// type is recognized and it is not `text/*`. An unknown extension is treated
/// as text, the permissive default source files with uncommon extensions need.
pub fn is_binary_name(name: &str) -> bool {
    match mime_guess::from_path(name).first() {
        Some(mime) => mime.type_() != mime_guess::mime::TEXT,
        None => false,
    }
}

/// Loads exclusion patterns from a file, one per line. Blank lines and lines
/// starting with `#` are ignored.
pub fn load_exclude_patterns(path: &Path) -> Result<Vec<String>, ScanError> {
    let file = fs::File::open(path).map_err(|e| ScanError::PolicyLoad {
        path: path.to_path_buf(),
        source: Box::new(e),
    })?;

    let mut patterns = Vec::new();
    for line in std::io::BufReader::new(file).lines() {
        let line = line.map_err(|e| ScanError::PolicyLoad {
            path: path.to_path_buf(),
            source: Box::new(e),
        })?;
        let trimmed = line.trim();
        if !trimmed.is_empty() && !trimmed.starts_with('#') {
            patterns.push(trimmed.to_string());
        }
    }

    info!("Loaded {} exclusion patterns from {}", patterns.len(), path.display());
    Ok(patterns)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn policy(config: PolicyConfig) -> SelectionPolicy {
        SelectionPolicy::compile(config).unwrap()
    }

    #[test]
    fn test_literal_pattern_is_component_prefix() {
        let p = policy(PolicyConfig {
            exclude_patterns: vec!["vendor".to_string()],
            ..PolicyConfig::default()
        });

        assert!(p.is_excluded("vendor"));
        assert!(p.is_excluded("vendor/gem/file.rb"));
        assert!(!p.is_excluded("vendor2/file.rb"));
        assert!(!p.is_excluded("lib/file.rb"));
    }

    #[test]
    fn test_trailing_slash_pattern() {
        let p = policy(PolicyConfig {
            exclude_patterns: vec!["node_modules/".to_string()],
            ..PolicyConfig::default()
        });

        assert!(p.is_excluded("node_modules/pkg/index.js"));
        assert!(!p.is_excluded("node_modules_backup/index.js"));
    }

    #[test]
    fn test_glob_pattern() {
        let p = policy(PolicyConfig {
            exclude_patterns: vec!["*.log".to_string()],
            ..PolicyConfig::default()
        });

        assert!(p.is_excluded("server.log"));
        assert!(p.is_excluded("logs/server.log"));
        assert!(!p.is_excluded("server.rb"));
    }

    #[test]
    fn test_hidden_and_suffix_rules() {
        let p = policy(PolicyConfig {
            deny_suffixes: vec![".local.txt".to_string()],
            ..PolicyConfig::default()
        });

        assert!(!p.admits_dir(".git", ".git"));
        assert!(!p.admits_file(".env", ".env"));
        assert!(!p.admits_file("database.local.txt", "config/database.local.txt"));
        assert!(p.admits_file("database.txt", "config/database.txt"));
    }

    #[test]
    fn test_extension_filter() {
        // Binary skipping off so only the extension rule is exercised.
        let p = policy(PolicyConfig {
            extensions: vec![".rb".to_string(), "erb".to_string()],
            skip_binary: false,
            ..PolicyConfig::default()
        });

        assert!(p.admits_file("user.rb", "app/models/user.rb"));
        assert!(p.admits_file("index.html.erb", "app/views/index.html.erb"));
        assert!(!p.admits_file("main.py", "main.py"));
        assert!(!p.admits_file("Makefile", "Makefile"));
    }

    #[test]
    fn test_binary_classification() {
        assert!(is_binary_name("logo.png"));
        assert!(is_binary_name("archive.zip"));
        assert!(!is_binary_name("notes.txt"));
        // Unknown media type is permissive.
        assert!(!is_binary_name("user.rb"));

        let lenient = policy(PolicyConfig {
            skip_binary: false,
            ..PolicyConfig::default()
        });
        assert!(lenient.admits_file("logo.png", "assets/logo.png"));

        let strict = policy(PolicyConfig::default());
        assert!(!strict.admits_file("logo.png", "assets/logo.png"));
    }

    #[test]
    fn test_load_exclude_patterns() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("exclude.txt");

        {
            let mut file = fs::File::create(&file_path).unwrap();
            writeln!(file, "# comment").unwrap();
            writeln!(file, "vendor/").unwrap();
            writeln!(file).unwrap();
            writeln!(file, "*.log").unwrap();
        }

        let patterns = load_exclude_patterns(&file_path).unwrap();
        assert_eq!(patterns, vec!["vendor/".to_string(), "*.log".to_string()]);
    }

    #[test]
    fn test_load_exclude_patterns_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("nope.txt");

        let err = load_exclude_patterns(&missing).unwrap_err();
        assert!(matches!(err, ScanError::PolicyLoad { .. }));
        assert!(err.to_string().contains("nope.txt"));
    }
}
