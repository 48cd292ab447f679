use crate::cli::report::run_report;
use crate::core::archiver::archive;
use crate::core::collector::collect;
use crate::core::snapshot::{archive_file_name, render_snapshot, snapshot_file_name};
use crate::domain::models::CancelFlag;
use crate::domain::policy::{PolicyConfig, SelectionPolicy, load_exclude_patterns};
use crate::infra::logger::setup_logger;
use crate::infra::output::create_writer;
use crate::infra::progress::ConsoleProgress;
use clap::{Parser, Subcommand};
use crossterm::{
    ExecutableCommand,
    style::{Color, ResetColor, SetForegroundColor},
};
use log::{debug, info};
use std::io::{self, Write};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "repo-snap")]
#[command(about = "Flatten a project tree into a text snapshot and a ZIP archive", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Collect matching files into <project>_contents.txt and <project>.zip
    Snapshot {
        /// Root directory of the project to scan
        #[arg(long)]
        path: String,

        /// Comma-separated allowed extensions; empty allows all
        #[arg(long, default_value = "")]
        ext: String,

        /// Comma-separated exclusion patterns (globs or path prefixes)
        #[arg(long, default_value = "")]
        exclude: String,

        /// File with one exclusion pattern per line; must exist when given
        #[arg(long)]
        exclude_file: Option<PathBuf>,

        /// Comma-separated file-name suffixes to always exclude
        #[arg(long, default_value = "")]
        deny_suffix: String,

        /// Emit only `File:` header lines, without content
        #[arg(long)]
        paths_only: bool,

        /// Skip producing the ZIP archive
        #[arg(long)]
        no_archive: bool,

        #[arg(long)]
        include_hidden: bool,

        #[arg(long)]
        include_binary: bool,

        /// Abort on the first unreadable file instead of skipping it
        #[arg(long)]
        strict: bool,

        /// Directory the artifacts are written to (default: current directory)
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Print the snapshot to stdout instead of writing a file
        #[arg(long)]
        stdout: bool,
    },
    /// Print a best-effort structural summary of a Rails-style project
    Report {
        #[arg(long)]
        path: String,
    },
}

fn split_csv(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn project_name(root: &PathBuf) -> String {
    root.canonicalize()
        .unwrap_or_else(|_| root.clone())
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "project".to_string())
}

pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logger(cli.verbose)?;

    match cli.command {
        Commands::Snapshot {
            path,
            ext,
            exclude,
            exclude_file,
            deny_suffix,
            paths_only,
            no_archive,
            include_hidden,
            include_binary,
            strict,
            output_dir,
            stdout,
        } => {
            info!("Starting snapshot command");
            debug!(
                "Parameters: path={}, ext={}, exclude={}, exclude_file={:?}, paths_only={}, no_archive={}",
                path, ext, exclude, exclude_file, paths_only, no_archive
            );

            let mut exclude_patterns = split_csv(&exclude);
            if let Some(file) = &exclude_file {
                exclude_patterns.extend(load_exclude_patterns(file)?);
            }

            let config = PolicyConfig {
                extensions: split_csv(&ext),
                exclude_patterns,
                skip_hidden: !include_hidden,
                skip_binary: !include_binary,
                skip_symlinks: true,
                deny_suffixes: split_csv(&deny_suffix),
                embed_content: !paths_only,
                strict_reads: strict,
            };

            run_snapshot(
                PathBuf::from(path),
                config,
                output_dir.unwrap_or_else(|| PathBuf::from(".")),
                no_archive,
                stdout,
            )?;
        }
        Commands::Report { path } => {
            info!("Starting report command");
            run_report(&PathBuf::from(path))?;
        }
    }
    Ok(())
}

fn run_snapshot(
    root: PathBuf,
    config: PolicyConfig,
    output_dir: PathBuf,
    no_archive: bool,
    to_stdout: bool,
) -> anyhow::Result<()> {
    let policy = SelectionPolicy::compile(config)?;
    let name = project_name(&root);
    let cancel = CancelFlag::new();

    info!("Scanning project '{}' at {}", name, root.display());
    let outcome = collect(&root, &policy, &mut ConsoleProgress::new(), &cancel)?;

    let snapshot = render_snapshot(&outcome.entries);
    let snapshot_path = output_dir.join(snapshot_file_name(&name));
    let writer = create_writer(if to_stdout { None } else { Some(snapshot_path.clone()) });
    writer.write(&snapshot)?;

    if !no_archive {
        let archive_path = output_dir.join(archive_file_name(&name));
        let summary = archive(
            &root,
            &policy,
            &archive_path,
            &mut ConsoleProgress::new(),
            &cancel,
        )?;
        info!(
            "Archive written: {} ({} entries)",
            summary.destination.display(),
            summary.entries
        );
    }

    let mut stdout = io::stdout();
    stdout.execute(SetForegroundColor(Color::Green))?;
    writeln!(
        stdout,
        "✓ {} files included, {} excluded, {} read failures",
        outcome.summary.included, outcome.summary.excluded, outcome.summary.read_failures
    )?;
    stdout.execute(ResetColor)?;

    Ok(())
}
