use std::io::{self, Write};
use std::time::{Duration, Instant};

use crossterm::{
    ExecutableCommand, cursor,
    terminal::{Clear, ClearType},
};

/// Injected observer invoked at well-defined points of a run: once per file
/// visited by the walk and once per file written to the archive. Keeps
/// progress reporting out of the pipeline itself.
pub trait ProgressObserver {
    fn file_visited(&mut self, matched: bool);
    fn file_archived(&mut self, entry_name: &str);
    fn finish(&mut self);
}

/// No-op observer for library callers and tests.
pub struct SilentProgress;

impl ProgressObserver for SilentProgress {
    fn file_visited(&mut self, _matched: bool) {}
    fn file_archived(&mut self, _entry_name: &str) {}
    fn finish(&mut self) {}
}

/// Console spinner that rewrites a single status line while the walk runs.
pub struct ConsoleProgress {
    start_time: Instant,
    update_interval: Duration,
    last_update: Instant,
    scanned_count: usize,
    matched_count: usize,
    archived_count: usize,
}

impl ConsoleProgress {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            update_interval: Duration::from_millis(250),
            last_update: Instant::now(),
            scanned_count: 0,
            matched_count: 0,
            archived_count: 0,
        }
    }

    fn redraw(&mut self) -> io::Result<()> {
        let now = Instant::now();
        if now.duration_since(self.last_update) < self.update_interval {
            return Ok(());
        }
        self.last_update = now;

        let elapsed = now.duration_since(self.start_time).as_secs_f32();
        let files_per_sec = if elapsed > 0.0 {
            self.scanned_count as f32 / elapsed
        } else {
            0.0
        };

        let spinner_chars = ['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];
        let spinner_idx =
            ((now.duration_since(self.start_time).as_millis() / 100) % spinner_chars.len() as u128) as usize;

        let mut stdout = io::stdout();
        stdout.execute(cursor::SavePosition)?;
        stdout.execute(Clear(ClearType::CurrentLine))?;
        write!(
            stdout,
            "{} Scanning: {} visited, {} selected ({:.1} files/sec)",
            spinner_chars[spinner_idx], self.scanned_count, self.matched_count, files_per_sec
        )?;
        stdout.flush()?;
        stdout.execute(cursor::RestorePosition)?;
        Ok(())
    }

    fn summarize(&self) -> io::Result<()> {
        let elapsed = self.start_time.elapsed().as_secs_f32();
        let mut stdout = io::stdout();
        stdout.execute(Clear(ClearType::CurrentLine))?;
        writeln!(
            stdout,
            "✓ {} files visited, {} selected, {} archived in {:.1}s",
            self.scanned_count, self.matched_count, self.archived_count, elapsed
        )?;
        Ok(())
    }
}

impl Default for ConsoleProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressObserver for ConsoleProgress {
    fn file_visited(&mut self, matched: bool) {
        self.scanned_count += 1;
        if matched {
            self.matched_count += 1;
        }
        // A terminal that rejects cursor commands should not kill the run.
        let _ = self.redraw();
    }

    fn file_archived(&mut self, _entry_name: &str) {
        self.archived_count += 1;
        let _ = self.redraw();
    }

    fn finish(&mut self) {
        let _ = self.summarize();
    }
}
