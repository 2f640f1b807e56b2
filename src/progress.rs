//! Progress output for user-facing status updates.
//!
//! Lines go to stderr so the summary on stdout stays clean. Colors follow
//! `NO_COLOR` / `FORCE_COLOR` and whether stderr is a terminal.

use colored::Colorize;
use std::io::{self, IsTerminal, Write};
use std::path::Path;

/// Progress reporter for user-facing output
pub struct Progress {
    writer: Box<dyn Write>,
    /// When true, all output is suppressed
    silent: bool,
    /// When true, output is colorized
    colors_enabled: bool,
}

/// Check if we should use colors in output
fn should_use_colors() -> bool {
    if std::env::var("NO_COLOR").is_ok() {
        return false;
    }
    if std::env::var("FORCE_COLOR").is_ok() {
        return true;
    }
    io::stderr().is_terminal()
}

impl Default for Progress {
    fn default() -> Self {
        Self::new()
    }
}

impl Progress {
    /// Create a new progress reporter writing to stderr
    pub fn new() -> Self {
        let colors_enabled = should_use_colors();
        Self {
            writer: Box::new(io::stderr()),
            silent: false,
            colors_enabled,
        }
    }

    /// Create a progress reporter with a custom writer (for testing)
    #[cfg(test)]
    pub fn with_writer(writer: Box<dyn Write>) -> Self {
        Self {
            writer,
            silent: false,
            colors_enabled: false,
        }
    }

    /// Create a silent progress reporter
    pub fn silent() -> Self {
        Self {
            writer: Box::new(io::sink()),
            silent: true,
            colors_enabled: false,
        }
    }

    /// Report the start of a season unit
    pub fn unit_start(&mut self, label: &str, pending: usize, first_episode: u32) {
        if self.silent {
            return;
        }
        let _ = writeln!(self.writer);
        let line = format!(
            "{}: {} file(s) to convert, starting at episode {}",
            label, pending, first_episode
        );
        if self.colors_enabled {
            let _ = writeln!(self.writer, "{}", line.bold());
        } else {
            let _ = writeln!(self.writer, "{}", line);
        }
    }

    /// Report progress on a single rename
    pub fn rename_progress(&mut self, current: usize, total: usize, from: &str, to: &str) {
        self.arrow_line(current, total, from, to);
    }

    /// Report a destination conflict and how it was settled
    pub fn collision(&mut self, destination: &str, decision: &str) {
        self.warn(&format!("{} already exists ({})", destination, decision));
    }

    /// Report a source file that could not be opened and was passed over
    pub fn skipped_unreadable(&mut self, path: &Path) {
        self.warn(&format!(
            "Cannot access {}; it might still be being written. Skipping.",
            path.display()
        ));
    }

    /// Report an error during operation (non-fatal)
    pub fn warn(&mut self, message: &str) {
        if self.silent {
            return;
        }
        if self.colors_enabled {
            let _ = writeln!(self.writer, "{} {}", "!".yellow().bold(), message.yellow());
        } else {
            let _ = writeln!(self.writer, "Warning: {}", message);
        }
    }

    /// Report ledger file written
    pub fn ledger_written(&mut self, path: &Path) {
        if self.silent {
            return;
        }
        if self.colors_enabled {
            let _ = writeln!(
                self.writer,
                "{}",
                format!("Ledger saved to: {}", path.display()).dimmed()
            );
        } else {
            let _ = writeln!(self.writer, "Ledger saved to: {}", path.display());
        }
    }

    /// Report starting to undo one ledger
    pub fn undo_start(&mut self, ledger_name: &str, total: usize) {
        if self.silent {
            return;
        }
        let _ = writeln!(self.writer);
        let line = format!("Undoing {} rename(s) from {}", total, ledger_name);
        if self.colors_enabled {
            let _ = writeln!(self.writer, "{}", line.bold());
        } else {
            let _ = writeln!(self.writer, "{}", line);
        }
    }

    /// Report progress on a single reversal
    pub fn undo_progress(&mut self, current: usize, total: usize, from: &str, to: &str) {
        self.arrow_line(current, total, from, to);
    }

    fn arrow_line(&mut self, current: usize, total: usize, from: &str, to: &str) {
        if self.silent {
            return;
        }
        if self.colors_enabled {
            let counter = format!("[{}/{}]", current, total);
            let _ = writeln!(
                self.writer,
                "{} {} {} {}",
                counter.cyan(),
                from.dimmed(),
                "→".cyan(),
                to
            );
        } else {
            let _ = writeln!(self.writer, "[{}/{}] {} -> {}", current, total, from, to);
        }
    }
}
