use colored::Colorize;
use std::collections::HashMap;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// How to settle a destination that already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Replace the existing file
    Overwrite,
    /// Keep the existing file and write under "<name> (k)"
    KeepAlongside,
    /// Leave the source untouched
    Skip,
}

impl Resolution {
    pub fn description(&self) -> &'static str {
        match self {
            Resolution::Overwrite => "overwrite",
            Resolution::KeepAlongside => "keep both",
            Resolution::Skip => "skip",
        }
    }
}

/// Source of collision decisions, asked once per conflicting destination.
pub trait DecisionProvider {
    fn decide(&mut self, destination: &Path) -> Resolution;
}

/// Always answers with the same decision. Used for headless runs.
#[derive(Debug, Clone, Copy)]
pub struct FixedDecision(pub Resolution);

impl DecisionProvider for FixedDecision {
    fn decide(&mut self, destination: &Path) -> Resolution {
        debug!(path = ?destination, decision = ?self.0, "Using preselected decision");
        self.0
    }
}

/// Asks on a terminal. An uppercase answer is remembered for the rest of
/// the run; unreadable input or end of input counts as skip.
pub struct PromptDecision<R, W> {
    input: R,
    output: W,
    remembered: Option<Resolution>,
}

impl<R: BufRead, W: Write> PromptDecision<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self {
            input,
            output,
            remembered: None,
        }
    }

    fn ask(&mut self, destination: &Path) -> std::io::Result<Option<(Resolution, bool)>> {
        loop {
            write!(
                self.output,
                "{} {}\n  {} ",
                "File already exists:".yellow().bold(),
                destination.display(),
                "[o]verwrite, [k]eep both, [s]kip (uppercase applies to all):".magenta()
            )?;
            self.output.flush()?;

            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                return Ok(None);
            }

            match parse_answer(line.trim()) {
                Some(answer) => return Ok(Some(answer)),
                None => writeln!(self.output, "Please answer o, k or s.")?,
            }
        }
    }
}

impl<R: BufRead, W: Write> DecisionProvider for PromptDecision<R, W> {
    fn decide(&mut self, destination: &Path) -> Resolution {
        if let Some(remembered) = self.remembered {
            return remembered;
        }

        match self.ask(destination) {
            Ok(Some((resolution, remember))) => {
                if remember {
                    info!("Applying '{}' to all remaining conflicts", resolution.description());
                    self.remembered = Some(resolution);
                }
                resolution
            }
            Ok(None) => {
                warn!("No answer for {}; skipping", destination.display());
                Resolution::Skip
            }
            Err(e) => {
                warn!("Could not read answer ({}); skipping", e);
                Resolution::Skip
            }
        }
    }
}

fn parse_answer(answer: &str) -> Option<(Resolution, bool)> {
    let resolution = match answer.to_ascii_lowercase().as_str() {
        "o" | "overwrite" => Resolution::Overwrite,
        "k" | "keep" => Resolution::KeepAlongside,
        "s" | "skip" => Resolution::Skip,
        _ => return None,
    };
    let remember = answer.chars().all(|c| c.is_ascii_uppercase());
    Some((resolution, remember))
}

/// Which paths this run has emptied or filled, layered over the filesystem.
///
/// A real run records moves after making them, a print-only run records the
/// moves it would make. Both then see the same directory when checking the
/// next destination.
#[derive(Debug, Default, Clone)]
pub struct PendingMoves {
    overlay: HashMap<PathBuf, bool>,
}

impl PendingMoves {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn exists(&self, path: &Path) -> bool {
        match self.overlay.get(path) {
            Some(present) => *present,
            None => path.exists(),
        }
    }

    pub fn record(&mut self, from: &Path, to: &Path) {
        self.overlay.insert(from.to_path_buf(), false);
        self.overlay.insert(to.to_path_buf(), true);
    }
}

pub struct CollisionResolver<'a> {
    provider: &'a mut dyn DecisionProvider,
}

impl<'a> CollisionResolver<'a> {
    pub fn new(provider: &'a mut dyn DecisionProvider) -> Self {
        Self { provider }
    }

    /// A free destination needs no decision and resolves to a plain move.
    pub fn resolve(&mut self, destination: &Path, moves: &PendingMoves) -> Resolution {
        if !moves.exists(destination) {
            return Resolution::Overwrite;
        }

        let resolution = self.provider.decide(destination);
        info!(
            "Destination exists: {} ({})",
            destination.display(),
            resolution.description()
        );
        resolution
    }
}

/// First free "<stem> (k).<ext>" next to `destination`.
pub fn alongside_path(destination: &Path, moves: &PendingMoves) -> PathBuf {
    let parent = destination.parent().unwrap_or_else(|| Path::new(""));
    let stem = destination
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let extension = destination
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    let mut k = 1u32;
    loop {
        let candidate = parent.join(format!("{} ({}){}", stem, k, extension));
        if !moves.exists(&candidate) {
            return candidate;
        }
        k += 1;
    }
}
