//! Per-run settings shared read-only by every engine component.
//!
//! `ShowContextBuilder` is the only place raw user values are interpreted.
//! Anything malformed is dropped with a warning and the default takes its
//! place, so building a context never fails.

use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// The container extension produced by the ripping tool.
pub const MEDIA_EXTENSION: &str = "mkv";

// Release year suffix on show folders, e.g. "Doctor Who (2005)"
static YEAR_SUFFIX_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s\(\d{4}\)$").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeasonMode {
    /// Episodes live directly in the show root
    Flat,
    /// Episodes live in "Season N" subdirectories
    Seasoned,
}

/// What to do with a source file that cannot be opened exclusively
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnreadablePolicy {
    Abort,
    Skip,
}

#[derive(Debug, Clone)]
pub struct ShowContext {
    pub show_name: String,
    pub root: PathBuf,
    pub season_mode: SeasonMode,
    pub first_episode: Option<u32>,
    /// Treat every file as unformatted and renumber all of them
    pub force: bool,
    pub print_only: bool,
    pub unreadable: UnreadablePolicy,
    pub season_filter: Option<Regex>,
    pub episode_filter: Option<Regex>,
}

impl ShowContext {
    pub fn builder(working_dir: impl Into<PathBuf>) -> ShowContextBuilder {
        ShowContextBuilder::new(working_dir.into())
    }

    pub fn is_seasoned(&self) -> bool {
        self.season_mode == SeasonMode::Seasoned
    }
}

#[derive(Debug, Clone)]
pub struct ShowContextBuilder {
    working_dir: PathBuf,
    show_name: Option<String>,
    root: Option<PathBuf>,
    season_mode: SeasonMode,
    first_episode: Option<String>,
    force: bool,
    print_only: bool,
    ignore_unreadable: bool,
    season_filter: Option<String>,
    episode_filter: Option<String>,
}

impl ShowContextBuilder {
    fn new(working_dir: PathBuf) -> Self {
        Self {
            working_dir,
            show_name: None,
            root: None,
            season_mode: SeasonMode::Seasoned,
            first_episode: None,
            force: false,
            print_only: false,
            ignore_unreadable: false,
            season_filter: None,
            episode_filter: None,
        }
    }

    pub fn show_name(mut self, name: Option<String>) -> Self {
        self.show_name = name.filter(|n| !n.trim().is_empty());
        self
    }

    pub fn root(mut self, dir: Option<PathBuf>) -> Self {
        self.root = dir;
        self
    }

    pub fn season_mode(mut self, mode: SeasonMode) -> Self {
        self.season_mode = mode;
        self
    }

    pub fn first_episode(mut self, raw: Option<String>) -> Self {
        self.first_episode = raw;
        self
    }

    pub fn force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    pub fn print_only(mut self, print_only: bool) -> Self {
        self.print_only = print_only;
        self
    }

    pub fn ignore_unreadable(mut self, ignore: bool) -> Self {
        self.ignore_unreadable = ignore;
        self
    }

    pub fn season_filter(mut self, raw: Option<String>) -> Self {
        self.season_filter = raw;
        self
    }

    pub fn episode_filter(mut self, raw: Option<String>) -> Self {
        self.episode_filter = raw;
        self
    }

    pub fn build(self) -> ShowContext {
        let root = self.resolve_root();
        let root = fs::canonicalize(&root).unwrap_or(root);

        let show_name = match self.show_name {
            Some(name) => name,
            None => default_show_name(&root),
        };
        debug!(show = %show_name, root = ?root, "Resolved show context");

        let first_episode = self.first_episode.as_deref().and_then(parse_first_episode);

        let season_filter = self
            .season_filter
            .as_deref()
            .and_then(|raw| compile_filter("season", raw));
        if season_filter.is_some() && self.season_mode == SeasonMode::Flat {
            warn!("Season filter has no effect without seasons; ignoring it");
        }
        let season_filter = season_filter.filter(|_| self.season_mode == SeasonMode::Seasoned);

        let episode_filter = self
            .episode_filter
            .as_deref()
            .and_then(|raw| compile_filter("episode", raw));

        let unreadable = if self.ignore_unreadable {
            UnreadablePolicy::Skip
        } else {
            UnreadablePolicy::Abort
        };

        ShowContext {
            show_name,
            root,
            season_mode: self.season_mode,
            first_episode,
            force: self.force,
            print_only: self.print_only,
            unreadable,
            season_filter,
            episode_filter,
        }
    }

    fn resolve_root(&self) -> PathBuf {
        if let Some(dir) = &self.root {
            let candidate = if dir.is_absolute() {
                dir.clone()
            } else {
                self.working_dir.join(dir)
            };

            if candidate.is_dir() {
                return candidate;
            }

            warn!(
                "Directory {} does not exist or is not a directory; using {}",
                dir.display(),
                self.working_dir.display()
            );
            return self.working_dir.clone();
        }

        // A show name that is also a folder here selects that folder
        if let Some(name) = &self.show_name {
            let candidate = self.working_dir.join(name);
            if candidate.is_dir() {
                debug!(dir = ?candidate, "Using show folder as root");
                return candidate;
            }
        }

        self.working_dir.clone()
    }
}

/// Derive a show name from the root folder, dropping a trailing " (YYYY)".
pub fn default_show_name(root: &Path) -> String {
    let base = root
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    YEAR_SUFFIX_REGEX.replace(&base, "").to_string()
}

fn parse_first_episode(raw: &str) -> Option<u32> {
    match raw.trim().parse::<u32>() {
        Ok(n) => Some(n),
        Err(_) => {
            warn!(
                "Expected a non-negative whole number for the first episode, got '{}'; ignoring it",
                raw
            );
            None
        }
    }
}

fn compile_filter(kind: &str, raw: &str) -> Option<Regex> {
    match Regex::new(raw) {
        Ok(re) => Some(re),
        Err(e) => {
            warn!("Invalid {} filter '{}': {}; ignoring it", kind, raw, e);
            None
        }
    }
}
