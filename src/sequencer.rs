use std::path::PathBuf;
use tracing::debug;

use crate::matcher::NameMatcher;
use crate::scanner::file_name;

/// Next episode number to hand out within one season unit.
///
/// Only moves forward, one step per file actually renamed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EpisodeCounter {
    next: u32,
}

impl EpisodeCounter {
    pub fn starting_at(next: u32) -> Self {
        Self { next: next.max(1) }
    }

    pub fn current(&self) -> u32 {
        self.next
    }

    pub fn advance(&mut self) {
        self.next = self.next.saturating_add(1);
    }
}

/// First episode number that cannot clash with existing canonical files:
/// `max(highest existing + 1, first_episode or 1)`.
pub fn next_starting_number(
    files: &[PathBuf],
    matcher: &NameMatcher,
    first_episode: Option<u32>,
) -> u32 {
    let highest = files
        .iter()
        .filter_map(|path| matcher.episode_number(&file_name(path)))
        .max()
        .unwrap_or(0);

    let start = highest.saturating_add(1).max(first_episode.unwrap_or(1));

    debug!(
        season = ?matcher.season(),
        highest,
        override_ = ?first_episode,
        start,
        "Computed starting episode"
    );

    start
}
