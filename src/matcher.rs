use regex::Regex;
use std::path::Path;
use tracing::{trace, warn};

/// Recognizes file names already in "<show> [s<season>]e<episode>" form.
///
/// The show name goes into the pattern as written, without escaping. Names
/// containing regex metacharacters such as `(`, `.` or `+` can therefore
/// miss or over-match; only a name that does not compile at all is escaped.
#[derive(Debug, Clone)]
pub struct NameMatcher {
    pattern: Regex,
    season: Option<u32>,
    force: bool,
}

impl NameMatcher {
    pub fn new(show_name: &str, season: Option<u32>, force: bool) -> Self {
        let pattern = Regex::new(&canonical_pattern(show_name, season)).unwrap_or_else(|e| {
            warn!(
                "Show name '{}' is not usable as a pattern ({}); matching it literally",
                show_name, e
            );
            Regex::new(&canonical_pattern(&regex::escape(show_name), season))
                .unwrap_or_else(|_| Regex::new("$^").unwrap())
        });

        Self {
            pattern,
            season,
            force,
        }
    }

    pub fn season(&self) -> Option<u32> {
        self.season
    }

    /// True when `file_name` needs no conversion. Always false under force.
    pub fn is_canonical(&self, file_name: &str) -> bool {
        if self.force {
            return false;
        }

        let matched = self.pattern.is_match(stem(file_name));
        trace!(file = %file_name, matched, "Canonical check");
        matched
    }

    /// Episode number of a canonical file name.
    pub fn episode_number(&self, file_name: &str) -> Option<u32> {
        if self.force {
            return None;
        }

        self.pattern
            .captures(stem(file_name))
            .and_then(|caps| caps.name("episode"))
            .and_then(|m| m.as_str().parse().ok())
    }
}

fn canonical_pattern(show_name: &str, season: Option<u32>) -> String {
    match season {
        Some(season) => format!(r"^{} s{}e(?P<episode>\d+)", show_name, season),
        None => format!(r"^{} e(?P<episode>\d+)", show_name),
    }
}

fn stem(file_name: &str) -> &str {
    Path::new(file_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(file_name)
}

/// Build "<show> [s<season>]e<episode>.<ext>".
pub fn canonical_file_name(
    show_name: &str,
    season: Option<u32>,
    episode: u32,
    extension: &str,
) -> String {
    match season {
        Some(season) => format!("{} s{}e{}.{}", show_name, season, episode, extension),
        None => format!("{} e{}.{}", show_name, episode, extension),
    }
}
