use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, trace};

use crate::context::{ShowContext, MEDIA_EXTENSION};

// Season folder: "Season <N>"
static SEASON_DIR_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^Season (\d+)$").unwrap());

#[derive(Error, Debug)]
pub enum ScannerError {
    #[error("Path does not exist: {0}")]
    PathNotFound(PathBuf),

    #[error("Path is not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    #[error("Failed to read directory: {0}")]
    IoError(#[from] std::io::Error),
}

/// One directory of episodes: the show root in flat mode, or a season folder.
#[derive(Debug, Clone)]
pub struct SeasonUnit {
    pub season: Option<u32>,
    pub path: PathBuf,
    /// Every media file in the directory, sorted by path
    pub files: Vec<PathBuf>,
}

impl SeasonUnit {
    pub fn label(&self) -> String {
        match self.season {
            Some(season) => format!("Season {}", season),
            None => "Episodes".to_string(),
        }
    }
}

/// Find the directories to process for this show.
pub fn discover_units(ctx: &ShowContext) -> Result<Vec<SeasonUnit>, ScannerError> {
    if !ctx.is_seasoned() {
        let files = list_media_files(&ctx.root)?;
        return Ok(vec![SeasonUnit {
            season: None,
            path: ctx.root.clone(),
            files,
        }]);
    }

    let mut seasons = Vec::new();

    for dir in read_entries(&ctx.root)? {
        if !dir.is_dir() {
            continue;
        }

        let name = file_name(&dir);
        let Some(season) = parse_season_dir(&name) else {
            trace!(name = %name, "Skipping non-season directory");
            continue;
        };

        if let Some(filter) = &ctx.season_filter {
            if !filter.is_match(&name) {
                debug!(name = %name, "Season excluded by filter");
                continue;
            }
        }

        seasons.push((season, dir));
    }

    seasons.sort();

    let mut units = Vec::with_capacity(seasons.len());
    for (season, path) in seasons {
        let files = list_media_files(&path)?;
        debug!(season, count = files.len(), "Found season folder");
        units.push(SeasonUnit {
            season: Some(season),
            path,
            files,
        });
    }

    Ok(units)
}

/// Media files directly inside `dir`, sorted by path.
pub fn list_media_files(dir: &Path) -> Result<Vec<PathBuf>, ScannerError> {
    let mut files: Vec<PathBuf> = read_entries(dir)?
        .into_iter()
        .filter(|path| path.is_file())
        .filter(|path| is_media_file(path))
        .filter(|path| !file_name(path).starts_with('.'))
        .collect();

    files.sort();

    debug!(dir = ?dir, count = files.len(), "Listed media files");

    Ok(files)
}

pub fn is_media_file(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().eq_ignore_ascii_case(MEDIA_EXTENSION))
        .unwrap_or(false)
}

pub fn parse_season_dir(name: &str) -> Option<u32> {
    SEASON_DIR_REGEX
        .captures(name)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

pub fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}

fn read_entries(dir: &Path) -> Result<Vec<PathBuf>, ScannerError> {
    if !dir.exists() {
        return Err(ScannerError::PathNotFound(dir.to_path_buf()));
    }

    if !dir.is_dir() {
        return Err(ScannerError::NotADirectory(dir.to_path_buf()));
    }

    let read_dir = fs::read_dir(dir).map_err(|e| {
        if e.kind() == std::io::ErrorKind::PermissionDenied {
            ScannerError::PermissionDenied(dir.to_path_buf())
        } else {
            ScannerError::IoError(e)
        }
    })?;

    let mut entries = Vec::new();
    for entry in read_dir {
        entries.push(entry?.path());
    }

    Ok(entries)
}
