use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::collision::PendingMoves;
use crate::ledger::{
    list_ledger_files, load_ledger, write_ledger_file, ConversionMapping, LedgerError,
};
use crate::progress::Progress;

#[derive(Debug, thiserror::Error)]
pub enum UndoError {
    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("No ledger files found in {0}")]
    NoLedgers(PathBuf),

    #[error("Ledger '{name}' not found in {dir}")]
    UnknownLedger { name: String, dir: PathBuf },

    #[error("Failed to update ledger {path}: {source}")]
    Retire {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Which ledgers to undo, counted from the most recent one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UndoSelection {
    /// The N most recent ledgers
    Latest(usize),
    /// From the most recent back to this ledger file name, inclusive
    Through(String),
}

impl Default for UndoSelection {
    fn default() -> Self {
        UndoSelection::Latest(1)
    }
}

#[derive(Debug, Clone, Default)]
pub struct UndoOptions {
    pub selection: UndoSelection,
    pub dry_run: bool,
}

/// A mapping that could not be reversed, with the reason
#[derive(Debug, Clone)]
pub struct FailedReversal {
    pub mapping: ConversionMapping,
    pub reason: String,
}

/// Outcome of undoing one ledger file
#[derive(Debug, Clone)]
pub struct LedgerUndo {
    pub ledger_path: PathBuf,
    pub restored: Vec<ConversionMapping>,
    pub failed: Vec<FailedReversal>,
}

#[derive(Debug, Clone)]
pub struct UndoResult {
    /// Ledgers in the order they were undone (newest first)
    pub ledgers: Vec<LedgerUndo>,
    pub dry_run: bool,
}

impl UndoResult {
    pub fn restored_count(&self) -> usize {
        self.ledgers.iter().map(|l| l.restored.len()).sum()
    }

    pub fn failed_count(&self) -> usize {
        self.ledgers.iter().map(|l| l.failed.len()).sum()
    }
}

/// Reverse the renames recorded in the selected ledgers of `dir`.
///
/// Ledgers are replayed newest first; inside one ledger the recorded order
/// is kept. A reversal whose original name is still taken by a later rename
/// of the same ledger (e.g. `Show e2 -> Show e1` then `a -> Show e2` under
/// `--force`) is retried once that later rename has been undone.
///
/// A ledger that cannot be parsed stops the undo before any of its entries
/// is touched, and reversals already done from newer ledgers stay in place.
pub fn undo_ledgers(
    dir: &Path,
    options: &UndoOptions,
    progress: &mut Progress,
) -> Result<UndoResult, UndoError> {
    let mut ledgers = list_ledger_files(dir)?;
    if ledgers.is_empty() {
        return Err(UndoError::NoLedgers(dir.to_path_buf()));
    }
    ledgers.reverse();

    let selected = select_ledgers(dir, ledgers, &options.selection)?;
    info!("Undoing {} ledger(s) in {}", selected.len(), dir.display());

    let mut result = UndoResult {
        ledgers: Vec::with_capacity(selected.len()),
        dry_run: options.dry_run,
    };

    for path in selected {
        let outcome = undo_one(&path, options.dry_run, progress)?;
        result.ledgers.push(outcome);
    }

    Ok(result)
}

fn select_ledgers(
    dir: &Path,
    newest_first: Vec<PathBuf>,
    selection: &UndoSelection,
) -> Result<Vec<PathBuf>, UndoError> {
    match selection {
        UndoSelection::Latest(count) => {
            Ok(newest_first.into_iter().take((*count).max(1)).collect())
        }
        UndoSelection::Through(name) => {
            let boundary = newest_first
                .iter()
                .position(|p| p.file_name().is_some_and(|n| n.to_string_lossy() == name.as_str()))
                .ok_or_else(|| UndoError::UnknownLedger {
                    name: name.clone(),
                    dir: dir.to_path_buf(),
                })?;
            Ok(newest_first.into_iter().take(boundary + 1).collect())
        }
    }
}

fn undo_one(path: &Path, dry_run: bool, progress: &mut Progress) -> Result<LedgerUndo, UndoError> {
    info!("Loading ledger from: {:?}", path);

    let mut ledger = load_ledger(path)?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let total = ledger.changes.len();

    progress.undo_start(&name, total);

    let mut outcome = LedgerUndo {
        ledger_path: path.to_path_buf(),
        restored: Vec::new(),
        failed: Vec::new(),
    };

    let mut moves = PendingMoves::new();
    let mut pending: Vec<(usize, &ConversionMapping)> = ledger.changes.iter().enumerate().collect();
    let mut failed: Vec<(usize, &ConversionMapping, String)>;

    loop {
        let attempted = pending.len();
        failed = Vec::new();

        for (i, mapping) in pending {
            let current = display_name(&mapping.new_path);
            let original = display_name(&mapping.old_path);

            match reverse(mapping, dry_run, &mut moves) {
                Ok(()) => {
                    progress.undo_progress(i + 1, total, &current, &original);
                    outcome.restored.push(mapping.clone());
                }
                Err(reason) => failed.push((i, mapping, reason)),
            }
        }

        if failed.is_empty() || failed.len() == attempted {
            break;
        }

        debug!("Retrying {} reversal(s) after later renames were undone", failed.len());
        pending = failed.iter().map(|(i, mapping, _)| (*i, *mapping)).collect();
    }

    failed.sort_by_key(|(i, _, _)| *i);
    for (_, mapping, reason) in failed {
        let current = display_name(&mapping.new_path);
        warn!("Cannot undo {} -> {}: {}", current, display_name(&mapping.old_path), reason);
        progress.warn(&format!("Cannot undo {}: {}", current, reason));
        outcome.failed.push(FailedReversal {
            mapping: mapping.clone(),
            reason,
        });
    }

    if !dry_run {
        ledger.changes = outcome.failed.iter().map(|f| f.mapping.clone()).collect();
        retire_ledger(path, &ledger)?;
    }

    Ok(outcome)
}

/// Move one file back, or in a dry run only note the move.
fn reverse(
    mapping: &ConversionMapping,
    dry_run: bool,
    moves: &mut PendingMoves,
) -> Result<(), String> {
    check_reversal(mapping, moves)?;

    let back = mapping.reversed();
    if !dry_run {
        info!(
            "Reverting: {} -> {}",
            display_name(&back.old_path),
            display_name(&back.new_path)
        );
        fs::rename(&back.old_path, &back.new_path).map_err(|e| e.to_string())?;
    }

    moves.record(&back.old_path, &back.new_path);
    Ok(())
}

/// A reversal only moves a file that is still where the run left it, onto
/// a path that is free.
fn check_reversal(mapping: &ConversionMapping, moves: &PendingMoves) -> Result<(), String> {
    if !moves.exists(&mapping.new_path) {
        return Err(format!(
            "{} not found (expected from previous rename)",
            mapping.new_path.display()
        ));
    }

    if moves.exists(&mapping.old_path) {
        return Err(format!("{} already exists", mapping.old_path.display()));
    }

    Ok(())
}

/// Delete a fully undone ledger, or shrink it to what is left to undo.
fn retire_ledger(path: &Path, remaining: &crate::ledger::LedgerFile) -> Result<(), UndoError> {
    if remaining.changes.is_empty() {
        debug!("Removing fully undone ledger {:?}", path);
        return fs::remove_file(path).map_err(|e| UndoError::Retire {
            path: path.to_path_buf(),
            source: e,
        });
    }

    warn!(
        "{} rename(s) could not be undone; keeping them in {:?}",
        remaining.changes.len(),
        path
    );
    write_ledger_file(remaining, path)?;
    Ok(())
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::ExclusiveOpen;
    use crate::collision::{FixedDecision, Resolution};
    use crate::context::{SeasonMode, ShowContext};
    use crate::ledger::{ledger_filename, LedgerFile, RenameLedger, LEDGER_VERSION};
    use crate::matcher::NameMatcher;
    use crate::planner::ConversionPlanner;
    use crate::scanner::list_media_files;
    use crate::sequencer::next_starting_number;
    use chrono::{Duration, Utc};
    use tempfile::tempdir;

    fn touch(path: &Path) {
        fs::write(path, path.file_name().unwrap().to_string_lossy().as_bytes()).unwrap();
    }

    fn names_in(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        names
    }

    fn write_ledger(dir: &Path, minutes_ago: i64, changes: Vec<ConversionMapping>) -> PathBuf {
        let ledger = LedgerFile {
            version: LEDGER_VERSION.to_string(),
            executed_at: Utc::now() - Duration::minutes(minutes_ago),
            root_directory: dir.to_path_buf(),
            show_name: "Show".to_string(),
            tool_version: "1.0.0".to_string(),
            changes,
        };
        let path = dir.join(ledger_filename(&ledger.executed_at));
        write_ledger_file(&ledger, &path).unwrap();
        path
    }

    fn convert(dir: &Path, show: &str) -> Option<PathBuf> {
        let ctx = ShowContext::builder(dir)
            .show_name(Some(show.to_string()))
            .season_mode(SeasonMode::Flat)
            .build();
        let mut ledger = RenameLedger::new(&ctx);
        let mut decisions = FixedDecision(Resolution::Skip);
        let mut progress = Progress::silent();
        ConversionPlanner::new(&ctx, &mut decisions, &ExclusiveOpen, &mut progress)
            .run(&mut ledger)
            .unwrap();
        ledger.persist(&ctx.root).unwrap()
    }

    fn media_names(dir: &Path) -> Vec<String> {
        names_in(dir)
            .into_iter()
            .filter(|n| n.ends_with(".mkv"))
            .collect()
    }

    #[test]
    fn test_round_trip_restores_directory() {
        let dir = tempdir().unwrap();
        for name in ["Show e1.mkv", "title_t00.mkv", "title_t01.mkv"] {
            touch(&dir.path().join(name));
        }
        let before = media_names(dir.path());
        let matcher = NameMatcher::new("Show", None, false);
        let start_before =
            next_starting_number(&list_media_files(dir.path()).unwrap(), &matcher, None);

        let ledger = convert(dir.path(), "Show").unwrap();
        assert_eq!(
            media_names(dir.path()),
            vec!["Show e1.mkv", "Show e2.mkv", "Show e3.mkv"]
        );

        let result =
            undo_ledgers(dir.path(), &UndoOptions::default(), &mut Progress::silent()).unwrap();

        assert_eq!(result.restored_count(), 2);
        assert_eq!(result.failed_count(), 0);
        assert_eq!(media_names(dir.path()), before);
        assert_eq!(
            fs::read_to_string(dir.path().join("title_t01.mkv")).unwrap(),
            "title_t01.mkv"
        );
        assert_eq!(
            next_starting_number(&list_media_files(dir.path()).unwrap(), &matcher, None),
            start_before
        );
        assert!(!ledger.exists());
    }

    #[test]
    fn test_dry_run_changes_nothing() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("title_t00.mkv"));
        let ledger = convert(dir.path(), "Show").unwrap();

        let options = UndoOptions {
            dry_run: true,
            ..Default::default()
        };
        let result = undo_ledgers(dir.path(), &options, &mut Progress::silent()).unwrap();

        assert!(result.dry_run);
        assert_eq!(result.restored_count(), 1);
        assert!(dir.path().join("Show e1.mkv").exists());
        assert!(ledger.exists());
    }

    #[test]
    fn test_no_ledgers() {
        let dir = tempdir().unwrap();
        let result = undo_ledgers(dir.path(), &UndoOptions::default(), &mut Progress::silent());
        assert!(matches!(result, Err(UndoError::NoLedgers(_))));
    }

    #[test]
    fn test_latest_only_by_default() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("Show e1.mkv"));
        touch(&dir.path().join("Show e2.mkv"));
        let older = write_ledger(
            dir.path(),
            10,
            vec![ConversionMapping::new(
                dir.path().join("a.mkv"),
                dir.path().join("Show e1.mkv"),
            )],
        );
        write_ledger(
            dir.path(),
            5,
            vec![ConversionMapping::new(
                dir.path().join("b.mkv"),
                dir.path().join("Show e2.mkv"),
            )],
        );

        let result =
            undo_ledgers(dir.path(), &UndoOptions::default(), &mut Progress::silent()).unwrap();

        assert_eq!(result.ledgers.len(), 1);
        assert!(dir.path().join("b.mkv").exists());
        assert!(dir.path().join("Show e1.mkv").exists());
        assert!(older.exists());
    }

    #[test]
    fn test_through_replays_newest_first() {
        let dir = tempdir().unwrap();
        // Older run: a -> Show e1; newer run renamed Show e1 -> Show e1 (1)
        touch(&dir.path().join("Show e1 (1).mkv"));
        let older = write_ledger(
            dir.path(),
            10,
            vec![ConversionMapping::new(
                dir.path().join("a.mkv"),
                dir.path().join("Show e1.mkv"),
            )],
        );
        let newer = write_ledger(
            dir.path(),
            5,
            vec![ConversionMapping::new(
                dir.path().join("Show e1.mkv"),
                dir.path().join("Show e1 (1).mkv"),
            )],
        );

        let options = UndoOptions {
            selection: UndoSelection::Through(
                older.file_name().unwrap().to_string_lossy().to_string(),
            ),
            dry_run: false,
        };
        let result = undo_ledgers(dir.path(), &options, &mut Progress::silent()).unwrap();

        assert_eq!(result.ledgers.len(), 2);
        assert_eq!(result.ledgers[0].ledger_path, newer);
        assert_eq!(result.restored_count(), 2);
        assert_eq!(names_in(dir.path()), vec!["a.mkv"]);
    }

    #[test]
    fn test_unknown_boundary() {
        let dir = tempdir().unwrap();
        write_ledger(dir.path(), 1, vec![]);

        let options = UndoOptions {
            selection: UndoSelection::Through("showname-ledger-nope.json".to_string()),
            dry_run: false,
        };
        let result = undo_ledgers(dir.path(), &options, &mut Progress::silent());
        assert!(matches!(result, Err(UndoError::UnknownLedger { .. })));
    }

    #[test]
    fn test_corrupt_ledger_stops_before_touching_it() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("Show e1.mkv"));
        touch(&dir.path().join("Show e2.mkv"));

        let older = write_ledger(
            dir.path(),
            10,
            vec![ConversionMapping::new(
                dir.path().join("a.mkv"),
                dir.path().join("Show e1.mkv"),
            )],
        );
        fs::write(&older, "{ not json").unwrap();
        write_ledger(
            dir.path(),
            5,
            vec![ConversionMapping::new(
                dir.path().join("b.mkv"),
                dir.path().join("Show e2.mkv"),
            )],
        );

        let options = UndoOptions {
            selection: UndoSelection::Latest(2),
            dry_run: false,
        };
        let result = undo_ledgers(dir.path(), &options, &mut Progress::silent());

        assert!(matches!(
            result,
            Err(UndoError::Ledger(LedgerError::Corrupt { .. }))
        ));
        // Newer ledger was already reversed and stays reversed
        assert!(dir.path().join("b.mkv").exists());
        // Corrupt ledger's file was never touched
        assert!(dir.path().join("Show e1.mkv").exists());
        assert!(older.exists());
    }

    #[test]
    fn test_occupied_original_fails_single_reversal() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("Show e1.mkv"));
        touch(&dir.path().join("Show e2.mkv"));
        // Something new took the original name of the first file
        touch(&dir.path().join("a.mkv"));

        let ledger = write_ledger(
            dir.path(),
            1,
            vec![
                ConversionMapping::new(dir.path().join("a.mkv"), dir.path().join("Show e1.mkv")),
                ConversionMapping::new(dir.path().join("b.mkv"), dir.path().join("Show e2.mkv")),
            ],
        );

        let result =
            undo_ledgers(dir.path(), &UndoOptions::default(), &mut Progress::silent()).unwrap();

        assert_eq!(result.restored_count(), 1);
        assert_eq!(result.failed_count(), 1);
        assert!(dir.path().join("Show e1.mkv").exists());
        assert!(dir.path().join("b.mkv").exists());

        // Only the failed reversal is left in the ledger
        let remaining = load_ledger(&ledger).unwrap();
        assert_eq!(remaining.changes.len(), 1);
        assert!(remaining.changes[0].new_path.ends_with("Show e1.mkv"));
    }

    #[test]
    fn test_chained_renames_undo_in_one_pass() {
        // A forced renumber moved "Show e2" down to e1, then "a" into e2
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("Show e1.mkv"), "was e2").unwrap();
        fs::write(dir.path().join("Show e2.mkv"), "was a").unwrap();
        let changes = vec![
            ConversionMapping::new(dir.path().join("Show e2.mkv"), dir.path().join("Show e1.mkv")),
            ConversionMapping::new(dir.path().join("a.mkv"), dir.path().join("Show e2.mkv")),
        ];

        let preview_ledger = write_ledger(dir.path(), 1, changes);
        let options = UndoOptions {
            dry_run: true,
            ..Default::default()
        };
        let preview = undo_ledgers(dir.path(), &options, &mut Progress::silent()).unwrap();
        assert_eq!(preview.restored_count(), 2);
        assert_eq!(preview.failed_count(), 0);
        assert!(preview_ledger.exists());

        let result =
            undo_ledgers(dir.path(), &UndoOptions::default(), &mut Progress::silent()).unwrap();

        assert_eq!(result.restored_count(), 2);
        assert_eq!(result.failed_count(), 0);
        assert_eq!(names_in(dir.path()), vec!["Show e2.mkv", "a.mkv"]);
        assert_eq!(
            fs::read_to_string(dir.path().join("Show e2.mkv")).unwrap(),
            "was e2"
        );
        assert_eq!(fs::read_to_string(dir.path().join("a.mkv")).unwrap(), "was a");
    }

    #[test]
    fn test_forced_renumber_round_trip() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("Show e2.mkv"), "Show e2.mkv").unwrap();
        fs::write(dir.path().join("a.mkv"), "a.mkv").unwrap();

        let ctx = ShowContext::builder(dir.path())
            .show_name(Some("Show".to_string()))
            .season_mode(SeasonMode::Flat)
            .force(true)
            .build();
        let mut ledger = RenameLedger::new(&ctx).saved_in(&ctx.root);
        let mut decisions = FixedDecision(Resolution::Skip);
        let mut progress = Progress::silent();
        ConversionPlanner::new(&ctx, &mut decisions, &ExclusiveOpen, &mut progress)
            .run(&mut ledger)
            .unwrap();
        assert_eq!(media_names(dir.path()), vec!["Show e1.mkv", "Show e2.mkv"]);

        undo_ledgers(dir.path(), &UndoOptions::default(), &mut Progress::silent()).unwrap();

        assert_eq!(names_in(dir.path()), vec!["Show e2.mkv", "a.mkv"]);
        assert_eq!(
            fs::read_to_string(dir.path().join("Show e2.mkv")).unwrap(),
            "Show e2.mkv"
        );
    }

    #[test]
    fn test_missing_renamed_file_fails_single_reversal() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("Show e2.mkv"));

        write_ledger(
            dir.path(),
            1,
            vec![
                ConversionMapping::new(dir.path().join("a.mkv"), dir.path().join("Show e1.mkv")),
                ConversionMapping::new(dir.path().join("b.mkv"), dir.path().join("Show e2.mkv")),
            ],
        );

        let result =
            undo_ledgers(dir.path(), &UndoOptions::default(), &mut Progress::silent()).unwrap();

        assert_eq!(result.failed_count(), 1);
        assert!(result.ledgers[0].failed[0].reason.contains("not found"));
        assert!(dir.path().join("b.mkv").exists());
    }
}
