use std::path::PathBuf;

use crate::collision::Resolution;
use crate::ledger::ConversionMapping;

/// A single rename, applied or (in print-only mode) planned
#[derive(Debug, Clone)]
pub struct RenameOperation {
    /// Full path to the source file
    pub source_path: PathBuf,
    /// Original file name
    pub source_name: String,
    /// Full path the file ends up at
    pub destination_path: PathBuf,
    /// New file name
    pub destination_name: String,
    pub season: Option<u32>,
    pub episode: u32,
    /// How a destination conflict was settled, if there was one
    pub conflict: Option<Resolution>,
}

impl RenameOperation {
    pub fn new(
        source_path: PathBuf,
        destination_path: PathBuf,
        season: Option<u32>,
        episode: u32,
        conflict: Option<Resolution>,
    ) -> Self {
        let source_name = name_of(&source_path);
        let destination_name = name_of(&destination_path);

        Self {
            source_path,
            source_name,
            destination_path,
            destination_name,
            season,
            episode,
            conflict,
        }
    }

    pub fn mapping(&self) -> ConversionMapping {
        ConversionMapping::new(self.source_path.clone(), self.destination_path.clone())
    }
}

fn name_of(path: &std::path::Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Could not be opened, and unreadable files are being skipped
    Unreadable,
    /// Destination existed and the decision was to skip
    Collision,
}

#[derive(Debug, Clone)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: SkipReason,
}

/// Result of one planner run
#[derive(Debug, Clone)]
pub struct PlanReport {
    /// Operations performed or planned, in order
    pub operations: Vec<RenameOperation>,
    pub skipped: Vec<SkippedFile>,
    /// Number of season units visited
    pub units: usize,
    /// Whether this was a print-only run
    pub print_only: bool,
}

impl PlanReport {
    pub fn new(print_only: bool) -> Self {
        Self {
            operations: Vec::new(),
            skipped: Vec::new(),
            units: 0,
            print_only,
        }
    }

    pub fn add_operation(&mut self, op: RenameOperation) {
        self.operations.push(op);
    }

    pub fn skip(&mut self, path: PathBuf, reason: SkipReason) {
        self.skipped.push(SkippedFile { path, reason });
    }

    pub fn skipped_count(&self, reason: SkipReason) -> usize {
        self.skipped.iter().filter(|s| s.reason == reason).count()
    }

    pub fn conflict_count(&self) -> usize {
        self.operations.iter().filter(|op| op.conflict.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }
}
