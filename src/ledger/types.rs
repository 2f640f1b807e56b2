use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const LEDGER_VERSION: &str = "1.0";

pub const LEDGER_PREFIX: &str = "showname-ledger-";

/// Fixed-width so that file names sort chronologically
pub const LEDGER_TIMESTAMP_FORMAT: &str = "%Y%m%d-%H%M%S-%3f";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerFile {
    /// Schema version for compatibility
    pub version: String,

    /// When the run started
    pub executed_at: DateTime<Utc>,

    /// Show root the run operated on
    pub root_directory: PathBuf,

    pub show_name: String,

    /// Tool version that created this ledger
    pub tool_version: String,

    /// Renames in the order they were applied
    pub changes: Vec<ConversionMapping>,
}

/// One applied rename.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionMapping {
    pub old_path: PathBuf,
    pub new_path: PathBuf,
}

impl ConversionMapping {
    pub fn new(old_path: PathBuf, new_path: PathBuf) -> Self {
        Self { old_path, new_path }
    }

    /// The mapping that undoes this one.
    pub fn reversed(&self) -> Self {
        Self {
            old_path: self.new_path.clone(),
            new_path: self.old_path.clone(),
        }
    }
}

impl LedgerFile {
    pub fn generate_filename(&self) -> String {
        ledger_filename(&self.executed_at)
    }
}

pub fn ledger_filename(at: &DateTime<Utc>) -> String {
    format!("{}{}.json", LEDGER_PREFIX, at.format(LEDGER_TIMESTAMP_FORMAT))
}
