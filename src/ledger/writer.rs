use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, warn};

use crate::context::ShowContext;

use super::types::*;

/// Error types for ledger operations
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("Failed to write ledger file: {0}")]
    WriteError(#[from] std::io::Error),

    #[error("Failed to serialize ledger: {0}")]
    SerializeError(#[from] serde_json::Error),

    #[error("Failed to read ledger file {path}: {message}")]
    ReadError { path: PathBuf, message: String },

    #[error("Ledger file {path} is not valid: {message}")]
    Corrupt { path: PathBuf, message: String },

    #[error("Ledger file version mismatch: expected {expected}, found {found}")]
    VersionMismatch {
        path: PathBuf,
        expected: String,
        found: String,
    },
}

/// Renames applied during one run, in order.
///
/// With a save directory set, every `append` rewrites the ledger file, so
/// the file on disk always covers each rename already made. The file is
/// created by the first rename; a run without renames leaves no file.
#[derive(Debug, Clone)]
pub struct RenameLedger {
    started_at: DateTime<Utc>,
    root: PathBuf,
    show_name: String,
    mappings: Vec<ConversionMapping>,
    save_dir: Option<PathBuf>,
    path: Option<PathBuf>,
}

impl RenameLedger {
    pub fn new(ctx: &ShowContext) -> Self {
        Self {
            started_at: Utc::now(),
            root: ctx.root.clone(),
            show_name: ctx.show_name.clone(),
            mappings: Vec::new(),
            save_dir: None,
            path: None,
        }
    }

    /// Write the ledger into `dir` after every appended rename.
    pub fn saved_in(mut self, dir: &Path) -> Self {
        self.save_dir = Some(dir.to_path_buf());
        self
    }

    pub fn append(&mut self, mapping: ConversionMapping) -> Result<(), LedgerError> {
        debug!(from = ?mapping.old_path, to = ?mapping.new_path, "Ledgered rename");
        self.mappings.push(mapping);

        if let Some(dir) = self.save_dir.clone() {
            self.persist(&dir)?;
        }
        Ok(())
    }

    pub fn mappings(&self) -> &[ConversionMapping] {
        &self.mappings
    }

    /// The file this ledger was last written to
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn to_file(&self) -> LedgerFile {
        LedgerFile {
            version: LEDGER_VERSION.to_string(),
            executed_at: self.started_at,
            root_directory: self.root.clone(),
            show_name: self.show_name.clone(),
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
            changes: self.mappings.clone(),
        }
    }

    /// Write the ledger into `dir`. A ledger with no renames writes nothing.
    ///
    /// The first write picks a file name that is not taken yet; later writes
    /// replace that same file.
    pub fn persist(&mut self, dir: &Path) -> Result<Option<PathBuf>, LedgerError> {
        if self.is_empty() {
            debug!("No renames recorded; not writing a ledger");
            return Ok(None);
        }

        let path = match &self.path {
            Some(path) => path.clone(),
            None => {
                // Keep names unique without breaking their sort order
                let mut path = dir.join(ledger_filename(&self.started_at));
                while path.exists() {
                    warn!("Ledger file already exists: {:?}", path);
                    self.started_at += Duration::milliseconds(1);
                    path = dir.join(ledger_filename(&self.started_at));
                }
                path
            }
        };

        write_ledger_file(&self.to_file(), &path)?;
        self.path = Some(path.clone());
        Ok(Some(path))
    }
}

/// Write `ledger` to `path` through a temporary file.
pub fn write_ledger_file(ledger: &LedgerFile, path: &Path) -> Result<(), LedgerError> {
    let temp_path = path.with_extension("json.tmp");

    {
        let file = File::create(&temp_path)?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, ledger)?;
    }

    fs::rename(&temp_path, path)?;

    debug!("Ledger written to: {:?}", path);

    Ok(())
}
