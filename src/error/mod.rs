mod codes;

pub use codes::ExitCode;

use crate::ledger::LedgerError;
use crate::planner::PlanError;
use crate::scanner::ScannerError;
use crate::undo::UndoError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Target directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },

    #[error("Path is not a directory: {path}")]
    NotADirectory { path: PathBuf },

    #[error("Permission denied: {path}")]
    PermissionDenied { path: PathBuf },

    #[error("Cannot access episode: {path}")]
    UnreadableFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Rename failed: {from} -> {to}")]
    RenameError {
        from: String,
        to: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Ledger file is corrupt: {path}")]
    LedgerCorrupt { path: PathBuf, message: String },

    #[error("Ledger file error: {message}")]
    LedgerError {
        path: Option<PathBuf>,
        message: String,
    },

    #[error("No ledger files found in {dir}")]
    NoLedgers { dir: PathBuf },

    #[error("Ledger '{name}' not found in {dir}")]
    UnknownLedger { name: String, dir: PathBuf },

    #[error("{0}")]
    Other(String),
}

impl AppError {
    pub fn exit_code(&self) -> ExitCode {
        match self {
            AppError::DirectoryNotFound { .. } => ExitCode::DirectoryNotFound,
            AppError::NotADirectory { .. } => ExitCode::DirectoryNotFound,
            AppError::PermissionDenied { .. } => ExitCode::PermissionError,
            AppError::UnreadableFile { .. } => ExitCode::UnreadableFile,
            AppError::RenameError { .. } => ExitCode::RenameError,
            AppError::LedgerCorrupt { .. } => ExitCode::LedgerCorrupt,
            AppError::LedgerError { .. } => ExitCode::LedgerError,
            AppError::NoLedgers { .. } => ExitCode::LedgerError,
            AppError::UnknownLedger { .. } => ExitCode::InvalidArguments,
            AppError::Other(_) => ExitCode::GeneralError,
        }
    }

    pub fn detailed_message(&self) -> String {
        match self {
            AppError::DirectoryNotFound { path } => {
                format!(
                    "The specified directory does not exist:\n  {}\n\n\
                     Please verify the path and try again.",
                    path.display()
                )
            }

            AppError::NotADirectory { path } => {
                format!(
                    "The specified path is not a directory:\n  {}\n\n\
                     Please provide a valid directory path.",
                    path.display()
                )
            }

            AppError::PermissionDenied { path } => {
                format!(
                    "Permission denied when accessing:\n  {}\n\n\
                     Please check file permissions or run with appropriate privileges.",
                    path.display()
                )
            }

            AppError::UnreadableFile { path, source } => {
                format!(
                    "Cannot access episode file:\n  {}\n\
                     Error: {}\n\n\
                     It might still be being written. Wait for it to finish,\n\
                     or run with --ignore-bad-read to skip such files.\n\
                     Renames done before this file were recorded in the ledger.",
                    path.display(),
                    source
                )
            }

            AppError::RenameError { from, to, source } => {
                format!(
                    "Failed to rename file:\n\
                     From: {}\n\
                     To:   {}\n\
                     Error: {}\n\n\
                     Check file permissions and ensure no files are open.",
                    from, to, source
                )
            }

            AppError::LedgerCorrupt { path, message } => {
                format!(
                    "Ledger file cannot be parsed:\n  {}\n  {}\n\n\
                     Nothing from this ledger was undone. Newer ledgers that were\n\
                     already undone stay undone.",
                    path.display(),
                    message
                )
            }

            AppError::LedgerError { path, message } => {
                let path_info = path
                    .as_ref()
                    .map(|p| format!("File: {}\n", p.display()))
                    .unwrap_or_default();

                format!(
                    "Ledger file error:\n  {}\n{}\n\
                     Ensure the ledger file exists and is valid JSON.",
                    message, path_info
                )
            }

            AppError::NoLedgers { dir } => {
                format!(
                    "No ledger files found in:\n  {}\n\n\
                     There is nothing to undo. Ledgers are only written for runs\n\
                     that renamed at least one file.",
                    dir.display()
                )
            }

            AppError::UnknownLedger { name, dir } => {
                format!(
                    "Ledger '{}' was not found in:\n  {}\n\n\
                     Pass the file name of a ledger in that directory.",
                    name,
                    dir.display()
                )
            }

            AppError::Other(message) => message.clone(),
        }
    }
}

impl From<ScannerError> for AppError {
    fn from(err: ScannerError) -> Self {
        match err {
            ScannerError::PathNotFound(path) => AppError::DirectoryNotFound { path },
            ScannerError::NotADirectory(path) => AppError::NotADirectory { path },
            ScannerError::PermissionDenied(path) => AppError::PermissionDenied { path },
            ScannerError::IoError(e) => AppError::Other(format!("I/O error: {}", e)),
        }
    }
}

impl From<PlanError> for AppError {
    fn from(err: PlanError) -> Self {
        match err {
            PlanError::Scanner(e) => e.into(),
            PlanError::Unreadable { path, source } => AppError::UnreadableFile { path, source },
            PlanError::RenameFailed { from, to, source } => {
                AppError::RenameError { from, to, source }
            }
            PlanError::Ledger { renamed, source } => AppError::LedgerError {
                path: None,
                message: format!(
                    "{} was renamed but the ledger could not be updated: {}",
                    renamed.display(),
                    source
                ),
            },
        }
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::Corrupt { path, message } => AppError::LedgerCorrupt { path, message },
            LedgerError::ReadError { ref path, .. } | LedgerError::VersionMismatch { ref path, .. } => {
                AppError::LedgerError {
                    path: Some(path.clone()),
                    message: err.to_string(),
                }
            }
            other => AppError::LedgerError {
                path: None,
                message: other.to_string(),
            },
        }
    }
}

impl From<UndoError> for AppError {
    fn from(err: UndoError) -> Self {
        match err {
            UndoError::Ledger(e) => e.into(),
            UndoError::NoLedgers(dir) => AppError::NoLedgers { dir },
            UndoError::UnknownLedger { name, dir } => AppError::UnknownLedger { name, dir },
            UndoError::Retire { path, source } => AppError::LedgerError {
                path: Some(path),
                message: source.to_string(),
            },
        }
    }
}
