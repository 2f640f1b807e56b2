use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};

use tracing::trace;

use super::types::*;
use super::writer::LedgerError;

/// Read and parse a ledger file
pub fn load_ledger(path: &Path) -> Result<LedgerFile, LedgerError> {
    let file = File::open(path).map_err(|e| LedgerError::ReadError {
        path: path.to_path_buf(),
        message: format!("Cannot open file: {}", e),
    })?;

    let reader = BufReader::new(file);
    let ledger: LedgerFile =
        serde_json::from_reader(reader).map_err(|e| LedgerError::Corrupt {
            path: path.to_path_buf(),
            message: format!("Invalid JSON: {}", e),
        })?;

    if ledger.version != LEDGER_VERSION {
        return Err(LedgerError::VersionMismatch {
            path: path.to_path_buf(),
            expected: LEDGER_VERSION.to_string(),
            found: ledger.version,
        });
    }

    Ok(ledger)
}

/// Ledger files in `dir`, oldest first.
pub fn list_ledger_files(dir: &Path) -> Result<Vec<PathBuf>, LedgerError> {
    let mut ledgers = Vec::new();

    let entries = fs::read_dir(dir).map_err(|e| LedgerError::ReadError {
        path: dir.to_path_buf(),
        message: format!("Cannot list directory: {}", e),
    })?;

    for entry in entries {
        let path = entry
            .map_err(|e| LedgerError::ReadError {
                path: dir.to_path_buf(),
                message: format!("Cannot list directory: {}", e),
            })?
            .path();
        if !path.is_file() {
            continue;
        }

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        if is_ledger_filename(&name) {
            trace!(name = %name, "Found ledger");
            ledgers.push(path);
        }
    }

    ledgers.sort();

    Ok(ledgers)
}

pub fn is_ledger_filename(name: &str) -> bool {
    name.starts_with(LEDGER_PREFIX) && name.ends_with(".json")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tempfile::tempdir;

    fn create_test_ledger() -> LedgerFile {
        LedgerFile {
            version: LEDGER_VERSION.to_string(),
            executed_at: Utc::now(),
            root_directory: PathBuf::from("/tv/Show"),
            show_name: "Show".to_string(),
            tool_version: "1.0.0".to_string(),
            changes: vec![ConversionMapping::new(
                PathBuf::from("/tv/Show/title_t00.mkv"),
                PathBuf::from("/tv/Show/Show e1.mkv"),
            )],
        }
    }

    #[test]
    fn test_load_ledger() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("showname-ledger-20260115-100000-000.json");
        fs::write(
            &path,
            serde_json::to_string_pretty(&create_test_ledger()).unwrap(),
        )
        .unwrap();

        let loaded = load_ledger(&path).unwrap();

        assert_eq!(loaded.version, LEDGER_VERSION);
        assert_eq!(loaded.changes.len(), 1);
        assert!(loaded.changes[0].new_path.ends_with("Show e1.mkv"));
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = load_ledger(Path::new("/nonexistent/ledger.json"));
        assert!(matches!(result, Err(LedgerError::ReadError { .. })));
    }

    #[test]
    fn test_load_invalid_json() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "not valid json {{{").unwrap();

        let result = load_ledger(&path);
        assert!(matches!(result, Err(LedgerError::Corrupt { .. })));
    }

    #[test]
    fn test_version_mismatch() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("old-version.json");

        let bad_json = r#"{
            "version": "99.0",
            "executed_at": "2026-01-01T00:00:00Z",
            "root_directory": "/tv/Show",
            "show_name": "Show",
            "tool_version": "0.1.0",
            "changes": []
        }"#;
        fs::write(&path, bad_json).unwrap();

        let result = load_ledger(&path);
        assert!(matches!(result, Err(LedgerError::VersionMismatch { .. })));
    }

    #[test]
    fn test_list_ledger_files_sorted_and_filtered() {
        let dir = tempdir().unwrap();
        for name in [
            "showname-ledger-20260115-100000-500.json",
            "showname-ledger-20260114-235959-999.json",
            "showname-ledger-20260115-100000-500.json.tmp",
            "notes.json",
            "Show e1.mkv",
        ] {
            fs::write(dir.path().join(name), "{}").unwrap();
        }

        let ledgers = list_ledger_files(dir.path()).unwrap();
        let names: Vec<String> = ledgers
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();

        assert_eq!(
            names,
            vec![
                "showname-ledger-20260114-235959-999.json",
                "showname-ledger-20260115-100000-500.json",
            ]
        );
    }
}
