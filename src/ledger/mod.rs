mod reader;
mod types;
mod writer;

pub use reader::{is_ledger_filename, list_ledger_files, load_ledger};
pub use types::*;
pub use writer::{write_ledger_file, LedgerError, RenameLedger};
