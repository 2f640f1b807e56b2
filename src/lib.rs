pub mod access;
pub mod cli;
pub mod collision;
pub mod context;
pub mod error;
pub mod ledger;
pub mod logging;
pub mod matcher;
pub mod output;
pub mod planner;
pub mod progress;
pub mod scanner;
pub mod sequencer;
pub mod undo;

pub use access::{AccessProbe, ExclusiveOpen};
pub use collision::{DecisionProvider, FixedDecision, PromptDecision, Resolution};
pub use context::{SeasonMode, ShowContext, UnreadablePolicy};
pub use error::{AppError, ExitCode};
pub use ledger::{ConversionMapping, LedgerError, LedgerFile, RenameLedger};
pub use matcher::{canonical_file_name, NameMatcher};
pub use planner::{ConversionPlanner, PlanError, PlanReport, RenameOperation};
pub use scanner::{discover_units, ScannerError, SeasonUnit};
pub use undo::{undo_ledgers, UndoError, UndoOptions, UndoResult, UndoSelection};
