use clap::{Parser, ValueEnum};
use std::path::{Path, PathBuf};

use crate::collision::Resolution;
use crate::context::{SeasonMode, ShowContext};
use crate::undo::{UndoOptions, UndoSelection};

#[derive(Parser, Debug)]
#[command(name = "showname")]
#[command(author, version, about, long_about = None)]
#[command(about = "Rename ripped episode files to \"<Show> s<season>e<episode>\"")]
pub struct Args {
    /// Show name used in file names [default: root folder name without " (YYYY)"]
    #[arg(short, long, value_name = "NAME")]
    pub show: Option<String>,

    /// Show root directory [default: current directory, or the --show subfolder]
    #[arg(short, long, value_name = "DIR")]
    pub dir: Option<PathBuf>,

    /// Lowest episode number to assign
    #[arg(short, long, value_name = "NUMBER")]
    pub first: Option<String>,

    /// Episodes live directly in the root instead of "Season N" folders
    #[arg(short, long)]
    pub no_seasons: bool,

    /// Show what would be renamed without touching the filesystem
    #[arg(short, long)]
    pub print_only: bool,

    /// Skip files that cannot be opened instead of stopping
    #[arg(short, long)]
    pub ignore_bad_read: bool,

    /// Renumber every file, including ones already named correctly
    #[arg(long)]
    pub force: bool,

    /// Do not write a ledger for this run
    #[arg(long)]
    pub no_ledger: bool,

    /// Only process season folders whose name matches this regex
    #[arg(long, value_name = "REGEX")]
    pub season_filter: Option<String>,

    /// Only process files whose name matches this regex
    #[arg(long, value_name = "REGEX")]
    pub episode_filter: Option<String>,

    /// Answer destination conflicts without asking
    #[arg(long, value_enum, value_name = "POLICY", env = "SHOWNAME_ON_CONFLICT")]
    pub on_conflict: Option<ConflictPolicy>,

    /// Undo the most recent run using its ledger
    #[arg(short, long)]
    pub undo: bool,

    /// Undo the N most recent runs
    #[arg(
        long,
        value_name = "N",
        requires = "undo",
        conflicts_with = "undo_through",
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub undo_count: Option<u32>,

    /// Undo every run from the most recent back to this ledger file
    #[arg(long, value_name = "LEDGER", requires = "undo")]
    pub undo_through: Option<String>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ConflictPolicy {
    Overwrite,
    Keep,
    Skip,
}

impl From<ConflictPolicy> for Resolution {
    fn from(policy: ConflictPolicy) -> Self {
        match policy {
            ConflictPolicy::Overwrite => Resolution::Overwrite,
            ConflictPolicy::Keep => Resolution::KeepAlongside,
            ConflictPolicy::Skip => Resolution::Skip,
        }
    }
}

impl Args {
    pub fn to_context(&self, working_dir: &Path) -> ShowContext {
        let season_mode = if self.no_seasons {
            SeasonMode::Flat
        } else {
            SeasonMode::Seasoned
        };

        ShowContext::builder(working_dir)
            .show_name(self.show.clone())
            .root(self.dir.clone())
            .season_mode(season_mode)
            .first_episode(self.first.clone())
            .force(self.force)
            .print_only(self.print_only)
            .ignore_unreadable(self.ignore_bad_read)
            .season_filter(self.season_filter.clone())
            .episode_filter(self.episode_filter.clone())
            .build()
    }

    pub fn undo_options(&self) -> UndoOptions {
        let selection = match (&self.undo_through, self.undo_count) {
            (Some(name), _) => UndoSelection::Through(name.clone()),
            (None, Some(count)) => UndoSelection::Latest(count as usize),
            (None, None) => UndoSelection::default(),
        };

        UndoOptions {
            selection,
            dry_run: self.print_only,
        }
    }
}
