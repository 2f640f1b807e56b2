mod types;

pub use types::{PlanReport, RenameOperation, SkipReason, SkippedFile};

use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::access::AccessProbe;
use crate::collision::{
    alongside_path, CollisionResolver, DecisionProvider, PendingMoves, Resolution,
};
use crate::context::{ShowContext, UnreadablePolicy, MEDIA_EXTENSION};
use crate::ledger::{LedgerError, RenameLedger};
use crate::matcher::{canonical_file_name, NameMatcher};
use crate::progress::Progress;
use crate::scanner::{discover_units, file_name, ScannerError, SeasonUnit};
use crate::sequencer::{next_starting_number, EpisodeCounter};

/// Errors that stop a conversion run
#[derive(Error, Debug)]
pub enum PlanError {
    #[error(transparent)]
    Scanner(#[from] ScannerError),

    #[error("Cannot access episode {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to rename '{from}' to '{to}': {source}")]
    RenameFailed {
        from: String,
        to: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Renamed '{renamed}' but could not record it: {source}")]
    Ledger {
        renamed: PathBuf,
        #[source]
        source: LedgerError,
    },
}

/// Assigns sequential canonical names to every unformatted episode.
pub struct ConversionPlanner<'a> {
    ctx: &'a ShowContext,
    resolver: CollisionResolver<'a>,
    probe: &'a dyn AccessProbe,
    progress: &'a mut Progress,
    moves: PendingMoves,
}

impl<'a> ConversionPlanner<'a> {
    pub fn new(
        ctx: &'a ShowContext,
        decisions: &'a mut dyn DecisionProvider,
        probe: &'a dyn AccessProbe,
        progress: &'a mut Progress,
    ) -> Self {
        Self {
            ctx,
            resolver: CollisionResolver::new(decisions),
            probe,
            progress,
            moves: PendingMoves::new(),
        }
    }

    /// Convert every season unit of the show.
    ///
    /// Each rename is appended to `ledger` as soon as it succeeds, so the
    /// ledger holds every applied rename even when this returns an error.
    /// Print-only runs compute the same operations but never touch the
    /// filesystem or the ledger.
    pub fn run(&mut self, ledger: &mut RenameLedger) -> Result<PlanReport, PlanError> {
        let units = discover_units(self.ctx)?;

        if units.is_empty() {
            warn!("No season folders found in {}", self.ctx.root.display());
            self.progress.warn(&format!(
                "No \"Season <number>\" folders found in {}. Use --no-seasons for shows without seasons.",
                self.ctx.root.display()
            ));
        }

        let mut report = PlanReport::new(self.ctx.print_only);

        for unit in &units {
            self.convert_unit(unit, ledger, &mut report)?;
            report.units += 1;
        }

        info!(
            renamed = report.len(),
            skipped = report.skipped.len(),
            print_only = self.ctx.print_only,
            "Finished processing episodes"
        );

        Ok(report)
    }

    fn convert_unit(
        &mut self,
        unit: &SeasonUnit,
        ledger: &mut RenameLedger,
        report: &mut PlanReport,
    ) -> Result<(), PlanError> {
        let ctx = self.ctx;
        let matcher = NameMatcher::new(&ctx.show_name, unit.season, ctx.force);

        let mut pending: Vec<&PathBuf> = unit
            .files
            .iter()
            .filter(|path| passes_filter(ctx.episode_filter.as_ref(), path))
            .filter(|path| {
                let canonical = matcher.is_canonical(&file_name(path));
                if canonical {
                    debug!(file = ?path, "Found preformatted episode, skipping");
                }
                !canonical
            })
            .collect();
        pending.sort();

        let start = next_starting_number(&unit.files, &matcher, ctx.first_episode);
        let mut counter = EpisodeCounter::starting_at(start);
        let total = pending.len();

        info!(
            unit = %unit.label(),
            pending = total,
            start,
            "Processing {}",
            unit.path.display()
        );
        self.progress.unit_start(&unit.label(), total, start);

        for (i, source) in pending.into_iter().enumerate() {
            if let Err(e) = self.probe.check(source) {
                match ctx.unreadable {
                    UnreadablePolicy::Skip => {
                        warn!("Cannot access episode {}: {}. Skipping.", source.display(), e);
                        self.progress.skipped_unreadable(source);
                        report.skip(source.clone(), SkipReason::Unreadable);
                        continue;
                    }
                    UnreadablePolicy::Abort => {
                        error!(
                            "Cannot access episode {}: {}. Stopping to avoid episode order mismatch.",
                            source.display(),
                            e
                        );
                        return Err(PlanError::Unreadable {
                            path: source.clone(),
                            source: e,
                        });
                    }
                }
            }

            let episode = counter.current();
            let destination = unit.path.join(canonical_file_name(
                &ctx.show_name,
                unit.season,
                episode,
                MEDIA_EXTENSION,
            ));

            if destination == *source {
                debug!(file = ?source, episode, "Already named for its position");
                counter.advance();
                continue;
            }

            let conflict = self.moves.exists(&destination);
            let resolution = self.resolver.resolve(&destination, &self.moves);
            if conflict {
                self.progress
                    .collision(&file_name(&destination), resolution.description());
            }

            let target = match resolution {
                Resolution::Skip => {
                    report.skip(source.clone(), SkipReason::Collision);
                    continue;
                }
                Resolution::Overwrite => destination,
                Resolution::KeepAlongside => alongside_path(&destination, &self.moves),
            };

            let op = RenameOperation::new(
                source.clone(),
                target,
                unit.season,
                episode,
                conflict.then_some(resolution),
            );

            self.progress
                .rename_progress(i + 1, total, &op.source_name, &op.destination_name);

            if !ctx.print_only {
                apply_rename(&op)?;
                ledger
                    .append(op.mapping())
                    .map_err(|source| PlanError::Ledger {
                        renamed: op.destination_path.clone(),
                        source,
                    })?;
            }
            self.moves.record(&op.source_path, &op.destination_path);

            report.add_operation(op);
            counter.advance();
        }

        Ok(())
    }
}

fn passes_filter(filter: Option<&Regex>, path: &Path) -> bool {
    match filter {
        Some(re) => {
            let keep = re.is_match(&file_name(path));
            if !keep {
                debug!(file = ?path, "Excluded by episode filter");
            }
            keep
        }
        None => true,
    }
}

fn apply_rename(op: &RenameOperation) -> Result<(), PlanError> {
    info!("Renaming: {} -> {}", op.source_name, op.destination_name);

    fs::rename(&op.source_path, &op.destination_path).map_err(|e| PlanError::RenameFailed {
        from: op.source_name.clone(),
        to: op.destination_name.clone(),
        source: e,
    })
}
