use crate::planner::{PlanReport, SkipReason};
use crate::undo::UndoResult;
use std::io::{self, Write};

/// Display print-only results in a formatted output
pub fn display_dry_run(report: &PlanReport, writer: &mut impl Write) -> io::Result<()> {
    writeln!(writer)?;
    writeln!(writer, "========================================")?;
    writeln!(writer, "              PRINT ONLY")?;
    writeln!(writer, "========================================")?;
    writeln!(writer)?;
    writeln!(writer, "Units:      {}", report.units)?;
    writeln!(writer, "Operations: {}", report.len())?;
    writeln!(writer)?;

    if report.is_empty() {
        writeln!(writer, "No files to rename.")?;
        return Ok(());
    }

    writeln!(writer, "Planned changes:")?;
    writeln!(writer)?;

    for (i, op) in report.operations.iter().enumerate() {
        match op.season {
            Some(season) => writeln!(writer, "  {}. [s{}e{}]", i + 1, season, op.episode)?,
            None => writeln!(writer, "  {}. [e{}]", i + 1, op.episode)?,
        }
        writeln!(writer, "     From: {}", op.source_name)?;
        writeln!(writer, "     To:   {}", op.destination_name)?;

        if let Some(resolution) = op.conflict {
            writeln!(
                writer,
                "     [!] Destination exists ({})",
                resolution.description()
            )?;
        }

        writeln!(writer)?;
    }

    writeln!(writer, "----------------------------------------")?;
    writeln!(writer, "Summary:")?;
    writeln!(writer, "  {} files would be renamed", report.len())?;
    write_skip_counts(report, writer, "would be")?;

    writeln!(writer)?;
    writeln!(writer, "Run without --print-only to apply these changes.")?;

    Ok(())
}

/// Display execution results (non-print-only)
pub fn display_execution_result(report: &PlanReport, writer: &mut impl Write) -> io::Result<()> {
    writeln!(writer)?;

    if report.is_empty() && report.skipped.is_empty() {
        writeln!(writer, "Nothing to rename.")?;
        return Ok(());
    }

    writeln!(writer, "Successfully renamed {} files.", report.len())?;

    let conflicts = report.conflict_count();
    if conflicts > 0 {
        writeln!(writer, "  {} destination conflicts resolved.", conflicts)?;
    }
    write_skip_counts(report, writer, "were")?;

    Ok(())
}

fn write_skip_counts(report: &PlanReport, writer: &mut impl Write, verb: &str) -> io::Result<()> {
    let unreadable = report.skipped_count(SkipReason::Unreadable);
    if unreadable > 0 {
        writeln!(
            writer,
            "  {} unreadable files {} skipped",
            unreadable, verb
        )?;
    }

    let collisions = report.skipped_count(SkipReason::Collision);
    if collisions > 0 {
        writeln!(
            writer,
            "  {} files {} skipped because the destination exists",
            collisions, verb
        )?;
    }

    Ok(())
}

/// Display the outcome of an undo run
pub fn display_undo_result(result: &UndoResult, writer: &mut impl Write) -> io::Result<()> {
    writeln!(writer)?;

    if result.dry_run {
        writeln!(
            writer,
            "Would restore {} files from {} ledger(s).",
            result.restored_count(),
            result.ledgers.len()
        )?;
    } else {
        writeln!(
            writer,
            "Restored {} files from {} ledger(s).",
            result.restored_count(),
            result.ledgers.len()
        )?;
    }

    let failed = result.failed_count();
    if failed > 0 {
        writeln!(writer, "  {} renames could not be undone:", failed)?;
        for ledger in &result.ledgers {
            for failure in &ledger.failed {
                writeln!(
                    writer,
                    "    {}: {}",
                    failure.mapping.new_path.display(),
                    failure.reason
                )?;
            }
        }
    }

    Ok(())
}
