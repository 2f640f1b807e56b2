use std::io::{self, IsTerminal};

use clap::Parser;
use showname::cli::Args;
use showname::collision::{DecisionProvider, FixedDecision, PromptDecision, Resolution};
use showname::output::{display_dry_run, display_execution_result, display_undo_result};
use showname::progress::Progress;
use showname::{logging, undo_ledgers, AppError, ConversionPlanner, ExclusiveOpen, RenameLedger, ShowContext};
use tracing::{debug, error, info, warn};

fn main() {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    logging::init(args.verbose);

    if let Err(e) = run(args) {
        error!("{}", e);
        eprintln!("\nError: {}", e.detailed_message());
        std::process::exit(e.exit_code().into());
    }
}

fn run(args: Args) -> Result<(), AppError> {
    let working_dir = std::env::current_dir()
        .map_err(|e| AppError::Other(format!("Cannot determine working directory: {}", e)))?;
    let ctx = args.to_context(&working_dir);
    let mut progress = Progress::new();

    debug!(root = ?ctx.root, show = %ctx.show_name, "Resolved context");

    if args.undo {
        info!("Undo mode in {:?}", ctx.root);
        let result = undo_ledgers(&ctx.root, &args.undo_options(), &mut progress)?;
        return display_undo_result(&result, &mut io::stdout())
            .map_err(|e| AppError::Other(format!("Failed to display output: {}", e)));
    }

    let keep_ledger = !args.no_ledger && !ctx.print_only;
    let mut decisions = decision_provider(&args, &ctx);
    let mut ledger = RenameLedger::new(&ctx);
    if keep_ledger {
        ledger = ledger.saved_in(&ctx.root);
    }

    let outcome = ConversionPlanner::new(&ctx, decisions.as_mut(), &ExclusiveOpen, &mut progress)
        .run(&mut ledger);

    // The ledger is saved after each rename; this final write only matters
    // when the last save failed
    if keep_ledger {
        match ledger.persist(&ctx.root) {
            Ok(Some(path)) => progress.ledger_written(&path),
            Ok(None) => debug!("No renames applied, ledger not written"),
            Err(e) => {
                warn!("Failed to write ledger: {}", e);
                progress.warn(&format!("Failed to write ledger: {}", e));
            }
        }
    }

    let report = outcome?;

    let displayed = if report.print_only {
        display_dry_run(&report, &mut io::stdout())
    } else {
        display_execution_result(&report, &mut io::stdout())
    };
    displayed.map_err(|e| AppError::Other(format!("Failed to display output: {}", e)))
}

fn decision_provider(args: &Args, ctx: &ShowContext) -> Box<dyn DecisionProvider> {
    if let Some(policy) = args.on_conflict {
        return Box::new(FixedDecision(policy.into()));
    }

    if io::stdin().is_terminal() && !ctx.print_only {
        return Box::new(PromptDecision::new(io::stdin().lock(), io::stderr()));
    }

    debug!("No terminal for conflict prompts, skipping conflicts");
    Box::new(FixedDecision(Resolution::Skip))
}
