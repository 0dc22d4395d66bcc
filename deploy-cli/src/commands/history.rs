//! `history` command handler.

use deploy_core::ExitCode;

use crate::app::context::RunContext;
use crate::cli::{HistoryCommand, HistoryListArgs};

pub(crate) fn handle(ctx: &RunContext, command: &HistoryCommand) -> ExitCode {
    match command {
        HistoryCommand::List(args) => handle_list(ctx, args),
        HistoryCommand::Clear => handle_clear(ctx),
    }
}

fn handle_list(ctx: &RunContext, args: &HistoryListArgs) -> ExitCode {
    let entries = match &args.profile {
        Some(profile) => ctx.history.by_profile(profile),
        None => ctx.history.recent(args.limit),
    };

    match entries {
        Ok(entries) if entries.is_empty() => {
            println!("No deployment history recorded.");
            ExitCode::Success
        }
        Ok(entries) => {
            let width = crate::output::terminal_width();
            for entry in entries.iter().take(args.limit) {
                println!("{}", crate::output::render_history_row(entry, width));
            }
            ExitCode::Success
        }
        Err(err) => {
            eprintln!("Failed to read history: {err}");
            ExitCode::GeneralError
        }
    }
}

fn handle_clear(ctx: &RunContext) -> ExitCode {
    match ctx.history.clear() {
        Ok(()) => {
            println!("Deployment history cleared.");
            ExitCode::Success
        }
        Err(err) => {
            eprintln!("Failed to clear history: {err}");
            ExitCode::GeneralError
        }
    }
}
