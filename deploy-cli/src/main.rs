//! Deployment tool CLI entry point.

mod app;
mod cli;
mod commands;
mod output;

use clap::Parser;

use app::context::RunContext;
use app::terminal::{init_tracing, is_no_color_requested};
use cli::{Cli, Command};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let no_color = is_no_color_requested(cli.no_color);
    init_tracing("info", false, no_color);

    let ctx = match RunContext::build(no_color, cli.quiet) {
        Ok(ctx) => ctx,
        Err(err) => {
            eprintln!("Failed to initialize: {err}");
            std::process::exit(deploy_core::ExitCode::ConfigurationError.as_i32());
        }
    };

    let exit_code = match &cli.command {
        Command::Deploy(args) => commands::deploy::handle(&ctx, args).await,
        Command::Profile { command } => commands::profile::handle(&ctx, command),
        Command::History { command } => commands::history::handle(&ctx, command),
    };

    std::process::exit(exit_code.as_i32());
}
