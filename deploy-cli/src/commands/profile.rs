//! `profile` command handler.

use deploy_core::ExitCode;

use crate::app::context::RunContext;
use crate::app::profile_manager;
use crate::cli::{ProfileAddArgs, ProfileCommand, ProfileNameArg};

pub(crate) fn handle(ctx: &RunContext, command: &ProfileCommand) -> ExitCode {
    match command {
        ProfileCommand::Add(args) => handle_add(ctx, args),
        ProfileCommand::List => handle_list(ctx),
        ProfileCommand::Show(args) => handle_show(ctx, args),
        ProfileCommand::Remove(args) => handle_remove(ctx, args),
    }
}

fn handle_add(ctx: &RunContext, args: &ProfileAddArgs) -> ExitCode {
    match profile_manager::add_profile(ctx, args) {
        Ok(()) => {
            println!("Saved profile '{}'.", args.name);
            ExitCode::Success
        }
        Err(err) => {
            eprintln!("Failed to save profile: {err}");
            ExitCode::ConfigurationError
        }
    }
}

fn handle_list(ctx: &RunContext) -> ExitCode {
    match profile_manager::list_profiles(ctx) {
        Ok(names) if names.is_empty() => {
            println!("No profiles configured.");
            ExitCode::Success
        }
        Ok(names) => {
            for name in names {
                println!("{name}");
            }
            ExitCode::Success
        }
        Err(err) => {
            eprintln!("Failed to list profiles: {err}");
            ExitCode::ConfigurationError
        }
    }
}

fn handle_show(ctx: &RunContext, args: &ProfileNameArg) -> ExitCode {
    match profile_manager::show_profile(ctx, &args.name) {
        Ok(profile) => {
            println!("{}", crate::output::render_profile(&profile));
            ExitCode::Success
        }
        Err(deploy_core::ProfileError::NotFound(name)) => {
            eprintln!("No such profile: {name}");
            ExitCode::ProfileNotFound
        }
        Err(err) => {
            eprintln!("Failed to load profile: {err}");
            ExitCode::ConfigurationError
        }
    }
}

fn handle_remove(ctx: &RunContext, args: &ProfileNameArg) -> ExitCode {
    match profile_manager::remove_profile(ctx, &args.name) {
        Ok(true) => {
            println!("Removed profile '{}'.", args.name);
            ExitCode::Success
        }
        Ok(false) => {
            eprintln!("No such profile: {}", args.name);
            ExitCode::ProfileNotFound
        }
        Err(err) => {
            eprintln!("Failed to remove profile: {err}");
            ExitCode::ConfigurationError
        }
    }
}
