//! Profile subcommand handlers: create, list, show, and remove deployment
//! profiles, keeping credentials out of the profile JSON file.

use std::io::Write;

use deploy_core::{Credential, DeploymentProfile, ProfileError};

use super::context::RunContext;
use crate::cli::ProfileAddArgs;

/// Reads a password from stdin. Plain, unmasked input: terminal echo
/// suppression would require a new dependency this crate doesn't otherwise
/// need, so operators who want a hidden prompt should pass `--password`
/// from a secrets manager instead.
fn prompt_password() -> anyhow::Result<String> {
    print!("Password: ");
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

/// Creates or overwrites a profile, prompting for a password on stdin if
/// one wasn't passed via `--password`.
///
/// # Errors
///
/// Returns [`ProfileError`] if the profile fails validation or cannot be
/// written, or an I/O error if reading the password from stdin fails.
pub(crate) fn add_profile(ctx: &RunContext, args: &ProfileAddArgs) -> anyhow::Result<()> {
    let profile = DeploymentProfile {
        name: args.name.clone(),
        host: args.host.clone(),
        port: args.port,
        protocol: args.protocol.into(),
        username: args.username.clone(),
        remote_root: args.remote_root.clone(),
        local_build_dir: args.local_build_dir.clone(),
        build_command: args.build_command.clone(),
        exclude_patterns: args.exclude.clone(),
        pool_size: args.pool_size,
        use_app_offline: args.app_offline,
    };

    ctx.profiles.save(&profile)?;

    let password = match &args.password {
        Some(password) => password.clone(),
        None => prompt_password()?,
    };
    deploy_core::store_credential(&profile.name, &Credential::new(password))?;

    Ok(())
}

/// Lists all known profile names, sorted alphabetically.
///
/// # Errors
///
/// Returns [`ProfileError`] if the profile directory cannot be read.
pub(crate) fn list_profiles(ctx: &RunContext) -> Result<Vec<String>, ProfileError> {
    ctx.profiles.list()
}

/// Loads a single profile by name (credentials are never included).
///
/// # Errors
///
/// Returns [`ProfileError::NotFound`] if no profile exists for `name`.
pub(crate) fn show_profile(
    ctx: &RunContext,
    name: &str,
) -> Result<DeploymentProfile, ProfileError> {
    ctx.profiles.load(name)
}

/// Deletes a profile and its stored credential, if any.
///
/// # Errors
///
/// Returns [`ProfileError`] if the profile file exists but cannot be removed.
pub(crate) fn remove_profile(ctx: &RunContext, name: &str) -> anyhow::Result<bool> {
    let removed = ctx.profiles.delete(name)?;
    let _ = deploy_core::credentials::remove_credential(name);
    Ok(removed)
}
