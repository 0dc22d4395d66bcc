//! Exit code logic for the deployment process.
//!
//! Single responsibility: map a run's outcome to the process exit code
//! documented in the CLI's contract (0 success, 1 general error, ...).

use deploy_core::{DeployError, ExitCode};

/// Determines the process exit code for a completed or failed deployment
/// run. `Ok(true)` means every file published successfully; `Ok(false)`
/// means the run connected but left some files failed.
pub(crate) fn determine_exit_code(result: &Result<bool, DeployError>) -> ExitCode {
    match result {
        Ok(true) => ExitCode::Success,
        Ok(false) => ExitCode::DeploymentFailure,
        Err(err) => err.exit_code(),
    }
}
