//! Top-level error type and exit code mapping.

use crate::driver::DriverError;
use crate::history::HistoryError;
use crate::profile::ProfileError;

/// Process exit codes, per the deployment tool's CLI contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Success = 0,
    GeneralError = 1,
    BuildFailure = 2,
    ConnectionFailure = 3,
    AuthenticationFailure = 4,
    DeploymentFailure = 5,
    ConfigurationError = 6,
    ProfileNotFound = 7,
    InvalidArguments = 8,
    OperationCancelled = 9,
}

impl ExitCode {
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }
}

/// Errors that can occur anywhere in a deployment run.
#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    #[error("build failed: {0}")]
    Build(String),

    #[error(transparent)]
    Connection(#[from] DriverError),

    #[error("authentication failed for profile {profile}: {reason}")]
    Authentication { profile: String, reason: String },

    #[error("deployment failed: {0}")]
    Deployment(String),

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error(transparent)]
    Profile(#[from] ProfileError),

    #[error(transparent)]
    History(#[from] HistoryError),

    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("operation cancelled")]
    Cancelled,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl DeployError {
    /// Maps this error to the process exit code it should produce.
    #[must_use]
    pub fn exit_code(&self) -> ExitCode {
        match self {
            DeployError::Build(_) => ExitCode::BuildFailure,
            DeployError::Connection(_) => ExitCode::ConnectionFailure,
            DeployError::Authentication { .. } => ExitCode::AuthenticationFailure,
            DeployError::Deployment(_) => ExitCode::DeploymentFailure,
            DeployError::Configuration(_) => ExitCode::ConfigurationError,
            DeployError::Profile(ProfileError::NotFound(_)) => ExitCode::ProfileNotFound,
            DeployError::Profile(_) => ExitCode::ConfigurationError,
            DeployError::History(_) => ExitCode::GeneralError,
            DeployError::InvalidArguments(_) => ExitCode::InvalidArguments,
            DeployError::Cancelled => ExitCode::OperationCancelled,
            DeployError::Io(_) => ExitCode::GeneralError,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_error_maps_to_build_failure() {
        let err = DeployError::Build("cargo exited with status 101".to_string());
        assert_eq!(err.exit_code(), ExitCode::BuildFailure);
    }

    #[test]
    fn test_profile_not_found_maps_to_profile_not_found() {
        let err = DeployError::Profile(ProfileError::NotFound("staging".to_string()));
        assert_eq!(err.exit_code(), ExitCode::ProfileNotFound);
    }

    #[test]
    fn test_cancelled_maps_to_operation_cancelled() {
        assert_eq!(DeployError::Cancelled.exit_code(), ExitCode::OperationCancelled);
    }
}
