//! Deployment Tool Core Library
//!
//! This library provides the core functionality for the deployment tool,
//! which publishes a local build directory to a remote FTP/FTPS/SFTP target
//! through a managed, resumable, cancellable upload pipeline.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`build`] - build command execution
//! - [`config`] - global configuration loading
//! - [`coordinator`] - the deployment state machine
//! - [`credentials`] - encrypted-at-rest credential storage
//! - [`driver`] - FTP/FTPS/SFTP transport drivers behind a common trait
//! - [`error`] - top-level error type and exit code mapping
//! - [`history`] - append-only deployment history journal
//! - [`inventory`] - remote directory inventory/diff
//! - [`pool`] - bounded connection pool
//! - [`profile`] - deployment profile data model and resolver
//! - [`progress`] - progress bus / observer interface
//! - [`retry`] - retry policy for transient failures
//! - [`upload`] - the concurrent upload engine
//! - [`walk`] - local publish file discovery

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod build;
pub mod config;
pub mod coordinator;
pub mod credentials;
pub mod driver;
pub mod error;
pub mod history;
pub mod inventory;
pub mod pool;
pub mod profile;
pub mod progress;
pub mod retry;
pub mod upload;
pub mod walk;

// Re-export commonly used types
pub use build::{BuildError, BuildOutput, run_build};
pub use config::{ConfigError, GlobalConfig};
pub use coordinator::{CoordinatorState, DeploymentCoordinator, DeploymentResult};
pub use credentials::{Credential, StorageError, load_credential, store_credential};
pub use driver::{Driver, DriverError, RemoteEntry, build_driver};
pub use error::{DeployError, ExitCode};
pub use history::{DeploymentHistoryEntry, DeploymentOutcome, HistoryError, HistoryJournal};
pub use inventory::{RemoteInventory, build_remote_inventory};
pub use pool::{ConnectionLease, ConnectionPool};
pub use profile::{DeploymentProfile, ProfileError, ProfileResolver, Protocol};
pub use progress::{
    ProgressObserver, ProgressSnapshot, SharedProgressObserver, Stage, null_observer,
};
pub use retry::{FailureType, RetryDecision, RetryPolicy, classify_error};
pub use upload::{DEFAULT_CONCURRENCY, UploadStats, run_upload_engine};
pub use walk::exclude::{ExclusionError, ExclusionSet};
pub use walk::{FileKind, PublishFile, WalkError, has_app_offline_marker, walk_publish_files};
