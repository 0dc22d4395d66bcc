//! File server driver capability port: a transport-agnostic interface for
//! uploading, listing, and removing files on a remote host.
//!
//! Concrete drivers live in [`ftp`] (FTP/FTPS via `suppaftp`) and [`sftp`]
//! (SFTP via `russh`/`russh-sftp`). Callers hold a `Box<dyn Driver>` and never
//! need to know which transport backs it, mirroring how the upload engine and
//! connection pool are written against the trait rather than a concrete type.

pub mod ftp;
pub mod sftp;

use std::path::Path;

use async_trait::async_trait;

use crate::profile::{DeploymentProfile, Protocol};

/// A single entry returned when listing a remote directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteEntry {
    pub name: String,
    pub is_dir: bool,
    pub size: u64,
    pub modified: Option<chrono::DateTime<chrono::Utc>>,
}

/// Errors surfaced by a driver. Textual `message` fields are classified by
/// [`crate::retry::classify_error`] to decide retry behavior.
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    #[error("connection failed: {0}")]
    Connect(String),
    #[error("authentication failed: {0}")]
    Auth(String),
    #[error("transfer failed: {0}")]
    Transfer(String),
    #[error("listing failed: {0}")]
    List(String),
    #[error("remote filesystem error: {0}")]
    Filesystem(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl DriverError {
    #[must_use]
    pub fn message(&self) -> String {
        self.to_string()
    }
}

/// Capability port implemented by each transport.
#[async_trait]
pub trait Driver: Send + Sync {
    /// Opens the underlying connection and authenticates.
    async fn connect(&mut self) -> Result<(), DriverError>;

    /// Closes the connection. Idempotent.
    async fn disconnect(&mut self) -> Result<(), DriverError>;

    /// Returns whether the connection is still usable without a round trip.
    fn is_connected(&self) -> bool;

    /// Uploads `local_path` to `remote_path`, creating parent directories as needed.
    async fn upload(&mut self, local_path: &Path, remote_path: &str) -> Result<(), DriverError>;

    /// Removes a remote file.
    async fn remove_file(&mut self, remote_path: &str) -> Result<(), DriverError>;

    /// Creates a remote directory, including parents. Must not error if it
    /// already exists.
    async fn make_dir_all(&mut self, remote_path: &str) -> Result<(), DriverError>;

    /// Lists entries directly under `remote_path`.
    async fn list_dir(&mut self, remote_path: &str) -> Result<Vec<RemoteEntry>, DriverError>;

    /// Renames/moves a remote path, used for atomic `app_offline.htm` swaps.
    async fn rename(&mut self, from: &str, to: &str) -> Result<(), DriverError>;
}

/// Builds the concrete driver for a profile's configured [`Protocol`].
#[must_use]
pub fn build_driver(profile: &DeploymentProfile) -> Box<dyn Driver> {
    match profile.protocol {
        Protocol::Ftp | Protocol::Ftps => Box::new(ftp::FtpDriver::new(profile.clone())),
        Protocol::Sftp => Box::new(sftp::SftpDriver::new(profile.clone())),
    }
}
