//! FTP/FTPS driver backed by `suppaftp`'s async client.

use std::path::Path;

use async_trait::async_trait;
use suppaftp::AsyncRustlsFtpStream;
use suppaftp::FtpStream as _;
use suppaftp::types::FileType;

use crate::credentials;
use crate::profile::{DeploymentProfile, Protocol};

use super::{Driver, DriverError, RemoteEntry};

/// FTP (plaintext) or FTPS (explicit TLS) driver.
pub struct FtpDriver {
    profile: DeploymentProfile,
    stream: Option<AsyncRustlsFtpStream>,
}

impl FtpDriver {
    #[must_use]
    pub fn new(profile: DeploymentProfile) -> Self {
        Self {
            profile,
            stream: None,
        }
    }

    fn stream_mut(&mut self) -> Result<&mut AsyncRustlsFtpStream, DriverError> {
        self.stream
            .as_mut()
            .ok_or_else(|| DriverError::Connect("not connected".to_string()))
    }
}

#[async_trait]
impl Driver for FtpDriver {
    async fn connect(&mut self) -> Result<(), DriverError> {
        let addr = format!("{}:{}", self.profile.host, self.profile.effective_port());
        let mut stream = AsyncRustlsFtpStream::connect(&addr)
            .await
            .map_err(|e| DriverError::Connect(e.to_string()))?;

        if self.profile.protocol == Protocol::Ftps {
            stream = stream
                .into_secure(Default::default(), &self.profile.host)
                .await
                .map_err(|e| DriverError::Connect(e.to_string()))?;
        }

        let credential = credentials::load_credential(&self.profile.name)
            .map_err(|e| DriverError::Auth(e.to_string()))?;

        stream
            .login(&self.profile.username, &credential.secret)
            .await
            .map_err(|e| DriverError::Auth(e.to_string()))?;

        stream
            .transfer_type(FileType::Binary)
            .await
            .map_err(|e| DriverError::Connect(e.to_string()))?;

        self.stream = Some(stream);
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<(), DriverError> {
        if let Some(mut stream) = self.stream.take() {
            let _ = stream.quit().await;
        }
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    async fn upload(&mut self, local_path: &Path, remote_path: &str) -> Result<(), DriverError> {
        if let Some(parent) = remote_parent(remote_path) {
            self.make_dir_all(parent).await?;
        }
        let mut file = tokio::fs::File::open(local_path).await?;
        let stream = self.stream_mut()?;
        stream
            .put_file(remote_path, &mut file)
            .await
            .map_err(|e| DriverError::Transfer(e.to_string()))?;
        Ok(())
    }

    async fn remove_file(&mut self, remote_path: &str) -> Result<(), DriverError> {
        let stream = self.stream_mut()?;
        stream
            .rm(remote_path)
            .await
            .map_err(|e| DriverError::Filesystem(e.to_string()))
    }

    async fn make_dir_all(&mut self, remote_path: &str) -> Result<(), DriverError> {
        let segments: Vec<&str> = remote_path.split('/').filter(|s| !s.is_empty()).collect();
        let mut accumulated = String::new();
        let stream = self.stream_mut()?;
        for segment in segments {
            accumulated.push('/');
            accumulated.push_str(segment);
            match stream.mkdir(&accumulated).await {
                Ok(()) => {}
                Err(_) => continue,
            }
        }
        Ok(())
    }

    async fn list_dir(&mut self, remote_path: &str) -> Result<Vec<RemoteEntry>, DriverError> {
        let stream = self.stream_mut()?;
        let names = stream
            .list(Some(remote_path))
            .await
            .map_err(|e| DriverError::List(e.to_string()))?;
        Ok(names.iter().filter_map(|line| parse_list_line(line)).collect())
    }

    async fn rename(&mut self, from: &str, to: &str) -> Result<(), DriverError> {
        let stream = self.stream_mut()?;
        stream
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

/// Parses one line of a Unix-style `LIST` response into a [`RemoteEntry`].
/// Returns `None` for lines this parser doesn't recognize (e.g. "total N").
fn parse_list_line(line: &str) -> Option<RemoteEntry> {
    let mut fields = line.split_whitespace();
    let permissions = fields.next()?;
    if !permissions.starts_with('d') && !permissions.starts_with('-') && !permissions.starts_with('l') {
        return None;
    }
    let is_dir = permissions.starts_with('d');
    let rest: Vec<&str> = fields.collect();
    if rest.len() < 7 {
        return None;
    }
    let size: u64 = rest[3].parse().ok()?;
    let name = rest[6..].join(" ");
    Some(RemoteEntry {
        name,
        is_dir,
        size,
        modified: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_list_line_recognizes_file() {
        let entry =
            parse_list_line("-rw-r--r-- 1 user group 1024 Jan 01 00:00 index.html").unwrap();
        assert_eq!(entry.name, "index.html");
        assert!(!entry.is_dir);
        assert_eq!(entry.size, 1024);
    }

    #[test]
    fn test_parse_list_line_recognizes_directory() {
        let entry = parse_list_line("drwxr-xr-x 2 user group 4096 Jan 01 00:00 assets").unwrap();
        assert!(entry.is_dir);
    }

    #[test]
    fn test_parse_list_line_skips_total_line() {
        assert!(parse_list_line("total 24").is_none());
    }

    #[test]
    fn test_remote_parent_of_top_level_file() {
        assert_eq!(remote_parent("/index.html"), Some("/"));
    }

    #[test]
    fn test_remote_parent_of_nested_file() {
        assert_eq!(remote_parent("/assets/js/app.js"), Some("/assets/js"));
    }
}
