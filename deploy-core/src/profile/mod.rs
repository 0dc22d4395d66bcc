//! Deployment profile data model: the named, persisted configuration of a
//! remote deployment target (host, protocol, credentials reference, remote
//! root, build command, exclusions).

pub mod resolver;

use serde::{Deserialize, Serialize};

pub use resolver::ProfileResolver;

/// Errors produced while resolving or validating profiles.
#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    #[error("profile not found: {0}")]
    NotFound(String),
    #[error("profile directory unavailable: {0}")]
    DirUnavailable(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("invalid profile {name}: {reason}")]
    Invalid { name: String, reason: String },
}

/// Wire protocol used to reach the remote file server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Ftp,
    Ftps,
    Sftp,
}

impl Protocol {
    #[must_use]
    pub fn default_port(self) -> u16 {
        match self {
            Protocol::Ftp | Protocol::Ftps => 21,
            Protocol::Sftp => 22,
        }
    }
}

fn default_pool_size() -> usize {
    4
}

fn default_true() -> bool {
    true
}

/// A named deployment target, persisted as JSON under the profile directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentProfile {
    pub name: String,
    pub host: String,
    #[serde(default)]
    pub port: Option<u16>,
    pub protocol: Protocol,
    pub username: String,
    pub remote_root: String,
    pub local_build_dir: String,
    #[serde(default)]
    pub build_command: Option<String>,
    #[serde(default)]
    pub exclude_patterns: Vec<String>,
    #[serde(default = "default_pool_size")]
    pub pool_size: usize,
    #[serde(default = "default_true")]
    pub use_app_offline: bool,
}

impl DeploymentProfile {
    #[must_use]
    pub fn effective_port(&self) -> u16 {
        self.port.unwrap_or_else(|| self.protocol.default_port())
    }

    /// Validates required fields beyond what serde's type system enforces.
    ///
    /// # Errors
    ///
    /// Returns [`ProfileError::Invalid`] if a required field is empty.
    pub fn validate(&self) -> Result<(), ProfileError> {
        if self.name.trim().is_empty() {
            return Err(ProfileError::Invalid {
                name: self.name.clone(),
                reason: "name must not be empty".to_string(),
            });
        }
        if self.host.trim().is_empty() {
            return Err(ProfileError::Invalid {
                name: self.name.clone(),
                reason: "host must not be empty".to_string(),
            });
        }
        if self.remote_root.trim().is_empty() {
            return Err(ProfileError::Invalid {
                name: self.name.clone(),
                reason: "remote_root must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

/// Legacy flat profile shape (pre-named-profile-directory era), kept for
/// read compatibility: a single profile stored directly as the top-level
/// object rather than nested under a `profiles/<name>.json` file.
#[derive(Debug, Deserialize)]
struct LegacyFlatProfile {
    host: String,
    #[serde(default)]
    port: Option<u16>,
    #[serde(default)]
    protocol: Option<Protocol>,
    user: String,
    #[serde(default)]
    remote_path: Option<String>,
    #[serde(default)]
    local_path: Option<String>,
}

/// Attempts to read `bytes` as a legacy flat profile and upgrade it to a
/// [`DeploymentProfile`] under `name`. Returns `None` if the bytes don't match
/// the legacy shape.
#[must_use]
pub fn upgrade_legacy_profile(name: &str, bytes: &[u8]) -> Option<DeploymentProfile> {
    let legacy: LegacyFlatProfile = serde_json::from_slice(bytes).ok()?;
    Some(DeploymentProfile {
        name: name.to_string(),
        host: legacy.host,
        port: legacy.port,
        protocol: legacy.protocol.unwrap_or(Protocol::Ftp),
        username: legacy.user,
        remote_root: legacy.remote_path.unwrap_or_else(|| "/".to_string()),
        local_build_dir: legacy.local_path.unwrap_or_else(|| ".".to_string()),
        build_command: None,
        exclude_patterns: Vec::new(),
        pool_size: default_pool_size(),
        use_app_offline: true,
    })
}
