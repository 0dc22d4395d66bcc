//! Resolves named profiles from the on-disk profile directory
//! (`~/.config/deploy-tool/profiles/<name>.json`).

use std::fs;
use std::path::{Path, PathBuf};

use super::{DeploymentProfile, ProfileError, upgrade_legacy_profile};

/// Looks up and persists [`DeploymentProfile`]s on disk.
pub struct ProfileResolver {
    profiles_dir: PathBuf,
}

impl ProfileResolver {
    #[must_use]
    pub fn new(profiles_dir: PathBuf) -> Self {
        Self { profiles_dir }
    }

    /// Builds a resolver rooted at the default config directory
    /// (`~/.config/deploy-tool/profiles`, or `$XDG_CONFIG_HOME` equivalent).
    ///
    /// # Errors
    ///
    /// Returns [`ProfileError::DirUnavailable`] if no config directory can be
    /// determined for the current platform.
    pub fn default_location() -> Result<Self, ProfileError> {
        let base = dirs::config_dir().ok_or_else(|| {
            ProfileError::DirUnavailable("no user config directory available".to_string())
        })?;
        Ok(Self::new(base.join("deploy-tool").join("profiles")))
    }

    fn path_for(&self, name: &str) -> PathBuf {
        self.profiles_dir.join(format!("{name}.json"))
    }

    /// Loads a profile by name.
    ///
    /// # Errors
    ///
    /// Returns [`ProfileError::NotFound`] if no file exists for `name`, or
    /// [`ProfileError::Invalid`] if the file fails validation.
    pub fn load(&self, name: &str) -> Result<DeploymentProfile, ProfileError> {
        let path = self.path_for(name);
        if !path.exists() {
            return Err(ProfileError::NotFound(name.to_string()));
        }
        let bytes = fs::read(&path)?;
        let profile = match serde_json::from_slice::<DeploymentProfile>(&bytes) {
            Ok(profile) => profile,
            Err(_) => upgrade_legacy_profile(name, &bytes).ok_or_else(|| ProfileError::Invalid {
                name: name.to_string(),
                reason: "unrecognized profile shape".to_string(),
            })?,
        };
        profile.validate()?;
        Ok(profile)
    }

    /// Persists `profile` under its own name, creating the profile directory
    /// if needed.
    ///
    /// # Errors
    ///
    /// Returns [`ProfileError::Io`] if the directory or file cannot be written.
    pub fn save(&self, profile: &DeploymentProfile) -> Result<(), ProfileError> {
        profile.validate()?;
        fs::create_dir_all(&self.profiles_dir)?;
        let path = self.path_for(&profile.name);
        let json = serde_json::to_vec_pretty(profile)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Removes a profile by name. Returns `true` if a file was deleted.
    ///
    /// # Errors
    ///
    /// Returns [`ProfileError::Io`] if removal fails for a reason other than
    /// the file not existing.
    pub fn delete(&self, name: &str) -> Result<bool, ProfileError> {
        let path = self.path_for(name);
        if !path.exists() {
            return Ok(false);
        }
        fs::remove_file(path)?;
        Ok(true)
    }

    /// Lists the names of all persisted profiles, sorted alphabetically.
    ///
    /// # Errors
    ///
    /// Returns [`ProfileError::Io`] if the profile directory cannot be read.
    pub fn list(&self) -> Result<Vec<String>, ProfileError> {
        if !self.profiles_dir.exists() {
            return Ok(Vec::new());
        }
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.profiles_dir)? {
            let entry = entry?;
            if let Some(name) = file_stem_if_json(&entry.path()) {
                names.push(name);
            }
        }
        names.sort();
        Ok(names)
    }
}

fn file_stem_if_json(path: &Path) -> Option<String> {
    if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
        return None;
    }
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .map(std::string::ToString::to_string)
}
