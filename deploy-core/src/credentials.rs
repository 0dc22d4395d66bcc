//! Secure credential persistence with encrypted-at-rest storage.
//!
//! Credentials are opt-in and write encrypted data to:
//! `~/.config/deploy-tool/credentials.enc` (or `$XDG_CONFIG_HOME/deploy-tool/credentials.enc`).

use std::collections::BTreeMap;
use std::env;
use std::ffi::OsString;
use std::fs;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::{Path, PathBuf};

use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::{Key, XChaCha20Poly1305, XNonce};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

const CREDENTIAL_FILE_NAME: &str = "credentials.enc";
const KEYRING_SERVICE: &str = "deploy-tool";
const KEYRING_ENTRY_NAME: &str = "credential-master-key-v1";
const MAGIC: &[u8; 4] = b"DPC1";
const NONCE_LEN: usize = 24;
const KEY_LEN: usize = 32;

/// Errors for persisted credential storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// No suitable user config directory is available.
    #[error("unable to determine config directory (set XDG_CONFIG_HOME or HOME)")]
    ConfigDirUnavailable,
    /// Filesystem I/O failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// Serialization/deserialization failed.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    /// Could not access keychain and no env fallback key was provided.
    #[error(
        "unable to access system keychain for credential encryption key; set DEPLOY_TOOL_MASTER_KEY or configure keychain access"
    )]
    KeychainUnavailable,
    /// Stored encrypted payload is malformed.
    #[error("persisted credential payload is invalid")]
    InvalidPayload,
    /// Encryption failed.
    #[error("failed to encrypt persisted credentials")]
    EncryptionFailed,
    /// Decryption failed.
    #[error("failed to decrypt persisted credentials")]
    DecryptionFailed,
    /// No credential stored for the requested profile.
    #[error("no stored credential for profile {0}")]
    NotFound(String),
}

/// A secret (password or private-key passphrase) associated with one
/// deployment profile's username.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Credential {
    pub secret: String,
}

impl Credential {
    #[must_use]
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }
}

/// Returns the default persisted credential path
/// (`~/.config/deploy-tool/credentials.enc`).
///
/// # Errors
///
/// Returns [`StorageError::ConfigDirUnavailable`] if no usable config dir is found.
pub fn persisted_credential_path() -> Result<PathBuf, StorageError> {
    Ok(default_config_dir()?.join(CREDENTIAL_FILE_NAME))
}

/// Stores the credential for `profile_name`, merging with any already-stored
/// credentials for other profiles.
///
/// # Errors
///
/// Returns [`StorageError`] when key retrieval, encryption, or file writing fails.
pub fn store_credential(profile_name: &str, credential: &Credential) -> Result<(), StorageError> {
    let path = persisted_credential_path()?;
    let key = load_or_create_key()?;
    let mut all = load_all_with_key_if_exists(&path, &key)?;
    all.insert(profile_name.to_string(), credential.clone());
    store_all_with_key(&all, &path, &key)
}

/// Loads the credential for `profile_name`.
///
/// # Errors
///
/// Returns [`StorageError::NotFound`] if no credential is stored for the
/// profile, or another [`StorageError`] variant on I/O or crypto failure.
pub fn load_credential(profile_name: &str) -> Result<Credential, StorageError> {
    let path = persisted_credential_path()?;
    let key = load_or_create_key()?;
    let all = load_all_with_key_if_exists(&path, &key)?;
    all.get(profile_name)
        .cloned()
        .ok_or_else(|| StorageError::NotFound(profile_name.to_string()))
}

/// Removes the credential for `profile_name`. Returns `true` if one existed.
///
/// # Errors
///
/// Returns [`StorageError`] when loading or re-writing the store fails.
pub fn remove_credential(profile_name: &str) -> Result<bool, StorageError> {
    let path = persisted_credential_path()?;
    let key = load_or_create_key()?;
    let mut all = load_all_with_key_if_exists(&path, &key)?;
    let removed = all.remove(profile_name).is_some();
    if removed {
        store_all_with_key(&all, &path, &key)?;
    }
    Ok(removed)
}

/// Removes all persisted credentials and best-effort clears the keychain key.
///
/// # Errors
///
/// Returns [`StorageError`] when file removal fails.
pub fn clear_all_credentials() -> Result<bool, StorageError> {
    let path = persisted_credential_path()?;
    let removed = if path.exists() {
        fs::remove_file(&path)?;
        true
    } else {
        false
    };

    if env::var_os("DEPLOY_TOOL_MASTER_KEY").is_none() {
        let _ = delete_keychain_key();
    }

    Ok(removed)
}

fn default_config_dir() -> Result<PathBuf, StorageError> {
    resolve_config_dir(
        sanitize_env_path(env::var_os("XDG_CONFIG_HOME")),
        sanitize_env_path(env::var_os("HOME")),
        sanitize_env_path(env::var_os("APPDATA")),
    )
}

fn sanitize_env_path(value: Option<OsString>) -> Option<PathBuf> {
    let value = value?;
    if value.to_string_lossy().trim().is_empty() {
        return None;
    }

    Some(PathBuf::from(value))
}

fn resolve_config_dir(
    xdg_config_home: Option<PathBuf>,
    home: Option<PathBuf>,
    app_data: Option<PathBuf>,
) -> Result<PathBuf, StorageError> {
    if let Some(xdg) = xdg_config_home {
        return Ok(xdg.join("deploy-tool"));
    }
    if let Some(home) = home {
        return Ok(home.join(".config").join("deploy-tool"));
    }
    if let Some(app_data) = app_data {
        return Ok(app_data.join("deploy-tool"));
    }

    Err(StorageError::ConfigDirUnavailable)
}

fn load_or_create_key() -> Result<String, StorageError> {
    if let Some(from_env) = env::var_os("DEPLOY_TOOL_MASTER_KEY") {
        let key = from_env.to_string_lossy().trim().to_string();
        if !key.is_empty() {
            return Ok(key);
        }
    }

    let entry = safe_keyring_entry()?;

    match safe_keyring_get_password(&entry) {
        Ok(existing) if !existing.trim().is_empty() => Ok(existing),
        _ => {
            let generated = generate_key_material();
            safe_keyring_set_password(&entry, &generated)?;
            Ok(generated)
        }
    }
}

fn delete_keychain_key() -> Result<(), StorageError> {
    let entry = safe_keyring_entry()?;
    let _ = safe_keyring_delete_credential(&entry);
    Ok(())
}

fn safe_keyring_entry() -> Result<keyring::Entry, StorageError> {
    catch_unwind(|| keyring::Entry::new(KEYRING_SERVICE, KEYRING_ENTRY_NAME))
        .map_err(|_| StorageError::KeychainUnavailable)?
        .map_err(|_| StorageError::KeychainUnavailable)
}

fn safe_keyring_get_password(entry: &keyring::Entry) -> Result<String, StorageError> {
    catch_unwind(AssertUnwindSafe(|| entry.get_password()))
        .map_err(|_| StorageError::KeychainUnavailable)?
        .map_err(|_| StorageError::KeychainUnavailable)
}

fn safe_keyring_set_password(entry: &keyring::Entry, password: &str) -> Result<(), StorageError> {
    catch_unwind(AssertUnwindSafe(|| entry.set_password(password)))
        .map_err(|_| StorageError::KeychainUnavailable)?
        .map_err(|_| StorageError::KeychainUnavailable)
}

fn safe_keyring_delete_credential(entry: &keyring::Entry) -> Result<(), StorageError> {
    catch_unwind(AssertUnwindSafe(|| entry.delete_credential()))
        .map_err(|_| StorageError::KeychainUnavailable)?
        .map_err(|_| StorageError::KeychainUnavailable)
}

fn generate_key_material() -> String {
    let mut bytes = [0_u8; KEY_LEN];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex_encode(&bytes)
}

fn hex_encode(bytes: &[u8]) -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        out.push(char::from(HEX[usize::from(byte >> 4)]));
        out.push(char::from(HEX[usize::from(byte & 0x0f)]));
    }
    out
}

fn derive_key_bytes(key_material: &str) -> [u8; KEY_LEN] {
    let digest = Sha256::digest(key_material.as_bytes());
    let mut key = [0_u8; KEY_LEN];
    key.copy_from_slice(&digest[..KEY_LEN]);
    key
}

fn load_all_with_key_if_exists(
    path: &Path,
    key_material: &str,
) -> Result<BTreeMap<String, Credential>, StorageError> {
    if !path.exists() {
        return Ok(BTreeMap::new());
    }
    load_all_with_key(path, key_material)
}

fn store_all_with_key(
    all: &BTreeMap<String, Credential>,
    path: &Path,
    key_material: &str,
) -> Result<(), StorageError> {
    let plaintext = serde_json::to_vec(all)?;
    let encrypted = encrypt_bytes(&plaintext, key_material)?;
    write_encrypted_payload(path, &encrypted)
}

fn write_encrypted_payload(path: &Path, payload: &[u8]) -> Result<(), StorageError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    fs::write(path, payload)?;
    set_owner_only_permissions(path)?;
    Ok(())
}

#[cfg(unix)]
fn set_owner_only_permissions(path: &Path) -> Result<(), StorageError> {
    use std::os::unix::fs::PermissionsExt;

    let permissions = fs::Permissions::from_mode(0o600);
    fs::set_permissions(path, permissions)?;
    Ok(())
}

#[cfg(not(unix))]
fn set_owner_only_permissions(_path: &Path) -> Result<(), StorageError> {
    Ok(())
}

fn load_all_with_key(
    path: &Path,
    key_material: &str,
) -> Result<BTreeMap<String, Credential>, StorageError> {
    let bytes = fs::read(path)?;
    let plaintext = decrypt_bytes(&bytes, key_material)?;
    Ok(serde_json::from_slice(&plaintext)?)
}

fn encrypt_bytes(plaintext: &[u8], key_material: &str) -> Result<Vec<u8>, StorageError> {
    let key_bytes = derive_key_bytes(key_material);
    let cipher = XChaCha20Poly1305::new(Key::from_slice(&key_bytes));

    let mut nonce = [0_u8; NONCE_LEN];
    rand::thread_rng().fill_bytes(&mut nonce);
    let nonce_ref = XNonce::from_slice(&nonce);

    let ciphertext = cipher
        .encrypt(nonce_ref, plaintext)
        .map_err(|_| StorageError::EncryptionFailed)?;

    let mut output = Vec::with_capacity(MAGIC.len() + NONCE_LEN + ciphertext.len());
    output.extend_from_slice(MAGIC);
    output.extend_from_slice(&nonce);
    output.extend_from_slice(&ciphertext);
    Ok(output)
}

fn decrypt_bytes(payload: &[u8], key_material: &str) -> Result<Vec<u8>, StorageError> {
    if payload.len() < MAGIC.len() + NONCE_LEN || &payload[..MAGIC.len()] != MAGIC {
        return Err(StorageError::InvalidPayload);
    }

    let key_bytes = derive_key_bytes(key_material);
    let cipher = XChaCha20Poly1305::new(Key::from_slice(&key_bytes));
    let nonce_start = MAGIC.len();
    let nonce_end = nonce_start + NONCE_LEN;
    let nonce = XNonce::from_slice(&payload[nonce_start..nonce_end]);
    let ciphertext = &payload[nonce_end..];

    cipher
        .decrypt(nonce, ciphertext)
        .map_err(|_| StorageError::DecryptionFailed)
}

#[cfg(test)]
mod tests {
    use std::ffi::OsString;

    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_store_and_load_round_trip_with_explicit_key() {
        let tempdir = TempDir::new().unwrap();
        let path = tempdir.path().join("credentials.enc");
        let mut all = BTreeMap::new();
        all.insert("staging".to_string(), Credential::new("secret"));

        store_all_with_key(&all, &path, "test-key").unwrap();
        let loaded = load_all_with_key(&path, "test-key").unwrap();
        assert_eq!(loaded.get("staging").unwrap().secret, "secret");
    }

    #[test]
    fn test_load_with_wrong_key_fails() {
        let tempdir = TempDir::new().unwrap();
        let path = tempdir.path().join("credentials.enc");
        let mut all = BTreeMap::new();
        all.insert("staging".to_string(), Credential::new("secret"));
        store_all_with_key(&all, &path, "key-a").unwrap();

        let result = load_all_with_key(&path, "key-b");
        assert!(matches!(result, Err(StorageError::DecryptionFailed)));
    }

    #[test]
    fn test_invalid_payload_fails() {
        let tempdir = TempDir::new().unwrap();
        let path = tempdir.path().join("credentials.enc");
        fs::write(&path, b"not-encrypted-data").unwrap();

        let result = load_all_with_key(&path, "test-key");
        assert!(matches!(result, Err(StorageError::InvalidPayload)));
    }

    #[test]
    fn test_hex_encode_length() {
        let encoded = hex_encode(&[1_u8, 255_u8, 16_u8]);
        assert_eq!(encoded.len(), 6);
        assert_eq!(encoded, "01ff10");
    }

    #[test]
    fn test_sanitize_env_path_rejects_blank_values() {
        assert!(sanitize_env_path(Some(OsString::from(""))).is_none());
        assert!(sanitize_env_path(Some(OsString::from("   "))).is_none());
    }

    #[test]
    fn test_resolve_config_dir_prefers_xdg_over_home() {
        let resolved = resolve_config_dir(
            Some(PathBuf::from("/tmp/xdg")),
            Some(PathBuf::from("/tmp/home")),
            Some(PathBuf::from("/tmp/appdata")),
        )
        .unwrap();
        assert_eq!(resolved, PathBuf::from("/tmp/xdg/deploy-tool"));
    }

    #[test]
    fn test_resolve_config_dir_errors_when_all_sources_missing() {
        let result = resolve_config_dir(None, None, None);
        assert!(matches!(result, Err(StorageError::ConfigDirUnavailable)));
    }

    #[cfg(unix)]
    #[test]
    fn test_store_sets_owner_only_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let tempdir = TempDir::new().unwrap();
        let path = tempdir.path().join("credentials.enc");
        let mut all = BTreeMap::new();
        all.insert("staging".to_string(), Credential::new("secret"));
        store_all_with_key(&all, &path, "test-key").unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o600);
    }

    #[test]
    fn test_remove_from_multi_profile_store_preserves_others() {
        let tempdir = TempDir::new().unwrap();
        let path = tempdir.path().join("credentials.enc");
        let mut all = BTreeMap::new();
        all.insert("staging".to_string(), Credential::new("secret-a"));
        all.insert("production".to_string(), Credential::new("secret-b"));
        store_all_with_key(&all, &path, "test-key").unwrap();

        let mut reloaded = load_all_with_key(&path, "test-key").unwrap();
        reloaded.remove("staging");
        store_all_with_key(&reloaded, &path, "test-key").unwrap();

        let final_state = load_all_with_key(&path, "test-key").unwrap();
        assert!(!final_state.contains_key("staging"));
        assert_eq!(final_state.get("production").unwrap().secret, "secret-b");
    }
}
