use std::fs;
use std::path::PathBuf;

use crate::credential::Credential;
use crate::error::AuthError;

const CREDENTIAL_FILE: &str = "credential.json";

/// On-disk persistence for the OAuth credential, written after every
/// successful exchange or refresh and read once at startup.
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    pub fn new() -> Result<Self, AuthError> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| AuthError::Storage("no cache directory available".to_string()))?
            .join("zoncli");
        Self::with_dir(cache_dir)
    }

    /// Store rooted at an explicit directory (used by tests).
    pub fn with_dir(dir: PathBuf) -> Result<Self, AuthError> {
        if !dir.exists() {
            fs::create_dir_all(&dir).map_err(|e| {
                AuthError::Storage(format!("failed to create cache directory: {e}"))
            })?;
        }
        Ok(Self {
            path: dir.join(CREDENTIAL_FILE),
        })
    }

    pub fn save(&self, credential: &Credential) -> Result<(), AuthError> {
        let json = serde_json::to_string_pretty(credential)?;

        fs::write(&self.path, json)
            .map_err(|e| AuthError::Storage(format!("failed to save credential: {e}")))?;

        // The file holds live tokens: owner read/write only.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = fs::metadata(&self.path)
                .map_err(|e| AuthError::Storage(format!("failed to read permissions: {e}")))?
                .permissions();
            perms.set_mode(0o600);
            fs::set_permissions(&self.path, perms)
                .map_err(|e| AuthError::Storage(format!("failed to set permissions: {e}")))?;
        }

        Ok(())
    }

    pub fn load(&self) -> Result<Option<Credential>, AuthError> {
        if !self.path.exists() {
            return Ok(None);
        }

        let json = fs::read_to_string(&self.path)
            .map_err(|e| AuthError::Storage(format!("failed to read credential: {e}")))?;

        let credential: Credential = serde_json::from_str(&json)?;
        Ok(Some(credential))
    }

    pub fn delete(&self) -> Result<(), AuthError> {
        if self.path.exists() {
            fs::remove_file(&self.path)
                .map_err(|e| AuthError::Storage(format!("failed to delete credential: {e}")))?;
        }
        Ok(())
    }
}
