//! OAuth token storage (token.json in the data directory).

use std::path::{Path, PathBuf};

use tokio::sync::Mutex;

use super::{is_token_expired, refresh_access_token, GoogleApiError, GoogleToken};

/// File-backed token store. Refreshes are serialized per store.
pub struct TokenStore {
    path: PathBuf,
    refresh_lock: Mutex<()>,
}

impl TokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            refresh_lock: Mutex::new(()),
        }
    }

    /// token.json inside `data_dir`.
    pub fn in_dir(data_dir: &Path) -> Self {
        Self::new(data_dir.join("google").join("token.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<GoogleToken, GoogleApiError> {
        if !self.path.exists() {
            return Err(GoogleApiError::TokenNotFound(self.path.clone()));
        }
        let content = std::fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save(&self, token: &GoogleToken) -> Result<(), GoogleApiError> {
        if let Some(parent) = self.path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent)?;
                #[cfg(unix)]
                {
                    use std::os::unix::fs::PermissionsExt;
                    std::fs::set_permissions(parent, std::fs::Permissions::from_mode(0o700))?;
                }
            }
        }

        let content = serde_json::to_string_pretty(token)?;
        std::fs::write(&self.path, content)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))?;
        }
        Ok(())
    }

    /// Sign out.
    pub fn delete(&self) -> Result<(), GoogleApiError> {
        if self.path.exists() {
            std::fs::remove_file(&self.path)?;
        }
        Ok(())
    }

    /// Signed-in account email, without propagating errors.
    pub fn peek_account_email(&self) -> Option<String> {
        self.load().ok().map(|token| {
            token
                .account
                .filter(|value| !value.trim().is_empty())
                .unwrap_or_else(|| "connected".to_string())
        })
    }

    /// A valid access token, refreshing and persisting it when expired.
    pub async fn valid_access_token(&self) -> Result<String, GoogleApiError> {
        let _guard = self.refresh_lock.lock().await;
        let token = self.load()?;
        if !is_token_expired(&token) {
            return Ok(token.token);
        }
        let refreshed = refresh_access_token(&token).await?;
        self.save(&refreshed)?;
        Ok(refreshed.token)
    }
}
