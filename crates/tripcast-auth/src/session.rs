use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// The signed-in account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Provider-assigned account id; trips are owned by this id
    pub uid: String,
    pub email: String,
    pub display_name: Option<String>,
}

/// Tokens for an authenticated user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub user: User,

    /// Short-lived token sent with account requests
    pub id_token: String,

    pub refresh_token: Option<String>,

    /// Token expiration timestamp (Unix timestamp)
    pub expires_at: i64,
}

impl Session {
    /// Check if the token needs refresh (within 5 minutes of expiry)
    pub fn needs_refresh(&self) -> bool {
        let now = chrono::Utc::now().timestamp();
        now >= self.expires_at - 300
    }

    pub fn is_expired(&self) -> bool {
        let now = chrono::Utc::now().timestamp();
        now >= self.expires_at
    }
}

/// Session persisted as a JSON file in the data directory
pub struct SessionStorage {
    path: PathBuf,
}

impl SessionStorage {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    pub fn store(&self, session: &Session) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).context("Failed to create session directory")?;
        }

        let json = serde_json::to_string_pretty(session).context("Failed to serialize session")?;

        fs::write(&self.path, &json).context("Failed to write session file")?;

        tracing::info!("Stored session for {} at {:?}", session.user.email, self.path);
        Ok(())
    }

    /// The stored session, or `None` if there is none
    pub fn retrieve(&self) -> Result<Option<Session>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let json = fs::read_to_string(&self.path).context("Failed to read session file")?;

        let session: Session =
            serde_json::from_str(&json).context("Failed to deserialize session")?;

        Ok(Some(session))
    }

    pub fn delete(&self) -> Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path).context("Failed to delete session file")?;
            tracing::info!("Deleted stored session");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;
    use tempfile::tempdir;

    fn session(expires_at: i64) -> Session {
        Session {
            user: User {
                uid: "uid-1".to_string(),
                email: "ada@example.com".to_string(),
                display_name: Some("Ada".to_string()),
            },
            id_token: "token".to_string(),
            refresh_token: None,
            expires_at,
        }
    }

    #[test]
    fn test_session_expiry() {
        let now = chrono::Utc::now().timestamp();

        let expired = session(now - 3600);
        assert!(expired.is_expired());
        assert!(expired.needs_refresh());

        let valid = session(now + 3600);
        assert!(!valid.is_expired());
        assert!(!valid.needs_refresh());

        let soon = session(now + 200);
        assert!(!soon.is_expired());
        assert!(soon.needs_refresh());
    }

    #[test]
    fn test_store_retrieve_delete() {
        let dir = tempdir().unwrap();
        let storage = SessionStorage::new(&dir.path().join("nested").join("session.json"));

        assert!(storage.retrieve().unwrap().is_none());

        storage.store(&session(42)).unwrap();
        let loaded = storage.retrieve().unwrap().unwrap();
        assert_eq!(loaded.user.uid, "uid-1");
        assert_eq!(loaded.expires_at, 42);

        storage.delete().unwrap();
        assert!(storage.retrieve().unwrap().is_none());
        storage.delete().unwrap();
    }

    #[test]
    fn test_corrupt_file_is_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "nope").unwrap();
        assert!(SessionStorage::new(&path).retrieve().is_err());
    }
}
