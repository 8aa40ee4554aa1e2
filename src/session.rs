use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoredSession {
    token: Option<String>,
}

/// Bearer token for the Markly API, persisted between runs.
#[derive(Debug)]
pub struct Session {
    path: PathBuf,
    token: Option<String>,
}

impl Session {
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let token = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            let stored: StoredSession = toml::from_str(&content)?;
            stored.token.filter(|t| !t.trim().is_empty())
        } else {
            None
        };
        Ok(Self { path, token })
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    pub fn set_token(&mut self, token: String) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let stored = StoredSession {
            token: Some(token.clone()),
        };
        let content =
            toml::to_string_pretty(&stored).map_err(|e| AppError::Config(e.to_string()))?;
        std::fs::write(&self.path, content)?;
        self.token = Some(token);
        Ok(())
    }

    pub fn clear(&mut self) -> Result<()> {
        self.token = None;
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_survives_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("session.toml");

        let mut session = Session::load(&path).unwrap();
        assert!(!session.is_authenticated());

        session.set_token("abc123".to_string()).unwrap();

        let reloaded = Session::load(&path).unwrap();
        assert_eq!(reloaded.token(), Some("abc123"));
    }

    #[test]
    fn test_clear_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.toml");

        let mut session = Session::load(&path).unwrap();
        session.set_token("abc123".to_string()).unwrap();
        session.clear().unwrap();

        assert!(!session.is_authenticated());
        assert!(!path.exists());
        // Clearing twice is fine
        session.clear().unwrap();
    }

    #[test]
    fn test_blank_token_is_not_a_session() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.toml");
        std::fs::write(&path, "token = \"  \"\n").unwrap();

        let session = Session::load(&path).unwrap();
        assert!(!session.is_authenticated());
    }
}
