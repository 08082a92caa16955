use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("session file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SessionError>;

/// Credentials persisted between runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedSession {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Access-token expiry, epoch milliseconds.
    #[serde(default)]
    pub expires_at: Option<i64>,
    /// When this record was written, epoch milliseconds.
    pub saved_at: i64,
}

/// A session file whose contents expire `max_age` after being written,
/// like a cookie with a max-age.
#[derive(Debug, Clone)]
pub struct SessionFile {
    path: PathBuf,
    max_age: Duration,
}

impl SessionFile {
    pub fn new(path: impl Into<PathBuf>, max_age: Duration) -> Self {
        Self {
            path: path.into(),
            max_age,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the session. Missing, expired, or token-less records read as
    /// `None`.
    pub fn load(&self, now_ms: i64) -> Result<Option<PersistedSession>> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(SessionError::Io {
                    path: self.path.clone(),
                    source,
                });
            }
        };
        let session: PersistedSession = serde_json::from_str(&content)?;
        if session.access_token.is_empty() {
            return Ok(None);
        }
        let age_ms = now_ms.saturating_sub(session.saved_at);
        let max_age_ms = i64::try_from(self.max_age.as_millis()).unwrap_or(i64::MAX);
        if age_ms > max_age_ms {
            debug!(age_ms, "persisted session expired");
            return Ok(None);
        }
        Ok(Some(session))
    }

    pub fn save(&self, session: &PersistedSession) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir).map_err(|source| SessionError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
        }
        let content = serde_json::to_string_pretty(session)?;
        std::fs::write(&self.path, content).map_err(|source| SessionError::Io {
            path: self.path.clone(),
            source,
        })
    }

    /// Remove the session file. Already absent is not an error.
    pub fn clear(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(SessionError::Io {
                path: self.path.clone(),
                source,
            }),
        }
    }
}
