use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard, PoisonError};

use rusqlite::OptionalExtension;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::warn;

use shop_admin::{CredentialProvider, GitHubCredentials};

use crate::schema;

const GITHUB_TOKEN: &str = "github_token";
const GITHUB_OWNER: &str = "github_owner";
const GITHUB_REPO: &str = "github_repo";
const GITHUB_BRANCH: &str = "github_branch";
const VIEW_MODE: &str = "view_mode";
const SESSION: &str = "session";

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("database error: {0}")]
    Database(String),

    #[error("migration error: {0}")]
    Migration(String),

    #[error("corrupt setting {key}: {message}")]
    Corrupt { key: String, message: String },
}

impl From<rusqlite::Error> for SettingsError {
    fn from(e: rusqlite::Error) -> Self {
        Self::Database(e.to_string())
    }
}

/// How the product list is rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ViewMode {
    #[default]
    Table,
    Cards,
}

impl ViewMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Table => "table",
            Self::Cards => "cards",
        }
    }
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ViewMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "table" => Ok(Self::Table),
            "cards" => Ok(Self::Cards),
            other => Err(format!("unknown view mode {other:?} (expected table or cards)")),
        }
    }
}

/// Fields from the credentials form. Blank or missing fields keep the
/// stored value.
#[derive(Debug, Clone, Default)]
pub struct CredentialUpdate {
    pub token: Option<String>,
    pub owner: Option<String>,
    pub repo: Option<String>,
    pub branch: Option<String>,
}

/// Durable key-value settings on SQLite.
pub struct SettingsStore {
    conn: Mutex<rusqlite::Connection>,
}

impl SettingsStore {
    /// Open a store backed by a file on disk.
    pub fn open(path: &Path) -> Result<Self, SettingsError> {
        Self::init(rusqlite::Connection::open(path)?)
    }

    /// Open an in-memory store (for testing).
    pub fn open_in_memory() -> Result<Self, SettingsError> {
        Self::init(rusqlite::Connection::open_in_memory()?)
    }

    fn init(mut conn: rusqlite::Connection) -> Result<Self, SettingsError> {
        schema::migrations()
            .to_latest(&mut conn)
            .map_err(|e| SettingsError::Migration(e.to_string()))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> MutexGuard<'_, rusqlite::Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn get(&self, key: &str) -> Result<Option<String>, SettingsError> {
        let value = self
            .conn()
            .query_row("SELECT value FROM settings WHERE key = ?1", [key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    pub fn set(&self, key: &str, value: &str) -> Result<(), SettingsError> {
        self.conn().execute(
            "INSERT INTO settings (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            [key, value],
        )?;
        Ok(())
    }

    pub fn remove(&self, key: &str) -> Result<(), SettingsError> {
        self.conn()
            .execute("DELETE FROM settings WHERE key = ?1", [key])?;
        Ok(())
    }

    /// The saved credential tuple, if token, owner and repo are all set.
    pub fn load_credentials(&self) -> Result<Option<GitHubCredentials>, SettingsError> {
        let token = self.get(GITHUB_TOKEN)?;
        let owner = self.get(GITHUB_OWNER)?;
        let repo = self.get(GITHUB_REPO)?;
        let branch = self.get(GITHUB_BRANCH)?;

        Ok(match (token, owner, repo) {
            (Some(token), Some(owner), Some(repo)) => {
                Some(GitHubCredentials::new(token, owner, repo, branch))
            }
            _ => None,
        })
    }

    /// Overwrite only the fields the operator filled in.
    pub fn update_credentials(&self, update: &CredentialUpdate) -> Result<(), SettingsError> {
        let fields = [
            (GITHUB_TOKEN, &update.token),
            (GITHUB_OWNER, &update.owner),
            (GITHUB_REPO, &update.repo),
            (GITHUB_BRANCH, &update.branch),
        ];

        let mut conn = self.conn();
        let tx = conn.transaction()?;
        for (key, value) in fields {
            if let Some(value) = value.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
                tx.execute(
                    "INSERT INTO settings (key, value) VALUES (?1, ?2)
                     ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                    [key, value],
                )?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    pub fn clear_credentials(&self) -> Result<(), SettingsError> {
        self.conn().execute(
            "DELETE FROM settings WHERE key IN (?1, ?2, ?3, ?4)",
            [GITHUB_TOKEN, GITHUB_OWNER, GITHUB_REPO, GITHUB_BRANCH],
        )?;
        Ok(())
    }

    /// Saved view mode. An unrecognized value falls back to the default.
    pub fn view_mode(&self) -> Result<ViewMode, SettingsError> {
        Ok(match self.get(VIEW_MODE)? {
            Some(raw) => raw.parse().unwrap_or_else(|e: String| {
                warn!("ignoring saved view mode: {e}");
                ViewMode::default()
            }),
            None => ViewMode::default(),
        })
    }

    pub fn set_view_mode(&self, mode: ViewMode) -> Result<(), SettingsError> {
        self.set(VIEW_MODE, mode.as_str())
    }

    pub fn load_session<T: DeserializeOwned>(&self) -> Result<Option<T>, SettingsError> {
        self.get(SESSION)?
            .map(|raw| {
                serde_json::from_str(&raw).map_err(|e| SettingsError::Corrupt {
                    key: SESSION.into(),
                    message: e.to_string(),
                })
            })
            .transpose()
    }

    pub fn save_session<T: Serialize>(&self, session: &T) -> Result<(), SettingsError> {
        let raw = serde_json::to_string(session).map_err(|e| SettingsError::Corrupt {
            key: SESSION.into(),
            message: e.to_string(),
        })?;
        self.set(SESSION, &raw)
    }

    pub fn clear_session(&self) -> Result<(), SettingsError> {
        self.remove(SESSION)
    }
}

#[async_trait::async_trait]
impl CredentialProvider for SettingsStore {
    async fn credentials(&self) -> Option<GitHubCredentials> {
        match self.load_credentials() {
            Ok(creds) => creds,
            Err(e) => {
                warn!(error = %e, "could not read saved credentials");
                None
            }
        }
    }
}
