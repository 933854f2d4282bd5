//! Owned store for the persisted login session.
//!
//! The token and the cached user profile live in a single TOML file so they
//! are always written and cleared together. Every read goes to disk, which
//! keeps independently constructed handles (the API client and the auth
//! manager each hold one) coherent without shared in-memory state.

use crate::api::User;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::error::Error as StdError;
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Persisted session state. `token` and `user` are only ever `Some` together
/// once a login completes; a token without a profile exists transiently while
/// the profile fetch is in flight.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub token: Option<String>,
    pub user: Option<User>,
}

/// Errors that can occur when persisting or clearing the session file.
#[derive(Debug)]
pub enum SessionError {
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    Remove {
        path: PathBuf,
        source: std::io::Error,
    },
    Serialize {
        source: toml::ser::Error,
    },
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::Write { path, source } => {
                write!(f, "Failed to write session at {}: {}", path.display(), source)
            }
            SessionError::Remove { path, source } => {
                write!(
                    f,
                    "Failed to remove session at {}: {}",
                    path.display(),
                    source
                )
            }
            SessionError::Serialize { source } => {
                write!(f, "Failed to serialize session: {source}")
            }
        }
    }
}

impl StdError for SessionError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            SessionError::Write { source, .. } => Some(source),
            SessionError::Remove { source, .. } => Some(source),
            SessionError::Serialize { source } => Some(source),
        }
    }
}

/// Handle to the on-disk session. Cloning yields another handle to the same
/// file.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    /// Open the session at the platform config location.
    pub fn open() -> Self {
        Self {
            path: default_session_path(),
        }
    }

    /// Open a session at an explicit path (used by tests).
    pub fn at(path: PathBuf) -> Self {
        Self { path }
    }

    /// Load the current session; a missing or unreadable file is an anonymous
    /// session, never an error.
    pub fn load(&self) -> Session {
        match fs::read_to_string(&self.path) {
            Ok(contents) => toml::from_str(&contents).unwrap_or_default(),
            Err(_) => Session::default(),
        }
    }

    pub fn token(&self) -> Option<String> {
        self.load().token
    }

    pub fn user(&self) -> Option<User> {
        self.load().user
    }

    /// Derived from token presence, never tracked separately.
    pub fn is_authenticated(&self) -> bool {
        self.load().token.is_some()
    }

    /// Atomically replace the persisted session.
    pub fn save(&self, session: &Session) -> Result<(), SessionError> {
        let contents = toml::to_string_pretty(session)
            .map_err(|source| SessionError::Serialize { source })?;
        let parent = self.path.parent().filter(|dir| !dir.as_os_str().is_empty());

        if let Some(dir) = parent {
            fs::create_dir_all(dir).map_err(|source| self.write_error(source))?;
        }

        let mut temp_file = match parent {
            Some(dir) => NamedTempFile::new_in(dir),
            None => NamedTempFile::new(),
        }
        .map_err(|source| self.write_error(source))?;

        temp_file
            .write_all(contents.as_bytes())
            .map_err(|source| self.write_error(source))?;
        temp_file
            .as_file_mut()
            .sync_all()
            .map_err(|source| self.write_error(source))?;
        temp_file
            .persist(&self.path)
            .map_err(|err| self.write_error(err.error))?;
        Ok(())
    }

    /// Delete the session file. Idempotent: succeeds when no session exists.
    pub fn clear(&self) -> Result<(), SessionError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(SessionError::Remove {
                path: self.path.clone(),
                source,
            }),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_error(&self, source: std::io::Error) -> SessionError {
        SessionError::Write {
            path: self.path.clone(),
            source,
        }
    }
}

fn default_session_path() -> PathBuf {
    let proj_dirs = ProjectDirs::from("org", "permacommons", "eventline")
        .expect("Failed to determine config directory");
    proj_dirs.config_dir().join("session.toml")
}
