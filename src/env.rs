use nix::unistd::{User, geteuid};
use std::env as stdenv;
use std::path::{Path, PathBuf};

/// Name of the history file kept in the user's home directory.
pub const HISTORY_FILE: &str = ".vsh_history";

/// Variable that points the history file somewhere else.
pub const HISTORY_FILE_VAR: &str = "VSH_HISTFILE";

/// Session state the shell carries between command lines.
///
/// Variables are not part of it: `$NAME` expansion reads the process
/// environment directly.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    /// Target of a bare `cd`.
    pub home: Option<PathBuf>,
    /// In-memory command history shown by the `history` builtin.
    pub history: Vec<String>,
}

impl Environment {
    /// Captures the effective user's home directory, with an empty history.
    pub fn new() -> Self {
        Self {
            home: effective_user().map(|user| user.dir),
            history: Vec::new(),
        }
    }

    /// Where history is loaded from and saved to: `$VSH_HISTFILE` when set
    /// and non-empty, `~/.vsh_history` otherwise.
    pub fn history_path(&self) -> Option<PathBuf> {
        resolve_history_path(stdenv::var(HISTORY_FILE_VAR).ok(), self.home.as_deref())
    }
}

fn resolve_history_path(histfile: Option<String>, home: Option<&Path>) -> Option<PathBuf> {
    match histfile {
        Some(path) if !path.is_empty() => Some(PathBuf::from(path)),
        _ => home.map(|home| home.join(HISTORY_FILE)),
    }
}

/// Looks up the effective user in the user database.
pub fn effective_user() -> Option<User> {
    match User::from_uid(geteuid()) {
        Ok(user) => user,
        Err(e) => {
            log::warn!("user database lookup failed: {e}");
            None
        }
    }
}
