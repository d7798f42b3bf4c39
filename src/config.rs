use std::env;
use std::path::PathBuf;

use tracing::warn;

pub const ROSTER_VAR: &str = "GRADEBOOK_ROSTER";
pub const ADMIN_USER_VAR: &str = "GRADEBOOK_ADMIN_USER";
pub const ADMIN_PASSWORD_VAR: &str = "GRADEBOOK_ADMIN_PASSWORD";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminCredentials {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    /// CSV roster to load instead of the built-in sample.
    pub roster: Option<PathBuf>,
    /// Admin login is disabled when unset.
    pub admin: Option<AdminCredentials>,
}

impl Config {
    /// Reads settings from the process environment, after loading `.env` if present.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let admin = match (non_empty(ADMIN_USER_VAR), non_empty(ADMIN_PASSWORD_VAR)) {
            (Some(username), Some(password)) => Some(AdminCredentials { username, password }),
            (Some(_), None) | (None, Some(_)) => {
                warn!(
                    "{ADMIN_USER_VAR} and {ADMIN_PASSWORD_VAR} must both be set; admin login disabled"
                );
                None
            }
            (None, None) => None,
        };

        Config {
            roster: non_empty(ROSTER_VAR).map(PathBuf::from),
            admin,
        }
    }

    pub fn with_roster(mut self, roster: Option<PathBuf>) -> Self {
        if roster.is_some() {
            self.roster = roster;
        }
        self
    }
}
