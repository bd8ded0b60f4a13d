use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ExplorerError;

/// Settings read from the YAML file passed with `--config`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplorerConfig {
    pub database_url: Option<String>,
    /// Used when `--user` is not given.
    pub default_user: Option<String>,
    /// Usernames granted the admin role when they sign in.
    pub admins: Vec<String>,
}

impl ExplorerConfig {
    pub fn load(path: &Path) -> Result<Self, ExplorerError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ExplorerError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml(&contents).map_err(|source| ExplorerError::Yaml {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn from_yaml(contents: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(contents)
    }

    pub fn is_admin(&self, username: &str) -> bool {
        self.admins.iter().any(|admin| admin == username)
    }
}
