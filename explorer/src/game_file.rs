use std::path::Path;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use types::{Game, GameDraft, JoinCode};
use uuid::Uuid;

use crate::error::ExplorerError;

/// A game definition on disk: the editor's draft plus an optional fixed
/// join code for offline play.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameFile {
    #[serde(default)]
    pub game_code: Option<String>,
    #[serde(flatten)]
    pub draft: GameDraft,
}

impl GameFile {
    pub fn load(path: &Path) -> Result<Self, ExplorerError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ExplorerError::Io {
            path: path.display().to_string(),
            source,
        })?;
        serde_yaml::from_str(&contents).map_err(|source| ExplorerError::Yaml {
            path: path.display().to_string(),
            source,
        })
    }

    /// Builds a playable game that never touches a database. `fallback_code`
    /// is used when the file does not pin one.
    pub fn into_game(self, fallback_code: &str) -> Result<Game, ExplorerError> {
        let code = self.game_code.as_deref().unwrap_or(fallback_code);
        let game_code = JoinCode::parse(code)
            .map_err(|err| ExplorerError::Config(format!("game file join code: {err}")))?;
        let draft = self.draft.prepare()?;
        Ok(Game {
            id: Uuid::new_v4(),
            title: draft.title,
            description: draft.description,
            game_type: draft.game_type,
            game_code,
            creator_id: Uuid::new_v4(),
            play_count: 0,
            is_official: true,
            is_under_review: false,
            cover_image_url: draft.cover_image_url,
            created_at: Utc::now(),
            scenarios: draft.scenarios,
        })
    }
}
