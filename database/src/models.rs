use serde::{Deserialize, Serialize};
use types::{Game, GameType, JoinCode, Report};
use uuid::Uuid;

/// A game without its scenarios, as shown on list pages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSummary {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub game_type: GameType,
    pub game_code: JoinCode,
    pub creator_id: Uuid,
    pub creator_username: Option<String>,
    pub play_count: i64,
    pub is_official: bool,
    pub is_under_review: bool,
    pub cover_image_url: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<&Game> for GameSummary {
    fn from(game: &Game) -> Self {
        Self {
            id: game.id,
            title: game.title.clone(),
            description: game.description.clone(),
            game_type: game.game_type,
            game_code: game.game_code.clone(),
            creator_id: game.creator_id,
            creator_username: None,
            play_count: game.play_count,
            is_official: game.is_official,
            is_under_review: game.is_under_review,
            cover_image_url: game.cover_image_url.clone(),
            created_at: game.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameListing {
    pub game: GameSummary,
    pub completed: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GameCatalog {
    pub official: Vec<GameListing>,
    pub community: Vec<GameListing>,
}

/// What an edit did to existing player progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProgressReset {
    /// Scenarios untouched, progress kept.
    None,
    /// Scenarios were added: sessions cleared, scores kept so players
    /// continue from the new content.
    SessionsOnly,
    /// Scenarios were edited or removed: scores and sessions cleared.
    Full,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreWithTitle {
    pub score_id: Uuid,
    pub game_title: String,
    pub game_code: JoinCode,
    pub score_achieved: f64,
    pub scenario_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingReport {
    pub report: Report,
    pub game_title: Option<String>,
    pub game_code: Option<JoinCode>,
}
