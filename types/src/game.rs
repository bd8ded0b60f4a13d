use std::fmt::Display;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{join_code::JoinCode, scenario::ScenarioError, Scenario};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameType {
    Quiz,
    Story,
}

impl GameType {
    pub fn as_str(self) -> &'static str {
        match self {
            GameType::Quiz => "quiz",
            GameType::Story => "story",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "quiz" => Some(GameType::Quiz),
            "story" => Some(GameType::Story),
            _ => None,
        }
    }
}

impl Display for GameType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Game {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub game_type: GameType,
    pub game_code: JoinCode,
    pub creator_id: Uuid,
    pub play_count: i64,
    pub is_official: bool,
    pub is_under_review: bool,
    pub cover_image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub scenarios: Vec<Scenario>,
}

impl Game {
    pub fn scenario_count(&self) -> usize {
        self.scenarios.len()
    }

    pub fn validate(&self) -> Result<(), ScenarioError> {
        self.scenarios.iter().try_for_each(Scenario::validate)
    }
}

impl Display for Game {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} [{}] {} ({} scenarios, played {} times)",
            self.game_code,
            self.game_type,
            self.title,
            self.scenarios.len(),
            self.play_count
        )
    }
}

/// Authoring input: what the editor form submits.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameDraft {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_game_type")]
    pub game_type: GameType,
    #[serde(default)]
    pub cover_image_url: Option<String>,
    pub scenarios: Vec<Scenario>,
}

fn default_game_type() -> GameType {
    GameType::Quiz
}

impl GameDraft {
    /// Normalizes every scenario and checks the authoring invariants.
    pub fn prepare(mut self) -> Result<Self, ScenarioError> {
        self.scenarios = self
            .scenarios
            .into_iter()
            .map(Scenario::normalize)
            .collect();
        self.scenarios.iter().try_for_each(Scenario::validate)?;
        Ok(self)
    }
}
