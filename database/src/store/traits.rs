use async_trait::async_trait;
use types::{Game, JoinCode, ScoreRecord, SessionSnapshot};
use uuid::Uuid;

use crate::DatabaseError;

/// Everything a play session reads from and writes to the backend.
#[async_trait]
pub trait GameStore: Send + Sync {
    async fn fetch_game_by_code(&mut self, code: &JoinCode) -> Result<Option<Game>, DatabaseError>;
    async fn fetch_session(
        &mut self,
        user_id: Uuid,
        game_id: Uuid,
    ) -> Result<Option<SessionSnapshot>, DatabaseError>;
    async fn fetch_score(
        &mut self,
        user_id: Uuid,
        game_id: Uuid,
    ) -> Result<Option<ScoreRecord>, DatabaseError>;

    /// Last write wins; keyed by (user, game).
    async fn upsert_session(&mut self, snapshot: &SessionSnapshot) -> Result<(), DatabaseError>;
    async fn delete_session(&mut self, user_id: Uuid, game_id: Uuid) -> Result<(), DatabaseError>;

    async fn insert_score(
        &mut self,
        user_id: Uuid,
        game_id: Uuid,
        score: f64,
        scenario_count: usize,
    ) -> Result<ScoreRecord, DatabaseError>;
    /// Adds `score_delta` and keeps the larger scenario count.
    async fn update_score(
        &mut self,
        score_id: Uuid,
        score_delta: f64,
        scenario_count: usize,
    ) -> Result<ScoreRecord, DatabaseError>;

    async fn increment_play_count(&mut self, game_id: Uuid) -> Result<(), DatabaseError>;
    async fn grant_xp(&mut self, user_id: Uuid, xp: f64) -> Result<(), DatabaseError>;
}
