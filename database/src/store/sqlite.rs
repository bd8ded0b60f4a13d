use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;
use types::{Game, JoinCode, ScoreRecord, SessionSnapshot};
use uuid::Uuid;

use super::rows::{game_summary_from_row, scenario_from_row, score_from_row, session_from_row};
use super::GameStore;
use crate::{DatabaseConfig, DatabaseError};

#[derive(Debug, Clone)]
pub struct SqliteStore {
    pub(crate) pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Opens the pool described by `config` and brings the schema up to date.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, DatabaseError> {
        let store = Self::new(config.create_pool().await?);
        store.run_migrations().await?;
        Ok(store)
    }

    pub async fn run_migrations(&self) -> Result<(), DatabaseError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| DatabaseError::Migration(e.to_string()))?;
        tracing::debug!("Migrations applied");
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub(crate) async fn load_scenarios(
        &self,
        game_id: Uuid,
    ) -> Result<Vec<types::Scenario>, DatabaseError> {
        let rows = sqlx::query("SELECT * FROM scenarios WHERE game_id = ? ORDER BY position")
            .bind(game_id.to_string())
            .fetch_all(&self.pool)
            .await
            .map_err(DatabaseError::query)?;
        rows.iter().map(scenario_from_row).collect()
    }

    pub(crate) async fn load_game(&self, row: &sqlx::sqlite::SqliteRow) -> Result<Game, DatabaseError> {
        let summary = game_summary_from_row(row)?;
        let scenarios = self.load_scenarios(summary.id).await?;
        Ok(Game {
            id: summary.id,
            title: summary.title,
            description: summary.description,
            game_type: summary.game_type,
            game_code: summary.game_code,
            creator_id: summary.creator_id,
            play_count: summary.play_count,
            is_official: summary.is_official,
            is_under_review: summary.is_under_review,
            cover_image_url: summary.cover_image_url,
            created_at: summary.created_at,
            scenarios,
        })
    }

    pub async fn fetch_game(&self, game_id: Uuid) -> Result<Option<Game>, DatabaseError> {
        let row = sqlx::query("SELECT * FROM games WHERE id = ?")
            .bind(game_id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(DatabaseError::query)?;
        match row {
            Some(row) => Ok(Some(self.load_game(&row).await?)),
            None => Ok(None),
        }
    }

    async fn score_by_id(&self, score_id: Uuid) -> Result<ScoreRecord, DatabaseError> {
        let row = sqlx::query("SELECT * FROM scores WHERE id = ?")
            .bind(score_id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(DatabaseError::query)?
            .ok_or(DatabaseError::ScoreNotFound(score_id))?;
        score_from_row(&row)
    }
}

#[async_trait]
impl GameStore for SqliteStore {
    async fn fetch_game_by_code(&mut self, code: &JoinCode) -> Result<Option<Game>, DatabaseError> {
        let row = sqlx::query("SELECT * FROM games WHERE game_code = ?")
            .bind(code.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(DatabaseError::query)?;
        match row {
            Some(row) => Ok(Some(self.load_game(&row).await?)),
            None => Ok(None),
        }
    }

    async fn fetch_session(
        &mut self,
        user_id: Uuid,
        game_id: Uuid,
    ) -> Result<Option<SessionSnapshot>, DatabaseError> {
        let row = sqlx::query("SELECT * FROM game_sessions WHERE user_id = ? AND game_id = ?")
            .bind(user_id.to_string())
            .bind(game_id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(DatabaseError::query)?;
        row.as_ref().map(session_from_row).transpose()
    }

    async fn fetch_score(
        &mut self,
        user_id: Uuid,
        game_id: Uuid,
    ) -> Result<Option<ScoreRecord>, DatabaseError> {
        let row = sqlx::query("SELECT * FROM scores WHERE user_id = ? AND game_id = ?")
            .bind(user_id.to_string())
            .bind(game_id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(DatabaseError::query)?;
        row.as_ref().map(score_from_row).transpose()
    }

    async fn upsert_session(&mut self, snapshot: &SessionSnapshot) -> Result<(), DatabaseError> {
        sqlx::query(
            "INSERT INTO game_sessions (user_id, game_id, current_scenario_index, score, hp, updated_at)
             VALUES (?, ?, ?, ?, ?, ?)
             ON CONFLICT(user_id, game_id) DO UPDATE SET
                current_scenario_index = excluded.current_scenario_index,
                score = excluded.score,
                hp = excluded.hp,
                updated_at = excluded.updated_at",
        )
        .bind(snapshot.user_id.to_string())
        .bind(snapshot.game_id.to_string())
        .bind(snapshot.current_scenario_index as i64)
        .bind(snapshot.score)
        .bind(i64::from(snapshot.hp))
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(DatabaseError::query)?;
        Ok(())
    }

    async fn delete_session(&mut self, user_id: Uuid, game_id: Uuid) -> Result<(), DatabaseError> {
        sqlx::query("DELETE FROM game_sessions WHERE user_id = ? AND game_id = ?")
            .bind(user_id.to_string())
            .bind(game_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(DatabaseError::query)?;
        Ok(())
    }

    async fn insert_score(
        &mut self,
        user_id: Uuid,
        game_id: Uuid,
        score: f64,
        scenario_count: usize,
    ) -> Result<ScoreRecord, DatabaseError> {
        let record = ScoreRecord {
            id: Uuid::new_v4(),
            user_id,
            game_id,
            score_achieved: score,
            scenario_count,
            created_at: Utc::now(),
        };
        sqlx::query(
            "INSERT INTO scores (id, user_id, game_id, score_achieved, scenario_count, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(record.id.to_string())
        .bind(user_id.to_string())
        .bind(game_id.to_string())
        .bind(score)
        .bind(scenario_count as i64)
        .bind(record.created_at)
        .execute(&self.pool)
        .await
        .map_err(DatabaseError::query)?;
        Ok(record)
    }

    async fn update_score(
        &mut self,
        score_id: Uuid,
        score_delta: f64,
        scenario_count: usize,
    ) -> Result<ScoreRecord, DatabaseError> {
        let result = sqlx::query(
            "UPDATE scores
             SET score_achieved = score_achieved + ?, scenario_count = MAX(scenario_count, ?)
             WHERE id = ?",
        )
        .bind(score_delta)
        .bind(scenario_count as i64)
        .bind(score_id.to_string())
        .execute(&self.pool)
        .await
        .map_err(DatabaseError::query)?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::ScoreNotFound(score_id));
        }
        self.score_by_id(score_id).await
    }

    async fn increment_play_count(&mut self, game_id: Uuid) -> Result<(), DatabaseError> {
        let result = sqlx::query("UPDATE games SET play_count = play_count + 1 WHERE id = ?")
            .bind(game_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(DatabaseError::query)?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::GameNotFound(game_id.to_string()));
        }
        Ok(())
    }

    async fn grant_xp(&mut self, user_id: Uuid, xp: f64) -> Result<(), DatabaseError> {
        let result = sqlx::query("UPDATE profiles SET total_xp = total_xp + ? WHERE id = ?")
            .bind(xp)
            .bind(user_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(DatabaseError::query)?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::ProfileNotFound(user_id.to_string()));
        }
        tracing::debug!(%user_id, xp, "Granted XP");
        Ok(())
    }
}
