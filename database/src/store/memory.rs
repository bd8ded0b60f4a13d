use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::Utc;
use types::{Game, JoinCode, ScoreRecord, SessionSnapshot};
use uuid::Uuid;

use super::GameStore;
use crate::DatabaseError;

/// Keeps everything in maps. Used for offline play from a game file and in
/// tests, where `fail_writes` simulates an unreachable backend and
/// `fail_operation` breaks a single write.
#[derive(Debug, Default)]
pub struct MemoryStore {
    games: HashMap<Uuid, Game>,
    sessions: HashMap<(Uuid, Uuid), SessionSnapshot>,
    scores: HashMap<(Uuid, Uuid), ScoreRecord>,
    xp: HashMap<Uuid, f64>,
    fail_writes: bool,
    failing: HashSet<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_game(&mut self, game: Game) {
        self.games.insert(game.id, game);
    }

    pub fn replace_scenarios(&mut self, game_id: Uuid, scenarios: Vec<types::Scenario>) {
        if let Some(game) = self.games.get_mut(&game_id) {
            game.scenarios = scenarios;
        }
    }

    pub fn set_fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }

    /// Makes only the named trait write (e.g. `"insert_score"`) fail.
    pub fn fail_operation(&mut self, op: &str) {
        self.failing.insert(op.to_string());
    }

    pub fn session_for(&self, user_id: Uuid, game_id: Uuid) -> Option<&SessionSnapshot> {
        self.sessions.get(&(user_id, game_id))
    }

    pub fn score_for(&self, user_id: Uuid, game_id: Uuid) -> Option<&ScoreRecord> {
        self.scores.get(&(user_id, game_id))
    }

    pub fn xp_for(&self, user_id: Uuid) -> f64 {
        self.xp.get(&user_id).copied().unwrap_or_default()
    }

    pub fn play_count(&self, game_id: Uuid) -> Option<i64> {
        self.games.get(&game_id).map(|g| g.play_count)
    }

    fn check_writable(&self, op: &str) -> Result<(), DatabaseError> {
        if self.fail_writes || self.failing.contains(op) {
            return Err(DatabaseError::Unavailable(op.to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl GameStore for MemoryStore {
    async fn fetch_game_by_code(&mut self, code: &JoinCode) -> Result<Option<Game>, DatabaseError> {
        Ok(self.games.values().find(|g| &g.game_code == code).cloned())
    }

    async fn fetch_session(
        &mut self,
        user_id: Uuid,
        game_id: Uuid,
    ) -> Result<Option<SessionSnapshot>, DatabaseError> {
        Ok(self.sessions.get(&(user_id, game_id)).cloned())
    }

    async fn fetch_score(
        &mut self,
        user_id: Uuid,
        game_id: Uuid,
    ) -> Result<Option<ScoreRecord>, DatabaseError> {
        Ok(self.scores.get(&(user_id, game_id)).cloned())
    }

    async fn upsert_session(&mut self, snapshot: &SessionSnapshot) -> Result<(), DatabaseError> {
        self.check_writable("upsert_session")?;
        self.sessions
            .insert((snapshot.user_id, snapshot.game_id), snapshot.clone());
        Ok(())
    }

    async fn delete_session(&mut self, user_id: Uuid, game_id: Uuid) -> Result<(), DatabaseError> {
        self.check_writable("delete_session")?;
        self.sessions.remove(&(user_id, game_id));
        Ok(())
    }

    async fn insert_score(
        &mut self,
        user_id: Uuid,
        game_id: Uuid,
        score: f64,
        scenario_count: usize,
    ) -> Result<ScoreRecord, DatabaseError> {
        self.check_writable("insert_score")?;
        if self.scores.contains_key(&(user_id, game_id)) {
            return Err(DatabaseError::Query(format!(
                "UNIQUE constraint failed: scores ({user_id}, {game_id})"
            )));
        }
        let record = ScoreRecord {
            id: Uuid::new_v4(),
            user_id,
            game_id,
            score_achieved: score,
            scenario_count,
            created_at: Utc::now(),
        };
        self.scores.insert((user_id, game_id), record.clone());
        Ok(record)
    }

    async fn update_score(
        &mut self,
        score_id: Uuid,
        score_delta: f64,
        scenario_count: usize,
    ) -> Result<ScoreRecord, DatabaseError> {
        self.check_writable("update_score")?;
        let record = self
            .scores
            .values_mut()
            .find(|r| r.id == score_id)
            .ok_or(DatabaseError::ScoreNotFound(score_id))?;
        record.score_achieved += score_delta;
        record.scenario_count = record.scenario_count.max(scenario_count);
        Ok(record.clone())
    }

    async fn increment_play_count(&mut self, game_id: Uuid) -> Result<(), DatabaseError> {
        self.check_writable("increment_play_count")?;
        let game = self
            .games
            .get_mut(&game_id)
            .ok_or_else(|| DatabaseError::GameNotFound(game_id.to_string()))?;
        game.play_count += 1;
        Ok(())
    }

    async fn grant_xp(&mut self, user_id: Uuid, xp: f64) -> Result<(), DatabaseError> {
        self.check_writable("grant_xp")?;
        *self.xp.entry(user_id).or_default() += xp;
        Ok(())
    }
}
