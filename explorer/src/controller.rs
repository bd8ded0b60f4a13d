use database::GameStore;
use types::{
    EntryPoint, Identity, JoinCode, PlayState, RewardPolicy, RunResult, RunStatus, ScoreRecord,
    Step,
};

use crate::error::{Notice, PlayError};

/// What finalizing a completed run wrote back.
#[derive(Clone, Debug, PartialEq)]
pub struct Finalized {
    pub result: RunResult,
    /// `None` when the score write failed; see the session's notices.
    pub record: Option<ScoreRecord>,
    pub xp_granted: f64,
}

/// Drives a [`PlayState`] and keeps the store in step with it: progress is
/// saved after every answer, and completion or failure is written back once.
#[derive(Debug)]
pub struct PlaySession<'s, S: GameStore + ?Sized> {
    store: &'s mut S,
    state: PlayState,
    prior: Option<ScoreRecord>,
    notices: Vec<Notice>,
    finalized: Option<Finalized>,
}

impl<'s, S: GameStore + ?Sized> PlaySession<'s, S> {
    /// Loads the game behind `code` and resumes wherever the player left off.
    /// A run that turns out to be over already is finalized right away.
    pub async fn start(
        store: &'s mut S,
        identity: Option<Identity>,
        code: &str,
        entry: EntryPoint,
    ) -> Result<Self, PlayError> {
        let identity = identity.ok_or(PlayError::Unauthenticated)?;
        let code = JoinCode::parse(code).map_err(|err| {
            log::debug!("Rejected join code {code:?}: {err}");
            PlayError::GameNotFound(code.trim().to_string())
        })?;
        let game = store
            .fetch_game_by_code(&code)
            .await?
            .ok_or_else(|| PlayError::GameNotFound(code.to_string()))?;

        let prior = store.fetch_score(identity.user_id, game.id).await?;
        let policy = match RewardPolicy::for_entry(entry) {
            RewardPolicy::Normal => RewardPolicy::Normal,
            reduced if prior.as_ref().is_some_and(|r| r.covers(game.scenarios.len())) => reduced,
            reduced => {
                log::info!("{identity} has not completed {code}, playing at full reward instead of {reduced}");
                RewardPolicy::Normal
            }
        };
        let snapshot = match policy {
            RewardPolicy::Normal => store.fetch_session(identity.user_id, game.id).await?,
            RewardPolicy::Retry | RewardPolicy::Review => None,
        };
        let state = PlayState::resume(identity, game, snapshot, prior.as_ref(), policy)?;

        let mut session = Self {
            store,
            state,
            prior,
            notices: Vec::new(),
            finalized: None,
        };
        match session.state.status() {
            RunStatus::Completed => session.finalize().await,
            RunStatus::Failed => session.discard_progress().await,
            RunStatus::Playing => {}
        }
        Ok(session)
    }

    pub fn state(&self) -> &PlayState {
        &self.state
    }

    pub fn prior(&self) -> Option<&ScoreRecord> {
        self.prior.as_ref()
    }

    pub fn finalized(&self) -> Option<&Finalized> {
        self.finalized.as_ref()
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    pub fn continue_reading(&mut self) {
        self.state.continue_reading();
    }

    /// Applies the answer and saves progress. Repeat submissions for the
    /// same scenario change nothing and write nothing.
    pub async fn submit_answer(&mut self, option_key: Option<&str>) {
        let events = self.state.history.len();
        self.state.submit_answer(option_key);
        if self.state.history.len() == events {
            return;
        }
        match self.state.status() {
            RunStatus::Failed => self.discard_progress().await,
            RunStatus::Playing | RunStatus::Completed => self.save_progress().await,
        }
    }

    pub async fn advance(&mut self) -> Step {
        let step = self.state.advance();
        if matches!(step, Step::Finished(_)) && self.finalized.is_none() {
            self.finalize().await;
        }
        step
    }

    /// Best-effort save when the player walks away mid-run.
    pub async fn abandon(&mut self) {
        log::info!(
            "{} left {} at scenario {}",
            self.state.player,
            self.state.game.game_code,
            self.state.index() + 1
        );
        self.save_progress().await;
    }

    pub fn restart(&mut self) {
        self.state.restart();
        self.finalized = None;
    }

    async fn save_progress(&mut self) {
        let Some(snapshot) = self.state.snapshot() else {
            return;
        };
        if let Err(err) = self.store.upsert_session(&snapshot).await {
            log::warn!("Failed to save session snapshot: {err}");
            self.notices.push(Notice::new("save your progress", &err));
        }
    }

    async fn discard_progress(&mut self) {
        let (user_id, game_id) = (self.state.player.user_id, self.state.game.id);
        if let Err(err) = self.store.delete_session(user_id, game_id).await {
            log::warn!("Failed to delete session snapshot: {err}");
            self.notices.push(Notice::new("clear your saved session", &err));
        }
    }

    async fn finalize(&mut self) {
        let Some(result) = self.state.result() else {
            return;
        };
        let (user_id, game_id) = (self.state.player.user_id, self.state.game.id);
        self.discard_progress().await;

        let record = match self.prior.as_ref() {
            None => {
                match self
                    .store
                    .insert_score(user_id, game_id, result.score, result.scenario_count)
                    .await
                {
                    Ok(record) => {
                        if let Err(err) = self.store.increment_play_count(game_id).await {
                            log::warn!("Failed to bump play count for {game_id}: {err}");
                            self.notices.push(Notice::new("update the play count", &err));
                        }
                        Some(record)
                    }
                    Err(err) => {
                        log::warn!("Failed to insert score: {err}");
                        self.notices.push(Notice::new("record your score", &err));
                        None
                    }
                }
            }
            Some(prior) => {
                match self
                    .store
                    .update_score(prior.id, result.earned, result.scenario_count)
                    .await
                {
                    Ok(record) => Some(record),
                    Err(err) => {
                        log::warn!("Failed to update score {}: {err}", prior.id);
                        self.notices.push(Notice::new("record your score", &err));
                        None
                    }
                }
            }
        };
        if let Some(record) = &record {
            self.prior = Some(record.clone());
        }

        // XP without a score record could be collected again on replay.
        let mut xp_granted = 0.0;
        if record.is_some() && result.earned > 0.0 {
            match self.store.grant_xp(user_id, result.earned).await {
                Ok(()) => xp_granted = result.earned,
                Err(err) => {
                    log::warn!("Failed to grant {} XP: {err}", result.earned);
                    self.notices.push(Notice::new("add your XP", &err));
                }
            }
        }

        log::info!(
            "Finalized {} for {}: score {}, earned {}",
            self.state.game.game_code,
            self.state.player,
            types::format_points(result.score),
            types::format_points(result.earned)
        );
        self.finalized = Some(Finalized {
            result,
            record,
            xp_granted,
        });
    }
}
