use std::{fmt::Display, time::Duration};

use thiserror::Error;

use crate::{
    game::{Game, GameType},
    profile::Identity,
    records::{ScoreRecord, SessionSnapshot, MAX_HP},
    reward::{format_points, RewardPolicy},
    Scenario,
};

pub const WRONG_ANSWER_HP_PENALTY: u32 = 20;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ViewState {
    Reading,
    Answering,
    Feedback,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum RunStatus {
    Playing,
    Completed,
    Failed,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    Resumed {
        index: usize,
        score: f64,
        hp: u32,
    },
    FinishedReading {
        index: usize,
    },
    Answered {
        index: usize,
        selected: Option<String>,
        correct: bool,
        awarded: f64,
        hp: u32,
    },
    Advanced {
        index: usize,
    },
    Completed {
        score: f64,
    },
    Failed {
        index: usize,
    },
    Restarted {
        policy: RewardPolicy,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub enum Feedback {
    Correct { awarded: f64 },
    Wrong { selected: String, correct_answer: String },
    TimedOut { correct_answer: String },
}

impl Display for Feedback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Feedback::Correct { awarded } => write!(f, "Correct! +{} XP", format_points(*awarded)),
            Feedback::Wrong { correct_answer, .. } => write!(
                f,
                "Not quite! -{WRONG_ANSWER_HP_PENALTY} HP (answer: {correct_answer})"
            ),
            Feedback::TimedOut { correct_answer } => write!(
                f,
                "Time's up! -{WRONG_ANSWER_HP_PENALTY} HP (answer: {correct_answer})"
            ),
        }
    }
}

/// What the store collaborator needs to finalize a completed run.
#[derive(Clone, Debug, PartialEq)]
pub struct RunResult {
    pub score: f64,
    /// Score earned in this run alone, excluding anything carried over from
    /// an earlier completion. Never negative.
    pub earned: f64,
    pub scenario_count: usize,
    pub policy: RewardPolicy,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Step {
    AwaitingAnswer,
    Next(usize),
    Finished(RunResult),
    Failed,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Game already completed across all {scenario_count} scenarios")]
pub struct AlreadyCompleted {
    pub scenario_count: usize,
}

/// Everything a strategy may look at when answering.
#[derive(Debug)]
pub struct ScenarioView<'a> {
    pub index: usize,
    pub total: usize,
    pub game_type: GameType,
    pub scenario: &'a Scenario,
    pub score: f64,
    pub hp: u32,
    pub time_limit: Option<Duration>,
}

/// One player's run through one game.
#[derive(Debug)]
pub struct PlayState {
    pub player: Identity,
    pub game: Game,
    pub history: Vec<Event>,
    policy: RewardPolicy,
    index: usize,
    score: f64,
    carried_score: f64,
    hp: u32,
    answered: bool,
    selected: Option<String>,
    view: ViewState,
    status: RunStatus,
}

impl PlayState {
    pub fn new(player: Identity, game: Game, policy: RewardPolicy) -> Self {
        let view = initial_view(game.game_type);
        let status = if game.scenarios.is_empty() {
            RunStatus::Completed
        } else {
            RunStatus::Playing
        };
        log::info!(
            "{player} starting {} ({} scenarios, policy {policy})",
            game.game_code,
            game.scenarios.len()
        );
        Self {
            player,
            game,
            history: Vec::new(),
            policy,
            index: 0,
            score: 0.0,
            carried_score: 0.0,
            hp: MAX_HP,
            answered: false,
            selected: None,
            view,
            status,
        }
    }

    /// Builds the state for a player entering a game, picking up persisted
    /// progress when the policy allows it.
    pub fn resume(
        player: Identity,
        game: Game,
        snapshot: Option<SessionSnapshot>,
        prior: Option<&ScoreRecord>,
        policy: RewardPolicy,
    ) -> Result<Self, AlreadyCompleted> {
        let total = game.scenarios.len();
        let mut state = Self::new(player, game, policy);
        if policy != RewardPolicy::Normal {
            return Ok(state);
        }

        if let Some(snapshot) = snapshot {
            state.index = snapshot.current_scenario_index.min(total);
            state.score = snapshot.score.max(0.0);
            state.hp = snapshot.hp.min(MAX_HP);
            state.carried_score = prior.map_or(0.0, |record| record.score_achieved);
            if snapshot.current_scenario_index >= total {
                log::info!(
                    "Snapshot index {} is past the last of {total} scenarios, run is complete",
                    snapshot.current_scenario_index
                );
                state.status = RunStatus::Completed;
            } else if state.hp == 0 {
                state.status = RunStatus::Failed;
            }
        } else if let Some(record) = prior {
            if record.covers(total) {
                return Err(AlreadyCompleted {
                    scenario_count: record.scenario_count,
                });
            }
            log::info!(
                "New content since last completion, continuing from scenario {}",
                record.scenario_count + 1
            );
            state.index = record.scenario_count;
            state.score = record.score_achieved;
            state.carried_score = record.score_achieved;
        } else {
            return Ok(state);
        }

        state.history.push(Event::Resumed {
            index: state.index,
            score: state.score,
            hp: state.hp,
        });
        Ok(state)
    }

    pub fn current_scenario(&self) -> Option<&Scenario> {
        match self.status {
            RunStatus::Playing => self.game.scenarios.get(self.index),
            RunStatus::Completed | RunStatus::Failed => None,
        }
    }

    pub fn view(&self) -> Option<ScenarioView<'_>> {
        let scenario = self.current_scenario()?;
        Some(ScenarioView {
            index: self.index,
            total: self.game.scenarios.len(),
            game_type: self.game.game_type,
            scenario,
            score: self.score,
            hp: self.hp,
            time_limit: self.time_limit(),
        })
    }

    /// Story scenarios are timed; quizzes wait indefinitely.
    pub fn time_limit(&self) -> Option<Duration> {
        match self.game.game_type {
            GameType::Story => self
                .current_scenario()
                .map(|s| Duration::from_secs(u64::from(s.answer_time_secs()))),
            GameType::Quiz => None,
        }
    }

    pub fn continue_reading(&mut self) {
        if self.status != RunStatus::Playing || self.view != ViewState::Reading {
            log::debug!("Ignoring continue outside of the reading view");
            return;
        }
        self.view = ViewState::Answering;
        self.history.push(Event::FinishedReading { index: self.index });
    }

    /// `None` means the timer lapsed. Unknown keys count as wrong.
    pub fn submit_answer(&mut self, option_key: Option<&str>) {
        if self.answered || self.status != RunStatus::Playing {
            log::debug!("Scenario {} already answered, ignoring", self.index);
            return;
        }
        if self.view != ViewState::Answering {
            log::debug!("Ignoring answer while scenario {} is in {:?}", self.index, self.view);
            return;
        }
        let Some(scenario) = self.game.scenarios.get(self.index) else {
            return;
        };

        let correct = scenario.is_correct(option_key);
        let awarded = if correct {
            self.policy.award(scenario.points)
        } else {
            0.0
        };
        if correct {
            self.score += awarded;
        } else {
            self.hp = self.hp.saturating_sub(WRONG_ANSWER_HP_PENALTY);
        }
        self.answered = true;
        self.selected = option_key.map(str::to_string);
        if self.game.game_type == GameType::Story {
            self.view = ViewState::Feedback;
        }

        log::info!(
            "{} answered scenario {} with {:?}: correct={correct}, score={}, hp={}",
            self.player,
            self.index + 1,
            option_key,
            format_points(self.score),
            self.hp
        );
        self.history.push(Event::Answered {
            index: self.index,
            selected: self.selected.clone(),
            correct,
            awarded,
            hp: self.hp,
        });

        if self.hp == 0 {
            log::info!("{} ran out of HP on scenario {}", self.player, self.index + 1);
            self.status = RunStatus::Failed;
            self.history.push(Event::Failed { index: self.index });
        }
    }

    pub fn feedback(&self) -> Option<Feedback> {
        if !self.answered {
            return None;
        }
        let scenario = self.game.scenarios.get(self.index)?;
        let correct_answer = scenario.correct_answer.clone();
        Some(match self.selected.as_deref() {
            Some(key) if scenario.is_correct(Some(key)) => Feedback::Correct {
                awarded: self.policy.award(scenario.points),
            },
            Some(key) => Feedback::Wrong {
                selected: key.to_string(),
                correct_answer,
            },
            None => Feedback::TimedOut { correct_answer },
        })
    }

    pub fn advance(&mut self) -> Step {
        match self.status {
            RunStatus::Failed => return Step::Failed,
            RunStatus::Completed => return Step::Finished(self.build_result()),
            RunStatus::Playing => {}
        }
        if !self.answered {
            return Step::AwaitingAnswer;
        }

        if self.index + 1 < self.game.scenarios.len() {
            self.index += 1;
            self.answered = false;
            self.selected = None;
            self.view = initial_view(self.game.game_type);
            self.history.push(Event::Advanced { index: self.index });
            Step::Next(self.index)
        } else {
            self.status = RunStatus::Completed;
            self.history.push(Event::Completed { score: self.score });
            log::info!(
                "{} completed {} with {} XP",
                self.player,
                self.game.game_code,
                format_points(self.score)
            );
            Step::Finished(self.build_result())
        }
    }

    /// Starts over from the first scenario with a reduced reward.
    pub fn restart(&mut self) {
        self.policy = self.policy.on_restart();
        self.index = 0;
        self.score = 0.0;
        self.carried_score = 0.0;
        self.hp = MAX_HP;
        self.answered = false;
        self.selected = None;
        self.view = initial_view(self.game.game_type);
        self.status = if self.game.scenarios.is_empty() {
            RunStatus::Completed
        } else {
            RunStatus::Playing
        };
        self.history.push(Event::Restarted {
            policy: self.policy,
        });
        log::info!("{} restarted with policy {}", self.player, self.policy);
    }

    /// Progress to persist, or `None` when nothing resumable remains.
    pub fn snapshot(&self) -> Option<SessionSnapshot> {
        if self.status != RunStatus::Playing || self.policy != RewardPolicy::Normal {
            return None;
        }
        let index = if self.answered {
            self.index + 1
        } else {
            self.index
        };
        if index >= self.game.scenarios.len() {
            return None;
        }
        Some(SessionSnapshot::new(
            self.player.user_id,
            self.game.id,
            index,
            self.score,
            self.hp,
        ))
    }

    pub fn result(&self) -> Option<RunResult> {
        match self.status {
            RunStatus::Completed => Some(self.build_result()),
            RunStatus::Playing | RunStatus::Failed => None,
        }
    }

    fn build_result(&self) -> RunResult {
        RunResult {
            score: self.score,
            earned: (self.score - self.carried_score).max(0.0),
            scenario_count: self.game.scenarios.len(),
            policy: self.policy,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn score(&self) -> f64 {
        self.score
    }

    pub fn carried_score(&self) -> f64 {
        self.carried_score
    }

    pub fn hp(&self) -> u32 {
        self.hp
    }

    pub fn view_state(&self) -> ViewState {
        self.view
    }

    pub fn status(&self) -> RunStatus {
        self.status
    }

    pub fn policy(&self) -> RewardPolicy {
        self.policy
    }

    pub fn is_answered(&self) -> bool {
        self.answered
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn has_more_scenarios(&self) -> bool {
        self.index + 1 < self.game.scenarios.len()
    }
}

fn initial_view(game_type: GameType) -> ViewState {
    match game_type {
        GameType::Quiz => ViewState::Answering,
        GameType::Story => ViewState::Reading,
    }
}

impl Display for PlayState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} | scenario {}/{} | HP {}/{MAX_HP} | score {} | {:?}",
            self.game.title,
            (self.index + 1).min(self.game.scenarios.len()),
            self.game.scenarios.len(),
            self.hp,
            format_points(self.score),
            self.status
        )
    }
}
