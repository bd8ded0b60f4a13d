pub mod input_strategy;

use std::collections::VecDeque;

use rand::{rngs::ThreadRng, seq::SliceRandom};
use types::{Answer, Feedback, Proceed, ScenarioView, Strategy};

pub use crate::input_strategy::InputStrategy;

#[derive(Debug, Default)]
pub struct RandomStrategy {
    rng: ThreadRng,
}

impl Strategy for RandomStrategy {
    fn select_answer(&mut self, view: &ScenarioView<'_>) -> Answer {
        view.scenario
            .options
            .choose(&mut self.rng)
            .map(|opt| Answer::pick(opt.key.clone()))
            .unwrap_or(Answer::TimedOut)
    }
}

/// Always answers correctly.
#[derive(Debug, Default)]
pub struct PerfectStrategy {}

impl Strategy for PerfectStrategy {
    fn select_answer(&mut self, view: &ScenarioView<'_>) -> Answer {
        log::debug!(
            "Answering scenario {} with {}",
            view.index + 1,
            view.scenario.correct_answer
        );
        Answer::pick(view.scenario.correct_answer.clone())
    }
}

/// Replays a fixed list of answers, then abandons the run.
#[derive(Debug, Default)]
pub struct ScriptedStrategy {
    answers: VecDeque<Answer>,
    /// Abandon on the feedback screen after this many answers.
    stop_after: Option<usize>,
    given: usize,
    retries: usize,
}

impl ScriptedStrategy {
    pub fn new(answers: impl IntoIterator<Item = Answer>) -> Self {
        Self {
            answers: answers.into_iter().collect(),
            stop_after: None,
            given: 0,
            retries: 0,
        }
    }

    /// Accept this many restarts after running out of HP.
    pub fn with_retries(mut self, retries: usize) -> Self {
        self.retries = retries;
        self
    }

    pub fn stopping_after(mut self, answers: usize) -> Self {
        self.stop_after = Some(answers);
        self
    }
}

impl Strategy for ScriptedStrategy {
    fn select_answer(&mut self, _view: &ScenarioView<'_>) -> Answer {
        self.given += 1;
        self.answers.pop_front().unwrap_or(Answer::Abandon)
    }

    fn acknowledge(&mut self, _view: &ScenarioView<'_>, _feedback: &Feedback) -> Proceed {
        match self.stop_after {
            Some(limit) if self.given >= limit => Proceed::Abandon,
            _ => Proceed::Continue,
        }
    }

    fn retry_after_failure(&mut self, _score: f64) -> Proceed {
        if self.retries == 0 {
            return Proceed::Abandon;
        }
        self.retries -= 1;
        Proceed::Continue
    }
}
