use std::fmt::Debug;

use crate::{
    answer::{Answer, Proceed},
    play_state::{Feedback, ScenarioView},
};

pub trait Strategy: Debug {
    fn select_answer(&mut self, view: &ScenarioView<'_>) -> Answer;

    /// Called while a story scenario is being read, before options show.
    fn finish_reading(&mut self, _view: &ScenarioView<'_>) -> Proceed {
        Proceed::Continue
    }

    /// Called once feedback for the answered scenario is on screen.
    fn acknowledge(&mut self, _view: &ScenarioView<'_>, _feedback: &Feedback) -> Proceed {
        Proceed::Continue
    }

    /// Offered after HP runs out; `Continue` restarts at the retry reward.
    fn retry_after_failure(&mut self, _score: f64) -> Proceed {
        Proceed::Abandon
    }
}
