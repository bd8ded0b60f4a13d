use database::GameStore;
use types::{Answer, EntryPoint, Event, Identity, Proceed, RunStatus, Strategy, ViewState};

use crate::controller::{Finalized, PlaySession};
use crate::error::{Notice, PlayError};

#[derive(Clone, Debug, PartialEq)]
pub enum Outcome {
    Completed(Finalized),
    Failed { score: f64 },
    Abandoned { index: usize },
}

#[derive(Debug)]
pub struct SessionReport {
    pub outcome: Outcome,
    pub notices: Vec<Notice>,
    pub history: Vec<Event>,
}

/// Plays one game to its end, asking `strategy` for every decision.
pub async fn run_session<S: GameStore + ?Sized>(
    store: &mut S,
    identity: Option<Identity>,
    code: &str,
    entry: EntryPoint,
    strategy: &mut dyn Strategy,
) -> Result<SessionReport, PlayError> {
    let mut session = PlaySession::start(store, identity, code, entry).await?;

    let outcome = loop {
        log::debug!("{}", session.state());
        match session.state().status() {
            RunStatus::Completed => {
                if let Some(finalized) = session.finalized() {
                    break Outcome::Completed(finalized.clone());
                }
                session.advance().await;
                continue;
            }
            RunStatus::Failed => {
                let score = session.state().score();
                if strategy.retry_after_failure(score) == Proceed::Continue {
                    session.restart();
                    continue;
                }
                break Outcome::Failed { score };
            }
            RunStatus::Playing => {}
        }

        let index = session.state().index();
        let Some(view) = session.state().view() else {
            log::warn!("No scenario to show at index {index}");
            break Outcome::Abandoned { index };
        };

        if session.state().view_state() == ViewState::Reading {
            if strategy.finish_reading(&view) == Proceed::Abandon {
                session.abandon().await;
                break Outcome::Abandoned { index };
            }
            session.continue_reading();
            continue;
        }

        let answer = strategy.select_answer(&view);
        if answer == Answer::Abandon {
            session.abandon().await;
            break Outcome::Abandoned { index };
        }
        session.submit_answer(answer.key()).await;
        if session.state().status() == RunStatus::Failed {
            continue;
        }

        let proceed = match (session.state().view(), session.state().feedback()) {
            (Some(view), Some(feedback)) => strategy.acknowledge(&view, &feedback),
            _ => Proceed::Continue,
        };
        if proceed == Proceed::Abandon {
            session.abandon().await;
            break Outcome::Abandoned { index };
        }
        session.advance().await;
    };

    Ok(SessionReport {
        outcome,
        notices: session.take_notices(),
        history: session.state().history.clone(),
    })
}
