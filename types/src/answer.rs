use std::fmt::Display;

/// What a strategy hands back for the current scenario.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Answer {
    Pick(String),
    TimedOut,
    Abandon,
}

impl Answer {
    pub fn pick(key: impl Into<String>) -> Self {
        Answer::Pick(key.into())
    }

    /// The key as the state machine sees it; a timeout is `None`.
    pub fn key(&self) -> Option<&str> {
        match self {
            Answer::Pick(key) => Some(key.as_str()),
            Answer::TimedOut | Answer::Abandon => None,
        }
    }
}

impl Display for Answer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Answer::Pick(key) => write!(f, "Pick {key}"),
            Answer::TimedOut => write!(f, "Time's up"),
            Answer::Abandon => write!(f, "Abandon"),
        }
    }
}

/// Reply to a "continue" / "next" affordance.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Proceed {
    Continue,
    Abandon,
}
