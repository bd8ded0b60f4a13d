use std::fmt::Display;

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_ANSWER_TIME_SECS: u32 = 15;
pub const DEFAULT_POINTS: u32 = 20;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScenarioError {
    #[error("Scenario needs at least two populated options, found {0}")]
    TooFewOptions(usize),

    #[error("Duplicate option key: {0}")]
    DuplicateKey(String),

    #[error("Correct answer {0:?} is not one of the option keys")]
    UnknownCorrectAnswer(String),

    #[error("Correct answer {0:?} has no option text")]
    BlankCorrectAnswer(String),

    #[error("Highlight phrase {0:?} does not appear in the situation text")]
    HighlightNotFound(String),

    #[error("Situation text must not be empty")]
    EmptySituation,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioOption {
    pub key: String,
    pub text: String,
}

impl ScenarioOption {
    pub fn new(key: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            text: text.into(),
        }
    }
}

impl Display for ScenarioOption {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}) {}", self.key, self.text)
    }
}

/// One step of a game. Options keep the order they were authored in.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub situation: String,
    #[serde(default)]
    pub question: Option<String>,
    pub options: Vec<ScenarioOption>,
    pub correct_answer: String,
    #[serde(default = "default_points")]
    pub points: u32,
    #[serde(default)]
    pub explanation: String,
    #[serde(default)]
    pub highlight_phrase: Option<String>,
    #[serde(default)]
    pub answer_time: Option<u32>,
    #[serde(default)]
    pub image_url: Option<String>,
}

fn default_points() -> u32 {
    DEFAULT_POINTS
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Segment<'a> {
    Plain(&'a str),
    Marked(&'a str),
}

impl Scenario {
    pub fn new(
        situation: impl Into<String>,
        options: Vec<ScenarioOption>,
        correct_answer: impl Into<String>,
        points: u32,
        explanation: impl Into<String>,
    ) -> Result<Self, ScenarioError> {
        let scenario = Self {
            situation: situation.into(),
            question: None,
            options,
            correct_answer: correct_answer.into(),
            points,
            explanation: explanation.into(),
            highlight_phrase: None,
            answer_time: None,
            image_url: None,
        };
        scenario.validate()?;
        Ok(scenario)
    }

    pub fn with_question(mut self, question: impl Into<String>) -> Self {
        self.question = Some(question.into());
        self
    }

    pub fn with_highlight(mut self, phrase: impl Into<String>) -> Result<Self, ScenarioError> {
        self.highlight_phrase = Some(phrase.into());
        self.validate()?;
        Ok(self)
    }

    pub fn with_answer_time(mut self, secs: u32) -> Self {
        self.answer_time = Some(secs);
        self
    }

    pub fn with_image(mut self, image_url: impl Into<String>) -> Self {
        self.image_url = Some(image_url.into());
        self
    }

    /// Checks the authoring invariants. Blank options are dropped by
    /// [`Scenario::normalize`] before this is called on editor input.
    pub fn validate(&self) -> Result<(), ScenarioError> {
        if self.situation.trim().is_empty() {
            return Err(ScenarioError::EmptySituation);
        }
        let populated = self
            .options
            .iter()
            .filter(|opt| !opt.text.trim().is_empty())
            .count();
        if populated < 2 {
            return Err(ScenarioError::TooFewOptions(populated));
        }
        if let Some(dup) = self.options.iter().map(|opt| &opt.key).duplicates().next() {
            return Err(ScenarioError::DuplicateKey(dup.clone()));
        }
        match self.option(&self.correct_answer) {
            None => {
                return Err(ScenarioError::UnknownCorrectAnswer(
                    self.correct_answer.clone(),
                ))
            }
            Some(opt) if opt.text.trim().is_empty() => {
                return Err(ScenarioError::BlankCorrectAnswer(
                    self.correct_answer.clone(),
                ))
            }
            Some(_) => {}
        }
        if let Some(phrase) = self.highlight_phrase.as_deref() {
            if !phrase.is_empty()
                && !self
                    .situation
                    .to_ascii_lowercase()
                    .contains(&phrase.to_ascii_lowercase())
            {
                return Err(ScenarioError::HighlightNotFound(phrase.to_string()));
            }
        }
        Ok(())
    }

    /// Drops blank options and empty optional fields, as the editor form does on save.
    pub fn normalize(mut self) -> Self {
        self.options.retain(|opt| !opt.text.trim().is_empty());
        for opt in self.options.iter_mut() {
            opt.key = opt.key.trim().to_uppercase();
        }
        self.correct_answer = self.correct_answer.trim().to_uppercase();
        if self.question.as_deref().is_some_and(|q| q.trim().is_empty()) {
            self.question = None;
        }
        if self
            .highlight_phrase
            .as_deref()
            .is_some_and(|h| h.trim().is_empty())
        {
            self.highlight_phrase = None;
        }
        self
    }

    pub fn option(&self, key: &str) -> Option<&ScenarioOption> {
        self.options.iter().find(|opt| opt.key == key)
    }

    pub fn is_correct(&self, key: Option<&str>) -> bool {
        key == Some(self.correct_answer.as_str())
    }

    pub fn answer_time_secs(&self) -> u32 {
        self.answer_time.unwrap_or(DEFAULT_ANSWER_TIME_SECS)
    }

    /// Splits the situation text around every case-insensitive occurrence of
    /// the highlight phrase.
    pub fn highlight_segments(&self) -> Vec<Segment<'_>> {
        match self.highlight_phrase.as_deref() {
            Some(phrase) if !phrase.is_empty() => split_highlight(&self.situation, phrase),
            _ => vec![Segment::Plain(&self.situation)],
        }
    }
}

pub fn split_highlight<'a>(text: &'a str, phrase: &str) -> Vec<Segment<'a>> {
    if phrase.is_empty() {
        return vec![Segment::Plain(text)];
    }
    // ASCII lowering keeps byte offsets aligned with the original text
    let haystack = text.to_ascii_lowercase();
    let needle = phrase.to_ascii_lowercase();

    let mut segments = Vec::new();
    let mut cursor = 0;
    while let Some(found) = haystack[cursor..].find(&needle) {
        let start = cursor + found;
        let end = start + needle.len();
        if start > cursor {
            segments.push(Segment::Plain(&text[cursor..start]));
        }
        segments.push(Segment::Marked(&text[start..end]));
        cursor = end;
    }
    if cursor < text.len() {
        segments.push(Segment::Plain(&text[cursor..]));
    }
    segments
}

impl Display for Scenario {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} [{}] ({} pts)",
            self.situation,
            self.options.iter().map(|opt| &opt.key).join("/"),
            self.points
        )
    }
}
