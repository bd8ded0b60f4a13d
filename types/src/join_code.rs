use std::{fmt::Display, str::FromStr};

use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const JOIN_CODE_PREFIX: &str = "DIGI";
const PREFIX_LEN: usize = 4;
const SUFFIX_LEN: usize = 6;
const SUFFIX_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JoinCodeError {
    #[error("Join code must be {expected} characters, got {actual}")]
    Length { expected: usize, actual: usize },

    #[error("Join code {0:?} must start with four letters followed by six letters or digits")]
    Format(String),
}

/// Short human-enterable lookup key for a game, e.g. `DIGI4K2Q9Z`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct JoinCode(String);

impl JoinCode {
    /// Trims and upper-cases the input before checking its shape.
    pub fn parse(input: &str) -> Result<Self, JoinCodeError> {
        let normalized = input.trim().to_uppercase();
        let actual = normalized.chars().count();
        if actual != PREFIX_LEN + SUFFIX_LEN {
            return Err(JoinCodeError::Length {
                expected: PREFIX_LEN + SUFFIX_LEN,
                actual,
            });
        }
        if !normalized.is_ascii() {
            return Err(JoinCodeError::Format(normalized));
        }
        let (prefix, suffix) = normalized.split_at(PREFIX_LEN);
        if !prefix.chars().all(|c| c.is_ascii_alphabetic())
            || !suffix.chars().all(|c| c.is_ascii_alphanumeric())
        {
            return Err(JoinCodeError::Format(normalized));
        }
        Ok(Self(normalized))
    }

    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let suffix: String = (0..SUFFIX_LEN)
            .map(|_| SUFFIX_ALPHABET[rng.gen_range(0..SUFFIX_ALPHABET.len())] as char)
            .collect();
        Self(format!("{JOIN_CODE_PREFIX}{suffix}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for JoinCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for JoinCode {
    type Err = JoinCodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for JoinCode {
    type Error = JoinCodeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<JoinCode> for String {
    fn from(code: JoinCode) -> Self {
        code.0
    }
}
