use std::fmt::Display;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::reward::format_points;

pub const MAX_HP: u32 = 100;

/// Resumable progress for one (user, game) pair.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub user_id: Uuid,
    pub game_id: Uuid,
    pub current_scenario_index: usize,
    pub score: f64,
    pub hp: u32,
}

impl SessionSnapshot {
    pub fn new(user_id: Uuid, game_id: Uuid, index: usize, score: f64, hp: u32) -> Self {
        Self {
            user_id,
            game_id,
            current_scenario_index: index,
            score,
            hp: hp.min(MAX_HP),
        }
    }
}

/// Durable result of completing a game; at most one per (user, game).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub game_id: Uuid,
    pub score_achieved: f64,
    pub scenario_count: usize,
    pub created_at: DateTime<Utc>,
}

impl ScoreRecord {
    pub fn covers(&self, scenario_count: usize) -> bool {
        self.scenario_count >= scenario_count
    }
}

impl Display for ScoreRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} XP over {} scenarios",
            format_points(self.score_achieved),
            self.scenario_count
        )
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    Pending,
    Dismissed,
    Resolved,
}

impl ReportStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ReportStatus::Pending => "pending",
            ReportStatus::Dismissed => "dismissed",
            ReportStatus::Resolved => "resolved",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(ReportStatus::Pending),
            "dismissed" => Some(ReportStatus::Dismissed),
            "resolved" => Some(ReportStatus::Resolved),
            _ => None,
        }
    }
}

impl Display for ReportStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub id: Uuid,
    pub game_id: Option<Uuid>,
    pub reporter_id: Uuid,
    pub reason: String,
    pub status: ReportStatus,
    pub created_at: DateTime<Utc>,
}
