use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// How a run was entered. Decides the reward policy.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryPoint {
    Play,
    Retry,
    Review,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RewardPolicy {
    Normal,
    Retry,
    Review,
}

impl RewardPolicy {
    pub fn multiplier(self) -> f64 {
        match self {
            RewardPolicy::Normal => 1.0,
            RewardPolicy::Retry => 0.1,
            RewardPolicy::Review => 0.025,
        }
    }

    pub fn for_entry(entry: EntryPoint) -> Self {
        match entry {
            EntryPoint::Play => RewardPolicy::Normal,
            EntryPoint::Retry => RewardPolicy::Retry,
            EntryPoint::Review => RewardPolicy::Review,
        }
    }

    /// Policy for a restart inside a run that was entered with `self`.
    /// The smaller reward wins, so review runs stay review runs.
    pub fn on_restart(self) -> Self {
        match self {
            RewardPolicy::Review => RewardPolicy::Review,
            RewardPolicy::Normal | RewardPolicy::Retry => RewardPolicy::Retry,
        }
    }

    pub fn award(self, points: u32) -> f64 {
        f64::from(points) * self.multiplier()
    }
}

impl Display for RewardPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RewardPolicy::Normal => write!(f, "Normal"),
            RewardPolicy::Retry => write!(f, "Retry (10% XP)"),
            RewardPolicy::Review => write!(f, "Review (2.5% XP)"),
        }
    }
}

/// Scores are kept unrounded; this is the only place they get two decimals.
pub fn format_points(points: f64) -> String {
    format!("{points:.2}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_award_scales_by_policy() {
        assert!((RewardPolicy::Normal.award(20) - 20.0).abs() < 1e-9);
        assert!((RewardPolicy::Retry.award(20) - 2.0).abs() < 1e-9);
        assert!((RewardPolicy::Review.award(20) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_format_points_uses_two_decimals() {
        assert_eq!(format_points(7.5), "7.50");
        assert_eq!(format_points(20.0), "20.00");
        assert_eq!(format_points(0.025 * 30.0), "0.75");
    }

    #[test]
    fn test_restart_never_raises_the_reward() {
        assert_eq!(RewardPolicy::Normal.on_restart(), RewardPolicy::Retry);
        assert_eq!(RewardPolicy::Retry.on_restart(), RewardPolicy::Retry);
        assert_eq!(RewardPolicy::Review.on_restart(), RewardPolicy::Review);
    }
}
