pub mod answer;
pub mod game;
pub mod join_code;
pub mod play_state;
pub mod player;
pub mod profile;
pub mod records;
pub mod reward;
pub mod scenario;

pub use answer::{Answer, Proceed};
pub use game::{Game, GameDraft, GameType};
pub use join_code::{JoinCode, JoinCodeError};
pub use play_state::{
    AlreadyCompleted, Event, Feedback, PlayState, RunResult, RunStatus, ScenarioView, Step,
    ViewState,
};
pub use player::Strategy;
pub use profile::{Identity, LeaderboardEntry, Profile, Role};
pub use records::{Report, ReportStatus, ScoreRecord, SessionSnapshot, MAX_HP};
pub use reward::{format_points, EntryPoint, RewardPolicy};
pub use scenario::{Scenario, ScenarioError, ScenarioOption, Segment};
