use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqliteRow, Row};
use types::{
    GameType, JoinCode, Profile, Report, ReportStatus, Role, Scenario, ScenarioOption,
    ScoreRecord, SessionSnapshot,
};
use uuid::Uuid;

use crate::{models::GameSummary, DatabaseError};

fn column<'r, T>(row: &'r SqliteRow, name: &str) -> Result<T, DatabaseError>
where
    T: sqlx::Decode<'r, sqlx::Sqlite> + sqlx::Type<sqlx::Sqlite>,
{
    row.try_get(name).map_err(DatabaseError::query)
}

pub(crate) fn uuid_column(row: &SqliteRow, name: &str) -> Result<Uuid, DatabaseError> {
    let id: String = column(row, name)?;
    Ok(Uuid::parse_str(&id)?)
}

pub(crate) fn optional_uuid_column(row: &SqliteRow, name: &str) -> Result<Option<Uuid>, DatabaseError> {
    let id: Option<String> = column(row, name)?;
    id.map(|s| Uuid::parse_str(&s))
        .transpose()
        .map_err(DatabaseError::UuidParsing)
}

fn count_column(row: &SqliteRow, name: &str) -> Result<usize, DatabaseError> {
    let value: i64 = column(row, name)?;
    usize::try_from(value).map_err(|_| DatabaseError::Invalid(format!("negative {name}: {value}")))
}

pub(crate) fn game_summary_from_row(row: &SqliteRow) -> Result<GameSummary, DatabaseError> {
    let game_type: String = column(row, "game_type")?;
    let game_code: String = column(row, "game_code")?;
    Ok(GameSummary {
        id: uuid_column(row, "id")?,
        title: column(row, "title")?,
        description: column(row, "description")?,
        game_type: GameType::parse(&game_type)
            .ok_or_else(|| DatabaseError::Invalid(format!("unknown game type {game_type:?}")))?,
        game_code: JoinCode::parse(&game_code)?,
        creator_id: uuid_column(row, "creator_id")?,
        creator_username: row.try_get("creator_username").ok(),
        play_count: column(row, "play_count")?,
        is_official: column(row, "is_official")?,
        is_under_review: column(row, "is_under_review")?,
        cover_image_url: column(row, "cover_image_url")?,
        created_at: column(row, "created_at")?,
    })
}

pub(crate) fn scenario_from_row(row: &SqliteRow) -> Result<Scenario, DatabaseError> {
    let options_json: String = column(row, "options")?;
    let options: Vec<ScenarioOption> = serde_json::from_str(&options_json)?;
    let points: i64 = column(row, "points")?;
    let answer_time: Option<i64> = column(row, "answer_time")?;
    Ok(Scenario {
        situation: column(row, "situation")?,
        question: column(row, "question")?,
        options,
        correct_answer: column(row, "correct_answer")?,
        points: u32::try_from(points).unwrap_or_default(),
        explanation: column(row, "explanation")?,
        highlight_phrase: column(row, "highlight_phrase")?,
        answer_time: answer_time.and_then(|t| u32::try_from(t).ok()),
        image_url: column(row, "image_url")?,
    })
}

pub(crate) fn session_from_row(row: &SqliteRow) -> Result<SessionSnapshot, DatabaseError> {
    let hp: i64 = column(row, "hp")?;
    Ok(SessionSnapshot::new(
        uuid_column(row, "user_id")?,
        uuid_column(row, "game_id")?,
        count_column(row, "current_scenario_index")?,
        column(row, "score")?,
        u32::try_from(hp.max(0)).unwrap_or_default(),
    ))
}

pub(crate) fn score_from_row(row: &SqliteRow) -> Result<ScoreRecord, DatabaseError> {
    Ok(ScoreRecord {
        id: uuid_column(row, "id")?,
        user_id: uuid_column(row, "user_id")?,
        game_id: uuid_column(row, "game_id")?,
        score_achieved: column(row, "score_achieved")?,
        scenario_count: count_column(row, "scenario_count")?,
        created_at: column(row, "created_at")?,
    })
}

pub(crate) fn profile_from_row(row: &SqliteRow) -> Result<Profile, DatabaseError> {
    let role: String = column(row, "role")?;
    Ok(Profile {
        id: uuid_column(row, "id")?,
        username: column(row, "username")?,
        total_xp: column(row, "total_xp")?,
        role: Role::parse(&role)
            .ok_or_else(|| DatabaseError::Invalid(format!("unknown role {role:?}")))?,
        created_at: column::<DateTime<Utc>>(row, "created_at")?,
    })
}

pub(crate) fn report_from_row(row: &SqliteRow) -> Result<Report, DatabaseError> {
    let status: String = column(row, "status")?;
    Ok(Report {
        id: uuid_column(row, "id")?,
        game_id: optional_uuid_column(row, "game_id")?,
        reporter_id: uuid_column(row, "reporter_id")?,
        reason: column(row, "reason")?,
        status: ReportStatus::parse(&status)
            .ok_or_else(|| DatabaseError::Invalid(format!("unknown report status {status:?}")))?,
        created_at: column(row, "created_at")?,
    })
}
