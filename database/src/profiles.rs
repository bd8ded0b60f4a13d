use chrono::Utc;
use sqlx::Row;
use types::{LeaderboardEntry, Profile, Role};
use uuid::Uuid;

use crate::store::rows::profile_from_row;
use crate::{DatabaseError, SqliteStore};

const LEADERBOARD_SIZE: i64 = 10;

fn clean_username(username: &str) -> Result<String, DatabaseError> {
    let username = username.trim();
    if username.is_empty() {
        return Err(DatabaseError::Invalid("username must not be blank".to_string()));
    }
    Ok(username.to_string())
}

fn taken_or_query(err: sqlx::Error, username: &str) -> DatabaseError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            DatabaseError::Invalid(format!("username {username:?} is already taken"))
        }
        _ => DatabaseError::query(err),
    }
}

impl SqliteStore {
    pub async fn register_profile(&self, username: &str, role: Role) -> Result<Profile, DatabaseError> {
        let profile = Profile {
            id: Uuid::new_v4(),
            username: clean_username(username)?,
            total_xp: 0.0,
            role,
            created_at: Utc::now(),
        };
        sqlx::query("INSERT INTO profiles (id, username, total_xp, role, created_at) VALUES (?, ?, ?, ?, ?)")
            .bind(profile.id.to_string())
            .bind(&profile.username)
            .bind(profile.total_xp)
            .bind(profile.role.as_str())
            .bind(profile.created_at)
            .execute(&self.pool)
            .await
            .map_err(|e| taken_or_query(e, &profile.username))?;
        tracing::info!(username = %profile.username, role = %profile.role, "Registered profile");
        Ok(profile)
    }

    pub async fn profile_by_username(&self, username: &str) -> Result<Option<Profile>, DatabaseError> {
        let row = sqlx::query("SELECT * FROM profiles WHERE username = ?")
            .bind(username.trim())
            .fetch_optional(&self.pool)
            .await
            .map_err(DatabaseError::query)?;
        row.as_ref().map(profile_from_row).transpose()
    }

    pub async fn fetch_profile(&self, user_id: Uuid) -> Result<Profile, DatabaseError> {
        let row = sqlx::query("SELECT * FROM profiles WHERE id = ?")
            .bind(user_id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(DatabaseError::query)?
            .ok_or_else(|| DatabaseError::ProfileNotFound(user_id.to_string()))?;
        profile_from_row(&row)
    }

    pub async fn update_username(&self, user_id: Uuid, username: &str) -> Result<Profile, DatabaseError> {
        let username = clean_username(username)?;
        let result = sqlx::query("UPDATE profiles SET username = ? WHERE id = ?")
            .bind(&username)
            .bind(user_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| taken_or_query(e, &username))?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::ProfileNotFound(user_id.to_string()));
        }
        self.fetch_profile(user_id).await
    }

    pub async fn set_role(&self, user_id: Uuid, role: Role) -> Result<(), DatabaseError> {
        let result = sqlx::query("UPDATE profiles SET role = ? WHERE id = ?")
            .bind(role.as_str())
            .bind(user_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(DatabaseError::query)?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::ProfileNotFound(user_id.to_string()));
        }
        Ok(())
    }

    /// Top players by total XP; ties go to the alphabetically first name.
    pub async fn leaderboard(&self) -> Result<Vec<LeaderboardEntry>, DatabaseError> {
        let rows = sqlx::query(
            "SELECT username, total_xp FROM profiles ORDER BY total_xp DESC, username ASC LIMIT ?",
        )
        .bind(LEADERBOARD_SIZE)
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::query)?;

        rows.iter()
            .enumerate()
            .map(|(i, row)| -> Result<LeaderboardEntry, DatabaseError> {
                Ok(LeaderboardEntry {
                    rank: i + 1,
                    username: row.try_get("username").map_err(DatabaseError::query)?,
                    total_xp: row.try_get("total_xp").map_err(DatabaseError::query)?,
                })
            })
            .collect()
    }

    pub async fn require_admin(&self, user_id: Uuid) -> Result<Profile, DatabaseError> {
        let profile = self.fetch_profile(user_id).await?;
        if !profile.is_admin() {
            return Err(DatabaseError::Forbidden(format!(
                "{} is not an admin",
                profile.username
            )));
        }
        Ok(profile)
    }
}
