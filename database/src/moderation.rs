use chrono::Utc;
use sqlx::Row;
use types::{JoinCode, Report, ReportStatus};
use uuid::Uuid;

use crate::models::PendingReport;
use crate::store::rows::{optional_uuid_column, report_from_row};
use crate::{DatabaseError, SqliteStore};

impl SqliteStore {
    /// Files a report and hides the game from community listings until an
    /// admin looks at it.
    pub async fn submit_report(
        &self,
        reporter_id: Uuid,
        game_id: Uuid,
        reason: &str,
    ) -> Result<Report, DatabaseError> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(DatabaseError::Invalid("report reason must not be blank".to_string()));
        }
        let report = Report {
            id: Uuid::new_v4(),
            game_id: Some(game_id),
            reporter_id,
            reason: reason.to_string(),
            status: ReportStatus::Pending,
            created_at: Utc::now(),
        };

        let mut tx = self.pool.begin().await.map_err(DatabaseError::transaction)?;
        let flagged = sqlx::query("UPDATE games SET is_under_review = 1 WHERE id = ?")
            .bind(game_id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(DatabaseError::query)?;
        if flagged.rows_affected() == 0 {
            return Err(DatabaseError::GameNotFound(game_id.to_string()));
        }
        sqlx::query(
            "INSERT INTO reports (id, game_id, reporter_id, reason, status, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(report.id.to_string())
        .bind(game_id.to_string())
        .bind(reporter_id.to_string())
        .bind(&report.reason)
        .bind(report.status.as_str())
        .bind(report.created_at)
        .execute(&mut *tx)
        .await
        .map_err(DatabaseError::query)?;
        tx.commit().await.map_err(DatabaseError::transaction)?;

        tracing::info!(report_id = %report.id, %game_id, "Game reported");
        Ok(report)
    }

    pub async fn pending_reports(&self, admin_id: Uuid) -> Result<Vec<PendingReport>, DatabaseError> {
        self.require_admin(admin_id).await?;
        let rows = sqlx::query(
            "SELECT r.*, g.title AS game_title, g.game_code AS game_code
             FROM reports r LEFT JOIN games g ON g.id = r.game_id
             WHERE r.status = 'pending'
             ORDER BY r.created_at",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::query)?;

        rows.iter()
            .map(|row| -> Result<PendingReport, DatabaseError> {
                let game_code: Option<String> =
                    row.try_get("game_code").map_err(DatabaseError::query)?;
                Ok(PendingReport {
                    report: report_from_row(row)?,
                    game_title: row.try_get("game_title").map_err(DatabaseError::query)?,
                    game_code: game_code.as_deref().map(JoinCode::parse).transpose()?,
                })
            })
            .collect()
    }

    /// Closes a report as unfounded and puts the game back in listings.
    pub async fn dismiss_report(&self, admin_id: Uuid, report_id: Uuid) -> Result<(), DatabaseError> {
        self.require_admin(admin_id).await?;
        let mut tx = self.pool.begin().await.map_err(DatabaseError::transaction)?;
        let row = sqlx::query("SELECT game_id FROM reports WHERE id = ? AND status = 'pending'")
            .bind(report_id.to_string())
            .fetch_optional(&mut *tx)
            .await
            .map_err(DatabaseError::query)?
            .ok_or(DatabaseError::ReportNotFound(report_id))?;
        let game_id: Option<String> = row.try_get("game_id").map_err(DatabaseError::query)?;

        sqlx::query("UPDATE reports SET status = ? WHERE id = ?")
            .bind(ReportStatus::Dismissed.as_str())
            .bind(report_id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(DatabaseError::query)?;

        if let Some(game_id) = game_id {
            // other open reports keep the game hidden
            sqlx::query(
                "UPDATE games SET is_under_review = 0
                 WHERE id = ? AND NOT EXISTS (
                    SELECT 1 FROM reports WHERE game_id = ? AND status = 'pending'
                 )",
            )
            .bind(&game_id)
            .bind(&game_id)
            .execute(&mut *tx)
            .await
            .map_err(DatabaseError::query)?;
        }
        tx.commit().await.map_err(DatabaseError::transaction)?;
        tracing::info!(%report_id, "Report dismissed");
        Ok(())
    }

    /// Upholds a report by deleting the reported game. The report survives
    /// with its game reference cleared.
    pub async fn resolve_report_by_deleting(
        &self,
        admin_id: Uuid,
        report_id: Uuid,
    ) -> Result<Option<Uuid>, DatabaseError> {
        self.require_admin(admin_id).await?;
        let mut tx = self.pool.begin().await.map_err(DatabaseError::transaction)?;
        let row = sqlx::query("SELECT * FROM reports WHERE id = ? AND status = 'pending'")
            .bind(report_id.to_string())
            .fetch_optional(&mut *tx)
            .await
            .map_err(DatabaseError::query)?
            .ok_or(DatabaseError::ReportNotFound(report_id))?;
        let game_id = optional_uuid_column(&row, "game_id")?;

        sqlx::query("UPDATE reports SET status = ? WHERE id = ?")
            .bind(ReportStatus::Resolved.as_str())
            .bind(report_id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(DatabaseError::query)?;

        if let Some(game_id) = game_id {
            sqlx::query("DELETE FROM games WHERE id = ?")
                .bind(game_id.to_string())
                .execute(&mut *tx)
                .await
                .map_err(DatabaseError::query)?;
        }
        tx.commit().await.map_err(DatabaseError::transaction)?;
        tracing::info!(%report_id, ?game_id, "Report resolved by deleting game");
        Ok(game_id)
    }
}
