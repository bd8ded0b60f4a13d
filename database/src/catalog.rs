use chrono::Utc;
use sqlx::{Row, Sqlite, Transaction};
use types::{Game, GameDraft, JoinCode, Profile, Scenario};
use uuid::Uuid;

use crate::models::{GameCatalog, GameListing, GameSummary, ProgressReset, ScoreWithTitle};
use crate::store::rows::{game_summary_from_row, uuid_column};
use crate::{DatabaseError, SqliteStore};

const CODE_ATTEMPTS: usize = 8;
const COMMUNITY_LIMIT: i64 = 10;

const LISTING_COLUMNS: &str = "g.*, p.username AS creator_username,
    EXISTS (
        SELECT 1 FROM scores sc
        WHERE sc.game_id = g.id AND sc.user_id = ?
          AND sc.scenario_count >= (SELECT COUNT(*) FROM scenarios s WHERE s.game_id = g.id)
    ) AS completed";

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

async fn insert_scenarios(
    tx: &mut Transaction<'_, Sqlite>,
    game_id: Uuid,
    scenarios: &[Scenario],
) -> Result<(), DatabaseError> {
    for (position, scenario) in scenarios.iter().enumerate() {
        let options = serde_json::to_string(&scenario.options)?;
        sqlx::query(
            "INSERT INTO scenarios (game_id, position, situation, question, options, correct_answer,
                points, explanation, highlight_phrase, answer_time, image_url)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(game_id.to_string())
        .bind(position as i64)
        .bind(&scenario.situation)
        .bind(&scenario.question)
        .bind(options)
        .bind(&scenario.correct_answer)
        .bind(i64::from(scenario.points))
        .bind(&scenario.explanation)
        .bind(&scenario.highlight_phrase)
        .bind(scenario.answer_time.map(i64::from))
        .bind(&scenario.image_url)
        .execute(&mut **tx)
        .await
        .map_err(DatabaseError::query)?;
    }
    Ok(())
}

impl SqliteStore {
    /// Stores a new game under a freshly generated join code. Codes that
    /// collide with an existing game are regenerated.
    pub async fn create_game(&self, creator_id: Uuid, draft: GameDraft) -> Result<Game, DatabaseError> {
        let draft = draft.prepare()?;
        if draft.title.trim().is_empty() {
            return Err(DatabaseError::Invalid("title must not be blank".to_string()));
        }

        for attempt in 1..=CODE_ATTEMPTS {
            let code = JoinCode::generate(&mut rand::thread_rng());
            let game = Game {
                id: Uuid::new_v4(),
                title: draft.title.trim().to_string(),
                description: draft.description.clone(),
                game_type: draft.game_type,
                game_code: code,
                creator_id,
                play_count: 0,
                is_official: false,
                is_under_review: false,
                cover_image_url: draft.cover_image_url.clone(),
                created_at: Utc::now(),
                scenarios: draft.scenarios.clone(),
            };

            let mut tx = self.pool.begin().await.map_err(DatabaseError::transaction)?;
            let inserted = sqlx::query(
                "INSERT INTO games (id, creator_id, title, description, game_type, game_code,
                    cover_image_url, created_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(game.id.to_string())
            .bind(creator_id.to_string())
            .bind(&game.title)
            .bind(&game.description)
            .bind(game.game_type.as_str())
            .bind(game.game_code.as_str())
            .bind(&game.cover_image_url)
            .bind(game.created_at)
            .execute(&mut *tx)
            .await;

            match inserted {
                Ok(_) => {}
                Err(e) if is_unique_violation(&e) => {
                    tracing::warn!(attempt, code = %game.game_code, "Join code collision, regenerating");
                    continue;
                }
                Err(e) => return Err(DatabaseError::query(e)),
            }

            insert_scenarios(&mut tx, game.id, &game.scenarios).await?;
            tx.commit().await.map_err(DatabaseError::transaction)?;
            tracing::info!(game_id = %game.id, code = %game.game_code, "Created game");
            return Ok(game);
        }

        Err(DatabaseError::Invalid(format!(
            "could not allocate a unique join code after {CODE_ATTEMPTS} attempts"
        )))
    }

    /// Applies an edit from the game's creator and reports which player
    /// progress had to be discarded.
    pub async fn update_game(
        &self,
        editor_id: Uuid,
        game_id: Uuid,
        draft: GameDraft,
    ) -> Result<ProgressReset, DatabaseError> {
        let draft = draft.prepare()?;
        let existing = self
            .fetch_game(game_id)
            .await?
            .ok_or_else(|| DatabaseError::GameNotFound(game_id.to_string()))?;
        if existing.creator_id != editor_id {
            return Err(DatabaseError::Forbidden(format!(
                "only the creator can edit game {game_id}"
            )));
        }

        let reset = if draft.scenarios == existing.scenarios {
            ProgressReset::None
        } else if draft.scenarios.len() > existing.scenarios.len() {
            ProgressReset::SessionsOnly
        } else {
            ProgressReset::Full
        };

        let mut tx = self.pool.begin().await.map_err(DatabaseError::transaction)?;
        sqlx::query(
            "UPDATE games SET title = ?, description = ?, game_type = ?, cover_image_url = ? WHERE id = ?",
        )
        .bind(draft.title.trim())
        .bind(&draft.description)
        .bind(draft.game_type.as_str())
        .bind(&draft.cover_image_url)
        .bind(game_id.to_string())
        .execute(&mut *tx)
        .await
        .map_err(DatabaseError::query)?;

        if reset != ProgressReset::None {
            sqlx::query("DELETE FROM scenarios WHERE game_id = ?")
                .bind(game_id.to_string())
                .execute(&mut *tx)
                .await
                .map_err(DatabaseError::query)?;
            insert_scenarios(&mut tx, game_id, &draft.scenarios).await?;

            sqlx::query("DELETE FROM game_sessions WHERE game_id = ?")
                .bind(game_id.to_string())
                .execute(&mut *tx)
                .await
                .map_err(DatabaseError::query)?;
        }
        if reset == ProgressReset::Full {
            sqlx::query("DELETE FROM scores WHERE game_id = ?")
                .bind(game_id.to_string())
                .execute(&mut *tx)
                .await
                .map_err(DatabaseError::query)?;
        }

        tx.commit().await.map_err(DatabaseError::transaction)?;
        tracing::info!(%game_id, ?reset, "Updated game");
        Ok(reset)
    }

    /// Creators may delete their own games; admins may delete any.
    pub async fn delete_game(&self, actor: &Profile, game_id: Uuid) -> Result<(), DatabaseError> {
        let row = sqlx::query("SELECT creator_id FROM games WHERE id = ?")
            .bind(game_id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(DatabaseError::query)?
            .ok_or_else(|| DatabaseError::GameNotFound(game_id.to_string()))?;
        let creator_id = uuid_column(&row, "creator_id")?;
        if creator_id != actor.id && !actor.is_admin() {
            return Err(DatabaseError::Forbidden(format!(
                "{} cannot delete game {game_id}",
                actor.username
            )));
        }

        sqlx::query("DELETE FROM games WHERE id = ?")
            .bind(game_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(DatabaseError::query)?;
        tracing::info!(%game_id, by = %actor.username, "Deleted game");
        Ok(())
    }

    pub async fn games_by_creator(&self, creator_id: Uuid) -> Result<Vec<GameSummary>, DatabaseError> {
        let rows = sqlx::query(
            "SELECT g.*, p.username AS creator_username
             FROM games g LEFT JOIN profiles p ON p.id = g.creator_id
             WHERE g.creator_id = ?
             ORDER BY g.created_at DESC",
        )
        .bind(creator_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::query)?;
        rows.iter().map(game_summary_from_row).collect()
    }

    /// Official games plus the newest community games that are not under
    /// review, each flagged with whether `viewer` has completed it.
    pub async fn list_games(&self, viewer: Option<Uuid>) -> Result<GameCatalog, DatabaseError> {
        let viewer = viewer.map(|id| id.to_string());

        let official = sqlx::query(&format!(
            "SELECT {LISTING_COLUMNS}
             FROM games g LEFT JOIN profiles p ON p.id = g.creator_id
             WHERE g.is_official = 1
             ORDER BY g.created_at"
        ))
        .bind(&viewer)
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::query)?;

        let community = sqlx::query(&format!(
            "SELECT {LISTING_COLUMNS}
             FROM games g LEFT JOIN profiles p ON p.id = g.creator_id
             WHERE g.is_official = 0 AND g.is_under_review = 0
             ORDER BY g.created_at DESC
             LIMIT ?"
        ))
        .bind(&viewer)
        .bind(COMMUNITY_LIMIT)
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::query)?;

        let listing = |row: &sqlx::sqlite::SqliteRow| -> Result<GameListing, DatabaseError> {
            Ok(GameListing {
                game: game_summary_from_row(row)?,
                completed: row.try_get("completed").map_err(DatabaseError::query)?,
            })
        };

        Ok(GameCatalog {
            official: official.iter().map(listing).collect::<Result<_, _>>()?,
            community: community.iter().map(listing).collect::<Result<_, _>>()?,
        })
    }

    pub async fn fetch_game_by_id(&self, game_id: Uuid) -> Result<Game, DatabaseError> {
        self.fetch_game(game_id)
            .await?
            .ok_or_else(|| DatabaseError::GameNotFound(game_id.to_string()))
    }

    /// The result page: a player's score on a game, with the game's title.
    pub async fn score_with_title(
        &self,
        user_id: Uuid,
        code: &JoinCode,
    ) -> Result<Option<ScoreWithTitle>, DatabaseError> {
        let row = sqlx::query(
            "SELECT sc.id, sc.score_achieved, sc.scenario_count, g.title, g.game_code
             FROM scores sc JOIN games g ON g.id = sc.game_id
             WHERE sc.user_id = ? AND g.game_code = ?",
        )
        .bind(user_id.to_string())
        .bind(code.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::query)?;

        let Some(row) = row else {
            return Ok(None);
        };
        let game_code: String = row.try_get("game_code").map_err(DatabaseError::query)?;
        let scenario_count: i64 = row.try_get("scenario_count").map_err(DatabaseError::query)?;
        Ok(Some(ScoreWithTitle {
            score_id: uuid_column(&row, "id")?,
            game_title: row.try_get("title").map_err(DatabaseError::query)?,
            game_code: JoinCode::parse(&game_code)?,
            score_achieved: row.try_get("score_achieved").map_err(DatabaseError::query)?,
            scenario_count: usize::try_from(scenario_count).unwrap_or_default(),
        }))
    }

    /// Marks a game as official so it is listed above community games.
    pub async fn set_official(&self, game_id: Uuid, official: bool) -> Result<(), DatabaseError> {
        let result = sqlx::query("UPDATE games SET is_official = ? WHERE id = ?")
            .bind(official)
            .bind(game_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(DatabaseError::query)?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::GameNotFound(game_id.to_string()));
        }
        Ok(())
    }
}
