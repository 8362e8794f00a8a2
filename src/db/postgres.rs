use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

use super::store::{HealthLogStore, ProfileStore};
use crate::error::AppResult;
use crate::models::health_log::{HealthLog, HealthLogPatch};
use crate::models::profile::UserProfile;

#[derive(Clone)]
pub struct PgHealthLogStore {
    db: PgPool,
}

impl PgHealthLogStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl HealthLogStore for PgHealthLogStore {
    async fn upsert(
        &self,
        patch: HealthLogPatch,
        score: &(dyn for<'h> Fn(&'h HealthLog) -> i32 + Send + Sync),
    ) -> AppResult<HealthLog> {
        let mut tx = self.db.begin().await?;

        // The upsert holds the row lock until commit, so the score is
        // computed from exactly the row that gets stored.
        let merged = sqlx::query_as::<_, HealthLog>(
            r#"
            INSERT INTO health_logs (
                id, user_id, log_date, sleep_hours, sleep_quality, energy_level,
                stress_level, mood_score, activity_minutes, steps, water_glasses,
                caffeine_cups, notes
            )
            VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8,
                COALESCE($9, 0), COALESCE($10, 0), COALESCE($11, 0), COALESCE($12, 0), $13
            )
            ON CONFLICT (user_id, log_date) DO UPDATE SET
                sleep_hours = EXCLUDED.sleep_hours,
                sleep_quality = EXCLUDED.sleep_quality,
                energy_level = EXCLUDED.energy_level,
                stress_level = EXCLUDED.stress_level,
                mood_score = EXCLUDED.mood_score,
                activity_minutes = COALESCE($9, health_logs.activity_minutes),
                steps = COALESCE($10, health_logs.steps),
                water_glasses = COALESCE($11, health_logs.water_glasses),
                caffeine_cups = COALESCE($12, health_logs.caffeine_cups),
                notes = COALESCE($13, health_logs.notes),
                updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(patch.user_id)
        .bind(patch.log_date)
        .bind(patch.sleep_hours)
        .bind(patch.sleep_quality)
        .bind(patch.energy_level)
        .bind(patch.stress_level)
        .bind(patch.mood_score)
        .bind(patch.activity_minutes)
        .bind(patch.steps)
        .bind(patch.water_glasses)
        .bind(patch.caffeine_cups)
        .bind(&patch.notes)
        .fetch_one(&mut *tx)
        .await?;

        let log = sqlx::query_as::<_, HealthLog>(
            "UPDATE health_logs SET readiness_score = $2 WHERE id = $1 RETURNING *",
        )
        .bind(merged.id)
        .bind(score(&merged))
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(log)
    }

    async fn find_by_date(&self, user_id: Uuid, date: NaiveDate) -> AppResult<Option<HealthLog>> {
        let log = sqlx::query_as::<_, HealthLog>(
            "SELECT * FROM health_logs WHERE user_id = $1 AND log_date = $2",
        )
        .bind(user_id)
        .bind(date)
        .fetch_optional(&self.db)
        .await?;

        Ok(log)
    }

    async fn list_recent(
        &self,
        user_id: Uuid,
        until: NaiveDate,
        limit: i64,
    ) -> AppResult<Vec<HealthLog>> {
        let logs = sqlx::query_as::<_, HealthLog>(
            r#"
            SELECT * FROM health_logs
            WHERE user_id = $1 AND log_date <= $2
            ORDER BY log_date DESC
            LIMIT $3
            "#,
        )
        .bind(user_id)
        .bind(until)
        .bind(limit)
        .fetch_all(&self.db)
        .await?;

        Ok(logs)
    }

    async fn list_range(
        &self,
        user_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> AppResult<Vec<HealthLog>> {
        let logs = sqlx::query_as::<_, HealthLog>(
            r#"
            SELECT * FROM health_logs
            WHERE user_id = $1 AND log_date BETWEEN $2 AND $3
            ORDER BY log_date DESC
            "#,
        )
        .bind(user_id)
        .bind(start)
        .bind(end)
        .fetch_all(&self.db)
        .await?;

        Ok(logs)
    }

    async fn ping(&self) -> AppResult<()> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.db)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl ProfileStore for PgHealthLogStore {
    async fn find_profile(&self, user_id: Uuid) -> AppResult<Option<UserProfile>> {
        let profile = sqlx::query_as::<_, UserProfile>(
            "SELECT * FROM user_profiles WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?;

        Ok(profile)
    }

    async fn upsert_profile(
        &self,
        user_id: Uuid,
        optimal_sleep_hours: f64,
    ) -> AppResult<UserProfile> {
        let profile = sqlx::query_as::<_, UserProfile>(
            r#"
            INSERT INTO user_profiles (user_id, optimal_sleep_hours)
            VALUES ($1, $2)
            ON CONFLICT (user_id) DO UPDATE SET
                optimal_sleep_hours = EXCLUDED.optimal_sleep_hours,
                updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(optimal_sleep_hours)
        .fetch_one(&self.db)
        .await?;

        Ok(profile)
    }
}
