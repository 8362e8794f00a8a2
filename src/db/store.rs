use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::health_log::{HealthLog, HealthLogPatch};
use crate::models::profile::UserProfile;

/// Persistence for daily health logs, keyed by `(user_id, log_date)`.
#[async_trait]
pub trait HealthLogStore: Send + Sync {
    /// Merge `patch` onto the day's log (or insert it) and store the
    /// readiness `score` of the merged row.
    ///
    /// Merge, scoring and write happen atomically per day, so concurrent
    /// partial submissions never drop each other's fields.
    async fn upsert(
        &self,
        patch: HealthLogPatch,
        score: &(dyn for<'h> Fn(&'h HealthLog) -> i32 + Send + Sync),
    ) -> AppResult<HealthLog>;

    async fn find_by_date(&self, user_id: Uuid, date: NaiveDate) -> AppResult<Option<HealthLog>>;

    /// Up to `limit` logs dated on or before `until`, most recent first.
    async fn list_recent(
        &self,
        user_id: Uuid,
        until: NaiveDate,
        limit: i64,
    ) -> AppResult<Vec<HealthLog>>;

    /// Logs dated within `start..=end`, most recent first.
    async fn list_range(
        &self,
        user_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> AppResult<Vec<HealthLog>>;

    async fn ping(&self) -> AppResult<()>;
}

/// Per-user settings that personalize scoring.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn find_profile(&self, user_id: Uuid) -> AppResult<Option<UserProfile>>;

    async fn upsert_profile(
        &self,
        user_id: Uuid,
        optimal_sleep_hours: f64,
    ) -> AppResult<UserProfile>;
}
