use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::store::{HealthLogStore, ProfileStore};
use crate::error::AppResult;
use crate::models::health_log::{HealthLog, HealthLogPatch};
use crate::models::profile::UserProfile;

/// Process-local store for single-instance runs without Postgres.
/// Contents are lost on restart.
#[derive(Clone, Default)]
pub struct MemoryHealthLogStore {
    logs: Arc<RwLock<BTreeMap<(Uuid, NaiveDate), HealthLog>>>,
    profiles: Arc<RwLock<HashMap<Uuid, UserProfile>>>,
}

impl MemoryHealthLogStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn user_range(
        user_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> std::ops::RangeInclusive<(Uuid, NaiveDate)> {
        (user_id, start)..=(user_id, end)
    }
}

#[async_trait]
impl HealthLogStore for MemoryHealthLogStore {
    async fn upsert(
        &self,
        patch: HealthLogPatch,
        score: &(dyn for<'h> Fn(&'h HealthLog) -> i32 + Send + Sync),
    ) -> AppResult<HealthLog> {
        let mut logs = self.logs.write().await;
        let key = (patch.user_id, patch.log_date);

        let mut log = patch.apply(logs.get(&key), Utc::now());
        log.readiness_score = Some(score(&log));
        logs.insert(key, log.clone());
        Ok(log)
    }

    async fn find_by_date(&self, user_id: Uuid, date: NaiveDate) -> AppResult<Option<HealthLog>> {
        Ok(self.logs.read().await.get(&(user_id, date)).cloned())
    }

    async fn list_recent(
        &self,
        user_id: Uuid,
        until: NaiveDate,
        limit: i64,
    ) -> AppResult<Vec<HealthLog>> {
        let logs = self.logs.read().await;
        let limit = usize::try_from(limit).unwrap_or(0);
        Ok(logs
            .range(Self::user_range(user_id, NaiveDate::MIN, until))
            .rev()
            .take(limit)
            .map(|(_, log)| log.clone())
            .collect())
    }

    async fn list_range(
        &self,
        user_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> AppResult<Vec<HealthLog>> {
        if start > end {
            return Ok(Vec::new());
        }
        let logs = self.logs.read().await;
        Ok(logs
            .range(Self::user_range(user_id, start, end))
            .rev()
            .map(|(_, log)| log.clone())
            .collect())
    }

    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }
}

#[async_trait]
impl ProfileStore for MemoryHealthLogStore {
    async fn find_profile(&self, user_id: Uuid) -> AppResult<Option<UserProfile>> {
        Ok(self.profiles.read().await.get(&user_id).cloned())
    }

    async fn upsert_profile(
        &self,
        user_id: Uuid,
        optimal_sleep_hours: f64,
    ) -> AppResult<UserProfile> {
        let mut profiles = self.profiles.write().await;
        let now = Utc::now();
        let profile = profiles
            .entry(user_id)
            .and_modify(|p| {
                p.optimal_sleep_hours = optimal_sleep_hours;
                p.updated_at = now;
            })
            .or_insert_with(|| UserProfile {
                user_id,
                optimal_sleep_hours,
                created_at: now,
                updated_at: now,
            });
        Ok(profile.clone())
    }
}
