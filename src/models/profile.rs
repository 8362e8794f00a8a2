use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::config::ScoringConfig;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct UserProfile {
    pub user_id: Uuid,
    pub optimal_sleep_hours: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// PUT /health/profile
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(required(message = "optimal_sleep_hours is required"), range(min = 4.0, max = 12.0, message = "optimal_sleep_hours must be between 4 and 12"))]
    pub optimal_sleep_hours: Option<f64>,
}

/// The sleep target scoring uses for a user, personal or default.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SleepProfile {
    pub user_id: Uuid,
    pub optimal_sleep_hours: f64,
    pub sleep_target_min: f64,
    pub sleep_target_max: f64,
    pub customized: bool,
}

impl SleepProfile {
    pub fn new(user_id: Uuid, scoring: &ScoringConfig, customized: bool) -> Self {
        Self {
            user_id,
            optimal_sleep_hours: scoring.optimal_sleep_hours,
            sleep_target_min: scoring.sleep_target_min,
            sleep_target_max: scoring.sleep_target_max,
            customized,
        }
    }
}

/// Scoring constants for a user: the band follows their target when one is set.
pub fn scoring_for(defaults: &ScoringConfig, profile: Option<&UserProfile>) -> ScoringConfig {
    match profile {
        Some(p) => defaults.with_sleep_target(p.optimal_sleep_hours),
        None => defaults.clone(),
    }
}
