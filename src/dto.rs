//! # Equinox Wellness: request query types
//!
//! Conventions:
//! - `*Query` → deserialized from query params
//! - `user` is accepted for client compatibility and must match the caller
//! - `tz_offset_minutes` is minutes east of UTC and decides the caller's "today"

use serde::Deserialize;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

// ============================================================================
// Caller only
// ============================================================================

/// GET /health/profile
#[derive(Debug, Default, Deserialize)]
pub struct UserQuery {
    pub user: Option<Uuid>,
}

// ============================================================================
// Single day
// ============================================================================

/// GET /health/today, GET /health/readiness, GET /health/streak
#[derive(Debug, Default, Deserialize)]
pub struct DayQuery {
    pub user: Option<Uuid>,
    pub tz_offset_minutes: Option<i32>,
}

// ============================================================================
// Windows of days
// ============================================================================

/// GET /health/history, GET /health/trends, GET /health/sleep-debt
#[derive(Debug, Default, Deserialize)]
pub struct WindowQuery {
    pub user: Option<Uuid>,
    pub days: Option<i64>,
    pub tz_offset_minutes: Option<i32>,
}

impl WindowQuery {
    /// Requested window length, or `default`; must fall in `1..=max`.
    pub fn days_or(&self, default: i64, max: i64) -> AppResult<i64> {
        let days = self.days.unwrap_or(default);
        if !(1..=max).contains(&days) {
            return Err(AppError::Validation(format!(
                "days must be between 1 and {max}"
            )));
        }
        Ok(days)
    }
}
