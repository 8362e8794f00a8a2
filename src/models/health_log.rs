use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};

/// One user's self-reported wellness metrics for a calendar day.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct HealthLog {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(rename = "date")]
    pub log_date: NaiveDate,
    pub sleep_hours: f64,
    pub sleep_quality: i32,
    pub energy_level: i32,
    pub stress_level: i32,
    pub mood_score: i32,
    pub activity_minutes: i32,
    pub steps: i32,
    pub water_glasses: i32,
    pub caffeine_cups: i32,
    pub notes: Option<String>,
    pub readiness_score: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A validated submission for `(user_id, log_date)`.
///
/// Required fields always replace the stored values. Optional fields left
/// as `None` keep what is stored, or start at zero for a new log.
#[derive(Debug, Clone, PartialEq)]
pub struct HealthLogPatch {
    pub user_id: Uuid,
    pub log_date: NaiveDate,
    pub sleep_hours: f64,
    pub sleep_quality: i32,
    pub energy_level: i32,
    pub stress_level: i32,
    pub mood_score: i32,
    pub activity_minutes: Option<i32>,
    pub steps: Option<i32>,
    pub water_glasses: Option<i32>,
    pub caffeine_cups: Option<i32>,
    pub notes: Option<String>,
}

impl HealthLogPatch {
    /// Merge onto the log currently stored for the day, if any.
    /// The result carries no readiness score yet.
    pub fn apply(self, existing: Option<&HealthLog>, now: DateTime<Utc>) -> HealthLog {
        let keep = |submitted: Option<i32>, stored: fn(&HealthLog) -> i32| {
            submitted.or_else(|| existing.map(stored)).unwrap_or(0)
        };

        HealthLog {
            id: existing.map(|l| l.id).unwrap_or_else(Uuid::new_v4),
            user_id: self.user_id,
            log_date: self.log_date,
            sleep_hours: self.sleep_hours,
            sleep_quality: self.sleep_quality,
            energy_level: self.energy_level,
            stress_level: self.stress_level,
            mood_score: self.mood_score,
            activity_minutes: keep(self.activity_minutes, |l| l.activity_minutes),
            steps: keep(self.steps, |l| l.steps),
            water_glasses: keep(self.water_glasses, |l| l.water_glasses),
            caffeine_cups: keep(self.caffeine_cups, |l| l.caffeine_cups),
            notes: self
                .notes
                .or_else(|| existing.and_then(|l| l.notes.clone())),
            readiness_score: None,
            created_at: existing.map(|l| l.created_at).unwrap_or(now),
            updated_at: now,
        }
    }
}

/// POST /health/log
#[derive(Debug, Deserialize, Validate)]
pub struct UpsertHealthLogRequest {
    /// Calendar day being logged. Defaults to the caller's today.
    pub date: Option<NaiveDate>,
    /// Caller's offset from UTC in minutes, used to resolve "today".
    pub tz_offset_minutes: Option<i32>,

    #[validate(required(message = "sleep_hours is required"), range(min = 0.0, max = 24.0, message = "sleep_hours must be between 0 and 24"))]
    pub sleep_hours: Option<f64>,
    #[validate(required(message = "sleep_quality is required"), range(min = 1, max = 10, message = "sleep_quality must be between 1 and 10"))]
    pub sleep_quality: Option<i32>,
    #[validate(required(message = "energy_level is required"), range(min = 1, max = 10, message = "energy_level must be between 1 and 10"))]
    pub energy_level: Option<i32>,
    #[validate(required(message = "stress_level is required"), range(min = 1, max = 10, message = "stress_level must be between 1 and 10"))]
    pub stress_level: Option<i32>,
    #[validate(required(message = "mood_score is required"), range(min = 1, max = 10, message = "mood_score must be between 1 and 10"))]
    pub mood_score: Option<i32>,

    #[validate(range(min = 0, message = "activity_minutes cannot be negative"))]
    pub activity_minutes: Option<i32>,
    #[validate(range(min = 0, message = "steps cannot be negative"))]
    pub steps: Option<i32>,
    #[validate(range(min = 0, message = "water_glasses cannot be negative"))]
    pub water_glasses: Option<i32>,
    #[validate(range(min = 0, message = "caffeine_cups cannot be negative"))]
    pub caffeine_cups: Option<i32>,

    #[validate(length(max = 2000, message = "notes must be under 2000 characters"))]
    pub notes: Option<String>,
}

impl UpsertHealthLogRequest {
    pub fn into_patch(self, user_id: Uuid, log_date: NaiveDate) -> AppResult<HealthLogPatch> {
        Ok(HealthLogPatch {
            user_id,
            log_date,
            sleep_hours: required(self.sleep_hours, "sleep_hours")?,
            sleep_quality: required(self.sleep_quality, "sleep_quality")?,
            energy_level: required(self.energy_level, "energy_level")?,
            stress_level: required(self.stress_level, "stress_level")?,
            mood_score: required(self.mood_score, "mood_score")?,
            activity_minutes: self.activity_minutes,
            steps: self.steps,
            water_glasses: self.water_glasses,
            caffeine_cups: self.caffeine_cups,
            notes: self.notes,
        })
    }
}

fn required<T>(value: Option<T>, field: &str) -> AppResult<T> {
    value.ok_or_else(|| AppError::Validation(format!("{field} is required")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(json: &str) -> UpsertHealthLogRequest {
        serde_json::from_str(json).unwrap()
    }

    fn stored(user_id: Uuid, date: NaiveDate) -> HealthLog {
        HealthLog {
            id: Uuid::new_v4(),
            user_id,
            log_date: date,
            sleep_hours: 7.0,
            sleep_quality: 6,
            energy_level: 6,
            stress_level: 4,
            mood_score: 6,
            activity_minutes: 45,
            steps: 9000,
            water_glasses: 7,
            caffeine_cups: 2,
            notes: Some("ran in the park".into()),
            readiness_score: Some(68),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    const FULL: &str = r#"{
        "sleep_hours": 8, "sleep_quality": 9, "energy_level": 8,
        "stress_level": 2, "mood_score": 8
    }"#;

    #[test]
    fn test_valid_request_passes_validation() {
        assert!(request(FULL).validate().is_ok());
    }

    #[test]
    fn test_missing_required_field_fails_validation() {
        let req = request(r#"{"sleep_hours": 8, "sleep_quality": 9, "energy_level": 8, "stress_level": 2}"#);
        let err = req.validate().unwrap_err();
        assert!(err.field_errors().contains_key("mood_score"));
    }

    #[test]
    fn test_out_of_range_slider_fails_validation() {
        let req = request(
            r#"{"sleep_hours": 8, "sleep_quality": 11, "energy_level": 0, "stress_level": 2, "mood_score": 8}"#,
        );
        let err = req.validate().unwrap_err();
        let fields = err.field_errors();
        assert!(fields.contains_key("sleep_quality"));
        assert!(fields.contains_key("energy_level"));
    }

    #[test]
    fn test_negative_counts_fail_validation() {
        let req = request(
            r#"{"sleep_hours": 8, "sleep_quality": 9, "energy_level": 8, "stress_level": 2,
                "mood_score": 8, "steps": -5, "caffeine_cups": -1}"#,
        );
        let err = req.validate().unwrap_err();
        let fields = err.field_errors();
        assert!(fields.contains_key("steps"));
        assert!(fields.contains_key("caffeine_cups"));
    }

    #[test]
    fn test_sleep_hours_above_a_day_fails_validation() {
        let req = request(
            r#"{"sleep_hours": 25, "sleep_quality": 9, "energy_level": 8, "stress_level": 2, "mood_score": 8}"#,
        );
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_new_log_defaults_optional_counts_to_zero() {
        let user = Uuid::new_v4();
        let date = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        let now = Utc::now();
        let log = request(FULL).into_patch(user, date).unwrap().apply(None, now);
        assert_eq!(log.activity_minutes, 0);
        assert_eq!(log.steps, 0);
        assert_eq!(log.notes, None);
        assert_eq!(log.sleep_quality, 9);
        assert_eq!(log.readiness_score, None);
        assert_eq!(log.created_at, now);
    }

    #[test]
    fn test_update_keeps_omitted_optional_fields() {
        let user = Uuid::new_v4();
        let date = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        let existing = stored(user, date);
        let log = request(
            r#"{"sleep_hours": 5.5, "sleep_quality": 4, "energy_level": 3,
                "stress_level": 7, "mood_score": 4, "steps": 1200}"#,
        )
        .into_patch(user, date)
        .unwrap()
        .apply(Some(&existing), Utc::now());

        assert_eq!(log.id, existing.id);
        assert_eq!(log.created_at, existing.created_at);
        assert_eq!(log.sleep_hours, 5.5);
        assert_eq!(log.stress_level, 7);
        assert_eq!(log.steps, 1200);
        assert_eq!(log.activity_minutes, 45);
        assert_eq!(log.water_glasses, 7);
        assert_eq!(log.notes.as_deref(), Some("ran in the park"));
    }

    #[test]
    fn test_patch_leaves_omitted_fields_unset() {
        let patch = request(FULL)
            .into_patch(Uuid::new_v4(), NaiveDate::from_ymd_opt(2026, 3, 2).unwrap())
            .unwrap();
        assert_eq!(patch.steps, None);
        assert_eq!(patch.notes, None);
    }

    #[test]
    fn test_log_serializes_day_as_date() {
        let log = stored(Uuid::new_v4(), NaiveDate::from_ymd_opt(2026, 3, 2).unwrap());
        let json = serde_json::to_value(&log).unwrap();
        assert_eq!(json["date"], "2026-03-02");
        assert!(json.get("log_date").is_none());
        assert_eq!(json["readiness_score"], 68);
    }
}
