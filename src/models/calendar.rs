use chrono::{DateTime, Days, FixedOffset, NaiveDate, Utc};

use crate::error::{AppError, AppResult};

pub const MIN_TZ_OFFSET_MINUTES: i32 = -720;
pub const MAX_TZ_OFFSET_MINUTES: i32 = 840;

/// Calendar day at `now` for a caller `tz_offset_minutes` east of UTC.
/// No offset means UTC.
pub fn local_date(now: DateTime<Utc>, tz_offset_minutes: Option<i32>) -> AppResult<NaiveDate> {
    let minutes = tz_offset_minutes.unwrap_or(0);
    if !(MIN_TZ_OFFSET_MINUTES..=MAX_TZ_OFFSET_MINUTES).contains(&minutes) {
        return Err(AppError::Validation(format!(
            "tz_offset_minutes must be between {MIN_TZ_OFFSET_MINUTES} and {MAX_TZ_OFFSET_MINUTES}"
        )));
    }
    let offset = FixedOffset::east_opt(minutes * 60)
        .ok_or_else(|| AppError::Validation("tz_offset_minutes is out of range".into()))?;
    Ok(now.with_timezone(&offset).date_naive())
}

pub fn today(tz_offset_minutes: Option<i32>) -> AppResult<NaiveDate> {
    local_date(Utc::now(), tz_offset_minutes)
}

/// `date` moved back `days`, saturating at the earliest representable day.
pub fn days_before(date: NaiveDate, days: i64) -> NaiveDate {
    let days = Days::new(u64::try_from(days).unwrap_or(0));
    date.checked_sub_days(days).unwrap_or(NaiveDate::MIN)
}
