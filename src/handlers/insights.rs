use axum::{
    extract::{Query, State},
    Extension, Json,
};

use crate::auth::middleware::AuthUser;
use crate::dto::{DayQuery, WindowQuery};
use crate::error::AppResult;
use crate::handlers::profile::user_scoring;
use crate::models::calendar;
use crate::services::sleep_debt::{sleep_debt, SleepDebtReport};
use crate::services::trends::{analyze_trends, logging_streak, StreakStatus, TrendReport};
use crate::AppState;

const DEFAULT_SLEEP_DEBT_DAYS: i64 = 14;
const DEFAULT_TREND_DAYS: i64 = 7;
const MAX_ANALYSIS_DAYS: i64 = 90;
/// Logs fetched per step while walking a streak backwards.
const STREAK_PAGE_DAYS: i64 = 366;

pub async fn get_sleep_debt(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<WindowQuery>,
) -> AppResult<Json<SleepDebtReport>> {
    let user_id = auth_user.resolve(query.user)?;
    let days = query.days_or(DEFAULT_SLEEP_DEBT_DAYS, MAX_ANALYSIS_DAYS)?;
    let today = calendar::today(query.tz_offset_minutes)?;

    let scoring = user_scoring(&state, user_id).await?;
    let logs = state.store.list_recent(user_id, today, days).await?;
    let report = sleep_debt(&logs, scoring.optimal_sleep_hours, logs.len());

    Ok(Json(report))
}

pub async fn get_trends(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<WindowQuery>,
) -> AppResult<Json<TrendReport>> {
    let user_id = auth_user.resolve(query.user)?;
    let days = query.days_or(DEFAULT_TREND_DAYS, MAX_ANALYSIS_DAYS)?;
    let today = calendar::today(query.tz_offset_minutes)?;

    let logs = state.store.list_recent(user_id, today, days).await?;
    Ok(Json(analyze_trends(&logs, logs.len())))
}

pub async fn get_streak(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<DayQuery>,
) -> AppResult<Json<StreakStatus>> {
    let user_id = auth_user.resolve(query.user)?;
    let today = calendar::today(query.tz_offset_minutes)?;

    // Keep paging while every fetched day is part of the run.
    let mut logs = Vec::new();
    let mut until = today;
    loop {
        let page = state.store.list_recent(user_id, until, STREAK_PAGE_DAYS).await?;
        let unbroken = i64::from(logging_streak(&page, until).streak) == STREAK_PAGE_DAYS;
        let next = page.last().and_then(|log| log.log_date.pred_opt());
        logs.extend(page);
        match next {
            Some(date) if unbroken => until = date,
            _ => break,
        }
    }

    Ok(Json(logging_streak(&logs, today)))
}
