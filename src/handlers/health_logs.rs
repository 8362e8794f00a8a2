use axum::{
    extract::{Query, State},
    Extension, Json,
};
use chrono::NaiveDate;
use uuid::Uuid;

use crate::auth::middleware::AuthUser;
use crate::config::ScoringConfig;
use crate::dto::{DayQuery, WindowQuery};
use crate::error::{AppError, AppResult};
use crate::extract::ValidatedJson;
use crate::handlers::profile::user_scoring;
use crate::handlers::ws::{publish, LiveEvent};
use crate::models::calendar::{self, days_before};
use crate::models::health_log::{HealthLog, UpsertHealthLogRequest};
use crate::services::readiness::{DailyMetrics, ReadinessScore, ReadinessScorer};
use crate::AppState;

const DEFAULT_HISTORY_DAYS: i64 = 7;
const MAX_HISTORY_DAYS: i64 = 365;

pub async fn upsert_health_log(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    ValidatedJson(body): ValidatedJson<UpsertHealthLogRequest>,
) -> AppResult<Json<HealthLog>> {
    let today = calendar::today(body.tz_offset_minutes)?;
    let log_date = body.date.unwrap_or(today);
    if log_date > today {
        return Err(AppError::Validation("date cannot be in the future".into()));
    }

    let patch = body.into_patch(auth_user.id, log_date)?;
    let scoring = user_scoring(&state, auth_user.id).await?;
    let history = prior_window(&state, &scoring, auth_user.id, log_date).await?;
    let scorer = ReadinessScorer::new(&scoring);
    let score = |log: &HealthLog| scorer.score(&DailyMetrics::from(log), &history).score;

    let log = state.store.upsert(patch, &score).await?;

    tracing::info!(
        user_id = %auth_user.id,
        date = %log.log_date,
        readiness_score = ?log.readiness_score,
        created = log.created_at == log.updated_at,
        "Health log saved"
    );

    publish(
        &state,
        LiveEvent::HealthLogUpserted {
            user_id: log.user_id,
            date: log.log_date,
            readiness_score: log.readiness_score,
        },
    );

    Ok(Json(log))
}

pub async fn get_today(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<DayQuery>,
) -> AppResult<Json<HealthLog>> {
    let user_id = auth_user.resolve(query.user)?;
    let today = calendar::today(query.tz_offset_minutes)?;

    let log = state
        .store
        .find_by_date(user_id, today)
        .await?
        .ok_or_else(|| AppError::NotFound("no log for today yet".into()))?;

    Ok(Json(log))
}

pub async fn get_readiness(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<DayQuery>,
) -> AppResult<Json<ReadinessScore>> {
    let user_id = auth_user.resolve(query.user)?;
    let today = calendar::today(query.tz_offset_minutes)?;

    let scoring = user_scoring(&state, user_id).await?;
    let log = state.store.find_by_date(user_id, today).await?;
    let history = match log {
        Some(_) => prior_window(&state, &scoring, user_id, today).await?,
        None => Vec::new(),
    };

    let readiness = ReadinessScorer::new(&scoring)
        .assess(log.as_ref().map(DailyMetrics::from).as_ref(), &history)
        .ok_or_else(|| AppError::NotFound("log today's health first".into()))?;

    Ok(Json(readiness))
}

pub async fn get_history(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<WindowQuery>,
) -> AppResult<Json<Vec<HealthLog>>> {
    let user_id = auth_user.resolve(query.user)?;
    let days = query.days_or(DEFAULT_HISTORY_DAYS, MAX_HISTORY_DAYS)?;
    let today = calendar::today(query.tz_offset_minutes)?;

    let logs = state.store.list_recent(user_id, today, days).await?;
    Ok(Json(logs))
}

/// Logs from the consistency window strictly before `date`.
async fn prior_window(
    state: &AppState,
    scoring: &ScoringConfig,
    user_id: Uuid,
    date: NaiveDate,
) -> AppResult<Vec<DailyMetrics>> {
    let Some(yesterday) = date.pred_opt() else {
        return Ok(Vec::new());
    };
    let logs = state
        .store
        .list_range(
            user_id,
            days_before(date, scoring.consistency_window_days),
            yesterday,
        )
        .await?;
    Ok(logs.iter().map(DailyMetrics::from).collect())
}
