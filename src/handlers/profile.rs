use axum::{
    extract::{Query, State},
    Extension, Json,
};
use uuid::Uuid;

use crate::auth::middleware::AuthUser;
use crate::config::ScoringConfig;
use crate::dto::UserQuery;
use crate::error::{AppError, AppResult};
use crate::extract::ValidatedJson;
use crate::models::profile::{self, SleepProfile, UpdateProfileRequest};
use crate::AppState;

/// Scoring constants personalized with the user's sleep target, if set.
pub async fn user_scoring(state: &AppState, user_id: Uuid) -> AppResult<ScoringConfig> {
    let stored = state.profiles.find_profile(user_id).await?;
    Ok(profile::scoring_for(&state.config.scoring, stored.as_ref()))
}

pub async fn get_profile(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<UserQuery>,
) -> AppResult<Json<SleepProfile>> {
    let user_id = auth_user.resolve(query.user)?;
    let stored = state.profiles.find_profile(user_id).await?;
    let scoring = profile::scoring_for(&state.config.scoring, stored.as_ref());

    Ok(Json(SleepProfile::new(user_id, &scoring, stored.is_some())))
}

pub async fn put_profile(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    ValidatedJson(body): ValidatedJson<UpdateProfileRequest>,
) -> AppResult<Json<SleepProfile>> {
    let hours = body
        .optimal_sleep_hours
        .ok_or_else(|| AppError::Validation("optimal_sleep_hours is required".into()))?;
    let stored = state.profiles.upsert_profile(auth_user.id, hours).await?;

    tracing::info!(
        user_id = %auth_user.id,
        optimal_sleep_hours = stored.optimal_sleep_hours,
        "Sleep profile saved"
    );

    let scoring = profile::scoring_for(&state.config.scoring, Some(&stored));
    Ok(Json(SleepProfile::new(auth_user.id, &scoring, true)))
}
