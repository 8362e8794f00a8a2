use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::auth::jwt::verify_access_token;
use crate::error::{AppError, AppResult};
use crate::AppState;

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
}

impl AuthUser {
    /// A `user` named in the query must be the caller; nobody reads another user's logs.
    pub fn resolve(&self, requested: Option<Uuid>) -> AppResult<Uuid> {
        match requested {
            Some(user_id) if user_id != self.id => {
                tracing::warn!(caller = %self.id, requested = %user_id, "Cross-user access denied");
                Err(AppError::Forbidden)
            }
            _ => Ok(self.id),
        }
    }
}

pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AppError::Unauthorized)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(AppError::Unauthorized)?;

    let user_id = verify_access_token(token, &state.config)?;

    req.extensions_mut().insert(AuthUser { id: user_id });
    Ok(next.run(req).await)
}
