use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::NaiveDate;
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::auth::jwt::verify_access_token;
use crate::AppState;

/// Pushed to a user's open connections when their data changes.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LiveEvent {
    HealthLogUpserted {
        user_id: Uuid,
        date: NaiveDate,
        readiness_score: Option<i32>,
    },
}

impl LiveEvent {
    pub fn user_id(&self) -> Uuid {
        match self {
            LiveEvent::HealthLogUpserted { user_id, .. } => *user_id,
        }
    }
}

/// Fire-and-forget: no open connections is not an error.
pub fn publish(state: &AppState, event: LiveEvent) {
    if let Some(tx) = state.ws_tx.as_ref() {
        let _ = tx.send(event);
    }
}

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    token: Option<String>,
}

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Query(query): Query<WsQuery>,
) -> Response {
    // Browsers cannot set headers on the upgrade request, so the token rides in the query.
    let user_id = match query
        .token
        .as_deref()
        .map(|token| verify_access_token(token, &state.config))
    {
        Some(Ok(id)) => id,
        _ => {
            tracing::warn!("WebSocket auth failed");
            return (StatusCode::UNAUTHORIZED, "Unauthorized").into_response();
        }
    };

    let Some(rx) = state.ws_tx.as_ref().map(|tx| tx.subscribe()) else {
        return (StatusCode::SERVICE_UNAVAILABLE, "Live updates disabled").into_response();
    };

    ws.on_upgrade(move |socket| handle_socket(socket, rx, user_id))
}

async fn handle_socket(socket: WebSocket, mut rx: broadcast::Receiver<LiveEvent>, user_id: Uuid) {
    let (mut sender, mut receiver) = socket.split();

    tracing::debug!(user_id = %user_id, "WebSocket connection established");

    let mut send_task = tokio::spawn(async move {
        loop {
            let event = match rx.recv().await {
                Ok(event) => event,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::debug!(user_id = %user_id, skipped, "WebSocket receiver lagged");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => break,
            };
            if event.user_id() != user_id {
                continue;
            }
            let Ok(text) = serde_json::to_string(&event) else {
                continue;
            };
            if sender.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
    });

    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            if let Message::Close(_) = msg {
                break;
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    tracing::debug!(user_id = %user_id, "WebSocket connection closed");
}
