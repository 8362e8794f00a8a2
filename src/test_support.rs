use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::Value;
use tokio::sync::broadcast;
use tower::ServiceExt;
use uuid::Uuid;

use crate::auth::jwt::{create_token, TokenType};
use crate::auth::rate_limit::RateLimitState;
use crate::config::{Config, ScoringConfig};
use crate::db::MemoryHealthLogStore;
use crate::handlers::ws::LiveEvent;
use crate::{build_router, AppState};

pub fn test_config() -> Config {
    Config {
        database_url: None,
        host: "127.0.0.1".into(),
        port: 0,
        frontend_url: "http://localhost:5173".into(),
        cors_extra_origins: Vec::new(),
        jwt_secret: "test-secret-for-equinox-wellness".into(),
        jwt_issuer: None,
        write_rate_limit_max: 1000,
        write_rate_limit_window_secs: 60,
        scoring: ScoringConfig::default(),
    }
}

pub struct TestUser {
    pub id: Uuid,
    token: String,
}

/// Router over the in-memory store, driven with `oneshot`.
pub struct TestApp {
    router: Router,
    state: AppState,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_write_limit(1000)
    }

    pub fn with_write_limit(max_writes: u32) -> Self {
        let config = Config {
            write_rate_limit_max: max_writes,
            ..test_config()
        };
        let (ws_tx, _) = broadcast::channel::<LiveEvent>(64);
        let store = MemoryHealthLogStore::new();
        let state = AppState {
            store: Arc::new(store.clone()),
            profiles: Arc::new(store),
            rate_limiter: RateLimitState::new(
                config.write_rate_limit_max,
                config.write_rate_limit_window_secs,
            ),
            config: Arc::new(config),
            ws_tx: Some(ws_tx),
        };
        Self {
            router: build_router(state.clone()),
            state,
        }
    }

    pub fn user(&self) -> TestUser {
        let id = Uuid::new_v4();
        TestUser {
            id,
            token: create_token(id, TokenType::Access, 900, &self.state.config),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LiveEvent> {
        self.state
            .ws_tx
            .as_ref()
            .expect("test app always has a live channel")
            .subscribe()
    }

    pub async fn get(&self, user: &TestUser, uri: &str) -> (StatusCode, Value) {
        let req = Request::builder()
            .method(Method::GET)
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {}", user.token))
            .body(Body::empty())
            .unwrap();
        self.send(req).await
    }

    pub async fn get_anonymous(&self, uri: &str) -> (StatusCode, Value) {
        let req = Request::builder()
            .method(Method::GET)
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        self.send(req).await
    }

    pub async fn post(&self, user: &TestUser, uri: &str, body: &str) -> (StatusCode, Value) {
        self.send_json(Method::POST, user, uri, body).await
    }

    pub async fn put(&self, user: &TestUser, uri: &str, body: &str) -> (StatusCode, Value) {
        self.send_json(Method::PUT, user, uri, body).await
    }

    async fn send_json(
        &self,
        method: Method,
        user: &TestUser,
        uri: &str,
        body: &str,
    ) -> (StatusCode, Value) {
        let req = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {}", user.token))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(req).await
    }

    async fn send(&self, req: Request<Body>) -> (StatusCode, Value) {
        let resp = self.router.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }
}
