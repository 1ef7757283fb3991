use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::Context;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::board::ItemId;
use crate::config::ApiConfig;
use crate::errors::{SyncError, SyncErrorKind};
use crate::geometry::round_coord;

/// Credentials attached to every backend request.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub token: Option<String>,
    pub session_cookie: Option<String>,
}

impl Credentials {
    pub fn apply(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let mut request = request;
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        if let Some(cookie) = &self.session_cookie {
            request = request.header(reqwest::header::COOKIE, cookie);
        }
        request
    }
}

/// Body of the position update call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionUpdate {
    pub x: i32,
    pub y: i32,
}

impl PositionUpdate {
    /// Round to integers and floor at zero.
    pub fn from_coords(x: f64, y: f64) -> Self {
        Self {
            x: round_coord(x).max(0),
            y: round_coord(y).max(0),
        }
    }
}

/// Result of a position sync, always a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    Synced,
    Failed(SyncError),
}

impl SyncOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, SyncOutcome::Synced)
    }

    pub fn kind(&self) -> Option<SyncErrorKind> {
        match self {
            SyncOutcome::Synced => None,
            SyncOutcome::Failed(err) => Some(err.kind),
        }
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            SyncOutcome::Synced => None,
            SyncOutcome::Failed(err) => Some(err.message.as_str()),
        }
    }
}

/// Persists an item's position. Implementations must not panic and report
/// every failure through [`SyncOutcome::Failed`].
#[async_trait]
pub trait PositionSync: Send + Sync {
    async fn update_position(&self, item_id: ItemId, x: f64, y: f64) -> SyncOutcome;
}

/// HTTP client for `PATCH /api/memos/{id}/position`.
pub struct PositionSyncClient {
    http: reqwest::Client,
    base_url: String,
    credentials: Credentials,
    session_valid: AtomicBool,
}

impl PositionSyncClient {
    pub fn new(api: &ApiConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(api.request_timeout())
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            http,
            base_url: api.base_url.trim_end_matches('/').to_string(),
            credentials: api.credentials(),
            session_valid: AtomicBool::new(true),
        })
    }

    pub fn position_url(&self, item_id: ItemId) -> String {
        format!("{}/api/memos/{}/position", self.base_url, item_id)
    }

    fn me_url(&self) -> String {
        format!("{}/api/users/me", self.base_url)
    }

    /// Whether the last session check succeeded. Starts out `true` and is
    /// cleared when a refresh after an auth failure is rejected.
    pub fn session_valid(&self) -> bool {
        self.session_valid.load(Ordering::Relaxed)
    }

    /// Re-validate the session against `GET /api/users/me`.
    pub async fn refresh_session(&self) -> bool {
        let valid = match self
            .credentials
            .apply(self.http.get(self.me_url()))
            .send()
            .await
        {
            Ok(resp) => resp.status().is_success(),
            Err(err) => {
                debug!(error = %err, "session check failed to reach backend");
                false
            }
        };
        self.session_valid.store(valid, Ordering::Relaxed);
        info!(valid, "session re-validated");
        valid
    }

    async fn send_update(&self, item_id: ItemId, body: PositionUpdate) -> SyncOutcome {
        let url = self.position_url(item_id);
        let response = match self
            .credentials
            .apply(self.http.patch(&url))
            .json(&body)
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(err) => {
                let reason = if err.is_timeout() {
                    "request timed out"
                } else if err.is_connect() {
                    "could not connect"
                } else {
                    "request failed"
                };
                return SyncOutcome::Failed(SyncError::network(format!("{}: {}", reason, err)));
            }
        };

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            self.refresh_session().await;
            return SyncOutcome::Failed(SyncError::auth(format!(
                "session rejected with HTTP {}",
                status.as_u16()
            )));
        }

        let text = match response.text().await {
            Ok(text) => text,
            Err(err) => {
                return SyncOutcome::Failed(SyncError::network(format!(
                    "failed to read response body: {}",
                    err
                )));
            }
        };

        if !status.is_success() {
            return SyncOutcome::Failed(SyncError::server(format!(
                "HTTP {}: {}",
                status.as_u16(),
                extract_error_message(&text)
            )));
        }

        if is_failure_ack(&text) {
            return SyncOutcome::Failed(SyncError::server("unexpected response"));
        }

        SyncOutcome::Synced
    }
}

#[async_trait]
impl PositionSync for PositionSyncClient {
    async fn update_position(&self, item_id: ItemId, x: f64, y: f64) -> SyncOutcome {
        let body = PositionUpdate::from_coords(x, y);
        info!(item = %item_id, x = body.x, y = body.y, "syncing position");
        let outcome = self.send_update(item_id, body).await;
        if let SyncOutcome::Failed(err) = &outcome {
            warn!(item = %item_id, kind = %err.kind, message = %err.message, "position sync failed");
        }
        outcome
    }
}

/// Pull the most specific human-readable message out of an error body:
/// `errors[0].message`, then `message`, then the first string field, else the
/// raw text.
pub fn extract_error_message(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "empty response body".to_string();
    }
    let Ok(Value::Object(map)) = serde_json::from_str::<Value>(trimmed) else {
        return trimmed.to_string();
    };
    if let Some(msg) = map
        .get("errors")
        .and_then(|errors| errors.get(0))
        .and_then(|first| first.get("message"))
        .and_then(Value::as_str)
    {
        return msg.to_string();
    }
    if let Some(msg) = map.get("message").and_then(Value::as_str) {
        return msg.to_string();
    }
    map.values()
        .find_map(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| trimmed.to_string())
}

/// True when a 2xx acknowledgement explicitly signals failure: a bare JSON
/// `false`, or an object whose `success` field is `false`. Anything else,
/// including an empty body, is an acknowledgement.
pub fn is_failure_ack(body: &str) -> bool {
    match serde_json::from_str::<Value>(body.trim()) {
        Ok(Value::Bool(false)) => true,
        Ok(Value::Object(map)) => matches!(map.get("success"), Some(Value::Bool(false))),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use axum::{
        Json, Router,
        extract::{Path, State},
        http::{HeaderMap, StatusCode as AxumStatus},
        routing::{get, patch},
    };

    #[derive(Default)]
    struct Recorded {
        bodies: Vec<(i64, Value)>,
        auth_headers: Vec<Option<String>>,
        me_calls: usize,
    }

    type Shared = Arc<Mutex<Recorded>>;

    async fn spawn_backend(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn backend(status: AxumStatus, reply: &'static str, me_status: AxumStatus) -> (Router, Shared) {
        let shared: Shared = Arc::default();
        let router = Router::new()
            .route(
                "/api/memos/{id}/position",
                patch(
                    move |State(rec): State<Shared>,
                          Path(id): Path<i64>,
                          headers: HeaderMap,
                          Json(body): Json<Value>| async move {
                        let mut rec = rec.lock().unwrap();
                        rec.bodies.push((id, body));
                        rec.auth_headers.push(
                            headers
                                .get("authorization")
                                .and_then(|v| v.to_str().ok())
                                .map(str::to_string),
                        );
                        (status, reply)
                    },
                ),
            )
            .route(
                "/api/users/me",
                get(move |State(rec): State<Shared>| async move {
                    rec.lock().unwrap().me_calls += 1;
                    (me_status, "{}")
                }),
            )
            .with_state(shared.clone());
        (router, shared)
    }

    fn client_for(base_url: String) -> PositionSyncClient {
        let api = ApiConfig {
            base_url,
            request_timeout_ms: 2_000,
            token: Some("tok-123".into()),
            session_cookie: None,
        };
        PositionSyncClient::new(&api).unwrap()
    }

    #[tokio::test]
    async fn test_success_sends_rounded_body_with_credentials() {
        let (router, rec) = backend(AxumStatus::OK, "", AxumStatus::OK);
        let client = client_for(spawn_backend(router).await);

        let outcome = client.update_position(ItemId(7), 289.6, 290.2).await;

        assert_eq!(outcome, SyncOutcome::Synced);
        let rec = rec.lock().unwrap();
        assert_eq!(rec.bodies.len(), 1);
        assert_eq!(rec.bodies[0].0, 7);
        assert_eq!(rec.bodies[0].1, serde_json::json!({"x": 290, "y": 290}));
        assert_eq!(rec.auth_headers[0].as_deref(), Some("Bearer tok-123"));
    }

    #[tokio::test]
    async fn test_unauthorized_is_auth_error_and_refreshes_session() {
        let (router, rec) = backend(AxumStatus::UNAUTHORIZED, "", AxumStatus::UNAUTHORIZED);
        let client = client_for(spawn_backend(router).await);

        let outcome = client.update_position(ItemId(1), 10.0, 10.0).await;

        assert_eq!(outcome.kind(), Some(SyncErrorKind::Auth));
        assert_eq!(rec.lock().unwrap().me_calls, 1);
        assert!(!client.session_valid());
    }

    #[tokio::test]
    async fn test_forbidden_with_valid_session_still_fails() {
        let (router, _rec) = backend(AxumStatus::FORBIDDEN, "", AxumStatus::OK);
        let client = client_for(spawn_backend(router).await);

        let outcome = client.update_position(ItemId(1), 10.0, 10.0).await;

        assert!(!outcome.is_success());
        assert_eq!(outcome.kind(), Some(SyncErrorKind::Auth));
        assert!(client.session_valid());
    }

    #[tokio::test]
    async fn test_server_error_carries_status_and_body() {
        let (router, _rec) = backend(
            AxumStatus::INTERNAL_SERVER_ERROR,
            r#"{"message":"db down"}"#,
            AxumStatus::OK,
        );
        let client = client_for(spawn_backend(router).await);

        let outcome = client.update_position(ItemId(1), 10.0, 10.0).await;

        assert_eq!(outcome.kind(), Some(SyncErrorKind::Server));
        assert_eq!(outcome.message(), Some("HTTP 500: db down"));
    }

    #[tokio::test]
    async fn test_failure_ack_on_2xx_is_server_error() {
        let (router, _rec) = backend(AxumStatus::OK, "false", AxumStatus::OK);
        let client = client_for(spawn_backend(router).await);

        let outcome = client.update_position(ItemId(1), 10.0, 10.0).await;

        assert_eq!(outcome.kind(), Some(SyncErrorKind::Server));
        assert_eq!(outcome.message(), Some("unexpected response"));
    }

    #[tokio::test]
    async fn test_ack_body_with_data_is_success() {
        let (router, _rec) = backend(
            AxumStatus::OK,
            r#"{"code":0,"message":"ok","data":{"x":1,"y":2}}"#,
            AxumStatus::OK,
        );
        let client = client_for(spawn_backend(router).await);
        assert!(client.update_position(ItemId(1), 1.0, 2.0).await.is_success());
    }

    #[tokio::test]
    async fn test_connection_refused_is_network_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let client = client_for(format!("http://{}", addr));

        let outcome = client.update_position(ItemId(1), 10.0, 10.0).await;

        assert_eq!(outcome.kind(), Some(SyncErrorKind::Network));
    }

    #[test]
    fn test_position_url_trims_trailing_slash() {
        let client = client_for("http://localhost:8080/".to_string());
        assert_eq!(
            client.position_url(ItemId(3)),
            "http://localhost:8080/api/memos/3/position"
        );
    }

    #[test]
    fn test_position_update_rounds_and_floors() {
        assert_eq!(
            PositionUpdate::from_coords(289.5, -3.2),
            PositionUpdate { x: 290, y: 0 }
        );
    }

    #[test]
    fn test_extract_error_message_variants() {
        assert_eq!(
            extract_error_message(r#"{"errors":[{"message":"bad x"}],"message":"outer"}"#),
            "bad x"
        );
        assert_eq!(extract_error_message(r#"{"message":"nope"}"#), "nope");
        assert_eq!(extract_error_message(r#"{"x":"must be >= 0"}"#), "must be >= 0");
        assert_eq!(extract_error_message("plain text"), "plain text");
        assert_eq!(extract_error_message("  "), "empty response body");
        assert_eq!(extract_error_message(r#"{"code":5}"#), r#"{"code":5}"#);
    }

    #[test]
    fn test_is_failure_ack() {
        assert!(is_failure_ack("false"));
        assert!(is_failure_ack(r#"{"success": false, "message": "locked"}"#));
        assert!(!is_failure_ack(""));
        assert!(!is_failure_ack("true"));
        assert!(!is_failure_ack(r#"{"success": true}"#));
        assert!(!is_failure_ack("OK"));
        assert!(!is_failure_ack("null"));
    }
}
