//! Owner-only HTTP endpoint for status and remote restarts.
//!
//! Runs on a separate tokio task. `GET /status` reports the guild and shard count of
//! the running client; `POST /restart` shuts the shards down and flags the main loop
//! to start a fresh client. Both require `Authorization: Bearer <OWNER_API_KEY>`.

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    routing::{get, post},
};
use poise::serenity_prelude as serenity;
use serde::Serialize;
use std::{
    net::SocketAddr,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};
use tokio::sync::RwLock;

struct Running {
    cache: Arc<serenity::Cache>,
    shards: Arc<serenity::ShardManager>,
}

/// Handle on the running client, shared between the bot loop and the endpoint.
#[derive(Default)]
pub struct Control {
    running: RwLock<Option<Running>>,
    restart: AtomicBool,
}

/// Body of `GET /status`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Status {
    /// Whether a client is connected
    pub online: bool,
    /// Guilds in the cache
    pub guilds: usize,
    /// Running shards
    pub shards: usize,
}

impl Control {
    /// Registers a freshly built client.
    pub async fn attach(&self, cache: Arc<serenity::Cache>, shards: Arc<serenity::ShardManager>) {
        *self.running.write().await = Some(Running { cache, shards });
    }

    /// Forgets the client after it stopped.
    pub async fn detach(&self) {
        *self.running.write().await = None;
    }

    /// Current status.
    pub async fn status(&self) -> Status {
        match self.running.read().await.as_ref() {
            Some(running) => Status {
                online: true,
                guilds: running.cache.guilds().len(),
                shards: running.shards.runners.lock().await.len(),
            },
            None => Status {
                online: false,
                guilds: 0,
                shards: 0,
            },
        }
    }

    /// Flags a restart and stops the shards. Returns false when no client is running.
    pub async fn request_restart(&self) -> bool {
        let shards = match self.running.read().await.as_ref() {
            Some(running) => Arc::clone(&running.shards),
            None => return false,
        };
        self.restart.store(true, Ordering::SeqCst);
        shards.shutdown_all().await;
        true
    }

    /// Consumes a pending restart request.
    pub fn take_restart(&self) -> bool {
        self.restart.swap(false, Ordering::SeqCst)
    }
}

#[derive(Clone)]
struct AppState {
    control: Arc<Control>,
    api_key: Arc<str>,
}

fn authorized(headers: &HeaderMap, api_key: &str) -> bool {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .is_some_and(|token| token.trim() == api_key)
}

async fn status_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Status>, StatusCode> {
    if !authorized(&headers, &state.api_key) {
        return Err(StatusCode::UNAUTHORIZED);
    }
    Ok(Json(state.control.status().await))
}

async fn restart_handler(State(state): State<AppState>, headers: HeaderMap) -> StatusCode {
    if !authorized(&headers, &state.api_key) {
        return StatusCode::UNAUTHORIZED;
    }
    tracing::warn!("Restart requested through the web endpoint");
    if state.control.request_restart().await {
        StatusCode::ACCEPTED
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

fn router(control: Arc<Control>, api_key: &str) -> Router {
    Router::new()
        .route("/status", get(status_handler))
        .route("/restart", post(restart_handler))
        .with_state(AppState {
            control,
            api_key: Arc::from(api_key),
        })
}

/// Serves the endpoint on `0.0.0.0:port`. Long-running, spawn it in the background.
pub async fn run_web_server(port: u16, api_key: String, control: Arc<Control>) {
    let app = router(control, &api_key);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Status endpoint listening on {}", addr);

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Failed to bind status endpoint on {}: {}", addr, e);
            return;
        }
    };

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("Status endpoint error: {}", e);
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_authorization_header() {
        let mut headers = HeaderMap::new();
        assert!(!authorized(&headers, "geheim"));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer falsch"));
        assert!(!authorized(&headers, "geheim"));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("geheim"));
        assert!(!authorized(&headers, "geheim"));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer geheim"));
        assert!(authorized(&headers, "geheim"));
    }

    #[tokio::test]
    async fn test_status_without_client() {
        let control = Control::default();
        assert_eq!(
            control.status().await,
            Status {
                online: false,
                guilds: 0,
                shards: 0
            }
        );
        assert!(!control.request_restart().await);
        assert!(!control.take_restart());
    }

    #[tokio::test]
    async fn test_handlers_reject_missing_token() {
        let state = AppState {
            control: Arc::new(Control::default()),
            api_key: Arc::from("geheim"),
        };
        let status = status_handler(State(state.clone()), HeaderMap::new()).await;
        assert_eq!(status.err(), Some(StatusCode::UNAUTHORIZED));

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer geheim"));
        assert_eq!(restart_handler(State(state), headers).await, StatusCode::SERVICE_UNAVAILABLE);
    }
}
