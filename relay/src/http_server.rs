//! Inbound webhook endpoint.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::Router;
use gembot_line::{verify_signature, WebhookPayload};
use tracing::{debug, info, warn};

use crate::dispatcher::EventDispatcher;

const SIGNATURE_HEADER: &str = "x-line-signature";

/// Application state shared with all routes
#[derive(Clone)]
pub struct AppState {
    channel_secret: Arc<String>,
    dispatcher: EventDispatcher,
}

impl AppState {
    pub fn new(channel_secret: String, dispatcher: EventDispatcher) -> Self {
        Self {
            channel_secret: Arc::new(channel_secret),
            dispatcher,
        }
    }
}

/// Start the HTTP server
pub async fn run_server(state: AppState, addr: SocketAddr) -> anyhow::Result<()> {
    info!("Starting HTTP server on {}", addr);

    let app = router(state);

    axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .await
        .map_err(|e| anyhow::anyhow!("Failed to start HTTP server: {}", e))
}

/// Build the router; separate from `run_server` so tests can drive it
/// without binding a socket.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health))
        .route("/callback", post(handle_callback))
        .with_state(state)
}

/// Health check handler
async fn health() -> impl IntoResponse {
    "Relay is running"
}

/// Webhook callback handler.
///
/// The platform signature covers the raw body, so verification happens
/// before any parsing; a request that fails it is rejected outright.
async fn handle_callback(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> impl IntoResponse {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok());

    let Some(signature) = signature else {
        warn!("Webhook request without a signature header");
        return (StatusCode::BAD_REQUEST, "missing signature");
    };

    if !verify_signature(&state.channel_secret, body.as_bytes(), signature) {
        warn!("Webhook signature verification failed");
        return (StatusCode::BAD_REQUEST, "invalid signature");
    }

    let payload: WebhookPayload = match serde_json::from_str(&body) {
        Ok(payload) => payload,
        Err(e) => {
            warn!(error = %e, "Failed to parse webhook payload");
            return (StatusCode::BAD_REQUEST, "invalid payload");
        }
    };

    debug!(events = payload.events.len(), "Dispatching webhook events");
    for event in payload.events {
        state.dispatcher.dispatch(event).await;
    }

    (StatusCode::OK, "OK")
}
