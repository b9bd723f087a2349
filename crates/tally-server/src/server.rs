//! Router assembly and HTTP handlers.

use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use axum::extract::{Json, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use serde::Deserialize;
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use tally_channel::registry::ChannelRegistry;
use tally_store::Repository;

use crate::actions::{ActionError, SessionActions};
use crate::config::ServerConfig;
use crate::identity::IdentityProvider;
use crate::protocol;
use crate::ws;

/// Shared state accessible from every handler.
#[derive(Clone)]
pub struct AppState {
    /// Session action handlers (own the repository and the registry).
    pub actions: Arc<SessionActions>,
    /// Resolves the acting user per request.
    pub identity: Arc<dyn IdentityProvider>,
    /// Server configuration.
    pub config: ServerConfig,
    /// When the server started.
    pub start_time: Instant,
}

/// The tally server: wires repository, registry, identity and routes.
pub struct TallyServer {
    state: AppState,
}

impl TallyServer {
    /// Assemble a server from its collaborators.
    #[must_use]
    pub fn new(
        config: ServerConfig,
        repo: Arc<dyn Repository>,
        identity: Arc<dyn IdentityProvider>,
    ) -> Self {
        let registry = Arc::new(ChannelRegistry::new());
        let actions = Arc::new(SessionActions::new(repo, registry, config.code_length));
        Self {
            state: AppState {
                actions,
                identity,
                config,
                start_time: Instant::now(),
            },
        }
    }

    /// Build the router with all routes.
    #[must_use]
    pub fn router(&self) -> Router {
        Router::new()
            .route("/health", get(health_handler))
            .route("/sessions", post(create_session_handler))
            .route("/session/{code}/ws", get(ws::ws_handler))
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive())
            .with_state(self.state.clone())
    }

    /// The shared state (for tests and embedding).
    #[must_use]
    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// The server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.state.config
    }
}

/// GET /health
async fn health_handler(State(state): State<AppState>) -> Response {
    let registry = state.actions.registry();
    Json(json!({
        "status": "ok",
        "uptimeSecs": state.start_time.elapsed().as_secs(),
        "channels": registry.channel_count(),
        "connections": registry.connection_count(),
    }))
    .into_response()
}

/// Body of POST /sessions.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateSessionRequest {
    name: String,
    #[serde(default)]
    description: String,
    /// Estimate scale specification, e.g. `"0m 30m 1h 2h 3h 5h 8h"`.
    scale: String,
}

/// POST /sessions — create a session; the caller becomes its moderator.
async fn create_session_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<CreateSessionRequest>,
) -> Response {
    let Some(actor) = state.identity.current_actor(&headers) else {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "unauthorized", "message": "sign in required" })),
        )
            .into_response();
    };
    match state
        .actions
        .create_session(&actor, &body.name, &body.description, &body.scale)
    {
        Ok(session) => {
            info!(code = %session.code, "session created over HTTP");
            (StatusCode::CREATED, Json(protocol::snapshot_frame(&session))).into_response()
        }
        Err(err) => error_response(&err),
    }
}

/// Map an action failure onto an HTTP response for the acting client.
fn error_response(err: &ActionError) -> Response {
    let status = match err {
        ActionError::Validation(_) | ActionError::Format(_) => StatusCode::BAD_REQUEST,
        ActionError::NotFound(_) => StatusCode::NOT_FOUND,
        ActionError::Forbidden(_) => StatusCode::FORBIDDEN,
        ActionError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        status,
        Json(json!({ "error": err.code(), "message": err.to_string() })),
    )
        .into_response()
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
