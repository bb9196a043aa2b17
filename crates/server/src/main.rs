use std::{net::SocketAddr, sync::Arc};

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::Value;
use shared::{
    command,
    domain::MachineState,
    error::{ApiError, ErrorCode},
    protocol::{CommandAccepted, CommandDelivery, ErrorResponse, IngestAccepted, StatusReport},
};
use store::StateStore;
use tower_http::limit::RequestBodyLimitLayer;
use tracing::{debug, info, warn};

mod config;

use config::load_settings;

#[derive(Clone)]
struct AppState {
    store: StateStore,
}

#[derive(Debug, Deserialize)]
struct CommandRequest {
    command: String,
}

const MAX_BODY_BYTES: usize = 64 * 1024;
const NO_STORE: &str = "no-store, max-age=0";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let settings = load_settings();
    let state = AppState {
        store: StateStore::new(),
    };
    let app = build_router(Arc::new(state));

    let addr: SocketAddr = settings.server_bind.parse()?;
    info!(%addr, "relay listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/command", post(submit_command).get(poll_command))
        .route("/status", get(machine_status))
        .route("/state", post(ingest_state))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

/// Dashboard-side entry point: validates the raw command, qualifies it
/// and appends it to the queue.
async fn submit_command(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CommandRequest>, JsonRejection>,
) -> Result<Json<CommandAccepted>, (StatusCode, Json<ErrorResponse>)> {
    let Json(request) = payload
        .map_err(|rejection| reject(ApiError::bad_request(rejection.body_text())))?;
    if request.command.is_empty() {
        return Err(reject(ApiError::bad_request(
            "command must be a non-empty string",
        )));
    }

    let qualified = command::qualify(&request.command).map_err(|error| {
        warn!(raw = %request.command, %error, "rejected operator command");
        reject(ApiError::from(error))
    })?;

    let depth = state.store.enqueue_command(qualified.clone()).await;
    info!(command = %qualified, depth, "queued operator command");

    Ok(Json(CommandAccepted {
        success: true,
        message: format!("command {qualified} queued"),
        command: qualified,
    }))
}

/// Controller-side poll. Handing out a command removes it from the
/// queue, so each command is delivered at most once.
async fn poll_command(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let delivered = state.store.take_next_command().await;
    if let Some(command) = &delivered {
        info!(%command, "delivered command to controller");
    }

    let body = CommandDelivery {
        success: true,
        message: delivered
            .is_none()
            .then(|| "no pending commands".to_string()),
        command: delivered,
        timestamp: Utc::now(),
    };
    ([(header::CACHE_CONTROL, NO_STORE)], Json(body))
}

async fn machine_status(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let (machine, last_update) = state.store.machine_state().await;
    let body = StatusReport {
        success: true,
        data: machine,
        last_update,
        timestamp: Utc::now(),
    };
    ([(header::CACHE_CONTROL, NO_STORE)], Json(body))
}

/// Controller-side report ingest. The snapshot replaces the stored one
/// wholesale; there is no field-level merging.
async fn ingest_state(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<IngestAccepted>, (StatusCode, Json<ErrorResponse>)> {
    let Json(report) = payload
        .map_err(|rejection| reject(ApiError::bad_request(rejection.body_text())))?;

    let snapshot = MachineState::from_payload(&report).map_err(|error| {
        warn!(%error, "rejected state report");
        reject(ApiError::from(error))
    })?;

    debug!(status = %snapshot.status, "storing state report");
    state.store.replace_machine_state(snapshot).await;

    Ok(Json(IngestAccepted {
        success: true,
        message: "state updated".to_string(),
        timestamp: Utc::now(),
    }))
}

fn reject(error: ApiError) -> (StatusCode, Json<ErrorResponse>) {
    let status = match error.code {
        ErrorCode::BadRequest | ErrorCode::InvalidCommand => StatusCode::BAD_REQUEST,
        ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        status,
        Json(ErrorResponse {
            success: false,
            error: error.message,
        }),
    )
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
