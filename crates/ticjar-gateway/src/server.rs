//! Tic jar web server, an Axum-based JSON API plus the embedded page

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use serde::Deserialize;
use tower_http::cors::CorsLayer;
use tracing::{error, info};

use ticjar_core::TicJar;

use crate::frontend;

/// Shared state for all request handlers
#[derive(Clone)]
pub struct AppState {
    pub jar: Arc<TicJar>,
    pub start_time: std::time::Instant,
}

/// The web server
pub struct GatewayServer {
    state: AppState,
    bind: SocketAddr,
}

impl GatewayServer {
    pub fn new(bind: SocketAddr, jar: Arc<TicJar>) -> Self {
        let state = AppState {
            jar,
            start_time: std::time::Instant::now(),
        };
        Self { state, bind }
    }

    /// Build the Axum router
    pub fn router(&self) -> Router {
        Router::new()
            .route("/", get(frontend::index_handler))
            .route("/assets/{*path}", get(frontend::static_handler))
            .route("/api/tic", post(tic_handler))
            .route("/api/report", get(report_handler))
            .route("/api/history/{user}", get(history_handler))
            .route("/api/status", get(status_handler))
            .layer(CorsLayer::permissive())
            .with_state(self.state.clone())
    }

    /// Start the server (blocks until ctrl-c)
    pub async fn run(self) -> anyhow::Result<()> {
        let router = self.router();
        let listener = tokio::net::TcpListener::bind(self.bind).await?;
        info!("ticjar listening on http://{}", self.bind);

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {e}");
    }
}

// ── Handlers ──

#[derive(Debug, Deserialize)]
struct TicRequest {
    user: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ReportParams {
    #[serde(rename = "type")]
    kind: Option<String>,
}

fn bad_request(message: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(serde_json::json!({ "error": message })),
    )
        .into_response()
}

async fn tic_handler(State(state): State<AppState>, Json(req): Json<TicRequest>) -> Response {
    let user = match req.user.as_deref() {
        Some(user) if !user.trim().is_empty() => user,
        _ => return bad_request("User not provided"),
    };

    match state.jar.add_tic(user).await {
        Ok(receipt) => Json(receipt).into_response(),
        Err(e) => {
            error!("Failed to record tic: {e:#}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": "Failed to persist ledger" })),
            )
                .into_response()
        }
    }
}

async fn report_handler(
    State(state): State<AppState>,
    Query(params): Query<ReportParams>,
) -> Response {
    match params.kind.as_deref().unwrap_or("current") {
        "current" => Json(state.jar.current_report().await).into_response(),
        "previous" => Json(state.jar.previous_report().await).into_response(),
        _ => bad_request("Invalid report type"),
    }
}

async fn history_handler(State(state): State<AppState>, Path(user): Path<String>) -> Response {
    Json(state.jar.user_history(&user).await).into_response()
}

async fn status_handler(State(state): State<AppState>) -> Response {
    let (users, total_tics) = state.jar.totals().await;
    let uptime = state.start_time.elapsed().as_secs();

    Json(serde_json::json!({
        "status": "ok",
        "users": users,
        "total_tics": total_tics,
        "uptime_secs": uptime,
    }))
    .into_response()
}
