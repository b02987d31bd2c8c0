//! HTTP gateway — `POST /command` and `GET /status` over axum.
//!
//! An inactivity task runs alongside the server; Ctrl-C shuts down the
//! dispatcher first and then the speech worker with its bounded join.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use vox_core::config::load_config;
use vox_orchestrator::inactivity::InactivityMonitor;
use vox_orchestrator::{Dispatcher, DispatcherState, SpeechHandle};

use crate::build_dispatcher;

const INACTIVITY_POLL: Duration = Duration::from_secs(30);

#[derive(Clone)]
struct AppState {
    dispatcher: Arc<Dispatcher>,
    monitor: Arc<InactivityMonitor>,
}

// ── Wire types ──

#[derive(Deserialize)]
pub struct CommandRequest {
    pub user_input: String,
    #[serde(default)]
    pub user_name: Option<String>,
}

#[derive(Serialize)]
pub struct CommandResponse {
    pub message: String,
    pub ai_response_summary: String,
    pub interaction_id: Option<u64>,
}

#[derive(Serialize)]
pub struct StatusResponse {
    pub user: String,
    pub mode: String,
    pub state: String,
    /// "current/ceiling" strings, e.g. "3/15".
    pub rpm: String,
    pub tpm: String,
    pub rpd: String,
}

/// Run the gateway until Ctrl-C.
pub async fn run() -> Result<()> {
    let config = load_config(None);
    let (dispatcher, worker) = build_dispatcher(&config, "gateway");

    let monitor = Arc::new(InactivityMonitor::new(
        Duration::from_secs(config.assistant.inactivity_threshold_secs),
        Instant::now(),
    ));

    let inactivity_task = spawn_inactivity_task(
        dispatcher.clone(),
        monitor.clone(),
        worker.handle(),
    );

    let state = AppState {
        dispatcher: dispatcher.clone(),
        monitor,
    };

    let app = Router::new()
        .route("/command", post(handle_command))
        .route("/status", get(handle_status))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind gateway to {addr}"))?;
    info!(addr = %addr, "Gateway listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("gateway server error")?;

    // Orderly teardown: refuse new turns, stop the proactive task, then
    // drain the speech queue.
    dispatcher.shutdown();
    inactivity_task.abort();
    worker.shutdown();
    info!("Gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("Shutdown signal received");
}

fn spawn_inactivity_task(
    dispatcher: Arc<Dispatcher>,
    monitor: Arc<InactivityMonitor>,
    speech: SpeechHandle,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(INACTIVITY_POLL);
        loop {
            interval.tick().await;
            if !dispatcher.is_running() {
                break;
            }
            let pending = dispatcher.state() == DispatcherState::AwaitingConfirmation;
            if let Some(utterance) = monitor.check(Instant::now(), pending) {
                speech.say(utterance);
            }
        }
    })
}

// ── Handlers ──

async fn handle_command(
    State(state): State<AppState>,
    Json(request): Json<CommandRequest>,
) -> Json<CommandResponse> {
    info!(
        user = request.user_name.as_deref().unwrap_or("anonymous"),
        "Command received"
    );
    state.monitor.touch(Instant::now());

    let outcome = state.dispatcher.handle_input(&request.user_input).await;

    Json(CommandResponse {
        message: outcome.message,
        ai_response_summary: outcome.summary,
        interaction_id: outcome.interaction_id,
    })
}

async fn handle_status(State(state): State<AppState>) -> Json<StatusResponse> {
    let (rpm, tpm, daily, limits) = state.dispatcher.quota_snapshot();

    Json(StatusResponse {
        user: state.dispatcher.user_name().to_string(),
        mode: "text".to_string(),
        state: state_label(state.dispatcher.state()).to_string(),
        rpm: format!("{}/{}", rpm, limits.rpm),
        tpm: format!("{}/{}", tpm, limits.tpm),
        rpd: format!("{}/{}", daily, limits.rpd),
    })
}

fn state_label(state: DispatcherState) -> &'static str {
    match state {
        DispatcherState::Idle => "idle",
        DispatcherState::Thinking => "thinking",
        DispatcherState::Executing => "executing",
        DispatcherState::AwaitingConfirmation => "awaiting_confirmation",
        DispatcherState::RateLimited => "rate_limited",
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
