//! Web API
//!
//! Thin axum layer over `ServoCore`. Every handler takes the servo lock
//! for the duration of one core call and returns JSON; failures are
//! `{"error": "..."}` with 400 for validation errors, 409 once stopped.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use joyservo_core::{JoyservoError, StopSource};
use joyservo_library::ServoCore;

#[derive(Clone)]
pub struct AppState {
    pub core: Arc<ServoCore>,
}

impl AppState {
    pub fn new(core: Arc<ServoCore>) -> Arc<Self> {
        Arc::new(Self { core })
    }
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl From<JoyservoError> for ApiError {
    fn from(err: JoyservoError) -> Self {
        let status = match &err {
            e if e.is_validation() => StatusCode::BAD_REQUEST,
            JoyservoError::Stopped => StatusCode::CONFLICT,
            JoyservoError::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

type ApiResult = Result<Json<serde_json::Value>, ApiError>;

/// A request without a JSON body reads as `None`; a JSON body must parse
fn optional_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<Option<T>, ApiError> {
    match body {
        Ok(Json(req)) => Ok(Some(req)),
        Err(JsonRejection::MissingJsonContentType(_)) => Ok(None),
        Err(rejection) => Err(rejection.into()),
    }
}

fn parse_channel(raw: &str) -> Result<u8, ApiError> {
    raw.parse::<u8>()
        .map_err(|_| ApiError::bad_request(format!("Invalid servo channel: {}", raw)))
}

// ============================================================================
// Request bodies
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct AngleRequest {
    pub angle: i64,
}

#[derive(Debug, Default, Deserialize)]
pub struct HoldRequest {
    pub hold: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LockRequest {
    pub lock: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct LogsQuery {
    pub limit: Option<usize>,
}

// ============================================================================
// Handlers
// ============================================================================

pub async fn index_handler() -> Html<&'static str> {
    Html(INDEX_HTML)
}

pub async fn status_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.core.get_status())
}

pub async fn servo_angle_handler(
    State(state): State<Arc<AppState>>,
    Path(channel): Path<String>,
    body: Result<Json<AngleRequest>, JsonRejection>,
) -> ApiResult {
    let channel = parse_channel(&channel)?;
    let Json(req) = body?;
    let servo = state.core.set_channel_angle(channel, req.angle)?;
    Ok(Json(json!({ "success": true, "servo": servo })))
}

pub async fn servo_all_handler(
    State(state): State<Arc<AppState>>,
    body: Result<Json<AngleRequest>, JsonRejection>,
) -> ApiResult {
    let Json(req) = body?;
    let moved = state.core.set_all_angle(req.angle)?;
    Ok(Json(json!({ "success": true, "angle": req.angle, "moved": moved })))
}

/// Absent body (or absent `hold`) toggles
pub async fn servo_hold_handler(
    State(state): State<Arc<AppState>>,
    Path(channel): Path<String>,
    body: Result<Json<HoldRequest>, JsonRejection>,
) -> ApiResult {
    let channel = parse_channel(&channel)?;
    let requested = optional_body(body)?.and_then(|req| req.hold);
    let hold = match requested {
        Some(hold) => {
            state.core.set_hold(channel, hold)?;
            hold
        }
        None => state.core.toggle_hold(channel)?,
    };
    Ok(Json(json!({ "success": true, "channel": channel, "hold": hold })))
}

/// Absent body (or absent `lock`) toggles
pub async fn servo_lock_handler(
    State(state): State<Arc<AppState>>,
    body: Result<Json<LockRequest>, JsonRejection>,
) -> ApiResult {
    let lock = match optional_body(body)?.and_then(|req| req.lock) {
        Some(lock) => {
            state.core.set_lock(lock)?;
            lock
        }
        None => state.core.toggle_lock()?,
    };
    Ok(Json(json!({ "success": true, "lock": lock })))
}

pub async fn logs_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LogsQuery>,
) -> ApiResult {
    let logs = state.core.recent_logs(query.limit)?;
    Ok(Json(json!({ "count": logs.len(), "logs": logs })))
}

pub async fn stop_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let first = state.core.request_stop(StopSource::Api);
    let exiting = state.core.shutdown_signal().is_exiting();
    Json(json!({ "success": true, "stopped": true, "first": first, "exiting": exiting }))
}

// ============================================================================
// Server
// ============================================================================

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/api/status", get(status_handler))
        .route("/api/servo/all", post(servo_all_handler))
        .route("/api/servo/lock", post(servo_lock_handler))
        .route("/api/servo/hold/:channel", post(servo_hold_handler))
        .route("/api/servo/:channel", post(servo_angle_handler))
        .route("/api/logs", get(logs_handler))
        .route("/api/stop", post(stop_handler))
        .with_state(state)
}

/// Serve until the core asks the process to exit
pub async fn serve(state: Arc<AppState>, addr: &str) -> anyhow::Result<()> {
    let signal = Arc::clone(state.core.shutdown_signal());
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Web API listening on {}", addr);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move {
            while !signal.is_exiting() {
                tokio::time::sleep(Duration::from_millis(100)).await;
            }
        })
        .await?;
    Ok(())
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>joyservo</title>
<style>
body { font-family: monospace; background: #111; color: #ddd; margin: 2em; }
td, th { padding: 0.2em 1em; text-align: left; }
.on { color: #e5c07b; }
</style>
</head>
<body>
<h1>joyservo</h1>
<table id="servos"><tr><th>ch</th><th>angle</th><th>dir</th><th>hold</th></tr></table>
<p id="flags"></p>
<p id="sensor"></p>
<p id="hardware"></p>
<button onclick="post('/api/servo/all', {angle: 0})">All 0°</button>
<button onclick="post('/api/servo/all', {angle: 90})">All 90°</button>
<button onclick="post('/api/servo/all', {angle: 180})">All 180°</button>
<button onclick="post('/api/servo/lock')">Toggle lock</button>
<button onclick="post('/api/stop')">Stop</button>
<script>
function post(url, body) {
  const opts = { method: 'POST' };
  if (body) { opts.headers = { 'Content-Type': 'application/json' }; opts.body = JSON.stringify(body); }
  return fetch(url, opts).then(refresh);
}
function refresh() {
  fetch('/api/status').then(r => r.json()).then(s => {
    const rows = s.servos.channels.map(c =>
      `<tr><td>${c.channel}</td><td>${c.angle}°</td><td>${c.direction}</td>` +
      `<td class="${c.hold ? 'on' : ''}">${c.hold ? 'HOLD' : ''}</td></tr>`).join('');
    document.getElementById('servos').innerHTML =
      '<tr><th>ch</th><th>angle</th><th>dir</th><th>hold</th></tr>' + rows;
    document.getElementById('flags').textContent =
      `speed ${s.servos.speed.toFixed(1)}x` + (s.servos.lock ? ' LOCK' : '') + (s.servos.stopped ? ' STOPPED' : '');
    const a = s.sensor.accel;
    document.getElementById('sensor').textContent =
      `accel x ${a.x.toFixed(2)} y ${a.y.toFixed(2)} z ${a.z.toFixed(2)} (${s.sensor.source})`;
    const h = s.hardware;
    document.getElementById('hardware').textContent =
      `PCA ${h.pca.connected ? 'connected' : 'simulated'} | MPU ${h.mpu.connected ? 'connected' : 'simulated'}` +
      ` | controller ${h.controller.connected ? h.controller.kind : 'none'}`;
  });
}
refresh();
setInterval(refresh, 500);
</script>
</body>
</html>
"#;
