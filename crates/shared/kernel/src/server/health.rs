use super::state::ApiState;
use axum::extract::State;
use axum::http::header;
use axum::{Json, response::IntoResponse};
use kw_derive::{api_handler, api_model};
use kw_domain::constants::SYSTEM_TAG;
use std::sync::LazyLock;
use std::time::Instant;

#[api_model]
/// Health check response
struct HealthResponse {
    /// Status
    status: &'static str,
    /// Version
    version: &'static str,
    /// Uptime in seconds
    uptime: u64,
    /// Committed inventory revision
    revision: u64,
    /// Whether some writes are not in the snapshot yet
    dirty: bool,
    /// Whether the inventory is backed by a snapshot file
    persistent: bool,
    /// Registered feature slices
    slices: Vec<String>,
}

static START_TIME: LazyLock<Instant> = LazyLock::new(Instant::now);

#[api_handler(
    get,
    path = "/health",
    responses((status = OK, description = "Healthcheck endpoint", body = HealthResponse)),
    tag = SYSTEM_TAG,
)]
pub(super) async fn health_handler(State(state): State<ApiState>) -> impl IntoResponse {
    let mut slices: Vec<String> = state.slice_names().map(str::to_owned).collect();
    slices.sort_unstable();
    let body = HealthResponse {
        status: "up",
        version: env!("CARGO_PKG_VERSION"),
        uptime: START_TIME.elapsed().as_secs(),
        revision: state.database.revision(),
        dirty: state.database.is_dirty(),
        persistent: state.is_persistent(),
        slices,
    };

    (
        [
            (header::CACHE_CONTROL, "no-store, no-cache, must-revalidate"),
            (header::PRAGMA, "no-cache"),
        ],
        Json(body),
    )
}
