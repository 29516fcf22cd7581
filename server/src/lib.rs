use anyhow::Result;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderValue, Method, StatusCode};
use axum::{routing::get, Json, Router};
use corpus_stats::persist::load_stats_file;
use corpus_stats::{check_stats, CorpusStats, CorpusStatsGrouping, CorpusStatsNestedGrouping, StatsError, Warning};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

#[derive(Deserialize)]
pub struct NestedParams {
    pub field: String,
}

#[derive(Serialize)]
pub struct ChecksResponse {
    pub groupings: usize,
    pub warnings: Vec<Warning>,
}

#[derive(Clone)]
pub struct AppState {
    pub stats: Arc<CorpusStats>,
    /// Computed once at startup; the document is never modified afterwards.
    pub warnings: Arc<Vec<Warning>>,
}

impl AppState {
    pub fn new(stats: CorpusStats) -> Self {
        let warnings = check_stats(&stats);
        for w in &warnings {
            tracing::warn!(path = w.path(), "{w}");
        }
        Self { stats: Arc::new(stats), warnings: Arc::new(warnings) }
    }

    fn grouping(&self, name: &str) -> Result<&CorpusStatsGrouping, (StatusCode, String)> {
        self.stats
            .get(name)
            .ok_or_else(|| error_response(StatsError::UnknownGrouping(name.to_string())))
    }
}

pub fn build_app(stats_path: String) -> Result<Router> {
    let stats = load_stats_file(&stats_path)?;
    tracing::info!(path = %stats_path, groupings = stats.len(), "loaded stats");
    Ok(router(AppState::new(stats)))
}

pub fn router(app_state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/stats", get(stats_handler))
        .route("/stats/:grouping", get(grouping_handler))
        .route("/stats/:grouping/nested", get(nested_handler))
        .route("/checks", get(checks_handler))
        .with_state(app_state)
        .layer(cors_layer(std::env::var("CORS_ALLOW_ORIGIN").ok().as_deref()))
        .layer(TraceLayer::new_for_http())
}

/// Origins come from a comma-separated list; unparsable entries are skipped and
/// an empty list falls back to any origin.
pub fn cors_layer(allowed: Option<&str>) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter_map(|s| s.parse().ok())
        .collect();
    let base = CorsLayer::new().allow_methods([Method::GET]).allow_headers(Any);
    if origins.is_empty() {
        return base.allow_origin(Any);
    }
    tracing::debug!(origins = origins.len(), "restricting CORS origins");
    base.allow_origin(AllowOrigin::list(origins))
}

pub async fn stats_handler(State(state): State<AppState>) -> Json<CorpusStats> {
    Json(state.stats.as_ref().clone())
}

pub async fn grouping_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<CorpusStatsGrouping>, (StatusCode, String)> {
    Ok(Json(state.grouping(&name)?.clone()))
}

pub async fn nested_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(params): Query<NestedParams>,
) -> Result<Json<CorpusStatsNestedGrouping>, (StatusCode, String)> {
    let nested = state.grouping(&name)?.nest_by(&params.field).map_err(error_response)?;
    Ok(Json(nested))
}

pub async fn checks_handler(State(state): State<AppState>) -> Json<ChecksResponse> {
    Json(ChecksResponse { groupings: state.stats.len(), warnings: state.warnings.as_ref().clone() })
}

fn error_response(err: StatsError) -> (StatusCode, String) {
    let status = match &err {
        StatsError::UnknownGrouping(_) => StatusCode::NOT_FOUND,
        StatsError::Nesting(_) | StatsError::MalformedDocument { .. } => StatusCode::BAD_REQUEST,
        StatsError::Io(_) | StatsError::Encode(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, err.to_string())
}
