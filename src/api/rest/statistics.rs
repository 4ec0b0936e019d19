use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::Json;
use axum::Router;

use crate::engine::statistics::{self, StatisticsSummary};
use crate::error::AppError;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/api/statistics/summary", get(summary))
}

async fn summary(State(state): State<Arc<AppState>>) -> Result<Json<StatisticsSummary>, AppError> {
    Ok(Json(statistics::summarize(&state)?))
}
