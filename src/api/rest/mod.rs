pub mod extract;
pub mod orders;
pub mod persons;
pub mod statistics;

use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderValue, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Json;
use axum::Router;
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::error::AppError;
use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    router_with_cors(state, None)
}

/// `allow_origin` of `None` allows any origin.
pub fn router_with_cors(state: Arc<AppState>, allow_origin: Option<&str>) -> Router {
    Router::new()
        .merge(orders::router())
        .merge(persons::router())
        .merge(statistics::router())
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .with_state(state)
        .layer(cors_layer(allow_origin))
        .layer(TraceLayer::new_for_http())
}

fn cors_layer(allow_origin: Option<&str>) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    match allow_origin.and_then(|origin| HeaderValue::from_str(origin).ok()) {
        Some(origin) => layer.allow_origin(origin),
        None => layer.allow_origin(Any),
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    orders: u64,
}

async fn health(State(state): State<Arc<AppState>>) -> Result<Json<HealthResponse>, AppError> {
    Ok(Json(HealthResponse {
        status: "ok",
        orders: state.orders.count_orders()?,
    }))
}

async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.metrics.encode() {
        Ok(body) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(err) => (StatusCode::INTERNAL_SERVER_ERROR, err).into_response(),
    }
}
