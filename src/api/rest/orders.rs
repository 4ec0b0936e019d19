use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, patch};
use axum::Json;
use axum::Router;
use uuid::Uuid;

use crate::api::rest::extract::{AppJson, AppPath, AppQuery};
use crate::engine::orders::{self, OrderRequest};
use crate::engine::patch::Fields;
use crate::error::AppError;
use crate::models::order::Order;
use crate::state::AppState;
use crate::store::OrderFilter;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/orders", get(list_orders).post(create_order))
        .route(
            "/api/orders/:id",
            get(get_order)
                .put(replace_order)
                .patch(patch_order)
                .delete(delete_order),
        )
        .route("/api/orders/:id/items/:item_id", patch(patch_order_item))
}

async fn list_orders(
    State(state): State<Arc<AppState>>,
    AppQuery(filter): AppQuery<OrderFilter>,
) -> Result<Json<Vec<Order>>, AppError> {
    Ok(Json(orders::list_orders(&state, &filter)?))
}

async fn get_order(
    State(state): State<Arc<AppState>>,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<Order>, AppError> {
    Ok(Json(orders::get_order(&state, id)?))
}

async fn create_order(
    State(state): State<Arc<AppState>>,
    AppJson(payload): AppJson<OrderRequest>,
) -> Result<(StatusCode, Json<Order>), AppError> {
    let order = orders::create_order(&state, payload)?;
    Ok((StatusCode::CREATED, Json(order)))
}

async fn replace_order(
    State(state): State<Arc<AppState>>,
    AppPath(id): AppPath<Uuid>,
    AppJson(payload): AppJson<OrderRequest>,
) -> Result<Json<Order>, AppError> {
    Ok(Json(orders::replace_order(&state, id, payload)?))
}

async fn patch_order(
    State(state): State<Arc<AppState>>,
    AppPath(id): AppPath<Uuid>,
    AppJson(fields): AppJson<Fields>,
) -> Result<Json<Order>, AppError> {
    Ok(Json(orders::patch_order(&state, id, &fields)?))
}

async fn patch_order_item(
    State(state): State<Arc<AppState>>,
    AppPath((id, item_id)): AppPath<(Uuid, Uuid)>,
    AppJson(fields): AppJson<Fields>,
) -> Result<Json<Order>, AppError> {
    Ok(Json(orders::patch_order_item(&state, id, item_id, &fields)?))
}

async fn delete_order(
    State(state): State<Arc<AppState>>,
    AppPath(id): AppPath<Uuid>,
) -> Result<StatusCode, AppError> {
    orders::delete_order(&state, id)?;
    Ok(StatusCode::NO_CONTENT)
}
