use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::Json;
use axum::Router;
use uuid::Uuid;

use crate::api::rest::extract::{AppJson, AppPath, AppQuery};
use crate::engine::patch::Fields;
use crate::engine::persons::{self, PersonRequest};
use crate::error::AppError;
use crate::models::person::Person;
use crate::state::AppState;
use crate::store::PersonFilter;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/persons", get(list_persons).post(create_person))
        .route(
            "/api/persons/:id",
            get(get_person)
                .put(replace_person)
                .patch(patch_person)
                .delete(delete_person),
        )
}

async fn list_persons(
    State(state): State<Arc<AppState>>,
    AppQuery(filter): AppQuery<PersonFilter>,
) -> Result<Json<Vec<Person>>, AppError> {
    Ok(Json(persons::list_persons(&state, &filter)?))
}

async fn get_person(
    State(state): State<Arc<AppState>>,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<Person>, AppError> {
    Ok(Json(persons::get_person(&state, id)?))
}

async fn create_person(
    State(state): State<Arc<AppState>>,
    AppJson(payload): AppJson<PersonRequest>,
) -> Result<(StatusCode, Json<Person>), AppError> {
    let person = persons::create_person(&state, payload)?;
    Ok((StatusCode::CREATED, Json(person)))
}

async fn replace_person(
    State(state): State<Arc<AppState>>,
    AppPath(id): AppPath<Uuid>,
    AppJson(payload): AppJson<PersonRequest>,
) -> Result<Json<Person>, AppError> {
    Ok(Json(persons::replace_person(&state, id, payload)?))
}

async fn patch_person(
    State(state): State<Arc<AppState>>,
    AppPath(id): AppPath<Uuid>,
    AppJson(fields): AppJson<Fields>,
) -> Result<Json<Person>, AppError> {
    Ok(Json(persons::patch_person(&state, id, &fields)?))
}

async fn delete_person(
    State(state): State<Arc<AppState>>,
    AppPath(id): AppPath<Uuid>,
) -> Result<StatusCode, AppError> {
    persons::delete_person(&state, id)?;
    Ok(StatusCode::NO_CONTENT)
}
