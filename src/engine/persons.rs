use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::engine::patch::{self, Fields};
use crate::error::AppError;
use crate::models::person::Person;
use crate::models::status::PersonRole;
use crate::state::AppState;
use crate::store::{CascadeReport, PersonFilter};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: String,
    pub address: String,
    pub role: String,
    #[serde(default)]
    pub archived: bool,
}

impl PersonRequest {
    fn into_person(self, id: Uuid) -> Result<Person, AppError> {
        Ok(Person {
            id,
            role: patch::parse_symbol::<PersonRole>("role", &self.role)?,
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            email: self.email.trim().to_string(),
            phone_number: self.phone_number.trim().to_string(),
            address: self.address.trim().to_string(),
            archived: self.archived,
        })
    }
}

pub fn get_person(state: &AppState, id: Uuid) -> Result<Person, AppError> {
    state
        .persons
        .find_person(id)?
        .ok_or_else(|| AppError::NotFound(format!("person {id} not found")))
}

pub fn list_persons(state: &AppState, filter: &PersonFilter) -> Result<Vec<Person>, AppError> {
    match filter.email.as_deref() {
        Some(email) => Ok(state
            .persons
            .find_person_by_email(email)?
            .into_iter()
            .filter(|person| filter.matches(person))
            .collect()),
        None => state.persons.list_persons(filter),
    }
}

pub fn create_person(state: &AppState, request: PersonRequest) -> Result<Person, AppError> {
    let person = request.into_person(Uuid::new_v4())?;
    person.validate()?;

    let person = state.persons.insert_person(person)?;
    info!(person_id = %person.id, role = %person.role, "person created");
    Ok(person)
}

pub fn replace_person(state: &AppState, id: Uuid, request: PersonRequest) -> Result<Person, AppError> {
    get_person(state, id)?;
    let next = request.into_person(id)?;
    store_person(state, next)
}

pub fn patch_person(state: &AppState, id: Uuid, fields: &Fields) -> Result<Person, AppError> {
    let mut next = get_person(state, id)?;
    patch::apply_person_fields(&mut next, fields)?;
    store_person(state, next)
}

/// Deletes the person together with every order they own as customer.
pub fn delete_person(state: &AppState, id: Uuid) -> Result<CascadeReport, AppError> {
    let report = state.persons.delete_person(id, state.clock.now())?;
    info!(
        person_id = %id,
        orders_removed = report.orders_removed,
        orders_detached = report.orders_detached,
        "person deleted"
    );
    Ok(report)
}

/// The store refuses a role change while orders still reference the person
/// in the role being given up.
fn store_person(state: &AppState, next: Person) -> Result<Person, AppError> {
    next.validate()?;

    let saved = state.persons.update_person(next)?;
    info!(person_id = %saved.id, archived = saved.archived, "person updated");
    Ok(saved)
}
