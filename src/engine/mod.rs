#[cfg(test)]
mod fixtures;
pub mod orders;
pub mod patch;
pub mod persons;
pub mod statistics;
pub mod transition;

use uuid::Uuid;

use crate::error::AppError;
use crate::models::person::Person;
use crate::models::status::PersonRole;
use crate::state::AppState;

/// Looks a person up and checks they can act in `role` on an order.
pub fn resolve_party(state: &AppState, id: Uuid, role: PersonRole) -> Result<Person, AppError> {
    let person = state
        .persons
        .find_person(id)?
        .ok_or_else(|| AppError::NotFound(format!("{} {id} not found", role.as_str().to_lowercase())))?;
    person.acting_as(role)?;
    Ok(person)
}
