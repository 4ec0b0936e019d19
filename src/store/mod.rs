//! Storage seams the engine talks to. Every method is fallible so a store
//! backed by a remote database can surface `AppError::Unavailable`.

pub mod memory;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::order::Order;
use crate::models::person::Person;
use crate::models::status::{OrderStatus, PersonRole, ServiceType};

pub use memory::MemoryStore;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonFilter {
    pub role: Option<PersonRole>,
    pub archived: Option<bool>,
    /// Matched case-insensitively.
    pub email: Option<String>,
}

impl PersonFilter {
    pub fn matches(&self, person: &Person) -> bool {
        self.role.is_none_or(|role| person.role == role)
            && self.archived.is_none_or(|archived| person.archived == archived)
            && self
                .email
                .as_deref()
                .is_none_or(|email| email.trim().eq_ignore_ascii_case(person.email.trim()))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderFilter {
    pub customer_id: Option<Uuid>,
    pub consultant_id: Option<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopPerformer {
    pub name: String,
    pub count: u64,
}

/// What a person deletion took with it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CascadeReport {
    pub orders_removed: usize,
    pub orders_detached: usize,
}

pub trait PersonStore: Send + Sync {
    /// Fails with `Conflict` when the email is already taken.
    fn insert_person(&self, person: Person) -> Result<Person, AppError>;

    fn find_person(&self, id: Uuid) -> Result<Option<Person>, AppError>;

    fn find_person_by_email(&self, email: &str) -> Result<Option<Person>, AppError>;

    fn list_persons(&self, filter: &PersonFilter) -> Result<Vec<Person>, AppError>;

    /// Fails with `InvalidRole` when the role changes while orders still
    /// reference the person in the role being given up.
    fn update_person(&self, person: Person) -> Result<Person, AppError>;

    /// Removes the person and every order they own as customer. Orders where
    /// they only consulted or last modified lose that reference and get
    /// `now` as their `last_updated`.
    fn delete_person(&self, id: Uuid, now: DateTime<Utc>) -> Result<CascadeReport, AppError>;
}

/// Writes re-check, atomically with the write, that every person the order
/// references still exists in the right role. A person deleted or re-roled
/// after the engine resolved it fails the write with `NotFound` or
/// `InvalidRole` instead of leaving a dangling reference.
pub trait OrderStore: Send + Sync {
    fn insert_order(&self, order: Order) -> Result<Order, AppError>;

    fn find_order(&self, id: Uuid) -> Result<Option<Order>, AppError>;

    /// Newest first.
    fn find_orders(&self, filter: &OrderFilter) -> Result<Vec<Order>, AppError>;

    /// Replaces the stored order if its version still equals `expected_version`,
    /// otherwise fails with `Conflict`. Returns the order with its bumped version.
    fn update_order(&self, order: Order, expected_version: u64) -> Result<Order, AppError>;

    fn delete_order(&self, id: Uuid) -> Result<bool, AppError>;

    fn count_orders(&self) -> Result<u64, AppError>;

    fn count_orders_by_status(&self, status: OrderStatus) -> Result<u64, AppError>;

    fn count_items_by_status(&self, status: OrderStatus) -> Result<u64, AppError>;

    fn count_items_by_status_and_service_type(
        &self,
        status: OrderStatus,
        service_type: ServiceType,
    ) -> Result<u64, AppError>;

    fn group_orders_by_status(&self) -> Result<Vec<(OrderStatus, u64)>, AppError>;

    fn group_items_by_service_type(&self) -> Result<Vec<(ServiceType, u64)>, AppError>;

    /// Persons joined through the customer or consultant column, ranked by
    /// order count descending.
    fn top_persons_by_order_count(
        &self,
        role: PersonRole,
        limit: usize,
    ) -> Result<Vec<TopPerformer>, AppError>;

    /// `(YYYY-MM, count)` for orders created at or after `since`, oldest month first.
    fn count_orders_by_month_since(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<(String, u64)>, AppError>;
}
