use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::status::{OrderStatus, ServiceType};

/// Destination placeholder for services that do not relocate anything.
pub const NOT_APPLICABLE_ADDRESS: &str = "N/A";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: Uuid,
    /// Join column back to the owning order. Never traversed.
    pub order_id: Uuid,
    pub service_type: ServiceType,
    pub status: OrderStatus,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub from_address: String,
    pub to_address: String,
    pub note: Option<String>,
}

impl OrderItem {
    pub fn check_date_order(&self) -> Result<(), AppError> {
        if self.end_date < self.start_date {
            return Err(AppError::InvalidArgument(format!(
                "item {}: endDate {} is before startDate {}",
                self.id, self.end_date, self.start_date
            )));
        }
        Ok(())
    }

    pub fn check_not_before(&self, today: NaiveDate) -> Result<(), AppError> {
        for (field, date) in [("startDate", self.start_date), ("endDate", self.end_date)] {
            if date < today {
                return Err(AppError::InvalidArgument(format!(
                    "item {}: {field} {date} is in the past",
                    self.id
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Uuid,
    pub status: OrderStatus,
    pub creation_date: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
    /// Bumped by the store on every successful write.
    pub version: u64,
    pub customer_id: Uuid,
    pub consultant_id: Option<Uuid>,
    pub modified_by_id: Option<Uuid>,
    pub items: Vec<OrderItem>,
}

impl Order {
    pub fn item_mut(&mut self, item_id: Uuid) -> Option<&mut OrderItem> {
        self.items.iter_mut().find(|item| item.id == item_id)
    }

    pub fn item(&self, item_id: Uuid) -> Option<&OrderItem> {
        self.items.iter().find(|item| item.id == item_id)
    }

    /// Invariants every stored order satisfies: at least one item, and no item
    /// ending before it starts.
    pub fn check_invariants(&self) -> Result<(), AppError> {
        if self.items.is_empty() {
            return Err(AppError::InvalidArgument(
                "order must contain at least one service item".to_string(),
            ));
        }
        self.items.iter().try_for_each(OrderItem::check_date_order)
    }

    /// Scheduling rule applied after a patch: nothing may be scheduled before `today`.
    pub fn check_schedule(&self, today: NaiveDate) -> Result<(), AppError> {
        self.check_invariants()?;
        self.items
            .iter()
            .try_for_each(|item| item.check_not_before(today))
    }
}
