use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::status::PersonRole;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: String,
    pub address: String,
    pub role: PersonRole,
    pub archived: bool,
}

impl Person {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Gate for using a person as the customer or consultant of an order.
    pub fn acting_as(&self, role: PersonRole) -> Result<&Self, AppError> {
        if self.role == role {
            Ok(self)
        } else {
            Err(AppError::InvalidRole(format!(
                "person {} is a {}, expected {}",
                self.id, self.role, role
            )))
        }
    }

    pub fn validate(&self) -> Result<(), AppError> {
        let required = [
            ("firstName", &self.first_name),
            ("lastName", &self.last_name),
            ("phoneNumber", &self.phone_number),
            ("address", &self.address),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(AppError::InvalidArgument(format!("{field} cannot be empty")));
            }
        }

        let email = self.email.trim();
        match email.split_once('@') {
            Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
            _ => Err(AppError::InvalidArgument(format!(
                "email {:?} is not a valid address",
                self.email
            ))),
        }
    }
}
