use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 4] = [
        OrderStatus::Pending,
        OrderStatus::InProgress,
        OrderStatus::Completed,
        OrderStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::InProgress => "IN_PROGRESS",
            OrderStatus::Completed => "COMPLETED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServiceType {
    Moving,
    Packing,
    Cleaning,
}

impl ServiceType {
    pub const ALL: [ServiceType; 3] = [ServiceType::Moving, ServiceType::Packing, ServiceType::Cleaning];

    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceType::Moving => "MOVING",
            ServiceType::Packing => "PACKING",
            ServiceType::Cleaning => "CLEANING",
        }
    }

    /// Flat per-job estimate used for dashboard revenue.
    pub fn unit_price(&self) -> f64 {
        match self {
            ServiceType::Moving => 1500.0,
            ServiceType::Packing => 500.0,
            ServiceType::Cleaning => 300.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PersonRole {
    Customer,
    Consultant,
}

impl PersonRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            PersonRole::Customer => "CUSTOMER",
            PersonRole::Consultant => "CONSULTANT",
        }
    }
}

macro_rules! symbolic_enum {
    ($ty:ty, $label:literal) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = AppError;

            fn from_str(raw: &str) -> Result<Self, Self::Err> {
                let normalized = raw.trim().to_ascii_uppercase();
                serde_json::from_value(serde_json::Value::String(normalized)).map_err(|_| {
                    AppError::InvalidArgument(format!("unknown {}: {raw:?}", $label))
                })
            }
        }
    };
}

symbolic_enum!(OrderStatus, "order status");
symbolic_enum!(ServiceType, "service type");
symbolic_enum!(PersonRole, "person role");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("in_progress".parse::<OrderStatus>(), Ok(OrderStatus::InProgress));
        assert_eq!(" Moving ".parse::<ServiceType>(), Ok(ServiceType::Moving));
        assert_eq!("consultant".parse::<PersonRole>(), Ok(PersonRole::Consultant));
    }

    #[test]
    fn rejects_unknown_names() {
        let err = "SHIPPED".parse::<OrderStatus>().unwrap_err();
        assert!(matches!(err, AppError::InvalidArgument(msg) if msg.contains("SHIPPED")));
    }

    #[test]
    fn serializes_as_symbolic_names() {
        assert_eq!(serde_json::to_string(&OrderStatus::InProgress).unwrap(), "\"IN_PROGRESS\"");
        assert_eq!(serde_json::to_string(&ServiceType::Cleaning).unwrap(), "\"CLEANING\"");
        for status in OrderStatus::ALL {
            assert_eq!(serde_json::to_value(status).unwrap(), status.as_str());
        }
    }
}
