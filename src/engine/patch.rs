//! Field tables for partial updates. Each recognised key maps to a function
//! that parses and applies that one field; keys missing from a table are
//! ignored. Whole-object rules run afterwards, in the callers.

use std::str::FromStr;

use chrono::NaiveDate;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::engine::resolve_party;
use crate::error::AppError;
use crate::models::order::{Order, OrderItem};
use crate::models::person::Person;
use crate::models::status::{OrderStatus, PersonRole, ServiceType};
use crate::state::AppState;

pub type Fields = Map<String, Value>;

type OrderField = fn(&AppState, &mut Order, &Value) -> Result<(), AppError>;
type ItemField = fn(&mut OrderItem, &Value) -> Result<(), AppError>;
type PersonField = fn(&mut Person, &Value) -> Result<(), AppError>;

const ORDER_FIELDS: &[(&str, OrderField)] = &[
    ("status", order_status),
    ("consultantId", order_consultant),
    ("modifiedById", order_modified_by),
    ("items", order_items),
];

const ITEM_FIELDS: &[(&str, ItemField)] = &[
    ("serviceType", item_service_type),
    ("status", item_status),
    ("startDate", item_start_date),
    ("endDate", item_end_date),
    ("fromAddress", item_from_address),
    ("toAddress", item_to_address),
    ("note", item_note),
];

const PERSON_FIELDS: &[(&str, PersonField)] = &[
    ("firstName", person_first_name),
    ("lastName", person_last_name),
    ("email", person_email),
    ("phoneNumber", person_phone_number),
    ("address", person_address),
    ("archived", person_archived),
    ("role", person_role),
];

pub fn apply_order_fields(state: &AppState, order: &mut Order, fields: &Fields) -> Result<(), AppError> {
    for (key, apply) in ORDER_FIELDS {
        if let Some(value) = fields.get(*key) {
            apply(state, order, value)?;
        }
    }
    Ok(())
}

pub fn apply_item_fields(item: &mut OrderItem, fields: &Fields) -> Result<(), AppError> {
    for (key, apply) in ITEM_FIELDS {
        if let Some(value) = fields.get(*key) {
            apply(item, value)?;
        }
    }
    Ok(())
}

pub fn apply_person_fields(person: &mut Person, fields: &Fields) -> Result<(), AppError> {
    for (key, apply) in PERSON_FIELDS {
        if let Some(value) = fields.get(*key) {
            apply(person, value)?;
        }
    }
    Ok(())
}

pub fn parse_date(field: &str, raw: &str) -> Result<NaiveDate, AppError> {
    raw.trim().parse::<NaiveDate>().map_err(|err| {
        AppError::InvalidArgument(format!(
            "{field}: cannot parse {raw:?} as a date (expected YYYY-MM-DD): {err}"
        ))
    })
}

pub fn parse_symbol<T>(field: &str, raw: &str) -> Result<T, AppError>
where
    T: FromStr<Err = AppError>,
{
    raw.parse::<T>().map_err(|err| match err {
        AppError::InvalidArgument(msg) => AppError::InvalidArgument(format!("{field}: {msg}")),
        other => other,
    })
}

pub fn require_text(field: &str, raw: &str) -> Result<String, AppError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(AppError::InvalidArgument(format!("{field} cannot be empty")));
    }
    Ok(trimmed.to_string())
}

fn as_str<'v>(field: &str, value: &'v Value) -> Result<&'v str, AppError> {
    value
        .as_str()
        .ok_or_else(|| AppError::InvalidArgument(format!("{field} must be a string, got {value}")))
}

fn as_optional_id(field: &str, value: &Value) -> Result<Option<Uuid>, AppError> {
    if value.is_null() {
        return Ok(None);
    }
    let raw = as_str(field, value)?;
    Uuid::parse_str(raw.trim())
        .map(Some)
        .map_err(|err| AppError::InvalidArgument(format!("{field}: {raw:?} is not a valid id: {err}")))
}

fn order_status(_: &AppState, order: &mut Order, value: &Value) -> Result<(), AppError> {
    order.status = parse_symbol::<OrderStatus>("status", as_str("status", value)?)?;
    Ok(())
}

fn order_consultant(state: &AppState, order: &mut Order, value: &Value) -> Result<(), AppError> {
    order.consultant_id = match as_optional_id("consultantId", value)? {
        Some(id) => Some(resolve_party(state, id, PersonRole::Consultant)?.id),
        None => None,
    };
    Ok(())
}

fn order_modified_by(state: &AppState, order: &mut Order, value: &Value) -> Result<(), AppError> {
    order.modified_by_id = match as_optional_id("modifiedById", value)? {
        Some(id) => Some(resolve_party(state, id, PersonRole::Consultant)?.id),
        None => None,
    };
    Ok(())
}

fn order_items(_: &AppState, order: &mut Order, value: &Value) -> Result<(), AppError> {
    let entries = value
        .as_array()
        .ok_or_else(|| AppError::InvalidArgument("items must be an array".to_string()))?;

    for entry in entries {
        let fields = entry.as_object().ok_or_else(|| {
            AppError::InvalidArgument("each items entry must be an object".to_string())
        })?;
        let item_id = fields
            .get("id")
            .map(|id| as_optional_id("items[].id", id))
            .transpose()?
            .flatten()
            .ok_or_else(|| AppError::InvalidArgument("items[].id is required".to_string()))?;

        let order_id = order.id;
        let item = order.item_mut(item_id).ok_or_else(|| {
            AppError::InvalidArgument(format!("item {item_id} does not belong to order {order_id}"))
        })?;
        apply_item_fields(item, fields)?;
    }
    Ok(())
}

fn item_service_type(item: &mut OrderItem, value: &Value) -> Result<(), AppError> {
    item.service_type = parse_symbol::<ServiceType>("serviceType", as_str("serviceType", value)?)?;
    Ok(())
}

fn item_status(item: &mut OrderItem, value: &Value) -> Result<(), AppError> {
    item.status = parse_symbol::<OrderStatus>("status", as_str("status", value)?)?;
    Ok(())
}

fn item_start_date(item: &mut OrderItem, value: &Value) -> Result<(), AppError> {
    item.start_date = parse_date("startDate", as_str("startDate", value)?)?;
    Ok(())
}

fn item_end_date(item: &mut OrderItem, value: &Value) -> Result<(), AppError> {
    item.end_date = parse_date("endDate", as_str("endDate", value)?)?;
    Ok(())
}

fn item_from_address(item: &mut OrderItem, value: &Value) -> Result<(), AppError> {
    item.from_address = require_text("fromAddress", as_str("fromAddress", value)?)?;
    Ok(())
}

fn item_to_address(item: &mut OrderItem, value: &Value) -> Result<(), AppError> {
    item.to_address = require_text("toAddress", as_str("toAddress", value)?)?;
    Ok(())
}

fn item_note(item: &mut OrderItem, value: &Value) -> Result<(), AppError> {
    item.note = if value.is_null() {
        None
    } else {
        Some(as_str("note", value)?.to_string()).filter(|note| !note.trim().is_empty())
    };
    Ok(())
}

fn person_first_name(person: &mut Person, value: &Value) -> Result<(), AppError> {
    person.first_name = as_str("firstName", value)?.to_string();
    Ok(())
}

fn person_last_name(person: &mut Person, value: &Value) -> Result<(), AppError> {
    person.last_name = as_str("lastName", value)?.to_string();
    Ok(())
}

fn person_email(person: &mut Person, value: &Value) -> Result<(), AppError> {
    person.email = as_str("email", value)?.trim().to_string();
    Ok(())
}

fn person_phone_number(person: &mut Person, value: &Value) -> Result<(), AppError> {
    person.phone_number = as_str("phoneNumber", value)?.to_string();
    Ok(())
}

fn person_address(person: &mut Person, value: &Value) -> Result<(), AppError> {
    person.address = as_str("address", value)?.to_string();
    Ok(())
}

fn person_archived(person: &mut Person, value: &Value) -> Result<(), AppError> {
    person.archived = value
        .as_bool()
        .ok_or_else(|| AppError::InvalidArgument(format!("archived must be a boolean, got {value}")))?;
    Ok(())
}

fn person_role(person: &mut Person, value: &Value) -> Result<(), AppError> {
    person.role = parse_symbol::<PersonRole>("role", as_str("role", value)?)?;
    Ok(())
}
