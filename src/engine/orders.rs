//! Order lifecycle: create, replace, patch and delete orders while keeping
//! status changes on the allowed edges and schedules consistent.

use std::collections::HashSet;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};
use uuid::Uuid;

use crate::engine::patch::{self, Fields};
use crate::engine::resolve_party;
use crate::engine::transition::check_transition;
use crate::error::AppError;
use crate::models::order::{Order, OrderItem, NOT_APPLICABLE_ADDRESS};
use crate::models::status::{OrderStatus, PersonRole, ServiceType};
use crate::state::AppState;
use crate::store::OrderFilter;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequest {
    pub customer_id: Uuid,
    pub consultant_id: Uuid,
    #[serde(default)]
    pub modified_by_id: Option<Uuid>,
    /// Defaults to `PENDING` on create and to the stored status on replace.
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub items: Vec<OrderItemRequest>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemRequest {
    /// Only meaningful on replace, where it keeps an existing item's identity.
    #[serde(default)]
    pub id: Option<Uuid>,
    pub service_type: String,
    #[serde(default)]
    pub status: Option<String>,
    pub start_date: String,
    pub end_date: String,
    pub from_address: String,
    #[serde(default)]
    pub to_address: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
}

pub fn get_order(state: &AppState, id: Uuid) -> Result<Order, AppError> {
    state
        .orders
        .find_order(id)?
        .ok_or_else(|| AppError::NotFound(format!("order {id} not found")))
}

pub fn list_orders(state: &AppState, filter: &OrderFilter) -> Result<Vec<Order>, AppError> {
    state.orders.find_orders(filter)
}

pub fn create_order(state: &AppState, request: OrderRequest) -> Result<Order, AppError> {
    let started = Instant::now();
    let result = create(state, request);
    state.metrics.observe_mutation("create", started, &result);
    result
}

pub fn replace_order(state: &AppState, id: Uuid, request: OrderRequest) -> Result<Order, AppError> {
    let started = Instant::now();
    let result = replace(state, id, request);
    state.metrics.observe_mutation("replace", started, &result);
    result
}

pub fn patch_order(state: &AppState, id: Uuid, fields: &Fields) -> Result<Order, AppError> {
    let started = Instant::now();
    let result = patch(state, id, fields);
    state.metrics.observe_mutation("patch", started, &result);
    result
}

/// Patch a single item; same rules as [`patch_order`] with an `items` entry.
pub fn patch_order_item(
    state: &AppState,
    order_id: Uuid,
    item_id: Uuid,
    fields: &Fields,
) -> Result<Order, AppError> {
    let mut entry = fields.clone();
    entry.insert("id".to_string(), Value::String(item_id.to_string()));

    let mut wrapped = Fields::new();
    wrapped.insert("items".to_string(), json!([entry]));
    patch_order(state, order_id, &wrapped)
}

pub fn delete_order(state: &AppState, id: Uuid) -> Result<(), AppError> {
    let started = Instant::now();
    let result = match state.orders.delete_order(id) {
        Ok(true) => Ok(()),
        Ok(false) => Err(AppError::NotFound(format!("order {id} not found"))),
        Err(err) => Err(err),
    };
    state.metrics.observe_mutation("delete", started, &result);

    if result.is_ok() {
        info!(order_id = %id, "order deleted");
    }
    result
}

fn create(state: &AppState, request: OrderRequest) -> Result<Order, AppError> {
    let customer = resolve_party(state, request.customer_id, PersonRole::Customer)?;
    let consultant = resolve_party(state, request.consultant_id, PersonRole::Consultant)?;
    let modified_by = request
        .modified_by_id
        .map(|id| resolve_party(state, id, PersonRole::Consultant))
        .transpose()?;

    if request.items.is_empty() {
        return Err(AppError::InvalidArgument(
            "order must contain at least one service item".to_string(),
        ));
    }

    let status = match request.status.as_deref() {
        Some(raw) => patch::parse_symbol::<OrderStatus>("status", raw)?,
        None => OrderStatus::Pending,
    };

    let order_id = Uuid::new_v4();
    let items = request
        .items
        .iter()
        .map(|item| build_item(order_id, Uuid::new_v4(), item))
        .collect::<Result<Vec<_>, _>>()?;

    let now = state.clock.now();
    let order = Order {
        id: order_id,
        status,
        creation_date: now,
        last_updated: now,
        version: 0,
        customer_id: customer.id,
        consultant_id: Some(consultant.id),
        modified_by_id: modified_by.map(|person| person.id),
        items,
    };
    order.check_invariants()?;

    let order = state.orders.insert_order(order)?;
    info!(
        order_id = %order.id,
        customer_id = %order.customer_id,
        items = order.items.len(),
        status = %order.status,
        "order created"
    );
    Ok(order)
}

fn replace(state: &AppState, id: Uuid, request: OrderRequest) -> Result<Order, AppError> {
    let current = get_order(state, id)?;

    let customer = resolve_party(state, request.customer_id, PersonRole::Customer)?;
    let consultant = resolve_party(state, request.consultant_id, PersonRole::Consultant)?;
    let modified_by = request
        .modified_by_id
        .map(|id| resolve_party(state, id, PersonRole::Consultant))
        .transpose()?;

    let status = match request.status.as_deref() {
        Some(raw) => patch::parse_symbol::<OrderStatus>("status", raw)?,
        None => current.status,
    };
    if let Err(err) = check_transition("order", current.status, status) {
        warn!(order_id = %id, error = %err, "replace rejected");
        return Err(err);
    }

    if request.items.is_empty() {
        return Err(AppError::InvalidArgument(
            "an updated order must contain at least one service item".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    let mut items = Vec::with_capacity(request.items.len());
    for item_request in &request.items {
        let item = match item_request.id {
            Some(item_id) => {
                if !seen.insert(item_id) {
                    return Err(AppError::InvalidArgument(format!(
                        "item {item_id} appears more than once"
                    )));
                }
                let persisted = current.item(item_id).ok_or_else(|| {
                    AppError::InvalidArgument(format!(
                        "item {item_id} does not belong to order {id}"
                    ))
                })?;
                let item = build_item(id, item_id, item_request)?;
                check_transition(&format!("item {item_id}"), persisted.status, item.status)?;
                item
            }
            None => build_item(id, Uuid::new_v4(), item_request)?,
        };
        items.push(item);
    }

    let mut next = current.clone();
    next.customer_id = customer.id;
    next.consultant_id = Some(consultant.id);
    next.modified_by_id = modified_by.map(|person| person.id);
    next.status = status;
    next.items = items;
    next.last_updated = state.clock.now();
    next.check_invariants()?;

    let saved = state.orders.update_order(next, current.version)?;
    info!(
        order_id = %saved.id,
        status = %saved.status,
        items = saved.items.len(),
        "order replaced"
    );
    Ok(saved)
}

fn patch(state: &AppState, id: Uuid, fields: &Fields) -> Result<Order, AppError> {
    let current = get_order(state, id)?;

    let mut draft = current.clone();
    let validated = patch::apply_order_fields(state, &mut draft, fields)
        .and_then(|()| check_lifecycle(&current, &draft))
        .and_then(|()| draft.check_schedule(state.clock.today()));
    if let Err(err) = validated {
        warn!(order_id = %id, error = %err, "patch rejected");
        return Err(err);
    }

    draft.last_updated = state.clock.now();
    let saved = state.orders.update_order(draft, current.version)?;
    info!(
        order_id = %saved.id,
        status = %saved.status,
        fields = fields.len(),
        "order patched"
    );
    Ok(saved)
}

/// Every status in `draft` must be reachable from the persisted one.
fn check_lifecycle(persisted: &Order, draft: &Order) -> Result<(), AppError> {
    check_transition("order", persisted.status, draft.status)?;
    for item in &draft.items {
        if let Some(before) = persisted.item(item.id) {
            check_transition(&format!("item {}", item.id), before.status, item.status)?;
        }
    }
    Ok(())
}

fn build_item(order_id: Uuid, item_id: Uuid, request: &OrderItemRequest) -> Result<OrderItem, AppError> {
    let status = match request.status.as_deref() {
        Some(raw) => patch::parse_symbol::<OrderStatus>("status", raw)?,
        None => OrderStatus::Pending,
    };
    let to_address = match request.to_address.as_deref() {
        Some(raw) => patch::require_text("toAddress", raw)?,
        None => NOT_APPLICABLE_ADDRESS.to_string(),
    };

    let item = OrderItem {
        id: item_id,
        order_id,
        service_type: patch::parse_symbol::<ServiceType>("serviceType", &request.service_type)?,
        status,
        start_date: patch::parse_date("startDate", &request.start_date)?,
        end_date: patch::parse_date("endDate", &request.end_date)?,
        from_address: patch::require_text("fromAddress", &request.from_address)?,
        to_address,
        note: request
            .note
            .clone()
            .filter(|note| !note.trim().is_empty()),
    };
    item.check_date_order()?;
    Ok(item)
}
