use std::collections::BTreeMap;

use chrono::Months;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::status::{OrderStatus, PersonRole, ServiceType};
use crate::state::AppState;
use crate::store::{OrderStore, TopPerformer};

/// Dashboard snapshot. Each figure comes from its own query, so under
/// concurrent writes they may describe slightly different instants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatisticsSummary {
    pub total_orders: u64,
    pub orders_in_progress: u64,
    pub pending_services: u64,
    pub estimated_total_revenue: f64,
    pub orders_by_status: BTreeMap<String, u64>,
    pub services_by_type: BTreeMap<String, u64>,
    pub monthly_orders: BTreeMap<String, u64>,
    pub top_consultants: Vec<TopPerformer>,
    pub top_customers: Vec<TopPerformer>,
}

pub fn summarize(state: &AppState) -> Result<StatisticsSummary, AppError> {
    let _timer = state.metrics.statistics_latency_seconds.start_timer();
    let store = state.orders.as_ref();

    let mut orders_by_status: BTreeMap<String, u64> = OrderStatus::ALL
        .iter()
        .map(|status| (status.to_string(), 0))
        .collect();
    for (status, count) in store.group_orders_by_status()? {
        orders_by_status.insert(status.to_string(), count);
    }

    let mut services_by_type: BTreeMap<String, u64> = ServiceType::ALL
        .iter()
        .map(|service_type| (service_type.to_string(), 0))
        .collect();
    for (service_type, count) in store.group_items_by_service_type()? {
        services_by_type.insert(service_type.to_string(), count);
    }

    let now = state.clock.now();
    let since = now
        .checked_sub_months(Months::new(state.summary.trailing_months))
        .ok_or_else(|| AppError::Internal(format!("cannot look back from {now}")))?;
    let monthly_orders = store.count_orders_by_month_since(since)?.into_iter().collect();

    let limit = state.summary.top_performers;

    Ok(StatisticsSummary {
        total_orders: store.count_orders()?,
        orders_in_progress: store.count_orders_by_status(OrderStatus::InProgress)?,
        pending_services: store.count_items_by_status(OrderStatus::Pending)?,
        estimated_total_revenue: estimate_revenue(store)?,
        orders_by_status,
        services_by_type,
        monthly_orders,
        top_consultants: store.top_persons_by_order_count(PersonRole::Consultant, limit)?,
        top_customers: store.top_persons_by_order_count(PersonRole::Customer, limit)?,
    })
}

/// Completed items priced at their flat per-service rate.
fn estimate_revenue(store: &dyn OrderStore) -> Result<f64, AppError> {
    let mut total = 0.0;
    for service_type in ServiceType::ALL {
        let completed =
            store.count_items_by_status_and_service_type(OrderStatus::Completed, service_type)?;
        total += completed as f64 * service_type.unit_price();
    }
    Ok(total)
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};
    use serde_json::{json, Value};

    use super::*;
    use crate::engine::fixtures::{item_request, order_request, Fixture};
    use crate::engine::orders::{create_order, patch_order, patch_order_item};
    use crate::engine::patch::Fields;
    use crate::models::order::Order;

    fn fields(value: Value) -> Fields {
        value.as_object().cloned().unwrap()
    }

    fn complete_item(fx: &Fixture, order: &Order, index: usize) {
        let item_id = order.items[index].id;
        for status in ["IN_PROGRESS", "COMPLETED"] {
            patch_order_item(&fx.state, order.id, item_id, &fields(json!({ "status": status })))
                .unwrap();
        }
    }

    fn backdated(fx: &Fixture, created: chrono::DateTime<Utc>) -> Order {
        let mut order = fx.create(vec![item_request("CLEANING", "2026-11-01", "2026-11-01")]);
        order.creation_date = created;
        fx.state.orders.update_order(order, 0).unwrap()
    }

    #[test]
    fn empty_store_reports_zeroes_for_every_bucket() {
        let fx = Fixture::new();
        let summary = summarize(&fx.state).unwrap();

        assert_eq!(summary.total_orders, 0);
        assert_eq!(summary.estimated_total_revenue, 0.0);
        assert_eq!(summary.orders_by_status.len(), 4);
        assert!(summary.orders_by_status.values().all(|count| *count == 0));
        assert_eq!(summary.services_by_type.len(), 3);
        assert!(summary.monthly_orders.is_empty());
        assert!(summary.top_customers.is_empty());
    }

    #[test]
    fn revenue_prices_completed_items_only() {
        let fx = Fixture::new();
        let order = fx.create(vec![
            item_request("MOVING", "2026-11-01", "2026-11-01"),
            item_request("MOVING", "2026-11-02", "2026-11-02"),
            item_request("PACKING", "2026-11-01", "2026-11-01"),
            item_request("CLEANING", "2026-11-03", "2026-11-03"),
            item_request("CLEANING", "2026-11-04", "2026-11-04"),
        ]);
        for index in [0, 1, 2, 3] {
            complete_item(&fx, &order, index);
        }

        let summary = summarize(&fx.state).unwrap();
        assert_eq!(summary.estimated_total_revenue, 1500.0 * 2.0 + 500.0 + 300.0);
        assert_eq!(summary.pending_services, 1);
    }

    #[test]
    fn mixed_order_counts_services_per_item() {
        let fx = Fixture::new();
        let order = fx.create(vec![
            item_request("PACKING", "2026-11-01", "2026-11-01"),
            item_request("MOVING", "2026-11-02", "2026-11-02"),
        ]);
        complete_item(&fx, &order, 1);

        let summary = summarize(&fx.state).unwrap();
        assert_eq!(summary.pending_services, 1);
        assert_eq!(summary.services_by_type["PACKING"], 1);
        assert_eq!(summary.services_by_type["MOVING"], 1);
        assert_eq!(summary.services_by_type["CLEANING"], 0);
        assert_eq!(summary.orders_by_status["PENDING"], 1);

        let err = patch_order(&fx.state, order.id, &fields(json!({ "status": "COMPLETED" })))
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidTransition { .. }));
    }

    #[test]
    fn monthly_window_includes_the_exact_boundary() {
        let fx = Fixture::new();
        let boundary = Utc.with_ymd_and_hms(2025, 10, 18, 12, 0, 0).unwrap();

        backdated(&fx, boundary);
        backdated(&fx, boundary - Duration::seconds(1));
        backdated(&fx, Utc.with_ymd_and_hms(2026, 3, 9, 8, 30, 0).unwrap());
        fx.create(vec![item_request("MOVING", "2026-11-01", "2026-11-01")]);

        let summary = summarize(&fx.state).unwrap();
        let months: Vec<(&str, u64)> = summary
            .monthly_orders
            .iter()
            .map(|(month, count)| (month.as_str(), *count))
            .collect();
        assert_eq!(months, vec![("2025-10", 1), ("2026-03", 1), ("2026-10", 1)]);
        assert_eq!(summary.total_orders, 4);
    }

    #[test]
    fn top_performers_rank_by_order_count() {
        let fx = Fixture::new();
        let busy = fx.add_person("Busy", PersonRole::Customer);
        let items = || vec![item_request("MOVING", "2026-11-01", "2026-11-01")];

        fx.create(items());
        for _ in 0..3 {
            let mut request = order_request(&fx, items());
            request.customer_id = busy.id;
            create_order(&fx.state, request).unwrap();
        }

        let summary = summarize(&fx.state).unwrap();
        assert_eq!(
            summary.top_customers,
            vec![
                TopPerformer {
                    name: "Busy Fixture".to_string(),
                    count: 3
                },
                TopPerformer {
                    name: "Carl Fixture".to_string(),
                    count: 1
                },
            ]
        );
        assert_eq!(
            summary.top_consultants,
            vec![TopPerformer {
                name: "Nina Fixture".to_string(),
                count: 4
            }]
        );
    }

    #[test]
    fn top_performers_are_capped() {
        let fx = Fixture::new();
        for index in 0..7 {
            let customer = fx.add_person(&format!("Cust{index}"), PersonRole::Customer);
            let mut request = order_request(
                &fx,
                vec![item_request("PACKING", "2026-11-01", "2026-11-01")],
            );
            request.customer_id = customer.id;
            create_order(&fx.state, request).unwrap();
        }

        let summary = summarize(&fx.state).unwrap();
        assert_eq!(summary.top_customers.len(), 5);
        assert!(summary.top_customers.iter().all(|entry| entry.count == 1));
    }
}
