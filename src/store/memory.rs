use std::collections::{BTreeMap, HashMap};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::order::Order;
use crate::models::person::Person;
use crate::models::status::{OrderStatus, PersonRole, ServiceType};
use crate::store::{
    CascadeReport, OrderFilter, OrderStore, PersonFilter, PersonStore, TopPerformer,
};

/// DashMap-backed store. Each order row holds its items, so an order write
/// swaps the whole item collection at once.
#[derive(Default)]
pub struct MemoryStore {
    persons: DashMap<Uuid, Person>,
    emails: DashMap<String, Uuid>,
    orders: DashMap<Uuid, Order>,
    /// Shared by order writes, exclusive for person updates and deletes. An
    /// order's reference check and its write see the same set of persons.
    people_gate: RwLock<()>,
}

fn email_key(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

fn references_as(order: &Order, person_id: Uuid, role: PersonRole) -> bool {
    match role {
        PersonRole::Customer => order.customer_id == person_id,
        PersonRole::Consultant => {
            order.consultant_id == Some(person_id) || order.modified_by_id == Some(person_id)
        }
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn shared_gate(&self) -> RwLockReadGuard<'_, ()> {
        self.people_gate.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn exclusive_gate(&self) -> RwLockWriteGuard<'_, ()> {
        self.people_gate.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn reserve_email(&self, email: &str, owner: Uuid) -> Result<(), AppError> {
        match self.emails.entry(email_key(email)) {
            Entry::Occupied(entry) if *entry.get() != owner => Err(AppError::Conflict(format!(
                "email {email} is already registered"
            ))),
            Entry::Occupied(_) => Ok(()),
            Entry::Vacant(entry) => {
                entry.insert(owner);
                Ok(())
            }
        }
    }

    fn check_party(&self, id: Uuid, role: PersonRole) -> Result<(), AppError> {
        let person = self.persons.get(&id).ok_or_else(|| {
            AppError::NotFound(format!("{} {id} not found", role.as_str().to_lowercase()))
        })?;
        person.acting_as(role)?;
        Ok(())
    }

    /// Caller holds the shared gate.
    fn check_references(&self, order: &Order) -> Result<(), AppError> {
        self.check_party(order.customer_id, PersonRole::Customer)?;
        for id in [order.consultant_id, order.modified_by_id].into_iter().flatten() {
            self.check_party(id, PersonRole::Consultant)?;
        }
        Ok(())
    }

    fn items(&self) -> impl Iterator<Item = (OrderStatus, ServiceType)> + '_ {
        self.orders.iter().flat_map(|entry| {
            entry
                .value()
                .items
                .iter()
                .map(|item| (item.status, item.service_type))
                .collect::<Vec<_>>()
        })
    }
}

impl PersonStore for MemoryStore {
    fn insert_person(&self, person: Person) -> Result<Person, AppError> {
        self.reserve_email(&person.email, person.id)?;
        self.persons.insert(person.id, person.clone());
        Ok(person)
    }

    fn find_person(&self, id: Uuid) -> Result<Option<Person>, AppError> {
        Ok(self.persons.get(&id).map(|entry| entry.value().clone()))
    }

    fn find_person_by_email(&self, email: &str) -> Result<Option<Person>, AppError> {
        let id = match self.emails.get(&email_key(email)) {
            Some(entry) => *entry.value(),
            None => return Ok(None),
        };
        self.find_person(id)
    }

    fn list_persons(&self, filter: &PersonFilter) -> Result<Vec<Person>, AppError> {
        let mut persons: Vec<Person> = self
            .persons
            .iter()
            .filter(|entry| filter.matches(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();

        persons.sort_by(|a, b| {
            (&a.last_name, &a.first_name, a.id).cmp(&(&b.last_name, &b.first_name, b.id))
        });
        Ok(persons)
    }

    fn update_person(&self, person: Person) -> Result<Person, AppError> {
        let _gate = self.exclusive_gate();

        let (previous_email, previous_role) = self
            .persons
            .get(&person.id)
            .map(|entry| (entry.value().email.clone(), entry.value().role))
            .ok_or_else(|| AppError::NotFound(format!("person {} not found", person.id)))?;

        if previous_role != person.role
            && self
                .orders
                .iter()
                .any(|entry| references_as(entry.value(), person.id, previous_role))
        {
            return Err(AppError::InvalidRole(format!(
                "person {} is still referenced by orders as {previous_role}",
                person.id
            )));
        }

        if email_key(&previous_email) != email_key(&person.email) {
            self.reserve_email(&person.email, person.id)?;
            self.emails.remove(&email_key(&previous_email));
        }

        self.persons.insert(person.id, person.clone());
        Ok(person)
    }

    fn delete_person(&self, id: Uuid, now: DateTime<Utc>) -> Result<CascadeReport, AppError> {
        let _gate = self.exclusive_gate();

        let (_, person) = self
            .persons
            .remove(&id)
            .ok_or_else(|| AppError::NotFound(format!("person {id} not found")))?;
        self.emails.remove(&email_key(&person.email));

        let mut report = CascadeReport::default();
        self.orders.retain(|_, order| {
            let owned = order.customer_id == id;
            if owned {
                report.orders_removed += 1;
            }
            !owned
        });

        for mut entry in self.orders.iter_mut() {
            let order = entry.value_mut();
            let mut touched = false;
            if order.consultant_id == Some(id) {
                order.consultant_id = None;
                touched = true;
            }
            if order.modified_by_id == Some(id) {
                order.modified_by_id = None;
                touched = true;
            }
            if touched {
                order.version += 1;
                order.last_updated = now;
                report.orders_detached += 1;
            }
        }

        Ok(report)
    }
}

impl OrderStore for MemoryStore {
    fn insert_order(&self, order: Order) -> Result<Order, AppError> {
        let _gate = self.shared_gate();
        self.check_references(&order)?;

        match self.orders.entry(order.id) {
            Entry::Occupied(_) => Err(AppError::Conflict(format!(
                "order {} already exists",
                order.id
            ))),
            Entry::Vacant(entry) => {
                entry.insert(order.clone());
                Ok(order)
            }
        }
    }

    fn find_order(&self, id: Uuid) -> Result<Option<Order>, AppError> {
        Ok(self.orders.get(&id).map(|entry| entry.value().clone()))
    }

    fn find_orders(&self, filter: &OrderFilter) -> Result<Vec<Order>, AppError> {
        let mut orders: Vec<Order> = self
            .orders
            .iter()
            .filter(|entry| {
                let order = entry.value();
                filter.customer_id.is_none_or(|id| order.customer_id == id)
                    && filter
                        .consultant_id
                        .is_none_or(|id| order.consultant_id == Some(id))
            })
            .map(|entry| entry.value().clone())
            .collect();

        orders.sort_by(|a, b| {
            b.creation_date
                .cmp(&a.creation_date)
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(orders)
    }

    fn update_order(&self, mut order: Order, expected_version: u64) -> Result<Order, AppError> {
        let _gate = self.shared_gate();
        self.check_references(&order)?;

        let mut stored = self
            .orders
            .get_mut(&order.id)
            .ok_or_else(|| AppError::NotFound(format!("order {} not found", order.id)))?;

        if stored.version != expected_version {
            return Err(AppError::Conflict(format!(
                "order {} was modified concurrently (expected version {expected_version}, found {})",
                order.id, stored.version
            )));
        }

        order.version = expected_version + 1;
        *stored = order.clone();
        Ok(order)
    }

    fn delete_order(&self, id: Uuid) -> Result<bool, AppError> {
        Ok(self.orders.remove(&id).is_some())
    }

    fn count_orders(&self) -> Result<u64, AppError> {
        Ok(self.orders.len() as u64)
    }

    fn count_orders_by_status(&self, status: OrderStatus) -> Result<u64, AppError> {
        Ok(self
            .orders
            .iter()
            .filter(|entry| entry.value().status == status)
            .count() as u64)
    }

    fn count_items_by_status(&self, status: OrderStatus) -> Result<u64, AppError> {
        Ok(self.items().filter(|(s, _)| *s == status).count() as u64)
    }

    fn count_items_by_status_and_service_type(
        &self,
        status: OrderStatus,
        service_type: ServiceType,
    ) -> Result<u64, AppError> {
        Ok(self
            .items()
            .filter(|(s, t)| *s == status && *t == service_type)
            .count() as u64)
    }

    fn group_orders_by_status(&self) -> Result<Vec<(OrderStatus, u64)>, AppError> {
        let mut groups: BTreeMap<OrderStatus, u64> = BTreeMap::new();
        for entry in self.orders.iter() {
            *groups.entry(entry.value().status).or_default() += 1;
        }
        Ok(groups.into_iter().collect())
    }

    fn group_items_by_service_type(&self) -> Result<Vec<(ServiceType, u64)>, AppError> {
        let mut groups: BTreeMap<ServiceType, u64> = BTreeMap::new();
        for (_, service_type) in self.items() {
            *groups.entry(service_type).or_default() += 1;
        }
        Ok(groups.into_iter().collect())
    }

    fn top_persons_by_order_count(
        &self,
        role: PersonRole,
        limit: usize,
    ) -> Result<Vec<TopPerformer>, AppError> {
        let mut counts: HashMap<Uuid, u64> = HashMap::new();
        for entry in self.orders.iter() {
            let order = entry.value();
            let person_id = match role {
                PersonRole::Customer => Some(order.customer_id),
                PersonRole::Consultant => order.consultant_id,
            };
            if let Some(person_id) = person_id {
                *counts.entry(person_id).or_default() += 1;
            }
        }

        let mut ranked: Vec<(String, Uuid, u64)> = counts
            .into_iter()
            .filter_map(|(id, count)| {
                self.persons
                    .get(&id)
                    .map(|person| (person.full_name(), id, count))
            })
            .collect();

        ranked.sort_by(|a, b| b.2.cmp(&a.2).then_with(|| (&a.0, a.1).cmp(&(&b.0, b.1))));

        Ok(ranked
            .into_iter()
            .take(limit)
            .map(|(name, _, count)| TopPerformer { name, count })
            .collect())
    }

    fn count_orders_by_month_since(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<(String, u64)>, AppError> {
        let mut months: BTreeMap<String, u64> = BTreeMap::new();
        for entry in self.orders.iter() {
            let created = entry.value().creation_date;
            if created >= since {
                *months
                    .entry(created.format("%Y-%m").to_string())
                    .or_default() += 1;
            }
        }
        Ok(months.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, TimeZone};

    use super::*;
    use crate::models::order::OrderItem;

    fn person(seed: u128, first: &str, role: PersonRole) -> Person {
        Person {
            id: Uuid::from_u128(seed),
            first_name: first.to_string(),
            last_name: "Tester".to_string(),
            email: format!("{}@example.com", first.to_lowercase()),
            phone_number: "555-0100".to_string(),
            address: "Main Street 1".to_string(),
            role,
            archived: false,
        }
    }

    fn order(seed: u128, customer: Uuid, consultant: Option<Uuid>) -> Order {
        let created = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let day = NaiveDate::from_ymd_opt(2026, 4, 1).unwrap();
        Order {
            id: Uuid::from_u128(seed),
            status: OrderStatus::Pending,
            creation_date: created,
            last_updated: created,
            version: 0,
            customer_id: customer,
            consultant_id: consultant,
            modified_by_id: consultant,
            items: vec![OrderItem {
                id: Uuid::from_u128(seed + 1000),
                order_id: Uuid::from_u128(seed),
                service_type: ServiceType::Moving,
                status: OrderStatus::Pending,
                start_date: day,
                end_date: day,
                from_address: "A".to_string(),
                to_address: "B".to_string(),
                note: None,
            }],
        }
    }

    #[test]
    fn duplicate_email_is_a_conflict_regardless_of_case() {
        let store = MemoryStore::new();
        store
            .insert_person(person(1, "Ana", PersonRole::Customer))
            .unwrap();

        let mut twin = person(2, "Other", PersonRole::Customer);
        twin.email = "ANA@example.com".to_string();
        let err = store.insert_person(twin).unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[test]
    fn changing_email_releases_the_old_address() {
        let store = MemoryStore::new();
        let mut ana = store
            .insert_person(person(1, "Ana", PersonRole::Customer))
            .unwrap();
        ana.email = "ana.new@example.com".to_string();
        store.update_person(ana).unwrap();

        assert!(store.find_person_by_email("ana@example.com").unwrap().is_none());
        store
            .insert_person(person(2, "Ana", PersonRole::Customer))
            .unwrap();
    }

    fn detached_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 5, 8, 0, 0).unwrap()
    }

    #[test]
    fn stale_version_is_rejected() {
        let store = MemoryStore::new();
        let customer = store
            .insert_person(person(10, "Cust", PersonRole::Customer))
            .unwrap();
        let stored = store.insert_order(order(1, customer.id, None)).unwrap();

        let first = store.update_order(stored.clone(), stored.version).unwrap();
        assert_eq!(first.version, stored.version + 1);

        let err = store.update_order(stored.clone(), stored.version).unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[test]
    fn deleting_a_person_cascades_and_detaches() {
        let store = MemoryStore::new();
        let customer = store
            .insert_person(person(1, "Cust", PersonRole::Customer))
            .unwrap();
        let other = store
            .insert_person(person(2, "Other", PersonRole::Customer))
            .unwrap();
        let consultant = store
            .insert_person(person(3, "Cons", PersonRole::Consultant))
            .unwrap();

        store.insert_order(order(10, customer.id, Some(consultant.id))).unwrap();
        store.insert_order(order(11, customer.id, None)).unwrap();
        store.insert_order(order(12, other.id, Some(consultant.id))).unwrap();

        let report = store.delete_person(customer.id, detached_at()).unwrap();
        assert_eq!(report.orders_removed, 2);
        assert_eq!(store.count_orders().unwrap(), 1);

        let report = store.delete_person(consultant.id, detached_at()).unwrap();
        assert_eq!(report.orders_detached, 1);
        let remaining = store.find_order(Uuid::from_u128(12)).unwrap().unwrap();
        assert_eq!(remaining.consultant_id, None);
        assert_eq!(remaining.modified_by_id, None);
        assert_eq!(remaining.version, 1);
        assert_eq!(remaining.last_updated, detached_at());
    }

    #[test]
    fn order_write_fails_once_a_referenced_person_is_gone() {
        let store = MemoryStore::new();
        let customer = store
            .insert_person(person(1, "Cust", PersonRole::Customer))
            .unwrap();
        let consultant = store
            .insert_person(person(2, "Cons", PersonRole::Consultant))
            .unwrap();
        let kept = store.insert_order(order(10, customer.id, Some(consultant.id))).unwrap();

        let resolved = order(11, customer.id, None);
        store.delete_person(customer.id, detached_at()).unwrap();
        let err = store.insert_order(resolved).unwrap_err();
        assert!(matches!(err, AppError::NotFound(msg) if msg.starts_with("customer")));
        assert_eq!(store.count_orders().unwrap(), 0);

        let other = store
            .insert_person(person(3, "Other", PersonRole::Customer))
            .unwrap();
        let mut draft = order(12, other.id, Some(consultant.id));
        store.insert_order(draft.clone()).unwrap();
        store.delete_person(consultant.id, detached_at()).unwrap();
        draft.version = 1;
        let err = store.update_order(draft, 1).unwrap_err();
        assert!(matches!(err, AppError::NotFound(msg) if msg.starts_with("consultant")));
        assert!(store.find_order(kept.id).unwrap().is_none());
    }

    #[test]
    fn order_write_rechecks_roles() {
        let store = MemoryStore::new();
        let customer = store
            .insert_person(person(1, "Cust", PersonRole::Customer))
            .unwrap();
        let err = store
            .insert_order(order(10, customer.id, Some(customer.id)))
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidRole(_)));
    }

    #[test]
    fn role_change_is_refused_while_referenced() {
        let store = MemoryStore::new();
        let customer = store
            .insert_person(person(1, "Cust", PersonRole::Customer))
            .unwrap();
        store.insert_order(order(10, customer.id, None)).unwrap();

        let mut promoted = customer.clone();
        promoted.role = PersonRole::Consultant;
        let err = store.update_person(promoted).unwrap_err();
        assert!(matches!(err, AppError::InvalidRole(_)));
        assert_eq!(store.find_person(customer.id).unwrap(), Some(customer));
    }

    #[test]
    fn concurrent_delete_never_leaves_orphaned_orders() {
        for round in 0..50u128 {
            let store = MemoryStore::new();
            let customer = store
                .insert_person(person(round + 1, "Cust", PersonRole::Customer))
                .unwrap();

            std::thread::scope(|scope| {
                scope.spawn(|| {
                    for seed in 0..20 {
                        let _ = store.insert_order(order(100 + seed, customer.id, None));
                    }
                });
                scope.spawn(|| store.delete_person(customer.id, detached_at()));
            });

            let orphaned = store
                .find_orders(&OrderFilter::default())
                .unwrap()
                .into_iter()
                .filter(|order| store.find_person(order.customer_id).unwrap().is_none())
                .count();
            assert_eq!(orphaned, 0, "round {round}");
        }
    }

    #[test]
    fn top_persons_ties_break_by_name() {
        let store = MemoryStore::new();
        let zed = store
            .insert_person(person(1, "Zed", PersonRole::Customer))
            .unwrap();
        let amy = store
            .insert_person(person(2, "Amy", PersonRole::Customer))
            .unwrap();
        let bob = store
            .insert_person(person(3, "Bob", PersonRole::Customer))
            .unwrap();

        store.insert_order(order(10, zed.id, None)).unwrap();
        store.insert_order(order(11, amy.id, None)).unwrap();
        store.insert_order(order(12, bob.id, None)).unwrap();
        store.insert_order(order(13, bob.id, None)).unwrap();

        let top = store
            .top_persons_by_order_count(PersonRole::Customer, 2)
            .unwrap();
        assert_eq!(
            top,
            vec![
                TopPerformer {
                    name: "Bob Tester".to_string(),
                    count: 2
                },
                TopPerformer {
                    name: "Amy Tester".to_string(),
                    count: 1
                },
            ]
        );
    }
}
