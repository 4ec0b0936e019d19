use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use uuid::Uuid;

use crate::clock::{Clock, FixedClock};
use crate::config::SummaryConfig;
use crate::engine::orders::{create_order, OrderItemRequest, OrderRequest};
use crate::models::order::Order;
use crate::models::person::Person;
use crate::models::status::PersonRole;
use crate::state::AppState;

pub struct Fixture {
    pub state: AppState,
    pub clock: Arc<FixedClock>,
    pub customer: Person,
    pub consultant: Person,
}

impl Fixture {
    pub fn new() -> Self {
        let clock = Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2026, 10, 18, 12, 0, 0).unwrap(),
        ));
        let state = AppState::new(clock.clone(), SummaryConfig::default());
        let mut fixture = Self {
            state,
            clock,
            customer: placeholder(),
            consultant: placeholder(),
        };
        fixture.customer = fixture.add_person("Carl", PersonRole::Customer);
        fixture.consultant = fixture.add_person("Nina", PersonRole::Consultant);
        fixture
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn advance_days(&self, days: i64) {
        self.clock.set(self.clock.now() + Duration::days(days));
    }

    pub fn add_person(&self, first_name: &str, role: PersonRole) -> Person {
        let person = Person {
            id: Uuid::new_v4(),
            first_name: first_name.to_string(),
            last_name: "Fixture".to_string(),
            email: format!("{}.{}@example.com", first_name.to_lowercase(), Uuid::new_v4()),
            phone_number: "555-0199".to_string(),
            address: "Fixture Road 1".to_string(),
            role,
            archived: false,
        };
        self.state.persons.insert_person(person).unwrap()
    }

    pub fn create(&self, items: Vec<OrderItemRequest>) -> Order {
        create_order(&self.state, order_request(self, items)).unwrap()
    }
}

fn placeholder() -> Person {
    Person {
        id: Uuid::nil(),
        first_name: String::new(),
        last_name: String::new(),
        email: String::new(),
        phone_number: String::new(),
        address: String::new(),
        role: PersonRole::Customer,
        archived: false,
    }
}

pub fn order_request(fx: &Fixture, items: Vec<OrderItemRequest>) -> OrderRequest {
    OrderRequest {
        customer_id: fx.customer.id,
        consultant_id: fx.consultant.id,
        modified_by_id: None,
        status: Some("PENDING".to_string()),
        items,
    }
}

pub fn item_request(service_type: &str, start_date: &str, end_date: &str) -> OrderItemRequest {
    OrderItemRequest {
        id: None,
        service_type: service_type.to_string(),
        status: None,
        start_date: start_date.to_string(),
        end_date: end_date.to_string(),
        from_address: "Birch Street 3".to_string(),
        to_address: None,
        note: None,
    }
}
