use std::sync::Arc;

use crate::clock::Clock;
use crate::config::SummaryConfig;
use crate::observability::metrics::Metrics;
use crate::store::{MemoryStore, OrderStore, PersonStore};

pub struct AppState {
    pub persons: Arc<dyn PersonStore>,
    pub orders: Arc<dyn OrderStore>,
    pub clock: Arc<dyn Clock>,
    pub summary: SummaryConfig,
    pub metrics: Metrics,
}

impl AppState {
    /// State backed by a fresh in-memory store.
    pub fn new(clock: Arc<dyn Clock>, summary: SummaryConfig) -> Self {
        let store = Arc::new(MemoryStore::new());
        Self::with_stores(store.clone(), store, clock, summary)
    }

    pub fn with_stores(
        persons: Arc<dyn PersonStore>,
        orders: Arc<dyn OrderStore>,
        clock: Arc<dyn Clock>,
        summary: SummaryConfig,
    ) -> Self {
        Self {
            persons,
            orders,
            clock,
            summary,
            metrics: Metrics::new(),
        }
    }
}
