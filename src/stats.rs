//! Query counters, exposed as the `jmxgate:type=QueryService` object

use jmxgate_common::{AttributeDescriptor, ManagementObject, ObjectName};
use serde_json::json;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

pub const QUERY_SERVICE_OBJECT_NAME: &str = "jmxgate:type=QueryService";

#[derive(Debug, Default)]
struct Counters {
    queries_served: AtomicU64,
    queries_denied: AtomicU64,
    worker_calls: AtomicU64,
    worker_failures: AtomicU64,
}

#[derive(Debug, Clone, Default)]
pub struct QueryStats {
    counters: Arc<Counters>,
}

impl QueryStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_served(&self) {
        self.counters.queries_served.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_denied(&self) {
        self.counters.queries_denied.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_worker_call(&self, succeeded: bool) {
        self.counters.worker_calls.fetch_add(1, Ordering::Relaxed);
        if !succeeded {
            self.counters.worker_failures.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn queries_served(&self) -> u64 {
        self.counters.queries_served.load(Ordering::Relaxed)
    }

    pub fn queries_denied(&self) -> u64 {
        self.counters.queries_denied.load(Ordering::Relaxed)
    }

    pub fn worker_calls(&self) -> u64 {
        self.counters.worker_calls.load(Ordering::Relaxed)
    }

    pub fn worker_failures(&self) -> u64 {
        self.counters.worker_failures.load(Ordering::Relaxed)
    }

    /// Management object reading these counters live
    pub fn management_object(&self) -> ManagementObject {
        let name = match ObjectName::parse(QUERY_SERVICE_OBJECT_NAME) {
            Ok(name) => name,
            Err(e) => unreachable!("built-in object name is valid: {e}"),
        };

        let served = self.clone();
        let denied = self.clone();
        let calls = self.clone();
        let failures = self.clone();

        ManagementObject::new(name, "Management query counters for this coordinator")
            .with_attribute(
                AttributeDescriptor::new("QueriesServed", "Authorized queries handled", "long"),
                move || json!(served.queries_served()),
            )
            .with_attribute(
                AttributeDescriptor::new("QueriesDenied", "Queries refused by the access gate", "long"),
                move || json!(denied.queries_denied()),
            )
            .with_attribute(
                AttributeDescriptor::new("WorkerCalls", "Requests sent to workers", "long"),
                move || json!(calls.worker_calls()),
            )
            .with_attribute(
                AttributeDescriptor::new("WorkerFailures", "Worker requests answered with an error", "long"),
                move || json!(failures.worker_failures()),
            )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_visible_through_object() {
        let stats = QueryStats::new();
        let object = stats.management_object();

        stats.record_served();
        stats.record_worker_call(true);
        stats.record_worker_call(false);

        assert_eq!(object.read("QueriesServed"), Some(json!(1)));
        assert_eq!(object.read("WorkerCalls"), Some(json!(2)));
        assert_eq!(object.read("WorkerFailures"), Some(json!(1)));
        assert_eq!(object.read("QueriesDenied"), Some(json!(0)));
    }
}
