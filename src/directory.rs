//! Worker directory: the known fleet and which members are primary
//!
//! Membership is maintained by an external discovery source through
//! [`FleetDirectory::upsert`], [`FleetDirectory::remove`] and
//! [`FleetDirectory::replace_all`]. Queries only read it.

use dashmap::DashMap;
use jmxgate_common::WorkerEndpoint;
use std::collections::BTreeSet;
use std::sync::Arc;

pub trait WorkerDirectory: Send + Sync {
    /// Every known worker endpoint
    fn all_worker_hosts(&self) -> BTreeSet<String>;

    /// The subset flagged primary
    fn primary_worker_hosts(&self) -> BTreeSet<String>;

    fn contains(&self, host_port: &str) -> bool {
        self.all_worker_hosts().contains(host_port)
    }
}

/// Thread-safe membership cache keyed by `host:port`
#[derive(Clone, Default)]
pub struct FleetDirectory {
    workers: Arc<DashMap<String, WorkerEndpoint>>,
}

impl FleetDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_endpoints(endpoints: impl IntoIterator<Item = WorkerEndpoint>) -> Self {
        let directory = Self::new();
        for endpoint in endpoints {
            directory.upsert(endpoint);
        }
        directory
    }

    /// Insert or update one worker
    pub fn upsert(&self, endpoint: WorkerEndpoint) {
        self.workers.insert(endpoint.host_port.clone(), endpoint);
    }

    pub fn remove(&self, host_port: &str) -> Option<WorkerEndpoint> {
        self.workers.remove(host_port).map(|(_, v)| v)
    }

    /// Swap in a complete membership snapshot
    pub fn replace_all(&self, endpoints: impl IntoIterator<Item = WorkerEndpoint>) {
        let incoming: Vec<WorkerEndpoint> = endpoints.into_iter().collect();
        let keep: BTreeSet<&str> = incoming.iter().map(|e| e.host_port.as_str()).collect();

        self.workers.retain(|host_port, _| keep.contains(host_port.as_str()));
        for endpoint in incoming {
            self.upsert(endpoint);
        }
    }

    pub fn len(&self) -> usize {
        self.workers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }
}

impl WorkerDirectory for FleetDirectory {
    fn all_worker_hosts(&self) -> BTreeSet<String> {
        self.workers.iter().map(|e| e.key().clone()).collect()
    }

    fn primary_worker_hosts(&self) -> BTreeSet<String> {
        self.workers
            .iter()
            .filter(|e| e.value().primary)
            .map(|e| e.key().clone())
            .collect()
    }

    fn contains(&self, host_port: &str) -> bool {
        self.workers.contains_key(host_port)
    }
}
