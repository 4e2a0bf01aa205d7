//! Aggregation service: resolves a scope and runs a query against it
//!
//! Single-target queries return that target's response map. Fan-out
//! queries return one entry per worker in the directory, keyed by
//! `host:port`, each independently a success or an `{"error": ...}` map.
//! A fan-out only fails as a whole when no target can be resolved.

use crate::directory::WorkerDirectory;
use crate::error::QueryError;
use crate::remote::WorkerClient;
use crate::stats::QueryStats;
use futures::future::join_all;
use jmxgate_common::{
    error_map, execute, keys, Command, ManagementRegistry, ObjectName, Query, QueryResult,
    ResponseMap,
};
use jmxgate_proto::WorkerRequest;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Which process(es) a query runs against
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    /// The coordinator itself
    Local,
    /// One named worker
    Worker(String),
    /// Every worker in the directory
    AllWorkers,
}

impl Scope {
    pub const ALL_WORKERS_PARAM: &'static str = "*";

    /// Map the operator's `hostPort` parameter to a scope
    pub fn from_param(host_port: Option<&str>) -> Self {
        match host_port.map(str::trim) {
            None | Some("") => Scope::Local,
            Some(Self::ALL_WORKERS_PARAM) => Scope::AllWorkers,
            Some(host_port) => Scope::Worker(host_port.to_string()),
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Local => f.write_str("local"),
            Scope::Worker(host_port) => write!(f, "worker {}", host_port),
            Scope::AllWorkers => f.write_str("all workers"),
        }
    }
}

pub struct AggregationService {
    registry: Arc<dyn ManagementRegistry>,
    directory: Arc<dyn WorkerDirectory>,
    client: Arc<dyn WorkerClient>,
    stats: QueryStats,
}

impl AggregationService {
    pub fn new(
        registry: Arc<dyn ManagementRegistry>,
        directory: Arc<dyn WorkerDirectory>,
        client: Arc<dyn WorkerClient>,
        stats: QueryStats,
    ) -> Self {
        Self {
            registry,
            directory,
            client,
            stats,
        }
    }

    pub async fn list_management_objects(&self, scope: &Scope) -> Result<ResponseMap, QueryError> {
        self.run(&Query::ListManagementObjects, scope).await
    }

    pub async fn describe_object(
        &self,
        scope: &Scope,
        object_name: &ObjectName,
    ) -> Result<ResponseMap, QueryError> {
        let query = Query::DescribeObject {
            object_name: object_name.clone(),
        };
        self.run(&query, scope).await
    }

    pub async fn get_attribute(
        &self,
        scope: &Scope,
        object_name: &ObjectName,
        attribute: &str,
    ) -> Result<ResponseMap, QueryError> {
        let query = Query::GetAttribute {
            object_name: object_name.clone(),
            attribute: attribute.to_string(),
        };
        self.run(&query, scope).await
    }

    pub async fn get_all_attributes(
        &self,
        scope: &Scope,
        object_name: &ObjectName,
    ) -> Result<ResponseMap, QueryError> {
        let query = Query::GetAllAttributes {
            object_name: object_name.clone(),
        };
        self.run(&query, scope).await
    }

    /// Ask one worker for all attributes of an object in a single call
    pub async fn get_all_executor_attributes(
        &self,
        host_port: &str,
        object_name: &ObjectName,
    ) -> Result<ResponseMap, QueryError> {
        self.require_worker(host_port)?;

        let request =
            WorkerRequest::new(Command::AllMbeanAttributes).with_mbean(object_name.canonical());
        Ok(self.call(host_port, &request).await.into_map())
    }

    /// Run `query` against `scope`
    pub async fn run(&self, query: &Query, scope: &Scope) -> Result<ResponseMap, QueryError> {
        debug!(command = %query.command(), %scope, "Running query");

        match scope {
            Scope::Local => Ok(execute(self.registry.as_ref(), query).into_map()),
            Scope::Worker(host_port) => {
                self.require_worker(host_port)?;
                Ok(self.query_remote(host_port, query).await.into_map())
            }
            Scope::AllWorkers => self.fan_out(query).await,
        }
    }

    /// Query every known worker concurrently and merge by host
    async fn fan_out(&self, query: &Query) -> Result<ResponseMap, QueryError> {
        let hosts = self.directory.all_worker_hosts();
        if hosts.is_empty() {
            return Err(QueryError::NoWorkers);
        }

        let calls = hosts.into_iter().map(|host_port| async move {
            let result = self.query_remote(&host_port, query).await;
            (host_port, result)
        });

        let mut merged = ResponseMap::new();
        for (host_port, result) in join_all(calls).await {
            let entry = match query {
                Query::ListManagementObjects => names_entry(&host_port, result),
                _ => result.into_value(),
            };
            merged.insert(host_port, entry);
        }

        Ok(merged)
    }

    /// Run a single-target query on one worker
    async fn query_remote(&self, host_port: &str, query: &Query) -> QueryResult {
        match query {
            Query::GetAllAttributes { object_name } => {
                self.remote_all_attributes(host_port, object_name).await
            }
            _ => self.call(host_port, &WorkerRequest::from_query(query)).await,
        }
    }

    /// Describe the object on the worker, then fetch each attribute on its
    /// own. A failed describe ends the command before any fetch.
    async fn remote_all_attributes(&self, host_port: &str, object_name: &ObjectName) -> QueryResult {
        let mbean = object_name.canonical();
        let describe = WorkerRequest::new(Command::MbeanInfo).with_mbean(mbean.clone());

        let info = match self.call(host_port, &describe).await {
            QueryResult::Success(info) => info,
            failed => return failed,
        };

        let fetches = attribute_names(&info).into_iter().map(|attribute| {
            let request = WorkerRequest::new(Command::MbeanAttribute)
                .with_mbean(mbean.clone())
                .with_attribute(attribute.clone());
            async move {
                let value = match self.call(host_port, &request).await {
                    QueryResult::Success(mut map) => map.remove(keys::VALUE).unwrap_or(Value::Null),
                    QueryResult::Error(message) => Value::Object(error_map(message)),
                };
                (attribute, value)
            }
        });

        let attributes: ResponseMap = join_all(fetches).await.into_iter().collect();
        QueryResult::single(keys::ATTRIBUTES, Value::Object(attributes))
    }

    async fn call(&self, host_port: &str, request: &WorkerRequest) -> QueryResult {
        let result = self.client.query_worker(host_port, request).await;
        self.stats.record_worker_call(result.is_success());
        result
    }

    fn require_worker(&self, host_port: &str) -> Result<(), QueryError> {
        if self.directory.contains(host_port) {
            Ok(())
        } else {
            warn!("Rejected query for unknown worker {}", host_port);
            Err(QueryError::UnknownWorker(host_port.to_string()))
        }
    }
}

/// Fan-out entry for a listing: the bare name array, or the error map
fn names_entry(host_port: &str, result: QueryResult) -> Value {
    match result {
        QueryResult::Success(mut map) => match map.remove(keys::MBEANS) {
            Some(names @ Value::Array(_)) => names,
            _ => QueryResult::from(QueryError::Transport {
                host_port: host_port.to_string(),
                cause: "response has no 'mbeans' list".to_string(),
            })
            .into_value(),
        },
        failed => failed.into_value(),
    }
}

/// Attribute names listed in an `mbean-info` response
fn attribute_names(info: &ResponseMap) -> Vec<String> {
    info.get(keys::ATTRIBUTES)
        .and_then(Value::as_array)
        .map(|descriptors| {
            descriptors
                .iter()
                .filter_map(|d| d.get("name").and_then(Value::as_str))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}
