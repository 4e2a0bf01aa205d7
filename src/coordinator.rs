//! Operator-facing entry point: access gate in front of the aggregation service
//!
//! [`Coordinator::handle`] accepts the flat parameter set the web layer
//! extracts from a request and always returns a well-formed response map.
//! [`Coordinator::overview`] produces the data behind the fleet page.

use crate::access::{AccessGate, StaticRoleStore};
use crate::config::Config;
use crate::directory::{FleetDirectory, WorkerDirectory};
use crate::error::QueryError;
use crate::remote::{TcpWorkerClient, WorkerClient};
use crate::service::{AggregationService, Scope};
use crate::stats::QueryStats;
use jmxgate_common::{
    commands_listing, parse_object_name, runtime_object, CallerIdentity, Command,
    InMemoryRegistry, ManagementRegistry, ObjectName, Query, ResponseMap, ValidationError,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

/// Raw request parameters, as named on the wire
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryParams {
    #[serde(default)]
    pub command: Option<String>,
    #[serde(default)]
    pub mbean: Option<String>,
    #[serde(default)]
    pub attribute: Option<String>,
    #[serde(default, rename = "hostPort")]
    pub host_port: Option<String>,
}

impl QueryParams {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: Some(command.into()),
            ..Self::default()
        }
    }

    pub fn mbean(mut self, mbean: impl Into<String>) -> Self {
        self.mbean = Some(mbean.into());
        self
    }

    pub fn attribute(mut self, attribute: impl Into<String>) -> Self {
        self.attribute = Some(attribute.into());
        self
    }

    pub fn host_port(mut self, host_port: impl Into<String>) -> Self {
        self.host_port = Some(host_port.into());
        self
    }

    /// Validate without touching any registry or worker
    pub fn validate(&self) -> Result<OperatorRequest, ValidationError> {
        let Some(command) = self.command.as_deref().and_then(Command::parse) else {
            return Ok(OperatorRequest::Help);
        };

        if command == Command::AllExecutorAttributes {
            let host_port = present(&self.host_port);
            let mbean = present(&self.mbean);
            return match (mbean, host_port) {
                (Some(mbean), Some(host_port)) => Ok(OperatorRequest::ExecutorAttributes {
                    host_port: host_port.to_string(),
                    object_name: parse_object_name(mbean)?,
                }),
                _ => Err(ValidationError::MissingParameters("'mbean' and 'hostPort'")),
            };
        }

        let query = Query::from_params(command, self.mbean.as_deref(), self.attribute.as_deref())?;
        Ok(OperatorRequest::Scoped {
            query,
            scope: Scope::from_param(self.host_port.as_deref()),
        })
    }
}

fn present(param: &Option<String>) -> Option<&str> {
    param.as_deref().map(str::trim).filter(|p| !p.is_empty())
}

/// A validated operator request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperatorRequest {
    Scoped { query: Query, scope: Scope },
    ExecutorAttributes { host_port: String, object_name: ObjectName },
    Help,
}

/// Per-worker entry of the fleet overview
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RemoteListing {
    pub host_port: String,
    pub primary: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mbeans: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Data behind the fleet page
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Overview {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_msg: Option<String>,
    pub mbeans: Vec<String>,
    pub remote_mbeans: Vec<RemoteListing>,
}

pub struct Coordinator {
    gate: AccessGate,
    registry: Arc<dyn ManagementRegistry>,
    directory: Arc<dyn WorkerDirectory>,
    service: AggregationService,
    stats: QueryStats,
}

impl Coordinator {
    pub fn new(
        gate: AccessGate,
        registry: Arc<dyn ManagementRegistry>,
        directory: Arc<dyn WorkerDirectory>,
        client: Arc<dyn WorkerClient>,
        stats: QueryStats,
    ) -> Self {
        let service = AggregationService::new(
            Arc::clone(&registry),
            Arc::clone(&directory),
            client,
            stats.clone(),
        );

        Self {
            gate,
            registry,
            directory,
            service,
            stats,
        }
    }

    /// Wire up the production collaborators described by `config`
    pub fn from_config(config: &Config) -> Self {
        let stats = QueryStats::new();

        let registry = InMemoryRegistry::new();
        registry.register(runtime_object("jmxgate", crate::VERSION));
        registry.register(stats.management_object());

        let roles = StaticRoleStore::new(config.roles());
        let directory = FleetDirectory::from_endpoints(config.workers.iter().cloned());
        let client = TcpWorkerClient::new(config.worker_timeout());

        Self::new(
            AccessGate::new(Arc::new(roles)),
            Arc::new(registry),
            Arc::new(directory),
            Arc::new(client),
            stats,
        )
    }

    pub fn stats(&self) -> &QueryStats {
        &self.stats
    }

    /// Answer one operator request
    pub async fn handle(&self, identity: &CallerIdentity, params: &QueryParams) -> ResponseMap {
        if !self.gate.authorize(identity) {
            self.stats.record_denied();
            warn!("User {} denied management query", identity.user_id);
            return QueryError::Unauthorized {
                user_id: identity.user_id.clone(),
            }
            .into_map();
        }

        self.stats.record_served();
        debug!(user = %identity.user_id, ?params, "Handling management query");

        match self.dispatch(params).await {
            Ok(response) => response,
            Err(e) => e.into_map(),
        }
    }

    async fn dispatch(&self, params: &QueryParams) -> Result<ResponseMap, QueryError> {
        match params.validate()? {
            OperatorRequest::Help => Ok(commands_listing()),
            OperatorRequest::ExecutorAttributes {
                host_port,
                object_name,
            } => {
                self.service
                    .get_all_executor_attributes(&host_port, &object_name)
                    .await
            }
            OperatorRequest::Scoped { query, scope } => self.service.run(&query, &scope).await,
        }
    }

    /// Local object names plus every worker's listing
    pub async fn overview(&self, identity: &CallerIdentity) -> Overview {
        if !self.gate.authorize(identity) {
            self.stats.record_denied();
            return Overview {
                error_msg: Some(
                    QueryError::Unauthorized {
                        user_id: identity.user_id.clone(),
                    }
                    .to_string(),
                ),
                mbeans: Vec::new(),
                remote_mbeans: Vec::new(),
            };
        }
        self.stats.record_served();

        let mbeans = self
            .registry
            .object_names()
            .iter()
            .map(ObjectName::canonical)
            .collect();

        let primary = self.directory.primary_worker_hosts();
        let remote_mbeans = match self.service.list_management_objects(&Scope::AllWorkers).await {
            Ok(listing) => listing
                .into_iter()
                .map(|(host_port, entry)| {
                    let error = entry
                        .get(jmxgate_common::keys::ERROR)
                        .and_then(Value::as_str)
                        .map(str::to_string);
                    if let Some(cause) = &error {
                        warn!("Cannot list objects on {}: {}", host_port, cause);
                    }
                    RemoteListing {
                        primary: primary.contains(&host_port),
                        mbeans: error.is_none().then_some(entry),
                        error,
                        host_port,
                    }
                })
                .collect(),
            Err(_) => Vec::new(),
        };

        Overview {
            error_msg: None,
            mbeans,
            remote_mbeans,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_or_missing_command_is_help() {
        assert_eq!(
            QueryParams::new("frobnicate").validate(),
            Ok(OperatorRequest::Help)
        );
        assert_eq!(QueryParams::default().validate(), Ok(OperatorRequest::Help));
    }

    #[test]
    fn test_executor_attributes_requires_both() {
        let err = QueryParams::new("all-executor-attributes")
            .mbean("app:type=Pool")
            .validate()
            .unwrap_err();
        assert_eq!(err.to_string(), "Parameters 'mbean' and 'hostPort' must be set");

        let ok = QueryParams::new("all-executor-attributes")
            .mbean("app:type=Pool")
            .host_port("h:1")
            .validate()
            .expect("Should validate");
        assert!(matches!(ok, OperatorRequest::ExecutorAttributes { .. }));
    }

    #[test]
    fn test_host_port_is_trimmed_for_every_command() {
        let executor = QueryParams::new("all-executor-attributes")
            .mbean("app:type=Pool")
            .host_port(" exec-a:12321 ")
            .validate()
            .expect("Should validate");
        assert!(matches!(
            executor,
            OperatorRequest::ExecutorAttributes { ref host_port, .. } if host_port == "exec-a:12321"
        ));

        let describe = QueryParams::new("mbean-info")
            .mbean("app:type=Pool")
            .host_port(" exec-a:12321 ")
            .validate()
            .expect("Should validate");
        assert!(matches!(
            describe,
            OperatorRequest::Scoped { scope: Scope::Worker(ref host_port), .. } if host_port == "exec-a:12321"
        ));
    }

    #[test]
    fn test_host_port_selects_scope() {
        let request = QueryParams::new("list-mbeans")
            .host_port("*")
            .validate()
            .expect("Should validate");
        assert_eq!(
            request,
            OperatorRequest::Scoped {
                query: Query::ListManagementObjects,
                scope: Scope::AllWorkers,
            }
        );
    }

    #[test]
    fn test_params_wire_names() {
        let params: QueryParams = serde_json::from_value(serde_json::json!({
            "command": "mbean-attribute",
            "mbean": "a:b=c",
            "attribute": "X",
            "hostPort": "h:1"
        }))
        .expect("Should deserialize");
        assert_eq!(params.host_port.as_deref(), Some("h:1"));
    }
}
