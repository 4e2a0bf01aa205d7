//! Management protocol server for the agent
//!
//! Answers coordinator requests from the agent's own registry.

use anyhow::{Context, Result};
use jmxgate_common::{
    commands_listing, error_map, execute, Command, ManagementRegistry, ResponseMap,
};
use jmxgate_proto::{serve, RequestHandler, WorkerRequest};
use log::{debug, info};
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Protocol handler backed by a management registry
pub struct AgentService {
    registry: Arc<dyn ManagementRegistry>,
    node_name: String,
}

impl AgentService {
    pub fn new(registry: Arc<dyn ManagementRegistry>, node_name: String) -> Self {
        Self {
            registry,
            node_name,
        }
    }

    pub fn node_name(&self) -> &str {
        &self.node_name
    }
}

impl RequestHandler for AgentService {
    fn handle(&self, request: WorkerRequest) -> ResponseMap {
        debug!("{}: handling '{}'", self.node_name, request.command);

        match request.to_query() {
            None => commands_listing(),
            Some(Err(e)) => error_map(e.to_string()),
            Some(Ok(query)) => execute(self.registry.as_ref(), &query).into_map(),
        }
    }
}

/// Handle to a running server
pub struct ServerHandle {
    pub local_addr: SocketAddr,
    shutdown: CancellationToken,
    task: JoinHandle<std::io::Result<()>>,
}

impl ServerHandle {
    /// Stop accepting, drop open connections and wait for the loop to exit
    pub async fn shutdown(self) -> Result<()> {
        self.shutdown.cancel();
        self.task.await.context("Server task panicked")??;
        Ok(())
    }
}

/// Bind `addr` and serve `registry` in the background
pub async fn start_server(
    registry: Arc<dyn ManagementRegistry>,
    addr: SocketAddr,
) -> Result<ServerHandle> {
    let node_name = std::env::var("NODE_NAME")
        .or_else(|_| hostname::get().map(|h| h.to_string_lossy().to_string()))
        .unwrap_or_else(|_| "unknown".to_string());

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    let local_addr = listener.local_addr()?;

    info!("Starting management server on {} as {}", local_addr, node_name);

    let service = Arc::new(AgentService::new(registry, node_name));
    let shutdown = CancellationToken::new();
    let task = tokio::spawn(serve(listener, service, shutdown.clone()));

    Ok(ServerHandle {
        local_addr,
        shutdown,
        task,
    })
}

/// Every recognized worker command, for logging at startup
pub fn served_commands() -> Vec<Value> {
    Command::ALL
        .iter()
        .filter(|c| **c != Command::AllExecutorAttributes)
        .map(|c| Value::String(c.as_str().to_string()))
        .collect()
}
