//! Remote query client: one request to one worker, failures isolated
//!
//! A call never fails outward. Connection errors, timeouts and
//! undecodable payloads come back as an error [`QueryResult`] naming the
//! host, so a fan-out can carry on with the other workers. There is no
//! retry.

use crate::error::QueryError;
use async_trait::async_trait;
use jmxgate_common::QueryResult;
use jmxgate_proto::{send_request, WorkerRequest};
use std::time::Duration;
use tracing::{debug, error};

pub const DEFAULT_WORKER_TIMEOUT: Duration = Duration::from_secs(5);

#[async_trait]
pub trait WorkerClient: Send + Sync {
    async fn query_worker(&self, host_port: &str, request: &WorkerRequest) -> QueryResult;
}

/// Speaks the management protocol over TCP with a bounded per-call timeout
#[derive(Debug, Clone)]
pub struct TcpWorkerClient {
    timeout: Duration,
}

impl TcpWorkerClient {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl Default for TcpWorkerClient {
    fn default() -> Self {
        Self::new(DEFAULT_WORKER_TIMEOUT)
    }
}

#[async_trait]
impl WorkerClient for TcpWorkerClient {
    async fn query_worker(&self, host_port: &str, request: &WorkerRequest) -> QueryResult {
        debug!(host = host_port, command = %request.command, "Querying worker");

        let cause = match tokio::time::timeout(self.timeout, send_request(host_port, request)).await
        {
            Ok(Ok(response)) => return QueryResult::from_map(response),
            Ok(Err(e)) => e.to_string(),
            Err(_) => format!("timed out after {} ms", self.timeout.as_millis()),
        };

        error!("Cannot contact worker {}: {}", host_port, cause);
        QueryError::Transport {
            host_port: host_port.to_string(),
            cause,
        }
        .into()
    }
}
