//! YAML configuration for the coordinator
//!
//! ```yaml
//! worker_timeout_ms: 5000
//! workers:
//!   - host_port: "exec-1:12321"
//!     primary: true
//! roles:
//!   admin: [admin]
//!   viewer: [read, metrics]
//! ```

use crate::access::{Permission, Role};
use crate::{JmxGateError, Result};
use jmxgate_common::WorkerEndpoint;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

const DEFAULT_WORKER_TIMEOUT_MS: u64 = 5000;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Per-call bound on a worker request
    pub worker_timeout_ms: u64,
    /// Initial fleet membership
    pub workers: Vec<WorkerEndpoint>,
    /// Role name to granted permissions
    pub roles: BTreeMap<String, Vec<Permission>>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            worker_timeout_ms: DEFAULT_WORKER_TIMEOUT_MS,
            workers: Vec::new(),
            roles: BTreeMap::new(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        debug!("Loading configuration from {}", path.display());
        let raw = std::fs::read_to_string(path)?;
        Self::from_yaml(&raw)
    }

    pub fn from_yaml(raw: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(raw)
            .map_err(|e| JmxGateError::ConfigError(format!("Invalid YAML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.worker_timeout_ms == 0 {
            return Err(JmxGateError::ConfigError(
                "worker_timeout_ms must be greater than zero".to_string(),
            ));
        }

        for worker in &self.workers {
            let valid = worker
                .host_port
                .rsplit_once(':')
                .is_some_and(|(host, port)| !host.is_empty() && port.parse::<u16>().is_ok());
            if !valid {
                return Err(JmxGateError::ConfigError(format!(
                    "Worker address '{}' is not of the form host:port",
                    worker.host_port
                )));
            }
        }

        Ok(())
    }

    pub fn worker_timeout(&self) -> Duration {
        Duration::from_millis(self.worker_timeout_ms)
    }

    pub fn roles(&self) -> Vec<Role> {
        self.roles
            .iter()
            .map(|(name, permissions)| Role::new(name.clone(), permissions.iter().copied()))
            .collect()
    }
}
