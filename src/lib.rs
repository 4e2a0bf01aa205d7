//! jmxgate coordinator
//!
//! Serves management-data queries for a fleet of workers from one admin
//! endpoint:
//! - `access` - admin permission check run before any query
//! - `directory` - known workers and which are primary
//! - `remote` - single request to one worker, failures isolated
//! - `service` - scope resolution, fan-out and merge
//! - `coordinator` - operator parameters in, response map out

pub mod access;
pub mod cli;
pub mod config;
pub mod coordinator;
pub mod directory;
pub mod error;
pub mod remote;
pub mod service;
pub mod stats;

pub use coordinator::{Coordinator, OperatorRequest, Overview, QueryParams, RemoteListing};
pub use error::{JmxGateError, QueryError, Result};
pub use service::{AggregationService, Scope};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
