//! Core data model shared by the coordinator, the wire protocol and workers

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeSet;

/// String-keyed response map, always JSON-serializable
pub type ResponseMap = Map<String, Value>;

/// Response keys
pub mod keys {
    pub const ERROR: &str = "error";
    pub const MBEANS: &str = "mbeans";
    pub const ATTRIBUTES: &str = "attributes";
    pub const DESCRIPTION: &str = "description";
    pub const VALUE: &str = "value";
    pub const COMMANDS: &str = "commands";
}

/// Metadata about one attribute of a management object
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttributeDescriptor {
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub type_name: String,
}

impl AttributeDescriptor {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        type_name: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            type_name: type_name.into(),
        }
    }
}

/// Identity of a worker in the fleet
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkerEndpoint {
    pub host_port: String,
    #[serde(default)]
    pub primary: bool,
}

impl WorkerEndpoint {
    pub fn new(host_port: impl Into<String>, primary: bool) -> Self {
        Self {
            host_port: host_port.into(),
            primary,
        }
    }
}

/// Who is asking, as established by the session layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallerIdentity {
    pub user_id: String,
    pub roles: BTreeSet<String>,
}

impl CallerIdentity {
    pub fn new<I, S>(user_id: impl Into<String>, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            user_id: user_id.into(),
            roles: roles.into_iter().map(Into::into).collect(),
        }
    }
}

/// Outcome of a query against a single target
///
/// A successful result carries the target's response map verbatim; a
/// failed one carries a human-readable cause. Fan-out results hold one of
/// these per host.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryResult {
    Success(ResponseMap),
    Error(String),
}

impl QueryResult {
    pub fn error(message: impl Into<String>) -> Self {
        QueryResult::Error(message.into())
    }

    /// Build a success result holding a single key
    pub fn single(key: &str, value: Value) -> Self {
        let mut map = ResponseMap::new();
        map.insert(key.to_string(), value);
        QueryResult::Success(map)
    }

    /// Interpret a decoded response map; an `error` key marks failure
    pub fn from_map(map: ResponseMap) -> Self {
        match map.get(keys::ERROR) {
            Some(Value::String(message)) => QueryResult::Error(message.clone()),
            Some(other) => QueryResult::Error(other.to_string()),
            None => QueryResult::Success(map),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, QueryResult::Success(_))
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            QueryResult::Error(message) => Some(message),
            QueryResult::Success(_) => None,
        }
    }

    /// Field of a successful result
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            QueryResult::Success(map) => map.get(key),
            QueryResult::Error(_) => None,
        }
    }

    /// Render as a response map; failures become `{"error": message}`
    pub fn into_map(self) -> ResponseMap {
        match self {
            QueryResult::Success(map) => map,
            QueryResult::Error(message) => error_map(message),
        }
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.into_map())
    }
}

/// `{"error": message}`
pub fn error_map(message: impl Into<String>) -> ResponseMap {
    let mut map = ResponseMap::new();
    map.insert(keys::ERROR.to_string(), Value::String(message.into()));
    map
}
