//! Request message sent from the coordinator to a worker

use jmxgate_common::{Command, Query, ValidationError};
use serde::{Deserialize, Serialize};

/// One request on the wire. `command` stays a plain string so that
/// unrecognized commands reach the worker and get the command listing back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerRequest {
    pub command: String,
    #[serde(default)]
    pub mbean: Option<String>,
    #[serde(default)]
    pub attribute: Option<String>,
}

impl WorkerRequest {
    pub fn new(command: Command) -> Self {
        Self {
            command: command.as_str().to_string(),
            mbean: None,
            attribute: None,
        }
    }

    pub fn with_mbean(mut self, mbean: impl Into<String>) -> Self {
        self.mbean = Some(mbean.into());
        self
    }

    pub fn with_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.attribute = Some(attribute.into());
        self
    }

    /// Encode an already validated query
    pub fn from_query(query: &Query) -> Self {
        Self {
            command: query.command().as_str().to_string(),
            mbean: query.object_name().map(|n| n.canonical()),
            attribute: query.attribute().map(str::to_string),
        }
    }

    /// Decode on the serving side. `None` means the command is not recognized.
    pub fn to_query(&self) -> Option<Result<Query, ValidationError>> {
        let command = Command::parse(&self.command)?;
        Some(Query::from_params(
            command,
            self.mbean.as_deref(),
            self.attribute.as_deref(),
        ))
    }
}
