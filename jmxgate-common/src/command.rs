//! Command vocabulary and validated single-target queries

use crate::model::{keys, ResponseMap};
use crate::object_name::{ObjectName, ObjectNameError};
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// The recognized commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    ListMbeans,
    MbeanInfo,
    MbeanAttribute,
    AllMbeanAttributes,
    AllExecutorAttributes,
}

impl Command {
    pub const ALL: [Command; 5] = [
        Command::ListMbeans,
        Command::MbeanInfo,
        Command::MbeanAttribute,
        Command::AllMbeanAttributes,
        Command::AllExecutorAttributes,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Command::ListMbeans => "list-mbeans",
            Command::MbeanInfo => "mbean-info",
            Command::MbeanAttribute => "mbean-attribute",
            Command::AllMbeanAttributes => "all-mbean-attributes",
            Command::AllExecutorAttributes => "all-executor-attributes",
        }
    }

    /// Unrecognized names yield `None`, which callers answer with [`commands_listing`]
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == name)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `{"commands": [...]}`, the answer to anything outside the vocabulary
pub fn commands_listing() -> ResponseMap {
    let names = Command::ALL
        .iter()
        .map(|c| Value::String(c.as_str().to_string()))
        .collect();

    let mut map = ResponseMap::new();
    map.insert(keys::COMMANDS.to_string(), Value::Array(names));
    map
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("No 'mbean' name parameter specified")]
    NoObjectName,

    #[error("Parameters {0} must be set")]
    MissingParameters(&'static str),

    #[error("'{name}' is not a valid mBean name")]
    InvalidObjectName {
        name: String,
        #[source]
        source: ObjectNameError,
    },

    #[error("'{0}' is only answered by the coordinator")]
    CoordinatorOnly(Command),
}

/// A query answerable by a single process
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    ListManagementObjects,
    DescribeObject {
        object_name: ObjectName,
    },
    GetAttribute {
        object_name: ObjectName,
        attribute: String,
    },
    GetAllAttributes {
        object_name: ObjectName,
    },
}

impl Query {
    /// Validate raw parameters for `command`. Blank parameters count as
    /// missing; presence is checked before the name is parsed.
    pub fn from_params(
        command: Command,
        mbean: Option<&str>,
        attribute: Option<&str>,
    ) -> Result<Self, ValidationError> {
        let mbean = present(mbean);
        let attribute = present(attribute);

        match command {
            Command::ListMbeans => Ok(Query::ListManagementObjects),
            Command::MbeanInfo => {
                let raw = mbean.ok_or(ValidationError::NoObjectName)?;
                Ok(Query::DescribeObject {
                    object_name: parse_object_name(raw)?,
                })
            }
            Command::MbeanAttribute => match (mbean, attribute) {
                (Some(raw), Some(attribute)) => Ok(Query::GetAttribute {
                    object_name: parse_object_name(raw)?,
                    attribute: attribute.to_string(),
                }),
                _ => Err(ValidationError::MissingParameters(
                    "'mbean' and 'attribute'",
                )),
            },
            Command::AllMbeanAttributes => {
                let raw = mbean.ok_or(ValidationError::MissingParameters("'mbean'"))?;
                Ok(Query::GetAllAttributes {
                    object_name: parse_object_name(raw)?,
                })
            }
            Command::AllExecutorAttributes => Err(ValidationError::CoordinatorOnly(command)),
        }
    }

    pub fn command(&self) -> Command {
        match self {
            Query::ListManagementObjects => Command::ListMbeans,
            Query::DescribeObject { .. } => Command::MbeanInfo,
            Query::GetAttribute { .. } => Command::MbeanAttribute,
            Query::GetAllAttributes { .. } => Command::AllMbeanAttributes,
        }
    }

    pub fn object_name(&self) -> Option<&ObjectName> {
        match self {
            Query::ListManagementObjects => None,
            Query::DescribeObject { object_name }
            | Query::GetAttribute { object_name, .. }
            | Query::GetAllAttributes { object_name } => Some(object_name),
        }
    }

    pub fn attribute(&self) -> Option<&str> {
        match self {
            Query::GetAttribute { attribute, .. } => Some(attribute),
            _ => None,
        }
    }
}

fn present(param: Option<&str>) -> Option<&str> {
    param.filter(|p| !p.trim().is_empty())
}

/// Parse a caller-supplied name into the validation error callers report
pub fn parse_object_name(raw: &str) -> Result<ObjectName, ValidationError> {
    ObjectName::parse(raw).map_err(|source| ValidationError::InvalidObjectName {
        name: raw.to_string(),
        source,
    })
}
