//! Shared management-data model for jmxgate
//!
//! Used by both sides of the worker management protocol:
//! - the coordinator, for its local scope and to decode worker answers
//! - workers, to answer queries against their own registry

pub mod command;
pub mod model;
pub mod object_name;
pub mod registry;
pub mod runtime;

pub use command::{commands_listing, parse_object_name, Command, Query, ValidationError};
pub use model::{
    error_map, keys, AttributeDescriptor, CallerIdentity, QueryResult, ResponseMap,
    WorkerEndpoint,
};
pub use object_name::{ObjectName, ObjectNameError};
pub use registry::{
    execute, InMemoryRegistry, LookupError, ManagementObject, ManagementRegistry, ObjectInfo,
};
pub use runtime::{runtime_object, RUNTIME_OBJECT_NAME};
