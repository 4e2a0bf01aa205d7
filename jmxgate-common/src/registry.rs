//! Management registry: the objects a process exposes about itself
//!
//! Attribute values are produced by reader closures on every query, never
//! cached. [`execute`] answers a [`Query`] against any registry and is used
//! both by the coordinator for its local scope and by workers serving the
//! management protocol.

use crate::command::Query;
use crate::model::{keys, AttributeDescriptor, QueryResult, ResponseMap};
use crate::object_name::ObjectName;
use dashmap::DashMap;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Produces the current value of one attribute
pub type AttributeReader = Arc<dyn Fn() -> Value + Send + Sync>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    #[error("'{0}' is not a valid mBean name")]
    ObjectNotFound(ObjectName),

    #[error("'{attribute}' is not an attribute of '{object}'")]
    AttributeNotFound {
        object: ObjectName,
        attribute: String,
    },
}

/// Description and attribute metadata of one object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectInfo {
    pub description: String,
    pub attributes: Vec<AttributeDescriptor>,
}

/// A named object with readable attributes
#[derive(Clone)]
pub struct ManagementObject {
    name: ObjectName,
    description: String,
    attributes: Vec<(AttributeDescriptor, AttributeReader)>,
}

impl ManagementObject {
    pub fn new(name: ObjectName, description: impl Into<String>) -> Self {
        Self {
            name,
            description: description.into(),
            attributes: Vec::new(),
        }
    }

    /// Add an attribute; a later attribute with the same name replaces an earlier one
    pub fn with_attribute<F>(mut self, descriptor: AttributeDescriptor, reader: F) -> Self
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        self.attributes.retain(|(d, _)| d.name != descriptor.name);
        self.attributes.push((descriptor, Arc::new(reader)));
        self
    }

    pub fn name(&self) -> &ObjectName {
        &self.name
    }

    pub fn info(&self) -> ObjectInfo {
        ObjectInfo {
            description: self.description.clone(),
            attributes: self.attributes.iter().map(|(d, _)| d.clone()).collect(),
        }
    }

    pub fn read(&self, attribute: &str) -> Option<Value> {
        self.attributes
            .iter()
            .find(|(d, _)| d.name == attribute)
            .map(|(_, reader)| reader())
    }
}

impl fmt::Debug for ManagementObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManagementObject")
            .field("name", &self.name)
            .field("description", &self.description)
            .field(
                "attributes",
                &self.attributes.iter().map(|(d, _)| &d.name).collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// Lookup interface over the objects a process exposes
pub trait ManagementRegistry: Send + Sync {
    /// Every registered name, sorted
    fn object_names(&self) -> Vec<ObjectName>;

    fn object_info(&self, name: &ObjectName) -> Result<ObjectInfo, LookupError>;

    fn attribute(&self, name: &ObjectName, attribute: &str) -> Result<Value, LookupError>;
}

/// Thread-safe registry backed by a concurrent map
#[derive(Clone, Default)]
pub struct InMemoryRegistry {
    objects: Arc<DashMap<ObjectName, ManagementObject>>,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an object, returning the one it replaced
    pub fn register(&self, object: ManagementObject) -> Option<ManagementObject> {
        self.objects.insert(object.name().clone(), object)
    }

    pub fn unregister(&self, name: &ObjectName) -> Option<ManagementObject> {
        self.objects.remove(name).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

impl ManagementRegistry for InMemoryRegistry {
    fn object_names(&self) -> Vec<ObjectName> {
        let mut names: Vec<ObjectName> = self.objects.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    fn object_info(&self, name: &ObjectName) -> Result<ObjectInfo, LookupError> {
        self.objects
            .get(name)
            .map(|object| object.info())
            .ok_or_else(|| LookupError::ObjectNotFound(name.clone()))
    }

    fn attribute(&self, name: &ObjectName, attribute: &str) -> Result<Value, LookupError> {
        // Clone out of the map so readers never run under a shard lock
        let object = self
            .objects
            .get(name)
            .map(|object| object.clone())
            .ok_or_else(|| LookupError::ObjectNotFound(name.clone()))?;

        object
            .read(attribute)
            .ok_or_else(|| LookupError::AttributeNotFound {
                object: name.clone(),
                attribute: attribute.to_string(),
            })
    }
}

/// Answer `query` from `registry`. Lookup failures become error results.
pub fn execute(registry: &dyn ManagementRegistry, query: &Query) -> QueryResult {
    match query {
        Query::ListManagementObjects => {
            let names = registry
                .object_names()
                .iter()
                .map(|n| Value::String(n.canonical()))
                .collect();
            QueryResult::single(keys::MBEANS, Value::Array(names))
        }
        Query::DescribeObject { object_name } => match registry.object_info(object_name) {
            Ok(info) => describe_result(info),
            Err(e) => QueryResult::error(e.to_string()),
        },
        Query::GetAttribute {
            object_name,
            attribute,
        } => match registry.attribute(object_name, attribute) {
            Ok(value) => QueryResult::single(keys::VALUE, value),
            Err(e) => QueryResult::error(e.to_string()),
        },
        Query::GetAllAttributes { object_name } => {
            let info = match registry.object_info(object_name) {
                Ok(info) => info,
                Err(e) => return QueryResult::error(e.to_string()),
            };

            let mut attributes = ResponseMap::new();
            for descriptor in info.attributes {
                let value = match registry.attribute(object_name, &descriptor.name) {
                    Ok(value) => value,
                    Err(e) => Value::Object(crate::model::error_map(e.to_string())),
                };
                attributes.insert(descriptor.name, value);
            }

            QueryResult::single(keys::ATTRIBUTES, Value::Object(attributes))
        }
    }
}

fn describe_result(info: ObjectInfo) -> QueryResult {
    let attributes = info
        .attributes
        .into_iter()
        .map(|d| serde_json::to_value(d).unwrap_or(Value::Null))
        .collect();

    let mut map = ResponseMap::new();
    map.insert(keys::ATTRIBUTES.to_string(), Value::Array(attributes));
    map.insert(
        keys::DESCRIPTION.to_string(),
        Value::String(info.description),
    );
    QueryResult::Success(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicU64, Ordering};

    fn name(s: &str) -> ObjectName {
        ObjectName::parse(s).expect("Should parse")
    }

    fn pool_registry(counter: Arc<AtomicU64>) -> InMemoryRegistry {
        let registry = InMemoryRegistry::new();
        registry.register(
            ManagementObject::new(name("app:type=Pool"), "Executor thread pool")
                .with_attribute(
                    AttributeDescriptor::new("Size", "Configured threads", "int"),
                    || json!(8),
                )
                .with_attribute(
                    AttributeDescriptor::new("Reads", "Times this attribute was read", "long"),
                    move || json!(counter.fetch_add(1, Ordering::Relaxed) + 1),
                ),
        );
        registry.register(ManagementObject::new(name("app:type=Cache"), "Cache"));
        registry
    }

    #[test]
    fn test_list_is_sorted() {
        let registry = pool_registry(Arc::new(AtomicU64::new(0)));
        let result = execute(&registry, &Query::ListManagementObjects);
        assert_eq!(
            result.get("mbeans"),
            Some(&json!(["app:type=Cache", "app:type=Pool"]))
        );
    }

    #[test]
    fn test_describe_is_idempotent() {
        let registry = pool_registry(Arc::new(AtomicU64::new(0)));
        let query = Query::DescribeObject {
            object_name: name("app:type=Pool"),
        };

        let first = execute(&registry, &query);
        let second = execute(&registry, &query);
        assert_eq!(first, second);
        assert_eq!(first.get("description"), Some(&json!("Executor thread pool")));
        assert_eq!(
            first.get("attributes").and_then(Value::as_array).map(Vec::len),
            Some(2)
        );
    }

    #[test]
    fn test_values_are_read_fresh() {
        let registry = pool_registry(Arc::new(AtomicU64::new(0)));
        let query = Query::GetAttribute {
            object_name: name("app:type=Pool"),
            attribute: "Reads".to_string(),
        };

        assert_eq!(execute(&registry, &query).get("value"), Some(&json!(1)));
        assert_eq!(execute(&registry, &query).get("value"), Some(&json!(2)));
    }

    #[test]
    fn test_lookup_errors() {
        let registry = pool_registry(Arc::new(AtomicU64::new(0)));

        let missing_object = execute(
            &registry,
            &Query::DescribeObject {
                object_name: name("app:type=Nope"),
            },
        );
        assert_eq!(
            missing_object.error_message(),
            Some("'app:type=Nope' is not a valid mBean name")
        );

        let missing_attr = execute(
            &registry,
            &Query::GetAttribute {
                object_name: name("app:type=Pool"),
                attribute: "Color".to_string(),
            },
        );
        assert_eq!(
            missing_attr.error_message(),
            Some("'Color' is not an attribute of 'app:type=Pool'")
        );
    }

    #[test]
    fn test_get_all_attributes() {
        let registry = pool_registry(Arc::new(AtomicU64::new(0)));
        let result = execute(
            &registry,
            &Query::GetAllAttributes {
                object_name: name("app:type=Pool"),
            },
        );
        assert_eq!(
            result.get("attributes"),
            Some(&json!({"Size": 8, "Reads": 1}))
        );

        let failed = execute(
            &registry,
            &Query::GetAllAttributes {
                object_name: name("app:type=Gone"),
            },
        );
        assert!(failed.get("attributes").is_none());
        assert!(failed.error_message().is_some());
    }

    #[test]
    fn test_unregister() {
        let registry = pool_registry(Arc::new(AtomicU64::new(0)));
        assert_eq!(registry.len(), 2);
        assert!(registry.unregister(&name("app:type=Cache")).is_some());
        assert_eq!(registry.object_names(), vec![name("app:type=Pool")]);
    }
}
