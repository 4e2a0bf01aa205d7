//! Built-in `jmxgate:type=Runtime` object registered by every process

use crate::model::AttributeDescriptor;
use crate::object_name::ObjectName;
use crate::registry::ManagementObject;
use serde_json::json;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

pub const RUNTIME_OBJECT_NAME: &str = "jmxgate:type=Runtime";

/// Describe the current process. `component` and `version` identify the
/// binary that registers it.
pub fn runtime_object(component: &str, version: &str) -> ManagementObject {
    let started = Instant::now();
    let start_time_ms = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0);
    let component = component.to_string();
    let version = version.to_string();

    let name = match ObjectName::parse(RUNTIME_OBJECT_NAME) {
        Ok(name) => name,
        Err(e) => unreachable!("built-in object name is valid: {e}"),
    };

    ManagementObject::new(name, "Runtime information for this process")
        .with_attribute(
            AttributeDescriptor::new("Name", "Component name", "java.lang.String"),
            move || json!(component),
        )
        .with_attribute(
            AttributeDescriptor::new("Version", "Component version", "java.lang.String"),
            move || json!(version),
        )
        .with_attribute(
            AttributeDescriptor::new("Pid", "Operating system process id", "int"),
            || json!(std::process::id()),
        )
        .with_attribute(
            AttributeDescriptor::new("StartTime", "Start time in unix milliseconds", "long"),
            move || json!(start_time_ms),
        )
        .with_attribute(
            AttributeDescriptor::new("Uptime", "Milliseconds since start", "long"),
            move || json!(started.elapsed().as_millis() as u64),
        )
}
