use jmxgate_agent::server::start_server;
use jmxgate_common::{
    runtime_object, AttributeDescriptor, Command, InMemoryRegistry, ManagementObject, ObjectName,
    RUNTIME_OBJECT_NAME,
};
use jmxgate_proto::{send_request, WorkerRequest};
use serde_json::{json, Value};
use std::sync::Arc;

fn registry() -> InMemoryRegistry {
    let registry = InMemoryRegistry::new();
    registry.register(runtime_object("jmxgate-agent", "test"));
    registry.register(
        ManagementObject::new(
            ObjectName::parse("worker:type=Executor").expect("Should parse"),
            "Flow executor",
        )
        .with_attribute(
            AttributeDescriptor::new("NumRunningFlows", "Flows in progress", "int"),
            || json!(3),
        )
        .with_attribute(
            AttributeDescriptor::new("Active", "Accepting new flows", "boolean"),
            || json!(true),
        ),
    );
    registry
}

#[tokio::test]
async fn test_agent_answers_protocol_requests() {
    let server = start_server(
        Arc::new(registry()),
        "127.0.0.1:0".parse().expect("Should parse address"),
    )
    .await
    .expect("Should start");
    let addr = server.local_addr.to_string();

    let listing = send_request(&addr, &WorkerRequest::new(Command::ListMbeans))
        .await
        .expect("Should list");
    assert_eq!(
        listing.get("mbeans"),
        Some(&json!([RUNTIME_OBJECT_NAME, "worker:type=Executor"]))
    );

    let all = send_request(
        &addr,
        &WorkerRequest::new(Command::AllMbeanAttributes).with_mbean("worker:type=Executor"),
    )
    .await
    .expect("Should answer");
    assert_eq!(
        Value::Object(all),
        json!({"attributes": {"NumRunningFlows": 3, "Active": true}})
    );

    let missing = send_request(
        &addr,
        &WorkerRequest::new(Command::MbeanInfo).with_mbean("worker:type=Nope"),
    )
    .await
    .expect("Should answer");
    assert_eq!(
        missing.get("error"),
        Some(&json!("'worker:type=Nope' is not a valid mBean name"))
    );

    server.shutdown().await.expect("Should shut down");
}
