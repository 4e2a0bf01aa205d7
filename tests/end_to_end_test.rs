use jmxgate::access::{AccessGate, Permission, Role, StaticRoleStore};
use jmxgate::directory::FleetDirectory;
use jmxgate::remote::TcpWorkerClient;
use jmxgate::stats::QueryStats;
use jmxgate::{Coordinator, QueryParams};
use jmxgate_common::{
    execute, AttributeDescriptor, CallerIdentity, InMemoryRegistry, ManagementObject, ObjectName,
    ResponseMap, WorkerEndpoint,
};
use jmxgate_proto::{serve_connection, RequestHandler, WorkerRequest};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

/// Worker that answers listings with fixed names
struct FixedListing(Vec<&'static str>);

impl RequestHandler for FixedListing {
    fn handle(&self, _request: WorkerRequest) -> ResponseMap {
        let mut map = ResponseMap::new();
        map.insert("mbeans".to_string(), json!(self.0));
        map
    }
}

/// Worker that answers from a real registry
struct RegistryWorker(InMemoryRegistry);

impl RequestHandler for RegistryWorker {
    fn handle(&self, request: WorkerRequest) -> ResponseMap {
        match request.to_query() {
            Some(Ok(query)) => execute(&self.0, &query).into_map(),
            _ => jmxgate_common::error_map("unsupported"),
        }
    }
}

async fn spawn_worker<H: RequestHandler>(handler: H) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("Should bind");
    let addr = listener.local_addr().expect("Should have address").to_string();
    let handler = Arc::new(handler);

    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            tokio::spawn(serve_connection(stream, Arc::clone(&handler)));
        }
    });

    addr
}

/// Accepts connections and never answers
async fn spawn_silent_worker() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("Should bind");
    let addr = listener.local_addr().expect("Should have address").to_string();

    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((stream, _)) = listener.accept().await {
            held.push(stream);
        }
    });

    addr
}

fn coordinator(workers: Vec<WorkerEndpoint>, timeout: Duration) -> Coordinator {
    let gate = AccessGate::new(Arc::new(StaticRoleStore::new([Role::new(
        "admin",
        [Permission::Admin],
    )])));

    Coordinator::new(
        gate,
        Arc::new(InMemoryRegistry::new()),
        Arc::new(FleetDirectory::from_endpoints(workers)),
        Arc::new(TcpWorkerClient::new(timeout)),
        QueryStats::new(),
    )
}

fn admin() -> CallerIdentity {
    CallerIdentity::new("ops", ["admin"])
}

#[tokio::test]
async fn test_fan_out_with_one_worker_timing_out() {
    let host_a = spawn_worker(FixedListing(vec!["obj1", "obj2"])).await;
    let host_b = spawn_silent_worker().await;

    let coordinator = coordinator(
        vec![
            WorkerEndpoint::new(host_a.clone(), true),
            WorkerEndpoint::new(host_b.clone(), false),
        ],
        Duration::from_millis(200),
    );

    let response = coordinator
        .handle(&admin(), &QueryParams::new("list-mbeans").host_port("*"))
        .await;

    let mut expected = ResponseMap::new();
    expected.insert(host_a, json!(["obj1", "obj2"]));
    expected.insert(
        host_b.clone(),
        json!({"error": format!("Cannot contact worker {}: timed out after 200 ms", host_b)}),
    );
    assert_eq!(response, expected);
}

#[tokio::test]
async fn test_remote_queries_against_real_registry() {
    let registry = InMemoryRegistry::new();
    registry.register(
        ManagementObject::new(
            ObjectName::parse("exec:type=Flows").expect("Should parse"),
            "Flow counters",
        )
        .with_attribute(
            AttributeDescriptor::new("Running", "Running flows", "int"),
            || json!(2),
        )
        .with_attribute(
            AttributeDescriptor::new("Queued", "Queued flows", "int"),
            || json!(5),
        ),
    );
    let host = spawn_worker(RegistryWorker(registry)).await;
    let coordinator = coordinator(
        vec![WorkerEndpoint::new(host.clone(), true)],
        Duration::from_secs(2),
    );

    let value = coordinator
        .handle(
            &admin(),
            &QueryParams::new("mbean-attribute")
                .mbean("exec:type=Flows")
                .attribute("Queued")
                .host_port(host.clone()),
        )
        .await;
    assert_eq!(Value::Object(value), json!({"value": 5}));

    let per_attribute = coordinator
        .handle(
            &admin(),
            &QueryParams::new("all-mbean-attributes")
                .mbean("exec:type=Flows")
                .host_port(host.clone()),
        )
        .await;
    let single_call = coordinator
        .handle(
            &admin(),
            &QueryParams::new("all-executor-attributes")
                .mbean("exec:type=Flows")
                .host_port(host.clone()),
        )
        .await;

    let expected = json!({"attributes": {"Running": 2, "Queued": 5}});
    assert_eq!(Value::Object(per_attribute), expected);
    assert_eq!(Value::Object(single_call), expected);
    // mbean-attribute, then describe + 2 fetches, then one bulk call
    assert_eq!(coordinator.stats().worker_calls(), 5);
    assert_eq!(coordinator.stats().worker_failures(), 0);
}

#[tokio::test]
async fn test_every_worker_down_is_still_well_formed() {
    let down_a = {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("Should bind");
        listener.local_addr().expect("Should have address").to_string()
    };
    let down_b = {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("Should bind");
        listener.local_addr().expect("Should have address").to_string()
    };

    let coordinator = coordinator(
        vec![
            WorkerEndpoint::new(down_a.clone(), true),
            WorkerEndpoint::new(down_b.clone(), true),
        ],
        Duration::from_secs(2),
    );

    let response = coordinator
        .handle(&admin(), &QueryParams::new("list-mbeans").host_port("*"))
        .await;

    assert_eq!(response.len(), 2);
    for host in [&down_a, &down_b] {
        let message = response[host.as_str()]["error"]
            .as_str()
            .expect("Should be an error entry");
        assert!(message.starts_with(&format!("Cannot contact worker {}", host)));
    }
}
