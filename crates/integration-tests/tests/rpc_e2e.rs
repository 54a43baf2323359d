//! End-to-end over JSON-RPC
//!
//! Real server on an ephemeral port, in-memory store and cache, short
//! completion delay, jsonrpsee HTTP client.

use ingestion_api_rpc::types::{METHOD_GET_STATUS, METHOD_INGEST_EVENT};
use ingestion_api_rpc::{RpcServer, RpcServerConfig};
use ingestion_core::application::{
    shutdown_channel, CompletionScheduler, IngestionService, JobStatusTracker, ShutdownSender,
    TrackerConfig,
};
use ingestion_core::port::{JobStore, StatusCache, SystemTimeProvider, UuidProvider};
use ingestion_infra_memory::{InMemoryJobStore, InMemoryStatusCache};
use jsonrpsee::core::client::ClientT;
use jsonrpsee::core::params::ObjectParams;
use jsonrpsee::http_client::{HttpClient, HttpClientBuilder};
use jsonrpsee::server::ServerHandle;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

const COMPLETION_DELAY: Duration = Duration::from_millis(300);

struct TestServer {
    client: HttpClient,
    handle: ServerHandle,
    _shutdown: ShutdownSender,
}

async fn start() -> TestServer {
    let time_provider = Arc::new(SystemTimeProvider);
    let tracker = Arc::new(JobStatusTracker::new(
        Some(Arc::new(InMemoryJobStore::new(time_provider.clone())) as Arc<dyn JobStore>),
        Some(Arc::new(InMemoryStatusCache::new()) as Arc<dyn StatusCache>),
        Arc::new(UuidProvider),
        time_provider,
        TrackerConfig::default(),
    ));
    let (tx, token) = shutdown_channel();
    let scheduler = Arc::new(CompletionScheduler::new(
        tracker.clone(),
        COMPLETION_DELAY,
        token,
    ));
    let service = Arc::new(IngestionService::new(tracker, scheduler));

    let config = RpcServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
    };
    let (handle, addr) = RpcServer::new(config, service).start().await.unwrap();
    let client = HttpClientBuilder::default()
        .build(format!("http://{}", addr))
        .unwrap();

    TestServer {
        client,
        handle,
        _shutdown: tx,
    }
}

fn object(value: Value) -> ObjectParams {
    let mut params = ObjectParams::new();
    if let Value::Object(map) = value {
        for (key, value) in map {
            params.insert(&key, value).unwrap();
        }
    }
    params
}

impl TestServer {
    async fn ingest(&self, params: Value) -> Value {
        self.client
            .request(METHOD_INGEST_EVENT, object(params))
            .await
            .unwrap()
    }

    async fn status(&self, job_id: &str) -> String {
        let resp: Value = self
            .client
            .request(METHOD_GET_STATUS, object(json!({ "job_id": job_id })))
            .await
            .unwrap();
        resp["status"].as_str().unwrap().to_string()
    }

    /// Poll until done, like the manual client does
    async fn wait_done(&self, job_id: &str) {
        let poll = async {
            loop {
                if self.status(job_id).await == "done" {
                    return;
                }
                tokio::time::sleep(Duration::from_millis(50)).await;
            }
        };
        tokio::time::timeout(Duration::from_secs(5), poll)
            .await
            .expect("job never reached done");
    }
}

#[tokio::test]
async fn test_ingest_then_poll_until_done() {
    let server = start().await;

    let ack = server
        .ingest(json!({
            "event_id": "evt-123",
            "payload": "{\"type\":\"user_signup\"}",
            "timestamp": 1700000000
        }))
        .await;
    assert_eq!(ack["accepted"], true);
    assert_eq!(ack["message"], "Event received successfully");
    let job_id = ack["job_id"].as_str().unwrap().to_string();
    assert!(uuid::Uuid::parse_str(&job_id).is_ok());

    assert_eq!(server.status(&job_id).await, "processing");
    server.wait_done(&job_id).await;
    assert_eq!(server.status(&job_id).await, "done");

    server.handle.stop().unwrap();
}

#[tokio::test]
async fn test_empty_event_id_over_the_wire() {
    let server = start().await;

    let ack = server
        .ingest(json!({ "event_id": "", "payload": "x", "timestamp": 0 }))
        .await;

    assert_eq!(
        ack,
        json!({ "accepted": false, "message": "No event id received", "job_id": "" })
    );

    server.handle.stop().unwrap();
}

#[tokio::test]
async fn test_nonexistent_job_over_the_wire() {
    let server = start().await;

    assert_eq!(server.status("nonexistent").await, "not found");
    assert_eq!(server.status("").await, "not found");

    server.handle.stop().unwrap();
}

#[tokio::test]
async fn test_concurrent_clients() {
    let server = Arc::new(start().await);

    let mut tasks = Vec::new();
    for i in 0..10 {
        let server = server.clone();
        tasks.push(tokio::spawn(async move {
            let ack = server
                .ingest(json!({ "event_id": format!("evt-{}", i), "payload": "x", "timestamp": i }))
                .await;
            let job_id = ack["job_id"].as_str().unwrap().to_string();
            server.wait_done(&job_id).await;
            job_id
        }));
    }

    let mut ids = Vec::new();
    for task in tasks {
        ids.push(task.await.unwrap());
    }
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 10);

    server.handle.stop().unwrap();
}

#[tokio::test]
async fn test_unknown_method_is_protocol_error() {
    let server = start().await;

    let result: Result<Value, _> = server
        .client
        .request("events.delete.v1", object(json!({ "job_id": "x" })))
        .await;
    assert!(result.is_err());

    server.handle.stop().unwrap();
}
