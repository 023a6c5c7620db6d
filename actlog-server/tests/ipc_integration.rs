//! Integration tests for the Unix socket IPC server
//!
//! These tests verify:
//! 1. Ping round-trips over length-delimited MessagePack frames
//! 2. ActivityLog requests reach the search cluster and return the merged page
//! 3. Undecodable frames get an error response without dropping the connection

use actlog_core::ipc::{ActlogRequest, ActlogResponse};
use actlog_core::search::{ElasticsearchClient, SearchBackend};
use actlog_core::ActlogConfig;
use actlog_server::server::{frame_codec, run_unix_server};
use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::UnixStream;
use tokio::sync::broadcast;
use tokio_util::codec::Framed;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct TestServer {
    socket_path: String,
    shutdown: broadcast::Sender<()>,
    handle: tokio::task::JoinHandle<anyhow::Result<()>>,
}

impl TestServer {
    async fn start(name: &str, mock_server: &MockServer) -> Self {
        let socket_path = std::env::temp_dir()
            .join(format!("actlog-{}-{}.sock", name, std::process::id()))
            .to_string_lossy()
            .into_owned();

        let config = ActlogConfig::from_toml_str(&format!(
            r#"
            [service]
            socket_path = "{}"

            [search]
            url = "{}"
            "#,
            socket_path,
            mock_server.uri()
        ))
        .unwrap();

        let backend: Arc<dyn SearchBackend> =
            Arc::new(ElasticsearchClient::new(config.search.clone()).unwrap());
        let (shutdown, _rx) = broadcast::channel(1);

        let server_path = socket_path.clone();
        let server_shutdown = shutdown.subscribe();
        let handle = tokio::spawn(async move {
            run_unix_server(&server_path, backend, config, server_shutdown).await
        });

        // Wait for the listener to bind
        for _ in 0..50 {
            if std::path::Path::new(&socket_path).exists() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }

        Self {
            socket_path,
            shutdown,
            handle,
        }
    }

    async fn connect(&self) -> Framed<UnixStream, tokio_util::codec::LengthDelimitedCodec> {
        let stream = UnixStream::connect(&self.socket_path)
            .await
            .expect("Failed to connect to IPC socket");
        Framed::new(stream, frame_codec())
    }

    async fn stop(self) {
        let _ = self.shutdown.send(());
        let result = tokio::time::timeout(Duration::from_secs(5), self.handle)
            .await
            .expect("server did not shut down");
        assert!(result.unwrap().is_ok());
        assert!(!std::path::Path::new(&self.socket_path).exists());
    }
}

async fn roundtrip(
    framed: &mut Framed<UnixStream, tokio_util::codec::LengthDelimitedCodec>,
    payload: Vec<u8>,
) -> ActlogResponse {
    framed.send(Bytes::from(payload)).await.unwrap();
    let frame = framed.next().await.expect("no response frame").unwrap();
    ActlogResponse::from_msgpack(&frame).unwrap()
}

#[tokio::test]
async fn test_ping_over_socket() {
    let mock_server = MockServer::start().await;
    let server = TestServer::start("ping", &mock_server).await;

    let mut framed = server.connect().await;
    let response = roundtrip(&mut framed, ActlogRequest::Ping.to_msgpack().unwrap()).await;

    assert!(response.is_ok());
    assert_eq!(response.data.unwrap()["pong"], true);

    drop(framed);
    server.stop().await;
}

#[tokio::test]
async fn test_activity_log_over_socket() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/.fleet-actions/_search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "hits": { "hits": [
                { "_id": "act-1", "_source": { "action_id": "a1", "@timestamp": "2021-09-01T01:00:00Z" } }
            ] }
        })))
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/.fleet-actions-results/_search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "hits": { "hits": [
                { "_id": "res-1", "_source": { "action_id": "a1", "@timestamp": "2021-09-01T01:00:10Z" } }
            ] }
        })))
        .mount(&mock_server)
        .await;

    let server = TestServer::start("activity", &mock_server).await;
    let mut framed = server.connect().await;

    let request = ActlogRequest::ActivityLog {
        agent_id: "A1".to_string(),
        page: None,
        page_size: Some(2),
    };
    let response = roundtrip(&mut framed, request.to_msgpack().unwrap()).await;

    assert!(response.is_ok(), "error: {:?}", response.error);
    let data = response.data.unwrap();
    assert_eq!(data["page"], 1);
    assert_eq!(data["pageSize"], 2);
    assert_eq!(data["data"][0]["item"]["id"], "res-1");
    assert_eq!(data["data"][1]["item"]["id"], "act-1");

    drop(framed);
    server.stop().await;
}

#[tokio::test]
async fn test_bad_frame_gets_error_and_connection_survives() {
    let mock_server = MockServer::start().await;
    let server = TestServer::start("badframe", &mock_server).await;
    let mut framed = server.connect().await;

    let response = roundtrip(&mut framed, vec![0xc1, 0x00]).await;
    assert!(!response.is_ok());
    assert!(response.error.unwrap().contains("Deserialization error"));

    let response = roundtrip(&mut framed, ActlogRequest::Ping.to_msgpack().unwrap()).await;
    assert!(response.is_ok());

    drop(framed);
    server.stop().await;
}

#[tokio::test]
async fn test_invalid_paging_over_socket() {
    let mock_server = MockServer::start().await;
    let server = TestServer::start("paging", &mock_server).await;
    let mut framed = server.connect().await;

    let request = ActlogRequest::ActivityLog {
        agent_id: "A1".to_string(),
        page: Some(0),
        page_size: None,
    };
    let response = roundtrip(&mut framed, request.to_msgpack().unwrap()).await;
    assert!(!response.is_ok());
    assert!(response.error.unwrap().contains("page"));

    drop(framed);
    server.stop().await;
}
