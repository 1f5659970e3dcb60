//! End-to-end dispatch tests against a mock HTTP gate.
//!
//! Each test builds a real `Dispatcher` (reqwest client included) pointed at
//! a `wiremock` server or a raw TCP listener and checks both the outcome and
//! what the gate actually received.

use std::sync::Once;
use std::time::Duration;

use cmdgate_core::{
    ConfigError, DispatchOutcome, Dispatcher, DispatcherConfig, GateClientConfig, MemoryPacket,
};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

static TRACING: Once = Once::new();

fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("cmdgate_core=debug")
            .with_test_writer()
            .try_init();
    });
}

fn gate_for(server: &MockServer) -> Dispatcher {
    init_tracing();
    // Strip the scheme so the normalizer has to restore it.
    let raw = format!("{}/authorize", server.uri().trim_start_matches("http://"));
    Dispatcher::new(DispatcherConfig::new(raw).with_identity("op-7")).unwrap()
}

fn collect() -> MemoryPacket {
    MemoryPacket::command("INST", "COLLECT", 0x1801, 5)
}

// ─────────────────────────────────────────────────────────────────────────────
// Allowed
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_allowed_command_is_annotated() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/authorize"))
        .and(header("content-type", "application/json"))
        .and(body_json(serde_json::json!({
            "keycloak_id": "op-7",
            "target": "INST",
            "packet_name": "COLLECT",
            "stream_id": 6145,
            "function_code": 5
        })))
        .respond_with(ResponseTemplate::new(200).set_body_string("OK"))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = gate_for(&server).on_write(collect()).await.unwrap();

    let packet = outcome.into_packet().expect("command should continue");
    assert_eq!(packet.bytes("SER_CMD"), Some(&b"OK"[..]));
}

#[tokio::test]
async fn test_binary_token_written_verbatim() {
    let token = vec![0x00, 0xde, 0xad, 0xbe, 0xef, 0xff];
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(201)
                .insert_header("content-type", "application/octet-stream")
                .set_body_bytes(token.clone()),
        )
        .mount(&server)
        .await;

    let outcome = gate_for(&server).on_write(collect()).await.unwrap();

    let packet = outcome.into_packet().unwrap();
    assert_eq!(packet.bytes("SER_CMD"), Some(&token[..]));
}

// ─────────────────────────────────────────────────────────────────────────────
// No-op bypass
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_noop_never_reaches_gate() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let packet = MemoryPacket::command("INST", "NOOP", 0x1801, 1);
    let outcome = gate_for(&server).on_write(packet.clone()).await.unwrap();

    assert_eq!(outcome, DispatchOutcome::Continue(packet));
}

// ─────────────────────────────────────────────────────────────────────────────
// Denied and unreachable
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_forbidden_stops_exactly_once() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(403).set_body_string("operator not cleared"))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = gate_for(&server).on_write(collect()).await.unwrap();

    assert!(outcome.is_stop());
}

#[tokio::test]
async fn test_redirect_to_allowing_page_stops() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/authorize"))
        .respond_with(ResponseTemplate::new(302).insert_header("location", "/elsewhere"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(path("/elsewhere"))
        .respond_with(ResponseTemplate::new(200).set_body_string("OK"))
        .expect(0)
        .mount(&server)
        .await;

    let outcome = gate_for(&server).on_write(collect()).await.unwrap();

    assert!(outcome.is_stop());
    let received = server.received_requests().await.unwrap_or_default();
    assert_eq!(received.len(), 1);
}

#[tokio::test]
async fn test_server_error_stops() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_bytes(vec![0xff; 16]))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = gate_for(&server).on_write(collect()).await.unwrap();

    assert!(outcome.is_stop());
}

#[tokio::test]
async fn test_slow_gate_times_out_and_stops() {
    init_tracing();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("too late")
                .set_delay(Duration::from_secs(3)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let config = DispatcherConfig {
        client: GateClientConfig {
            timeout: Duration::from_millis(250),
            ..GateClientConfig::default()
        },
        ..DispatcherConfig::new(format!("{}/authorize", server.uri()))
    };
    let gate = Dispatcher::new(config).unwrap();

    let outcome = gate.on_write(collect()).await.unwrap();

    assert!(outcome.is_stop());
}

#[tokio::test]
async fn test_truncated_response_stops() {
    init_tracing();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buffer = vec![0u8; 4096];
        let _ = socket.read(&mut buffer).await.unwrap();

        // Promise 64 bytes, deliver 7, hang up.
        let response = b"HTTP/1.1 200 OK\r\n\
                        Content-Length: 64\r\n\
                        \r\n\
                        partial";
        socket.write_all(response).await.unwrap();
        socket.shutdown().await.unwrap();
    });

    let gate = Dispatcher::new(DispatcherConfig::new(format!("{addr}/authorize"))).unwrap();
    let outcome = gate.on_write(collect()).await.unwrap();

    assert!(outcome.is_stop());
}

// ─────────────────────────────────────────────────────────────────────────────
// Configuration failures
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_empty_endpoint_fails_construction() {
    let result = Dispatcher::new(DispatcherConfig::new(""));
    assert!(matches!(result, Err(ConfigError::EmptyEndpoint)));
}

#[tokio::test]
async fn test_annotation_overflow_stops() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("a-very-long-signature"))
        .expect(1)
        .mount(&server)
        .await;

    let packet = MemoryPacket::new("INST", "COLLECT")
        .with_integer("CCSDS_STREAMID", 16, false, 0x1801)
        .with_integer("CCSDS_FC", 7, false, 5)
        .with_block("SER_CMD", Some(8));
    let outcome = gate_for(&server).on_write(packet).await.unwrap();

    assert!(outcome.is_stop());
}
