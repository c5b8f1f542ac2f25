//! Integration Tests for the Dispatch Layer
//!
//! Drives the full request/response cycle over TCP against a mock
//! content source: one JSON request per connection, one JSON reply.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::task::JoinHandle;

use wiki_relay::error::{RelayError, Result};
use wiki_relay::source::ContentSource;
use wiki_relay::{Config, RelayServer, WikiRelay};

// == Mock Content Source ==

/// In-memory source; every title matches and page text derives from the
/// title. An optional delay simulates a slow network.
struct MockSource {
    delay: Duration,
    searches: AtomicUsize,
    fetches: AtomicUsize,
}

impl MockSource {
    fn instant() -> Self {
        Self::with_delay(Duration::ZERO)
    }

    fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            searches: AtomicUsize::new(0),
            fetches: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl ContentSource for MockSource {
    async fn search_titles(&self, query: &str, limit: usize) -> Result<Vec<String>> {
        self.searches.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        Ok((0..limit).map(|i| format!("{query} {i}")).collect())
    }

    async fn fetch_page_text(&self, title: &str) -> Result<String> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        if title == "Missing Page" {
            return Err(RelayError::PageMissing(title.to_string()));
        }
        Ok(format!("text of {title}"))
    }
}

// == Helpers ==

struct TestServer {
    addr: SocketAddr,
    handle: JoinHandle<Result<()>>,
    source: Arc<MockSource>,
    _dir: tempfile::TempDir,
}

async fn start_server(source: MockSource) -> TestServer {
    let dir = tempfile::tempdir().unwrap();
    let config = Config {
        snapshot_path: dir
            .path()
            .join("stats.json")
            .to_string_lossy()
            .into_owned(),
        ..Config::default()
    };
    let source = Arc::new(source);
    let relay = Arc::new(WikiRelay::new(&config, source.clone()));

    let server = RelayServer::bind("127.0.0.1:0".parse().unwrap(), relay, 10)
        .await
        .unwrap();
    let addr = server.local_addr().unwrap();
    let handle = tokio::spawn(server.serve());

    TestServer {
        addr,
        handle,
        source,
        _dir: dir,
    }
}

/// One full exchange: connect, send one request line, read the reply.
async fn roundtrip(addr: SocketAddr, request: &str) -> Value {
    let stream = TcpStream::connect(addr).await.unwrap();
    let (read_half, mut write_half) = stream.into_split();

    write_half.write_all(request.as_bytes()).await.unwrap();
    write_half.write_all(b"\n").await.unwrap();

    let mut reply = String::new();
    BufReader::new(read_half)
        .read_line(&mut reply)
        .await
        .unwrap();
    serde_json::from_str(&reply).unwrap()
}

// == Search ==

#[tokio::test]
async fn test_search_success_envelope() {
    let server = start_server(MockSource::instant()).await;

    let reply = roundtrip(
        server.addr,
        r#"{"id":"1","type":"search","query":"rust","limit":2}"#,
    )
    .await;

    assert_eq!(reply["id"], "1");
    assert_eq!(reply["status"], "success");
    let titles = reply["response"].as_array().unwrap();
    assert_eq!(titles.len(), 2);
    assert_eq!(titles[0], "rust 0");
}

#[tokio::test]
async fn test_search_without_query_is_invalid() {
    let server = start_server(MockSource::instant()).await;

    let reply = roundtrip(server.addr, r#"{"id":"2","type":"search"}"#).await;

    assert_eq!(reply["status"], "failed");
    assert_eq!(reply["response"], "Invalid operation");
    assert_eq!(server.source.searches.load(Ordering::SeqCst), 0);
}

// == Get Page ==

#[tokio::test]
async fn test_get_page_success_and_caching() {
    let server = start_server(MockSource::instant()).await;
    let request = r#"{"id":"3","type":"getPage","pageTitle":"Rust"}"#;

    let first = roundtrip(server.addr, request).await;
    assert_eq!(first["status"], "success");
    assert_eq!(first["response"], "text of Rust");

    let second = roundtrip(server.addr, request).await;
    assert_eq!(second["response"], "text of Rust");

    // The second lookup was served from cache.
    assert_eq!(server.source.fetches.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_get_page_source_failure_is_execution_failed() {
    let server = start_server(MockSource::instant()).await;

    let reply = roundtrip(
        server.addr,
        r#"{"id":"4","type":"getPage","pageTitle":"Missing Page"}"#,
    )
    .await;

    assert_eq!(reply["status"], "failed");
    assert_eq!(reply["response"], "Execution failed");
}

// == Statistics Operations ==

#[tokio::test]
async fn test_zeitgeist_orders_queries() {
    let server = start_server(MockSource::instant()).await;

    for request in [
        r#"{"id":"a","type":"search","query":"messi","limit":1}"#,
        r#"{"id":"b","type":"search","query":"ronaldo","limit":1}"#,
        r#"{"id":"c","type":"search","query":"messi","limit":1}"#,
        r#"{"id":"d","type":"search","query":"messi","limit":1}"#,
    ] {
        roundtrip(server.addr, request).await;
    }

    let reply = roundtrip(server.addr, r#"{"id":"z","type":"zeitgeist"}"#).await;

    assert_eq!(reply["status"], "success");
    let top = reply["response"].as_array().unwrap();
    assert_eq!(top[0], "messi");
    assert_eq!(top.len(), 2);
}

#[tokio::test]
async fn test_trending_reports_recent_queries() {
    let server = start_server(MockSource::instant()).await;

    roundtrip(
        server.addr,
        r#"{"id":"a","type":"search","query":"rust","limit":1}"#,
    )
    .await;

    let reply = roundtrip(server.addr, r#"{"id":"t","type":"trending","limit":5}"#).await;

    assert_eq!(reply["status"], "success");
    let trending = reply["response"].as_array().unwrap();
    assert_eq!(trending[0], "rust");
}

#[tokio::test]
async fn test_peak_load_is_string_encoded() {
    let server = start_server(MockSource::instant()).await;

    roundtrip(
        server.addr,
        r#"{"id":"a","type":"search","query":"rust","limit":1}"#,
    )
    .await;
    let reply = roundtrip(server.addr, r#"{"id":"p","type":"peakLoad30s"}"#).await;

    assert_eq!(reply["status"], "success");
    let peak: u64 = reply["response"].as_str().unwrap().parse().unwrap();
    assert!(peak >= 2);
}

// == Failure Envelopes ==

#[tokio::test]
async fn test_unrecognized_operation() {
    let server = start_server(MockSource::instant()).await;

    let reply = roundtrip(server.addr, r#"{"id":"9","type":"flush"}"#).await;

    assert_eq!(reply["id"], "9");
    assert_eq!(reply["status"], "failed");
    assert_eq!(reply["response"], "Invalid operation");
    assert_eq!(server.source.searches.load(Ordering::SeqCst), 0);
    assert_eq!(server.source.fetches.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_malformed_request() {
    let server = start_server(MockSource::instant()).await;

    let reply = roundtrip(server.addr, r#"{"id":"8","type":7}"#).await;

    assert_eq!(reply["id"], "8");
    assert_eq!(reply["status"], "failed");
    assert_eq!(reply["response"], "Invalid operation");
}

#[tokio::test]
async fn test_zero_timeout_always_times_out() {
    let server = start_server(MockSource::with_delay(Duration::from_secs(5))).await;

    let reply = roundtrip(
        server.addr,
        r#"{"id":"7","type":"search","query":"slow","timeout":0}"#,
    )
    .await;

    assert_eq!(reply["id"], "7");
    assert_eq!(reply["status"], "failed");
    assert_eq!(reply["response"], "Operation timed out");
}

#[tokio::test]
async fn test_generous_timeout_still_succeeds() {
    let server = start_server(MockSource::instant()).await;

    let reply = roundtrip(
        server.addr,
        r#"{"id":"6","type":"search","query":"rust","limit":1,"timeout":30}"#,
    )
    .await;

    assert_eq!(reply["status"], "success");
}

// == Stop ==

#[tokio::test]
async fn test_stop_replies_bye_and_terminates() {
    let server = start_server(MockSource::instant()).await;

    let reply = roundtrip(server.addr, r#"{"id":"s","type":"stop"}"#).await;

    assert_eq!(reply["id"], "s");
    assert_eq!(reply["type"], "bye");
    assert!(reply.get("status").is_none());

    // The accept loop observes the stop flag and exits.
    let served = tokio::time::timeout(Duration::from_secs(2), server.handle)
        .await
        .expect("accept loop did not terminate")
        .unwrap();
    assert!(served.is_ok());

    // Statistics were persisted on the way out.
    assert!(server._dir.path().join("stats.json").exists());
}
