// Routing between the file handler and the stats endpoint, and a real
// socket round trip through the accept loop

use clap::Parser;
use http_body_util::BodyExt;
use hyper::{Method, Request, StatusCode};
use std::net::SocketAddr;
use std::sync::atomic::AtomicUsize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::task::JoinHandle;

use staticd::cli::Cli;
use staticd::config::{AppState, Config};
use staticd::handler::handle_request;
use staticd::server::{
    create_reusable_listener, start_server_loop, ListenerRole, ServerLoopConfig, SignalHandler,
};

const PEER: &str = "127.0.0.1:40000";

fn state(dir: &tempfile::TempDir, extra: &[&str]) -> Arc<AppState> {
    let root = dir.path().to_str().unwrap();
    let mut argv = vec!["staticd", "--config", "does-not-exist", "--dir", root];
    argv.extend_from_slice(extra);
    let config = Config::load(&Cli::parse_from(argv)).unwrap();
    Arc::new(AppState::new(config).unwrap())
}

async fn call(
    state: &Arc<AppState>,
    role: ListenerRole,
    uri: &str,
) -> (StatusCode, serde_json::Value) {
    let req = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(())
        .unwrap();
    let resp = handle_request(req, Arc::clone(state), role, PEER.parse().unwrap())
        .await
        .unwrap();
    let status = resp.status();
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, json)
}

#[tokio::test]
async fn test_stats_route_on_file_listener() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("a.txt"), "hello").unwrap();
    let state = state(&dir, &[]);

    let (status, _) = call(&state, ListenerRole::Files, "/a.txt").await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = call(&state, ListenerRole::Files, "/missing").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, stats) = call(&state, ListenerRole::Files, "/stats").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["fsCalls"], 2);
    assert_eq!(stats["fsOKResponses"], 1);
    assert_eq!(stats["fsNotFoundResponses"], 1);
    assert_eq!(stats["fsResponseBodyBytes"], 5);

    // Stats requests are not file requests
    let (_, stats) = call(&state, ListenerRole::Files, "/stats?r=fsCalls").await;
    assert_eq!(stats, serde_json::json!({ "fsCalls": 2 }));
}

#[tokio::test]
async fn test_dedicated_stats_listener() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir(dir.path().join("stats")).unwrap();
    std::fs::write(dir.path().join("stats/index.html"), "file named stats").unwrap();
    let state = state(&dir, &["--addr-stats", "127.0.0.1:0"]);

    // With a stats address, /stats on the file listener is just a path
    let (status, json) = call(&state, ListenerRole::Files, "/stats").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, serde_json::Value::Null);

    let (status, stats) = call(&state, ListenerRole::StatsOnly, "/anything").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["fsCalls"], 1);
}

#[tokio::test]
async fn test_stats_disabled() {
    let dir = tempfile::tempdir().unwrap();
    let state = state(&dir, &["--stats", "false"]);

    let (status, _) = call(&state, ListenerRole::Files, "/stats").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

fn spawn_listener(state: &Arc<AppState>) -> (SocketAddr, SignalHandler, JoinHandle<()>) {
    let listener = create_reusable_listener("127.0.0.1:0".parse().unwrap()).unwrap();
    let addr = listener.local_addr().unwrap();
    let signals = SignalHandler::new();
    let server = tokio::spawn(start_server_loop(
        listener,
        Arc::clone(state),
        Arc::new(AtomicUsize::new(0)),
        ServerLoopConfig {
            role: ListenerRole::Files,
            tls: None,
            shutdown: signals.subscribe(),
        },
    ));
    (addr, signals, server)
}

#[tokio::test]
async fn test_socket_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("hello.txt"), "hello over tcp").unwrap();
    let state = state(&dir, &[]);
    let (addr, signals, server) = spawn_listener(&state);

    let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
    stream
        .write_all(b"GET /hello.txt HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
        .await
        .unwrap();
    let mut raw = String::new();
    stream.read_to_string(&mut raw).await.unwrap();

    assert!(raw.starts_with("HTTP/1.1 200 OK\r\n"), "{raw}");
    assert!(raw.ends_with("hello over tcp"));

    signals.trigger();
    server.await.unwrap();
}

#[tokio::test]
async fn test_slow_download_outlives_read_timeout() {
    const SIZE: usize = 8 * 1024 * 1024;
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("large.bin"), vec![7u8; SIZE]).unwrap();

    let root = dir.path().to_str().unwrap();
    let mut config =
        Config::load(&Cli::parse_from(["staticd", "--config", "does-not-exist", "--dir", root]))
            .unwrap();
    config.performance.read_timeout = 1;
    let state = Arc::new(AppState::new(config).unwrap());
    let (addr, signals, server) = spawn_listener(&state);

    let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
    stream
        .write_all(b"GET /large.bin HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
        .await
        .unwrap();

    // 128 reads of 64 KiB, 20ms apart, keep the transfer going well past 1s
    let started = Instant::now();
    let mut raw = Vec::with_capacity(SIZE + 1024);
    let mut chunk = vec![0u8; 64 * 1024];
    loop {
        let n = stream.read(&mut chunk).await.unwrap();
        if n == 0 {
            break;
        }
        raw.extend_from_slice(&chunk[..n]);
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(started.elapsed() > Duration::from_secs(1));

    let head_end = raw.windows(4).position(|w| w == b"\r\n\r\n").unwrap() + 4;
    let head = String::from_utf8_lossy(&raw[..head_end]);
    assert!(head.starts_with("HTTP/1.1 200 OK\r\n"), "{head}");
    assert_eq!(raw.len() - head_end, SIZE);

    signals.trigger();
    server.await.unwrap();
}
