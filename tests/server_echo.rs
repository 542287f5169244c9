//! Ingestion Server Tests
//!
//! Real loopback sockets against both backends:
//! - every completed line is answered with the whole stored log, as of the
//!   write that completed it, even with many clients at once
//! - a received chunk is stored with one write
//! - partial lines are stored but not answered
//! - SEEKTO control lines answer from a record position and are not stored
//! - shutdown releases the backend

use std::time::Duration;

use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use ringlog::config::{Backend, Config};
use ringlog::server::{Server, ServerResult, Sink};

// =============================================================================
// Test Utilities
// =============================================================================

struct Running {
    addr: std::net::SocketAddr,
    sink: Sink,
    stop: oneshot::Sender<()>,
    handle: JoinHandle<ServerResult<()>>,
}

async fn start(config: Config) -> Running {
    let server = Server::bind(config).await.expect("bind loopback");
    let addr = server.local_addr().unwrap();
    let sink = server.sink().clone();
    let (stop, stopped) = oneshot::channel::<()>();

    let handle = tokio::spawn(server.run_until(async move {
        let _ = stopped.await;
    }));

    Running {
        addr,
        sink,
        stop,
        handle,
    }
}

impl Running {
    async fn shutdown(self) -> Sink {
        self.stop.send(()).unwrap();
        self.handle.await.unwrap().unwrap();
        self.sink
    }
}

fn loopback(backend: Backend, capacity: usize) -> Config {
    Config {
        host: "127.0.0.1".into(),
        port: 0,
        backend,
        capacity,
        ..Config::default()
    }
}

async fn send(stream: &mut TcpStream, bytes: &[u8]) {
    stream.write_all(bytes).await.unwrap();
    stream.flush().await.unwrap();
}

async fn expect_reply(stream: &mut TcpStream, expected: &[u8]) {
    let mut buf = vec![0u8; expected.len()];
    tokio::time::timeout(Duration::from_secs(5), stream.read_exact(&mut buf))
        .await
        .expect("reply in time")
        .unwrap();
    assert_eq!(
        String::from_utf8_lossy(&buf),
        String::from_utf8_lossy(expected)
    );
}

/// Read until the reply ends with `suffix`
async fn read_until_suffix(stream: &mut TcpStream, suffix: &[u8]) -> Vec<u8> {
    let mut reply = Vec::new();
    let mut buf = [0u8; 256];
    tokio::time::timeout(Duration::from_secs(5), async {
        while !reply.ends_with(suffix) {
            let n = stream.read(&mut buf).await.unwrap();
            assert!(n > 0, "connection closed before the reply ended");
            reply.extend_from_slice(&buf[..n]);
        }
    })
    .await
    .expect("reply ending with the client's own line");
    reply
}

/// Several clients each send one line at the same time. Returns every
/// client's line with the reply it got.
async fn concurrent_clients(addr: std::net::SocketAddr, clients: usize) -> Vec<(Vec<u8>, Vec<u8>)> {
    let mut tasks = Vec::new();
    for i in 0..clients {
        tasks.push(tokio::spawn(async move {
            let line = format!("client-{:02}\n", i).into_bytes();
            let mut stream = TcpStream::connect(addr).await.unwrap();
            send(&mut stream, &line).await;
            let reply = read_until_suffix(&mut stream, &line).await;
            (line, reply)
        }));
    }

    let mut results = Vec::new();
    for task in tasks {
        results.push(task.await.unwrap());
    }
    results
}

/// Each reply is the log as of its own write: a prefix of the final log
/// ending in the sender's line.
fn assert_replies_are_snapshots(results: &[(Vec<u8>, Vec<u8>)], final_log: &[u8]) {
    for (line, reply) in results {
        assert!(reply.ends_with(line));
        assert!(
            final_log.starts_with(reply),
            "reply {:?} is not a prefix of the final log",
            String::from_utf8_lossy(reply)
        );
    }
}

async fn expect_silence(stream: &mut TcpStream) {
    let mut buf = [0u8; 1];
    let waited = tokio::time::timeout(Duration::from_millis(150), stream.read(&mut buf)).await;
    assert!(waited.is_err(), "server replied unexpectedly");
}

// =============================================================================
// Device Backend
// =============================================================================

#[tokio::test]
async fn test_device_echoes_whole_log_per_line() {
    let running = start(loopback(Backend::Device, 10)).await;
    let mut client = TcpStream::connect(running.addr).await.unwrap();

    send(&mut client, b"AAA\n").await;
    expect_reply(&mut client, b"AAA\n").await;

    send(&mut client, b"BBB\n").await;
    expect_reply(&mut client, b"AAA\nBBB\n").await;

    send(&mut client, b"CC").await;
    expect_silence(&mut client).await;
    send(&mut client, b"C\n").await;
    expect_reply(&mut client, b"AAA\nBBB\nCCC\n").await;

    drop(client);
    running.shutdown().await;
}

#[tokio::test]
async fn test_device_stores_each_chunk_with_one_write() {
    let running = start(loopback(Backend::Device, 10)).await;
    let mut client = TcpStream::connect(running.addr).await.unwrap();

    send(&mut client, b"one\ntwo\nthr").await;
    expect_reply(&mut client, b"one\ntwo\nthr").await;

    match &running.sink {
        Sink::Device(device) => {
            assert_eq!(device.records().await, vec![b"one\ntwo\nthr".to_vec()]);
            assert_eq!(device.pending_len().await, 0);
        }
        Sink::File(_) => panic!("expected device sink"),
    }

    // The whole chunk is one record, so record 1 is the next chunk
    send(&mut client, b"four\n").await;
    expect_reply(&mut client, b"one\ntwo\nthrfour\n").await;
    send(&mut client, b"SEEKTO:1,0\n").await;
    expect_reply(&mut client, b"four\n").await;

    drop(client);
    running.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_device_concurrent_clients_get_consistent_echo() {
    let running = start(loopback(Backend::Device, 16)).await;

    let results = concurrent_clients(running.addr, 12).await;

    let final_log = match &running.sink {
        Sink::Device(device) => device.records().await.concat(),
        Sink::File(_) => panic!("expected device sink"),
    };
    assert_eq!(final_log.len(), 12 * b"client-00\n".len());
    assert_replies_are_snapshots(&results, &final_log);

    running.shutdown().await;
}

#[tokio::test]
async fn test_device_seekto_answers_from_record() {
    let running = start(loopback(Backend::Device, 10)).await;
    let mut client = TcpStream::connect(running.addr).await.unwrap();

    for (line, log) in [
        (&b"AAA\n"[..], &b"AAA\n"[..]),
        (&b"BBB\n"[..], &b"AAA\nBBB\n"[..]),
        (&b"CCC\n"[..], &b"AAA\nBBB\nCCC\n"[..]),
    ] {
        send(&mut client, line).await;
        expect_reply(&mut client, log).await;
    }

    send(&mut client, b"SEEKTO:1,0\n").await;
    expect_reply(&mut client, b"BBB\nCCC\n").await;

    send(&mut client, b"SEEKTO:2,1\n").await;
    expect_reply(&mut client, b"CC\n").await;

    // Out of range: nothing sent, nothing stored
    send(&mut client, b"SEEKTO:9,0\n").await;
    expect_silence(&mut client).await;

    send(&mut client, b"DDD\n").await;
    expect_reply(&mut client, b"AAA\nBBB\nCCC\nDDD\n").await;

    drop(client);
    running.shutdown().await;
}

#[tokio::test]
async fn test_device_evicts_across_connections() {
    let running = start(loopback(Backend::Device, 2)).await;

    let mut first = TcpStream::connect(running.addr).await.unwrap();
    send(&mut first, b"one\n").await;
    expect_reply(&mut first, b"one\n").await;
    drop(first);

    let mut second = TcpStream::connect(running.addr).await.unwrap();
    send(&mut second, b"two\n").await;
    expect_reply(&mut second, b"one\ntwo\n").await;
    send(&mut second, b"three\n").await;
    expect_reply(&mut second, b"two\nthree\n").await;
    drop(second);

    let sink = running.shutdown().await;
    match sink {
        Sink::Device(device) => {
            assert!(device.records().await.is_empty());
            assert_eq!(device.metrics().records_evicted(), 1);
        }
        Sink::File(_) => panic!("expected device sink"),
    }
}

// =============================================================================
// File Backend
// =============================================================================

#[tokio::test]
async fn test_file_backend_keeps_everything_and_cleans_up() {
    let dir = TempDir::new().unwrap();
    let data_file = dir.path().join("ringlogdata");
    let config = Config {
        data_file: data_file.clone(),
        ..loopback(Backend::File, 1)
    };
    let running = start(config).await;
    let mut client = TcpStream::connect(running.addr).await.unwrap();

    send(&mut client, b"one\n").await;
    expect_reply(&mut client, b"one\n").await;
    send(&mut client, b"two\n").await;
    expect_reply(&mut client, b"one\ntwo\n").await;

    // No record structure: control lines are plain data
    send(&mut client, b"SEEKTO:0,0\n").await;
    expect_reply(&mut client, b"one\ntwo\nSEEKTO:0,0\n").await;
    assert!(data_file.exists());

    drop(client);
    running.shutdown().await;
    assert!(!data_file.exists());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_file_backend_concurrent_clients_get_consistent_echo() {
    let dir = TempDir::new().unwrap();
    let data_file = dir.path().join("ringlogdata");
    let config = Config {
        data_file: data_file.clone(),
        ..loopback(Backend::File, 1)
    };
    let running = start(config).await;

    let results = concurrent_clients(running.addr, 12).await;

    let final_log = tokio::fs::read(&data_file).await.unwrap();
    assert_eq!(final_log.len(), 12 * b"client-00\n".len());
    assert_replies_are_snapshots(&results, &final_log);

    running.shutdown().await;
}

// =============================================================================
// Startup Failures
// =============================================================================

#[tokio::test]
async fn test_bind_conflict_reported() {
    let running = start(loopback(Backend::Device, 4)).await;
    let config = Config {
        port: running.addr.port(),
        ..loopback(Backend::Device, 4)
    };

    let err = match Server::bind(config).await {
        Ok(_) => panic!("second bind on the same port should fail"),
        Err(e) => e,
    };
    assert!(!err.is_connection_scoped());

    running.shutdown().await;
}

#[tokio::test]
async fn test_invalid_config_rejected_before_bind() {
    let config = Config {
        capacity: 0,
        ..loopback(Backend::Device, 4)
    };
    assert!(Server::bind(config).await.is_err());
}
