//! Raw socket adapter.
//!
//! Every call opens a fresh TCP connection, writes exactly one message,
//! and waits for exactly one response chunk. The protocol is not framed:
//! the first data read terminates the wait, and multi-chunk responses are
//! intentionally not reassembled. The whole round trip runs under a
//! timeout; on expiry the connection is dropped with the future.

use crate::models::message::MessageRecord;
use chrono::{SecondsFormat, Utc};
use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time;
use tracing::debug;

/// Most-recent entries kept in the in-memory history.
const HISTORY_CAP: usize = 50;

const PROBE_TIMEOUT: Duration = Duration::from_secs(5);
const SEND_TIMEOUT: Duration = Duration::from_secs(10);

const READ_CHUNK: usize = 4096;

#[derive(Debug, Error)]
pub enum SocketError {
    /// No response arrived within the per-call limit.
    #[error("Connection timeout")]
    Timeout,

    #[error("connect failed: {0}")]
    Connect(io::Error),

    #[error("socket I/O failed: {0}")]
    Io(io::Error),

    /// Peer closed the connection before sending any data.
    #[error("connection closed before any response")]
    ClosedEarly,
}

pub type SocketResult<T> = Result<T, SocketError>;

/// Bounded newest-first history of socket exchanges.
///
/// The one piece of shared mutable state in the gateway. The mutex is held
/// only for the push/snapshot/clear critical sections, never across an
/// await point.
#[derive(Clone, Default)]
pub struct MessageHistory {
    inner: Arc<Mutex<VecDeque<MessageRecord>>>,
}

impl MessageHistory {
    pub fn push(&self, record: MessageRecord) {
        let mut history = self.inner.lock().expect("history lock poisoned");
        history.push_front(record);
        history.truncate(HISTORY_CAP);
    }

    /// Current entries, newest first.
    pub fn snapshot(&self) -> Vec<MessageRecord> {
        let history = self.inner.lock().expect("history lock poisoned");
        history.iter().cloned().collect()
    }

    /// Empty the history, returning how many entries were removed.
    pub fn clear(&self) -> usize {
        let mut history = self.inner.lock().expect("history lock poisoned");
        let removed = history.len();
        history.clear();
        removed
    }
}

/// One-shot TCP client for the line-oriented echo server.
#[derive(Clone)]
pub struct SocketService {
    addr: String,
    probe_timeout: Duration,
    send_timeout: Duration,
    history: MessageHistory,
}

impl SocketService {
    pub fn new(addr: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            probe_timeout: PROBE_TIMEOUT,
            send_timeout: SEND_TIMEOUT,
            history: MessageHistory::default(),
        }
    }

    /// Shrink the per-call timeouts. Used by tests against silent stubs.
    pub fn with_timeouts(mut self, probe: Duration, send: Duration) -> Self {
        self.probe_timeout = probe;
        self.send_timeout = send;
        self
    }

    /// `host:port` of the configured socket server.
    pub fn server_info(&self) -> &str {
        &self.addr
    }

    /// Connectivity probe: send `ping`, wait for whatever comes back.
    /// Not recorded in history.
    pub async fn probe(&self) -> SocketResult<String> {
        self.roundtrip("ping", self.probe_timeout).await
    }

    /// Send a raw message and record the exchange in history on success.
    pub async fn send(&self, message: &str, client_info: &str) -> SocketResult<MessageRecord> {
        let response = self.roundtrip(message, self.send_timeout).await?;

        let record = MessageRecord {
            id: Utc::now().timestamp_millis(),
            message: message.to_string(),
            response,
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            client_info: client_info.to_string(),
        };
        self.history.push(record.clone());
        Ok(record)
    }

    /// Send `echo <text>` with the shorter timeout. Not recorded.
    pub async fn echo(&self, text: &str) -> SocketResult<String> {
        let command = format!("echo {}", text);
        self.roundtrip(&command, self.probe_timeout).await
    }

    pub fn messages(&self) -> Vec<MessageRecord> {
        self.history.snapshot()
    }

    pub fn clear_messages(&self) -> usize {
        self.history.clear()
    }

    /// Connect, write one message, read one chunk. Dropping the future on
    /// timeout tears the connection down.
    async fn roundtrip(&self, message: &str, limit: Duration) -> SocketResult<String> {
        let attempt = async {
            let mut stream = TcpStream::connect(&self.addr)
                .await
                .map_err(SocketError::Connect)?;
            debug!("connected to {}, sending {} bytes", self.addr, message.len());

            stream
                .write_all(message.as_bytes())
                .await
                .map_err(SocketError::Io)?;

            let mut buf = vec![0u8; READ_CHUNK];
            let n = stream.read(&mut buf).await.map_err(SocketError::Io)?;
            if n == 0 {
                return Err(SocketError::ClosedEarly);
            }
            Ok(String::from_utf8_lossy(&buf[..n]).into_owned())
        };

        match time::timeout(limit, attempt).await {
            Ok(result) => result,
            Err(_) => Err(SocketError::Timeout),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::SocketAddr;
    use tokio::net::TcpListener;

    /// Stub that echoes every connection's first read back at it.
    async fn spawn_echo_stub() -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            loop {
                let (mut socket, _) = match listener.accept().await {
                    Ok(pair) => pair,
                    Err(_) => break,
                };
                tokio::spawn(async move {
                    let mut buf = vec![0u8; 1024];
                    if let Ok(n) = socket.read(&mut buf).await {
                        let _ = socket.write_all(&buf[..n]).await;
                    }
                });
            }
        });
        addr
    }

    /// Stub that accepts, reads, and never answers.
    async fn spawn_silent_stub() -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            loop {
                let (mut socket, _) = match listener.accept().await {
                    Ok(pair) => pair,
                    Err(_) => break,
                };
                tokio::spawn(async move {
                    let mut buf = vec![0u8; 1024];
                    let _ = socket.read(&mut buf).await;
                    time::sleep(Duration::from_secs(60)).await;
                });
            }
        });
        addr
    }

    /// Stub that closes every connection immediately.
    async fn spawn_closing_stub() -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            loop {
                match listener.accept().await {
                    Ok((socket, _)) => drop(socket),
                    Err(_) => break,
                }
            }
        });
        addr
    }

    fn record(id: i64) -> MessageRecord {
        MessageRecord {
            id,
            message: format!("msg {}", id),
            response: "ok".into(),
            timestamp: "2026-01-01T00:00:00.000Z".into(),
            client_info: "test".into(),
        }
    }

    #[tokio::test]
    async fn send_roundtrips_and_records_history() {
        let addr = spawn_echo_stub().await;
        let service = SocketService::new(addr.to_string());

        let result = service.send("hello there", "127.0.0.1").await.unwrap();
        assert_eq!(result.response, "hello there");
        assert_eq!(result.client_info, "127.0.0.1");

        let messages = service.messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].message, "hello there");
    }

    #[tokio::test]
    async fn echo_prefixes_and_skips_history() {
        let addr = spawn_echo_stub().await;
        let service = SocketService::new(addr.to_string());

        let response = service.echo("ping me").await.unwrap();
        assert_eq!(response, "echo ping me");
        assert!(service.messages().is_empty());
    }

    #[tokio::test]
    async fn probe_sends_ping() {
        let addr = spawn_echo_stub().await;
        let service = SocketService::new(addr.to_string());

        assert_eq!(service.probe().await.unwrap(), "ping");
        assert!(service.messages().is_empty());
    }

    #[tokio::test]
    async fn silent_server_times_out() {
        let addr = spawn_silent_stub().await;
        let service = SocketService::new(addr.to_string())
            .with_timeouts(Duration::from_millis(100), Duration::from_millis(100));

        let err = service.send("anyone?", "test").await.unwrap_err();
        assert!(matches!(err, SocketError::Timeout));
        assert!(service.messages().is_empty());
    }

    #[tokio::test]
    async fn immediate_close_is_not_a_timeout() {
        let addr = spawn_closing_stub().await;
        let service = SocketService::new(addr.to_string());

        let err = service.probe().await.unwrap_err();
        assert!(matches!(
            err,
            SocketError::ClosedEarly | SocketError::Io(_)
        ));
    }

    #[tokio::test]
    async fn unreachable_server_is_a_connect_error() {
        // Port 1 on localhost is essentially never listening.
        let service = SocketService::new("127.0.0.1:1")
            .with_timeouts(Duration::from_millis(500), Duration::from_millis(500));
        let err = service.probe().await.unwrap_err();
        assert!(matches!(err, SocketError::Connect(_) | SocketError::Timeout));
    }

    #[test]
    fn history_caps_at_fifty_newest_first() {
        let history = MessageHistory::default();
        for id in 1..=51 {
            history.push(record(id));
        }

        let messages = history.snapshot();
        assert_eq!(messages.len(), HISTORY_CAP);
        assert_eq!(messages[0].id, 51);
        assert_eq!(messages.last().unwrap().id, 2);
        assert!(messages.iter().all(|m| m.id != 1));
    }

    #[test]
    fn clear_reports_count_and_empties() {
        let history = MessageHistory::default();
        for id in 0..5 {
            history.push(record(id));
        }

        assert_eq!(history.clear(), 5);
        assert!(history.snapshot().is_empty());
        assert_eq!(history.clear(), 0);
    }
}
