//! WebSocket transport.
//!
//! A supervisor task owns the socket lifecycle: it reacts to connect
//! and retarget commands, cancels the previous session before dialing
//! the new target, and forwards frames and connection changes as
//! [`TransportEvent`]s the embedder drains. The wire protocol itself is
//! opaque here; text frames pass through unparsed.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::{Mutex, mpsc, watch};
use tokio_tungstenite::tungstenite;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::transport::{Transport, TransportError};

/// Keepalive ping interval.
const PING_INTERVAL: Duration = Duration::from_secs(20);

/// Events emitted by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// Handshake completed against this URL.
    Connected { url: String },
    /// A text frame arrived, passed through unparsed.
    Message(String),
    /// The connection to this URL ended (dial failure, close frame,
    /// read error, or retarget teardown).
    Disconnected { url: String },
}

enum Command {
    Connect,
    Retarget(String),
}

/// WebSocket transport targeting one backend at a time.
///
/// Retargeting implicitly closes the previous connection; there is no
/// separate disconnect operation.
pub struct WsTransport {
    cmd_tx: mpsc::Sender<Command>,
    events_rx: Mutex<Option<mpsc::Receiver<TransportEvent>>>,
    status_rx: watch::Receiver<bool>,
    cancel: CancellationToken,
    _supervisor: tokio::task::JoinHandle<()>,
}

impl WsTransport {
    /// Creates the transport targeting `initial_url`. Nothing is dialed
    /// until [`Transport::connect`].
    pub fn new(initial_url: impl Into<String>) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel(16);
        let (events_tx, events_rx) = mpsc::channel(64);
        let (status_tx, status_rx) = watch::channel(false);
        let cancel = CancellationToken::new();

        let supervisor = tokio::spawn(supervisor(
            initial_url.into(),
            cmd_rx,
            events_tx,
            status_tx,
            cancel.clone(),
        ));

        Self {
            cmd_tx,
            events_rx: Mutex::new(Some(events_rx)),
            status_rx,
            cancel,
            _supervisor: supervisor,
        }
    }

    /// Takes the event receiver. Can only be called once.
    pub async fn take_events(&self) -> Option<mpsc::Receiver<TransportEvent>> {
        self.events_rx.lock().await.take()
    }

    /// Tears down the connection and the supervisor task.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

impl Transport for WsTransport {
    async fn connect(&self) -> Result<(), TransportError> {
        self.cmd_tx
            .send(Command::Connect)
            .await
            .map_err(|_| TransportError::Closed)
    }

    async fn update_url(&self, url: &str) -> Result<(), TransportError> {
        self.cmd_tx
            .send(Command::Retarget(url.to_string()))
            .await
            .map_err(|_| TransportError::Closed)
    }

    async fn wait_connected(&self) -> Result<(), TransportError> {
        let mut rx = self.status_rx.clone();
        loop {
            if *rx.borrow_and_update() {
                return Ok(());
            }
            rx.changed().await.map_err(|_| TransportError::Closed)?;
        }
    }
}

impl Drop for WsTransport {
    fn drop(&mut self) {
        self.cancel.cancel();
        self._supervisor.abort();
    }
}

struct Session {
    cancel: CancellationToken,
    _handle: tokio::task::JoinHandle<()>,
}

async fn supervisor(
    mut url: String,
    mut cmd_rx: mpsc::Receiver<Command>,
    events_tx: mpsc::Sender<TransportEvent>,
    status_tx: watch::Sender<bool>,
    cancel: CancellationToken,
) {
    let mut session: Option<Session> = None;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            cmd = cmd_rx.recv() => {
                let Some(cmd) = cmd else { break };
                match cmd {
                    Command::Connect => {
                        // Idempotent: a second connect while a session
                        // exists does nothing.
                        if session.is_none() {
                            session = Some(open_session(&url, &events_tx, &status_tx, &cancel));
                        }
                    }
                    Command::Retarget(new_url) => {
                        if let Some(old) = session.take() {
                            old.cancel.cancel();
                        }
                        debug!(from = %url, to = %new_url, "retargeting connection");
                        url = new_url;
                        session = Some(open_session(&url, &events_tx, &status_tx, &cancel));
                    }
                }
            }
        }
    }

    if let Some(old) = session.take() {
        old.cancel.cancel();
    }
}

fn open_session(
    url: &str,
    events_tx: &mpsc::Sender<TransportEvent>,
    status_tx: &watch::Sender<bool>,
    parent: &CancellationToken,
) -> Session {
    let cancel = parent.child_token();
    let handle = tokio::spawn(run_session(
        url.to_string(),
        events_tx.clone(),
        status_tx.clone(),
        cancel.clone(),
    ));
    Session {
        cancel,
        _handle: handle,
    }
}

async fn run_session(
    url: String,
    events_tx: mpsc::Sender<TransportEvent>,
    status_tx: watch::Sender<bool>,
    cancel: CancellationToken,
) {
    let _ = status_tx.send(false);

    let (ws_stream, _) = match tokio_tungstenite::connect_async(url.as_str()).await {
        Ok(conn) => conn,
        Err(e) => {
            warn!(url = %url, "connection failed: {e}");
            let _ = events_tx.send(TransportEvent::Disconnected { url }).await;
            return;
        }
    };

    // A retarget may have superseded this session mid-dial; the status
    // flag now belongs to the replacement.
    if cancel.is_cancelled() {
        return;
    }

    let _ = status_tx.send(true);
    let _ = events_tx
        .send(TransportEvent::Connected { url: url.clone() })
        .await;

    let (mut write, mut read) = ws_stream.split();
    let mut ping = tokio::time::interval(PING_INTERVAL);
    ping.tick().await; // first tick fires immediately

    let mut superseded = false;
    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                let _ = write.send(tungstenite::Message::Close(None)).await;
                superseded = true;
                break;
            }
            _ = ping.tick() => {
                if write.send(tungstenite::Message::Ping(vec![].into())).await.is_err() {
                    break;
                }
            }
            msg = read.next() => match msg {
                Some(Ok(tungstenite::Message::Text(text))) => {
                    let _ = events_tx
                        .send(TransportEvent::Message(text.as_str().to_string()))
                        .await;
                }
                Some(Ok(tungstenite::Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!(url = %url, "read error: {e}");
                    break;
                }
            }
        }
    }

    // A superseded session leaves the status flag to its replacement.
    if !superseded {
        let _ = status_tx.send(false);
    }
    let _ = events_tx.send(TransportEvent::Disconnected { url }).await;
}

#[cfg(test)]
mod tests {
    use super::*;

    use tokio::net::TcpListener;

    const EVENT_TIMEOUT: Duration = Duration::from_secs(5);

    async fn next_event(rx: &mut mpsc::Receiver<TransportEvent>) -> TransportEvent {
        tokio::time::timeout(EVENT_TIMEOUT, rx.recv())
            .await
            .expect("timed out waiting for transport event")
            .expect("event channel closed")
    }

    /// Spawns a WebSocket server that greets every client with a text
    /// frame, then drains until close.
    async fn spawn_ws_server(greeting: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                tokio::spawn(async move {
                    if let Ok(mut ws) = tokio_tungstenite::accept_async(stream).await {
                        let _ = ws.send(tungstenite::Message::Text(greeting.into())).await;
                        while let Some(Ok(msg)) = ws.next().await {
                            if msg.is_close() {
                                break;
                            }
                        }
                    }
                });
            }
        });
        format!("ws://{addr}/api")
    }

    #[tokio::test]
    async fn dial_failure_emits_disconnected() {
        let url = "ws://127.0.0.1:1/api";
        let transport = WsTransport::new(url);
        let mut events = transport.take_events().await.unwrap();

        transport.connect().await.unwrap();

        match next_event(&mut events).await {
            TransportEvent::Disconnected { url: u } => assert_eq!(u, url),
            other => panic!("expected Disconnected, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn take_events_once() {
        let transport = WsTransport::new("ws://127.0.0.1:1/api");
        assert!(transport.take_events().await.is_some());
        assert!(transport.take_events().await.is_none());
    }

    #[tokio::test]
    async fn connect_then_retarget() {
        let url_a = spawn_ws_server("hello from a").await;
        let url_b = spawn_ws_server("hello from b").await;

        let transport = WsTransport::new(url_a.clone());
        let mut events = transport.take_events().await.unwrap();

        transport.connect().await.unwrap();
        assert_eq!(
            next_event(&mut events).await,
            TransportEvent::Connected { url: url_a.clone() }
        );
        assert_eq!(
            next_event(&mut events).await,
            TransportEvent::Message("hello from a".into())
        );

        transport.update_url(&url_b).await.unwrap();

        // The old session winds down and the new one comes up; exact
        // interleaving of the teardown events is not fixed.
        loop {
            match next_event(&mut events).await {
                TransportEvent::Connected { url } if url == url_b => break,
                TransportEvent::Disconnected { url } => assert_eq!(url, url_a),
                TransportEvent::Message(m) => assert_eq!(m, "hello from a"),
                other => panic!("unexpected event {other:?}"),
            }
        }
        assert_eq!(
            next_event(&mut events).await,
            TransportEvent::Message("hello from b".into())
        );

        transport.shutdown();
    }

    #[tokio::test]
    async fn connect_is_idempotent() {
        let url = spawn_ws_server("hi").await;
        let transport = WsTransport::new(url.clone());
        let mut events = transport.take_events().await.unwrap();

        transport.connect().await.unwrap();
        transport.connect().await.unwrap();
        transport.wait_connected().await.unwrap();

        assert_eq!(
            next_event(&mut events).await,
            TransportEvent::Connected { url: url.clone() }
        );
        assert_eq!(
            next_event(&mut events).await,
            TransportEvent::Message("hi".into())
        );
        // No second Connected from the duplicate connect.
        let extra = tokio::time::timeout(Duration::from_millis(200), events.recv()).await;
        assert!(extra.is_err(), "unexpected event {extra:?}");
    }
}
