//! Connection lifecycle: connect, read loop, fixed-delay reconnect.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::io::AsyncReadExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::endpoint::UpstreamEndpoint;
use super::frame::FrameDecoder;
use super::message::{decode, Decoded};
use crate::port::outbound::upstream::{UpstreamEvent, UpstreamLink};

/// Delay between a lost connection and the next attempt.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(2);

const READ_BUF: usize = 8 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Connecting,
    Connected,
}

struct LinkState {
    phase: Phase,
    closed: bool,
    /// Bumped on every connect attempt and on close; sessions carrying an
    /// older value are stale.
    generation: u64,
    session: Option<JoinHandle<()>>,
    reconnect: Option<JoinHandle<()>>,
}

struct Shared {
    endpoint: UpstreamEndpoint,
    reconnect_delay: Duration,
    events: mpsc::UnboundedSender<UpstreamEvent>,
    state: Mutex<LinkState>,
    connected: AtomicBool,
}

impl Shared {
    fn connect(self: &Arc<Self>) {
        let generation = {
            let mut state = self.state.lock();
            state.closed = false;
            if state.phase != Phase::Idle {
                return;
            }
            if let Some(pending) = state.reconnect.take() {
                pending.abort();
            }
            state.phase = Phase::Connecting;
            state.generation += 1;
            state.generation
        };

        debug!(endpoint = %self.endpoint, generation, "Connecting to upstream");
        let shared = Arc::clone(self);
        let handle = tokio::spawn(async move { shared.run_session(generation).await });

        let mut state = self.state.lock();
        if state.generation == generation {
            state.session = Some(handle);
        } else {
            handle.abort();
        }
    }

    async fn run_session(self: Arc<Self>, generation: u64) {
        let mut stream = match self.endpoint.connect().await {
            Ok(stream) => stream,
            Err(e) => {
                self.session_ended(generation, format!("connect failed: {e}"));
                return;
            }
        };

        if !self.mark_connected(generation) {
            return;
        }
        info!(endpoint = %self.endpoint, "Upstream connected");
        self.emit(UpstreamEvent::Connected);

        let mut decoder = FrameDecoder::new();
        let mut buf = vec![0u8; READ_BUF];
        let reason = loop {
            match stream.read(&mut buf).await {
                Ok(0) => break "closed by peer".to_string(),
                Ok(n) => {
                    for frame in decoder.push(&buf[..n]) {
                        self.dispatch(&frame);
                    }
                }
                Err(e) => break format!("read failed: {e}"),
            }
        };

        self.session_ended(generation, reason);
    }

    fn dispatch(&self, frame: &str) {
        match decode(frame) {
            Decoded::Event(event) => self.emit(event),
            Decoded::Unknown(kind) => debug!(kind = %kind, "Ignoring unknown upstream message"),
            Decoded::Invalid(reason) => warn!(reason = %reason, "Dropping upstream frame"),
        }
    }

    fn emit(&self, event: UpstreamEvent) {
        if self.events.send(event).is_err() {
            debug!("Upstream event receiver dropped");
        }
    }

    fn mark_connected(&self, generation: u64) -> bool {
        let mut state = self.state.lock();
        if state.generation != generation || state.closed {
            return false;
        }
        state.phase = Phase::Connected;
        self.connected.store(true, Ordering::SeqCst);
        true
    }

    fn session_ended(self: &Arc<Self>, generation: u64, reason: String) {
        let mut state = self.state.lock();
        if state.generation != generation {
            debug!(generation, "Ignoring end of stale upstream session");
            return;
        }
        state.phase = Phase::Idle;
        state.session = None;
        self.connected.store(false, Ordering::SeqCst);

        warn!(endpoint = %self.endpoint, reason = %reason, "Upstream disconnected");
        self.emit(UpstreamEvent::Disconnected { reason });

        if state.closed || state.reconnect.is_some() {
            return;
        }
        let shared = Arc::clone(self);
        let delay = self.reconnect_delay;
        state.reconnect = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            shared.state.lock().reconnect.take();
            shared.connect();
        }));
    }

    fn close(&self) {
        let mut state = self.state.lock();
        state.closed = true;
        state.generation += 1;
        state.phase = Phase::Idle;
        if let Some(handle) = state.reconnect.take() {
            handle.abort();
        }
        if let Some(handle) = state.session.take() {
            handle.abort();
        }
        self.connected.store(false, Ordering::SeqCst);
    }
}

/// Persistent, self-healing subscription to the upstream event source.
pub struct UpstreamSubscriber {
    shared: Arc<Shared>,
}

impl UpstreamSubscriber {
    /// Create an idle subscriber and the receiving end of its event channel.
    pub fn new(
        endpoint: UpstreamEndpoint,
        reconnect_delay: Duration,
    ) -> (Self, mpsc::UnboundedReceiver<UpstreamEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let shared = Arc::new(Shared {
            endpoint,
            reconnect_delay,
            events: tx,
            state: Mutex::new(LinkState {
                phase: Phase::Idle,
                closed: false,
                generation: 0,
                session: None,
                reconnect: None,
            }),
            connected: AtomicBool::new(false),
        });
        (Self { shared }, rx)
    }

    /// Start connecting. No-op while connecting or connected. Must be called
    /// inside a tokio runtime.
    pub fn connect(&self) {
        self.shared.connect();
    }

    #[must_use]
    pub fn endpoint(&self) -> &UpstreamEndpoint {
        &self.shared.endpoint
    }
}

impl UpstreamLink for UpstreamSubscriber {
    fn is_connected(&self) -> bool {
        self.shared.connected.load(Ordering::SeqCst)
    }

    fn close(&self) {
        self.shared.close();
    }
}

impl Drop for UpstreamSubscriber {
    fn drop(&mut self) {
        self.shared.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncWriteExt;
    use tokio::net::TcpListener;
    use tokio::time::timeout;

    async fn listener() -> (TcpListener, UpstreamEndpoint) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        (listener, UpstreamEndpoint::Tcp(addr.to_string()))
    }

    async fn next(rx: &mut mpsc::UnboundedReceiver<UpstreamEvent>) -> UpstreamEvent {
        timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("timed out waiting for event")
            .expect("channel closed")
    }

    #[tokio::test]
    async fn decodes_frames_and_skips_garbage() {
        let (listener, endpoint) = listener().await;
        let (subscriber, mut rx) = UpstreamSubscriber::new(endpoint, Duration::from_millis(50));
        subscriber.connect();

        let (mut socket, _) = listener.accept().await.unwrap();
        assert_eq!(next(&mut rx).await, UpstreamEvent::Connected);
        assert!(subscriber.is_connected());

        socket
            .write_all(b"garbage\n\n{\"type\":\"heartbeat\"}\n\n{\"type\":\"pap")
            .await
            .unwrap();
        socket.write_all(b"er_on\"}\n\n").await.unwrap();
        assert_eq!(next(&mut rx).await, UpstreamEvent::PaperOn);
        subscriber.close();
    }

    #[tokio::test]
    async fn reconnects_once_after_peer_close() {
        let (listener, endpoint) = listener().await;
        let (subscriber, mut rx) = UpstreamSubscriber::new(endpoint, Duration::from_millis(50));
        subscriber.connect();

        let (socket, _) = listener.accept().await.unwrap();
        assert_eq!(next(&mut rx).await, UpstreamEvent::Connected);
        drop(socket);

        assert!(matches!(
            next(&mut rx).await,
            UpstreamEvent::Disconnected { .. }
        ));
        assert!(!subscriber.is_connected());

        let (_socket, _) = timeout(Duration::from_secs(2), listener.accept())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(next(&mut rx).await, UpstreamEvent::Connected);
        subscriber.close();
    }

    #[tokio::test]
    async fn connect_is_idempotent_while_connected() {
        let (listener, endpoint) = listener().await;
        let (subscriber, mut rx) = UpstreamSubscriber::new(endpoint, Duration::from_millis(50));
        subscriber.connect();
        let (_socket, _) = listener.accept().await.unwrap();
        assert_eq!(next(&mut rx).await, UpstreamEvent::Connected);

        subscriber.connect();
        subscriber.connect();
        let second = timeout(Duration::from_millis(200), listener.accept()).await;
        assert!(second.is_err(), "no second connection expected");
        subscriber.close();
    }

    #[tokio::test]
    async fn close_cancels_pending_reconnect() {
        let (listener, endpoint) = listener().await;
        let (subscriber, mut rx) = UpstreamSubscriber::new(endpoint, Duration::from_millis(100));
        subscriber.connect();
        let (socket, _) = listener.accept().await.unwrap();
        assert_eq!(next(&mut rx).await, UpstreamEvent::Connected);
        drop(socket);
        assert!(matches!(
            next(&mut rx).await,
            UpstreamEvent::Disconnected { .. }
        ));

        subscriber.close();
        subscriber.close();
        let again = timeout(Duration::from_millis(400), listener.accept()).await;
        assert!(again.is_err(), "closed subscriber must not reconnect");
    }

    #[tokio::test]
    async fn failed_connect_schedules_retry() {
        let (listener, endpoint) = listener().await;
        drop(listener);
        let (subscriber, mut rx) = UpstreamSubscriber::new(endpoint, Duration::from_millis(30));
        subscriber.connect();

        for _ in 0..2 {
            assert!(matches!(
                next(&mut rx).await,
                UpstreamEvent::Disconnected { .. }
            ));
        }
        subscriber.close();
    }
}
