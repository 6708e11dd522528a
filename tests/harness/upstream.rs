//! Scripted upstream peer over TCP.

use cadence::adapter::outbound::upstream::UpstreamEndpoint;
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};

pub struct UpstreamPeer {
    listener: TcpListener,
}

impl UpstreamPeer {
    pub async fn bind() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind upstream listener");
        Self { listener }
    }

    pub fn endpoint(&self) -> UpstreamEndpoint {
        let addr = self.listener.local_addr().expect("listener address");
        UpstreamEndpoint::Tcp(addr.to_string())
    }

    pub async fn accept(&self) -> PeerSession {
        let (socket, _) = self.listener.accept().await.expect("accept subscriber");
        PeerSession { socket }
    }
}

pub struct PeerSession {
    socket: TcpStream,
}

impl PeerSession {
    /// Send one JSON message as a frame.
    pub async fn send(&mut self, message: serde_json::Value) {
        let frame = format!("{message}\n\n");
        self.socket
            .write_all(frame.as_bytes())
            .await
            .expect("write frame");
    }
}
