//! Where the upstream event source listens.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Deserializer};
use tokio::io::AsyncRead;

/// Byte stream read by a session.
pub(super) type Stream = Box<dyn AsyncRead + Send + Unpin>;

/// `unix:/path/to.sock` or `tcp:host:port`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpstreamEndpoint {
    Unix(PathBuf),
    Tcp(String),
}

impl UpstreamEndpoint {
    pub(super) async fn connect(&self) -> std::io::Result<Stream> {
        match self {
            Self::Tcp(addr) => {
                let stream = tokio::net::TcpStream::connect(addr.as_str()).await?;
                stream.set_nodelay(true)?;
                Ok(Box::new(stream))
            }
            #[cfg(unix)]
            Self::Unix(path) => Ok(Box::new(tokio::net::UnixStream::connect(path).await?)),
            #[cfg(not(unix))]
            Self::Unix(_) => Err(std::io::Error::new(
                std::io::ErrorKind::Unsupported,
                "unix sockets are not available on this platform",
            )),
        }
    }
}

impl FromStr for UpstreamEndpoint {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(path) = s.strip_prefix("unix:") {
            if path.is_empty() {
                return Err("unix endpoint needs a socket path".to_string());
            }
            return Ok(Self::Unix(PathBuf::from(path)));
        }
        if let Some(addr) = s.strip_prefix("tcp:") {
            match addr.rsplit_once(':') {
                Some((host, port)) if !host.is_empty() && port.parse::<u16>().is_ok() => {
                    return Ok(Self::Tcp(addr.to_string()));
                }
                _ => return Err(format!("tcp endpoint must be host:port, got '{addr}'")),
            }
        }
        Err(format!("unsupported endpoint '{s}' (expected unix:PATH or tcp:HOST:PORT)"))
    }
}

impl fmt::Display for UpstreamEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unix(path) => write!(f, "unix:{}", path.display()),
            Self::Tcp(addr) => write!(f, "tcp:{addr}"),
        }
    }
}

impl<'de> Deserialize<'de> for UpstreamEndpoint {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_both_schemes() {
        assert_eq!(
            "unix:/tmp/up.sock".parse::<UpstreamEndpoint>().unwrap(),
            UpstreamEndpoint::Unix(PathBuf::from("/tmp/up.sock"))
        );
        assert_eq!(
            "tcp:127.0.0.1:9000".parse::<UpstreamEndpoint>().unwrap(),
            UpstreamEndpoint::Tcp("127.0.0.1:9000".to_string())
        );
    }

    #[test]
    fn rejects_malformed() {
        for bad in ["", "unix:", "tcp:host", "tcp::90", "tcp:host:port", "http://x"] {
            assert!(bad.parse::<UpstreamEndpoint>().is_err(), "{bad}");
        }
    }

    #[test]
    fn display_round_trips() {
        let ep: UpstreamEndpoint = "tcp:localhost:7000".parse().unwrap();
        assert_eq!(ep.to_string(), "tcp:localhost:7000");
    }
}
