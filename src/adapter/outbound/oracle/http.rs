//! HTTP acknowledging authority client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::domain::RunEnvelope;
use crate::error::AckError;
use crate::port::outbound::oracle::{Acknowledger, AuthorityAck};

/// Upper bound on one acknowledgment round trip.
pub const DEFAULT_ACK_TIMEOUT: Duration = Duration::from_secs(10);

const CONNECT_TIMEOUT: Duration = Duration::from_secs(3);
const MAX_BODY_IN_ERROR: usize = 512;

#[derive(Debug, Deserialize)]
struct AckResponse {
    #[serde(alias = "runId")]
    id: Option<i64>,
}

/// Posts run envelopes to the authority and reads back its identifier.
pub struct HttpAcknowledger {
    http: HttpClient,
    url: String,
    token: Option<String>,
}

impl HttpAcknowledger {
    #[must_use]
    pub fn new(url: impl Into<String>, timeout: Duration, token: Option<String>) -> Self {
        let http = HttpClient::builder()
            .timeout(timeout)
            .connect_timeout(CONNECT_TIMEOUT.min(timeout))
            .build()
            .unwrap_or_else(|err| {
                warn!(error = %err, "Failed to build HTTP client, using defaults");
                HttpClient::new()
            });
        Self {
            http,
            url: url.into(),
            token,
        }
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl Acknowledger for HttpAcknowledger {
    async fn acknowledge(&self, envelope: &RunEnvelope) -> Result<AuthorityAck, AckError> {
        let mut request = self.http.post(&self.url).json(envelope);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(AckError::Transport)?;
        let status = response.status();
        let body = response.text().await.map_err(AckError::Transport)?;

        if !status.is_success() {
            let mut body = body;
            body.truncate(
                body.char_indices()
                    .nth(MAX_BODY_IN_ERROR)
                    .map_or(body.len(), |(i, _)| i),
            );
            return Err(AckError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: AckResponse = serde_json::from_str(&body)
            .map_err(|e| AckError::InvalidResponse(format!("{e}: {body}")))?;
        let id = parsed
            .id
            .ok_or_else(|| AckError::InvalidResponse(body.clone()))?;

        debug!(
            timeframe = %envelope.timeframe,
            boundary = envelope.boundary,
            authority_id = id,
            "Authority acknowledged run"
        );
        Ok(AuthorityAck { id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{RunSource, Timeframe};
    use crate::testkit::domain::{model_config, runner_output};
    use crate::testkit::http::{serve_once, unreachable};
    use tokio::net::TcpListener;

    fn envelope() -> RunEnvelope {
        RunEnvelope::new(
            Timeframe::H4,
            14_400_000,
            RunSource::Live,
            model_config("macd"),
            runner_output(7),
        )
    }

    #[tokio::test]
    async fn acknowledged_with_id_and_bearer_token() {
        let (base, server) = serve_once("200 OK", r#"{"id":42}"#).await;
        let ack = HttpAcknowledger::new(
            format!("{base}/runs"),
            Duration::from_secs(2),
            Some("s3cret".into()),
        );
        let result = ack.acknowledge(&envelope()).await.unwrap();
        assert_eq!(result.id, 42);

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /runs"));
        assert!(request
            .to_ascii_lowercase()
            .contains("authorization: bearer s3cret"));
        assert!(request.contains(r#""model_date":"1970-01-01T04:00:00.000Z""#));
    }

    #[tokio::test]
    async fn run_id_alias_is_accepted() {
        let (base, _server) = serve_once("201 Created", r#"{"runId":9}"#).await;
        let ack = HttpAcknowledger::new(base, Duration::from_secs(2), None);
        assert_eq!(ack.acknowledge(&envelope()).await.unwrap().id, 9);
    }

    #[tokio::test]
    async fn non_success_status_is_rejected() {
        let (base, _server) = serve_once("503 Service Unavailable", "down").await;
        let ack = HttpAcknowledger::new(base, Duration::from_secs(2), None);
        match ack.acknowledge(&envelope()).await {
            Err(AckError::Rejected { status, body }) => {
                assert_eq!(status, 503);
                assert_eq!(body, "down");
            }
            other => panic!("expected Rejected, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_id_is_invalid() {
        let (base, _server) = serve_once("200 OK", r#"{"ok":true}"#).await;
        let ack = HttpAcknowledger::new(base, Duration::from_secs(2), None);
        assert!(matches!(
            ack.acknowledge(&envelope()).await,
            Err(AckError::InvalidResponse(_))
        ));
    }

    #[tokio::test]
    async fn unreachable_authority_is_transport_error() {
        let ack = HttpAcknowledger::new(unreachable().await, Duration::from_secs(1), None);
        assert!(matches!(
            ack.acknowledge(&envelope()).await,
            Err(AckError::Transport(_))
        ));
    }

    #[tokio::test]
    async fn slow_authority_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/runs", listener.local_addr().unwrap());
        let _hold = tokio::spawn(async move {
            let (_socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(5)).await;
        });
        let ack = HttpAcknowledger::new(url, Duration::from_millis(200), None);
        match ack.acknowledge(&envelope()).await {
            Err(AckError::Transport(e)) => assert!(e.is_timeout()),
            other => panic!("expected timeout, got {other:?}"),
        }
    }
}
