//! Best-effort revocation delivery to the authorization collaborator.
//!
//! The [`RevocationNotifier`] posts revoke instructions to the collaborator's
//! `/revoke` endpoint with a bounded request timeout and a configurable
//! number of attempts. Delivery failures are logged and swallowed by the
//! dispatch worker; they never reach the telemetry caller and there is no
//! acknowledgment or deduplication.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::config::AuthServiceConfig;
use crate::error::{Result, WardenError};

/// Revoke instruction sent to the authorization collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevocationRequest {
    pub device_id: String,
    /// Free text embedding the triggering frequency and payload size.
    /// Not machine-parsed downstream.
    pub reason: String,
}

/// Sends revoke instructions over HTTP.
#[derive(Debug, Clone)]
pub struct RevocationNotifier {
    endpoint_url: String,
    http: reqwest::Client,
    attempts: u32,
    backoff: Duration,
}

impl RevocationNotifier {
    /// Create a notifier for the configured collaborator.
    pub fn new(config: &AuthServiceConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()?;
        Ok(Self::with_http_client(config, http))
    }

    /// Create a notifier with a custom HTTP client (for tests).
    pub fn with_http_client(config: &AuthServiceConfig, http: reqwest::Client) -> Self {
        Self {
            endpoint_url: format!("{}/revoke", config.base_url.trim_end_matches('/')),
            http,
            attempts: config.revoke_attempts.max(1),
            backoff: Duration::from_millis(config.retry_backoff_ms),
        }
    }

    /// Deliver one revoke instruction, retrying up to the configured number
    /// of attempts. Exactly one outbound call is made per attempt.
    pub async fn notify(&self, device_id: &str, reason: &str) -> Result<()> {
        let body = RevocationRequest {
            device_id: device_id.to_string(),
            reason: reason.to_string(),
        };

        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.post_revoke(&body).await {
                Ok(()) => {
                    debug!(device = %body.device_id, attempt, "revoke instruction delivered");
                    return Ok(());
                }
                Err(e) if attempt < self.attempts => {
                    warn!(
                        device = %body.device_id,
                        attempt,
                        error = %e,
                        "revoke delivery failed, retrying"
                    );
                    tokio::time::sleep(self.backoff).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn post_revoke(&self, body: &RevocationRequest) -> Result<()> {
        let response = self.http.post(&self.endpoint_url).json(body).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(WardenError::RevokeRejected {
                device_id: body.device_id.clone(),
                status: status.as_u16(),
            });
        }
        Ok(())
    }
}

/// Spawn the dispatch worker and return the queue it drains.
///
/// The worker runs for the life of the process, delivering instructions off
/// the request path so a slow or unreachable collaborator cannot stall
/// telemetry ingestion. Failures are logged and dropped here; an instruction
/// in flight at shutdown is abandoned.
pub fn spawn_dispatcher(
    notifier: RevocationNotifier,
    capacity: usize,
) -> mpsc::Sender<RevocationRequest> {
    let (tx, mut rx) = mpsc::channel::<RevocationRequest>(capacity);
    tokio::spawn(async move {
        while let Some(request) = rx.recv().await {
            if let Err(e) = notifier.notify(&request.device_id, &request.reason).await {
                warn!(
                    device = %request.device_id,
                    error = %e,
                    "revocation delivery failed"
                );
            }
        }
    });
    tx
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn config_for(base_url: &str, attempts: u32) -> AuthServiceConfig {
        AuthServiceConfig {
            base_url: base_url.to_string(),
            request_timeout_ms: 1000,
            revoke_attempts: attempts,
            retry_backoff_ms: 10,
            queue_capacity: 16,
        }
    }

    #[tokio::test]
    async fn test_notify_posts_device_and_reason() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/revoke")
            .match_header("content-type", "application/json")
            .match_body(mockito::Matcher::PartialJson(json!({
                "deviceId": "dev-1",
                "reason": "Anomaly detected: freq=11/window, size=50 bytes",
            })))
            .with_status(200)
            .create_async()
            .await;

        let notifier = RevocationNotifier::new(&config_for(&server.url(), 1)).unwrap();
        notifier
            .notify("dev-1", "Anomaly detected: freq=11/window, size=50 bytes")
            .await
            .unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_non_success_status_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/revoke")
            .with_status(503)
            .create_async()
            .await;

        let notifier = RevocationNotifier::new(&config_for(&server.url(), 1)).unwrap();
        let err = notifier.notify("dev-1", "reason").await.unwrap_err();
        match err {
            WardenError::RevokeRejected { status, .. } => assert_eq!(status, 503),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_connection_refused_is_an_error() {
        // Nothing listens on port 1.
        let notifier = RevocationNotifier::new(&config_for("http://127.0.0.1:1", 1)).unwrap();
        let err = notifier.notify("dev-1", "reason").await.unwrap_err();
        assert!(matches!(err, WardenError::Http(_)));
    }

    #[tokio::test]
    async fn test_configured_attempts_are_exhausted() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/revoke")
            .with_status(500)
            .expect(3)
            .create_async()
            .await;

        let notifier = RevocationNotifier::new(&config_for(&server.url(), 3)).unwrap();
        assert!(notifier.notify("dev-1", "reason").await.is_err());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_single_attempt_by_default_makes_one_call() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/revoke")
            .with_status(500)
            .expect(1)
            .create_async()
            .await;

        let notifier = RevocationNotifier::new(&config_for(&server.url(), 1)).unwrap();
        assert!(notifier.notify("dev-1", "reason").await.is_err());
        mock.assert_async().await;
    }

    #[test]
    fn test_trailing_slash_in_base_url() {
        let config = config_for("http://127.0.0.1:3001/", 1);
        let notifier = RevocationNotifier::new(&config).unwrap();
        assert_eq!(notifier.endpoint_url, "http://127.0.0.1:3001/revoke");
    }

    #[tokio::test]
    async fn test_dispatcher_delivers_queued_requests() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/revoke")
            .with_status(200)
            .expect(2)
            .create_async()
            .await;

        let notifier = RevocationNotifier::new(&config_for(&server.url(), 1)).unwrap();
        let tx = spawn_dispatcher(notifier, 16);
        for i in 0..2 {
            tx.send(RevocationRequest {
                device_id: format!("dev-{i}"),
                reason: "flooding".to_string(),
            })
            .await
            .unwrap();
        }

        // The worker drains asynchronously; poll until both calls land.
        for _ in 0..100 {
            if mock.matched_async().await {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        mock.assert_async().await;
    }
}
