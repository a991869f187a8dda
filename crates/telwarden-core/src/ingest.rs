//! Telemetry ingest pipeline.
//!
//! Drives one telemetry event through window recording, rule evaluation,
//! and (when anomalous) revocation dispatch. The returned status reflects
//! the detection outcome only -- never the fate of the revoke instruction.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::detector::AnomalyDetector;
use crate::error::{Result, WardenError};
use crate::notifier::RevocationRequest;
use crate::telemetry::{TelemetryRecord, TelemetryStatus};
use crate::window::WindowStore;

/// The ingest service: validates an event, updates the device's window,
/// evaluates the rules, and enqueues a revocation when a rule fires.
pub struct TelemetryService {
    store: Arc<WindowStore>,
    detector: AnomalyDetector,
    revocations: mpsc::Sender<RevocationRequest>,
}

impl TelemetryService {
    pub fn new(
        store: Arc<WindowStore>,
        detector: AnomalyDetector,
        revocations: mpsc::Sender<RevocationRequest>,
    ) -> Self {
        Self {
            store,
            detector,
            revocations,
        }
    }

    /// Handle one telemetry event observed at `now`.
    ///
    /// Malformed input is rejected before any state mutates. A full
    /// revocation queue drops the instruction with a warning; the anomaly
    /// status is reported to the caller regardless.
    pub async fn handle(
        &self,
        record: &TelemetryRecord,
        now: DateTime<Utc>,
    ) -> Result<TelemetryStatus> {
        if record.device_id.is_empty() {
            return Err(WardenError::InvalidTelemetry(
                "deviceId must not be empty".to_string(),
            ));
        }

        let frequency = self
            .store
            .record(&record.device_id, now, record.payload_size)
            .await;
        info!(
            device = %record.device_id,
            frequency,
            payload_size = record.payload_size,
            metric_value = record.metric_value,
            "telemetry received"
        );

        let verdict = self.detector.evaluate(frequency, record.payload_size);
        if !verdict.is_anomalous {
            return Ok(TelemetryStatus::Ok);
        }

        let reason = format!(
            "Anomaly detected: freq={}/window, size={} bytes",
            verdict.frequency, record.payload_size
        );
        warn!(device = %record.device_id, %reason, "revoking device credentials");

        // try_send keeps the request path free of backpressure from a slow
        // collaborator; a full queue trades delivery for availability.
        let request = RevocationRequest {
            device_id: record.device_id.clone(),
            reason,
        };
        if let Err(e) = self.revocations.try_send(request) {
            warn!(
                device = %record.device_id,
                error = %e,
                "revocation queue full, instruction dropped"
            );
        }

        Ok(TelemetryStatus::AnomalyDetected)
    }

    /// Number of device identities currently tracked by the store.
    pub async fn tracked_devices(&self) -> usize {
        self.store.tracked_devices().await
    }
}
