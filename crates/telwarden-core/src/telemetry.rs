//! Inbound telemetry and response types.
//!
//! Wire field names are camelCase to match the device firmware contract
//! (`deviceId`, `payloadSize`, `metricValue`).

use serde::{Deserialize, Serialize};

/// A single telemetry event as posted by a device.
///
/// `payload_size` is non-negative by construction; oversized values are what
/// the detector flags, not what the boundary rejects. `metric_value` is
/// accepted and logged but feeds no detection rule yet.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetryRecord {
    pub device_id: String,
    pub payload_size: u64,
    pub metric_value: f64,
}

/// Detection outcome reported back to the caller.
///
/// Reflects detection only -- a caller cannot distinguish "revocation
/// delivered" from "revocation attempt failed silently".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TelemetryStatus {
    #[serde(rename = "OK")]
    Ok,
    #[serde(rename = "ANOMALY_DETECTED")]
    AnomalyDetected,
}

/// Response body for `POST /telemetry`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryResponse {
    pub status: TelemetryStatus,
}
