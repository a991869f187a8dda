//! Rule-based anomaly detection.
//!
//! Two fixed rules over a window snapshot, no learning, no smoothing:
//! flooding (too many events in the trailing window) and payload spike
//! (a single oversized payload). Either alone is sufficient.

use serde::{Deserialize, Serialize};

use crate::config::DetectionConfig;

/// Verdict for a single evaluation. Ephemeral, never persisted.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AnomalyVerdict {
    /// In-window event count at evaluation time.
    pub frequency: u64,
    /// Whether the payload-spike rule fired.
    pub payload_anomaly: bool,
    /// Whether either rule fired.
    pub is_anomalous: bool,
}

/// Applies the fixed detection rules to a window snapshot.
///
/// Pure over its two inputs: identical `(frequency, payload_size)` pairs
/// always produce identical verdicts. Both thresholds are strict
/// greater-than, so the boundary values themselves are not anomalous.
#[derive(Debug, Clone)]
pub struct AnomalyDetector {
    flood_threshold: u64,
    payload_threshold: u64,
}

impl AnomalyDetector {
    pub fn new(flood_threshold: u64, payload_threshold: u64) -> Self {
        Self {
            flood_threshold,
            payload_threshold,
        }
    }

    pub fn from_config(config: &DetectionConfig) -> Self {
        Self::new(config.flood_threshold, config.payload_threshold)
    }

    /// Evaluate one event against the rules.
    pub fn evaluate(&self, frequency: u64, payload_size: u64) -> AnomalyVerdict {
        let flooding = frequency > self.flood_threshold;
        let payload_anomaly = payload_size > self.payload_threshold;
        AnomalyVerdict {
            frequency,
            payload_anomaly,
            is_anomalous: flooding || payload_anomaly,
        }
    }
}

impl Default for AnomalyDetector {
    fn default() -> Self {
        Self::from_config(&DetectionConfig::default())
    }
}
