//! Per-device sliding-window state.
//!
//! The [`WindowStore`] owns one [`DeviceWindow`] per device identity and
//! counts telemetry arrivals over a trailing time window. Entries age out on
//! each access, never proactively; an entry exactly one window old is
//! evicted. Access to a given device's window is serialized, while different
//! devices never block each other.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::{Mutex, RwLock};

/// Sliding-window history for a single device identity.
#[derive(Debug, Default)]
struct DeviceWindow {
    /// Event times, non-decreasing by insertion order.
    timestamps: VecDeque<DateTime<Utc>>,
    /// Most recent payload size in bytes.
    last_payload_size: u64,
    /// Last telemetry arrival, for idle eviction.
    last_seen: Option<DateTime<Utc>>,
}

impl DeviceWindow {
    /// Drop entries that have aged out of the window ending at `now`.
    /// Retention is strict: an entry exactly `window` old is evicted.
    fn prune(&mut self, now: DateTime<Utc>, window: Duration) {
        let cutoff = now - window;
        while let Some(front) = self.timestamps.front() {
            if *front <= cutoff {
                self.timestamps.pop_front();
            } else {
                break;
            }
        }
    }
}

/// Device-keyed store of sliding windows.
///
/// The map is guarded by an `RwLock` so lookups of already-known devices take
/// the read path; each window sits behind its own `Mutex` so concurrent
/// telemetry for the same device is an exclusive read-modify-write while
/// other devices proceed unblocked. No lock is ever held across outbound I/O.
pub struct WindowStore {
    window: Duration,
    windows: RwLock<HashMap<String, Arc<Mutex<DeviceWindow>>>>,
}

impl WindowStore {
    /// Create a store counting events over the given trailing window.
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            windows: RwLock::new(HashMap::new()),
        }
    }

    /// Record a telemetry arrival and return the in-window event count,
    /// inclusive of the event just recorded.
    ///
    /// The window for an unseen device is created lazily. Pruning runs on
    /// every call and is idempotent regardless of history length.
    pub async fn record(&self, device_id: &str, now: DateTime<Utc>, payload_size: u64) -> u64 {
        let slot = self.slot(device_id).await;
        let mut window = slot.lock().await;
        window.timestamps.push_back(now);
        window.last_payload_size = payload_size;
        window.last_seen = Some(now);
        window.prune(now, self.window);
        window.timestamps.len() as u64
    }

    /// Current in-window event count for a device without recording anything.
    /// Repeated queries at a fixed `now` return the same value.
    pub async fn frequency(&self, device_id: &str, now: DateTime<Utc>) -> u64 {
        let Some(slot) = self.lookup(device_id).await else {
            return 0;
        };
        let mut window = slot.lock().await;
        window.prune(now, self.window);
        window.timestamps.len() as u64
    }

    /// Most recent payload size reported by a device, if it has ever been seen.
    pub async fn last_payload_size(&self, device_id: &str) -> Option<u64> {
        let slot = self.lookup(device_id).await?;
        let window = slot.lock().await;
        Some(window.last_payload_size)
    }

    /// Remove windows for devices not seen within `idle` of `now`.
    /// Returns the number of evicted devices.
    pub async fn evict_idle(&self, now: DateTime<Utc>, idle: Duration) -> usize {
        let cutoff = now - idle;
        let mut windows = self.windows.write().await;
        let mut idle_devices = Vec::new();
        for (device_id, slot) in windows.iter() {
            if let Some(seen) = slot.lock().await.last_seen {
                if seen <= cutoff {
                    idle_devices.push(device_id.clone());
                }
            }
        }
        for device_id in &idle_devices {
            windows.remove(device_id);
        }
        idle_devices.len()
    }

    /// Number of device identities currently tracked.
    pub async fn tracked_devices(&self) -> usize {
        self.windows.read().await.len()
    }

    async fn lookup(&self, device_id: &str) -> Option<Arc<Mutex<DeviceWindow>>> {
        self.windows.read().await.get(device_id).cloned()
    }

    /// Fetch the window for a device, creating it if this is the first
    /// telemetry for that identity.
    async fn slot(&self, device_id: &str) -> Arc<Mutex<DeviceWindow>> {
        if let Some(slot) = self.lookup(device_id).await {
            return slot;
        }
        let mut windows = self.windows.write().await;
        windows.entry(device_id.to_string()).or_default().clone()
    }
}
