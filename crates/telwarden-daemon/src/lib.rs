//! Telwarden daemon orchestration logic.
//!
//! The [`Daemon`] struct wires the sliding-window store, the anomaly
//! detector, and the revocation dispatcher together behind the HTTP
//! boundary, and runs the background eviction sweeper.

pub mod http;

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::info;

use telwarden_core::config::{EvictionConfig, WardenConfig};
use telwarden_core::detector::AnomalyDetector;
use telwarden_core::ingest::TelemetryService;
use telwarden_core::notifier::{spawn_dispatcher, RevocationNotifier};
use telwarden_core::window::WindowStore;

/// The daemon process: telemetry endpoint, revocation dispatch, eviction.
pub struct Daemon {
    config: WardenConfig,
}

impl Daemon {
    pub fn new(config: WardenConfig) -> Self {
        Self { config }
    }

    /// Run until the process is terminated. A revoke call in flight at
    /// shutdown is abandoned without delivery.
    pub async fn run(self) -> Result<()> {
        let store = Arc::new(WindowStore::new(chrono::Duration::seconds(
            self.config.detection.window_seconds as i64,
        )));
        let detector = AnomalyDetector::from_config(&self.config.detection);
        let notifier = RevocationNotifier::new(&self.config.auth_service)
            .context("building revocation notifier")?;
        let revocations = spawn_dispatcher(notifier, self.config.auth_service.queue_capacity);
        let service = Arc::new(TelemetryService::new(
            Arc::clone(&store),
            detector,
            revocations,
        ));

        if self.config.eviction.enabled {
            spawn_eviction_sweeper(Arc::clone(&store), self.config.eviction.clone());
        }

        let app = http::router(service);
        let listener = tokio::net::TcpListener::bind(&self.config.server.bind_addr)
            .await
            .with_context(|| format!("binding {}", self.config.server.bind_addr))?;
        info!(
            addr = %self.config.server.bind_addr,
            auth_service = %self.config.auth_service.base_url,
            "telemetry endpoint listening"
        );
        axum::serve(listener, app).await?;
        Ok(())
    }
}

/// Periodically drop windows for devices that have gone quiet, so the store
/// does not grow with every device identity ever seen.
fn spawn_eviction_sweeper(store: Arc<WindowStore>, config: EvictionConfig) {
    tokio::spawn(async move {
        let idle = chrono::Duration::seconds(config.idle_seconds as i64);
        let mut tick =
            tokio::time::interval(std::time::Duration::from_secs(config.sweep_interval_seconds));
        loop {
            tick.tick().await;
            let evicted = store.evict_idle(Utc::now(), idle).await;
            if evicted > 0 {
                info!(evicted, "evicted idle device windows");
            }
        }
    });
}
