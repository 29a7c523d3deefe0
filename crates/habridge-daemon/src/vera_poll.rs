//! Vera snapshot polling
//!
//! Periodically fetches the controller's `sdata` report and stores it in the
//! shared [`VeraCache`]. A failed fetch clears the cache so the API reports
//! the hub as unavailable until the next successful poll.

use anyhow::{Context, Result};
use habridge_core::{Sdata, VeraCache};
use std::sync::Arc;
use tokio::time::{interval, Duration};
use tracing::{debug, info, warn};

use crate::config::VeraConfig;

/// Default port of the Vera LuaUPnP data request service
pub const VERA_PORT: u16 = 3480;

/// Vera poller
pub struct VeraPoller {
    /// HTTP client
    client: reqwest::Client,
    /// Full sdata request URL
    url: String,
    poll_interval: Duration,
    cache: Arc<VeraCache>,
}

impl VeraPoller {
    /// Create a poller for `address` writing into `cache`
    pub fn new(address: &str, config: &VeraConfig, cache: Arc<VeraCache>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            url: sdata_url(address),
            poll_interval: Duration::from_secs(config.poll_interval_secs.max(1)),
            cache,
        })
    }

    /// Fetch one snapshot and update the cache
    pub async fn poll_once(&self) -> bool {
        match self.fetch().await {
            Ok(sdata) => {
                debug!(
                    devices = sdata.devices.len(),
                    scenes = sdata.scenes.len(),
                    "Vera snapshot refreshed"
                );
                self.cache.set(Some(sdata));
                true
            }
            Err(e) => {
                warn!(url = %self.url, error = %e, "Failed to fetch Vera snapshot");
                self.cache.set(None);
                false
            }
        }
    }

    async fn fetch(&self) -> Result<Sdata> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .context("Vera request failed")?
            .error_for_status()?;

        let mut sdata: Sdata = response
            .json()
            .await
            .context("Failed to parse Vera sdata")?;
        sdata.resolve_names();
        Ok(sdata)
    }

    /// Poll forever at the configured interval
    pub async fn run(self) {
        info!(url = %self.url, interval_secs = self.poll_interval.as_secs(), "Starting Vera poller");
        let mut ticker = interval(self.poll_interval);
        loop {
            ticker.tick().await;
            self.poll_once().await;
        }
    }
}

/// Build the sdata URL; an address without a port gets [`VERA_PORT`]
fn sdata_url(address: &str) -> String {
    let host = if address.contains(':') {
        address.to_string()
    } else {
        format!("{}:{}", address, VERA_PORT)
    };
    format!("http://{}/data_request?id=sdata&output_format=json", host)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, routing::get, Router};
    use habridge_core::VeraSource;

    const SDATA: &str = r#"{
        "rooms": [{"name": "Kitchen", "id": 1}],
        "categories": [{"name": "Switch", "id": 3}],
        "devices": [{"name": "Counter", "id": 5, "category": 3, "room": 1}],
        "scenes": [{"name": "Dinner", "id": 2, "room": 1}]
    }"#;

    fn test_config() -> VeraConfig {
        VeraConfig {
            address: None,
            poll_interval_secs: 30,
            timeout_secs: 2,
        }
    }

    /// Serve `app` on an OS-assigned port, returning host:port
    async fn spawn_vera(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        addr.to_string()
    }

    #[test]
    fn test_sdata_url() {
        assert_eq!(
            sdata_url("192.168.1.10"),
            "http://192.168.1.10:3480/data_request?id=sdata&output_format=json"
        );
        assert_eq!(
            sdata_url("vera.local:8080"),
            "http://vera.local:8080/data_request?id=sdata&output_format=json"
        );
    }

    #[tokio::test]
    async fn test_poll_once_success() {
        let app = Router::new().route("/data_request", get(|| async { SDATA }));
        let address = spawn_vera(app).await;

        let cache = Arc::new(VeraCache::new());
        let poller = VeraPoller::new(&address, &test_config(), cache.clone()).unwrap();

        assert!(poller.poll_once().await);
        let sdata = cache.snapshot().unwrap();
        assert_eq!(sdata.devices[0].name, "Counter");
        assert_eq!(sdata.devices[0].room, "Kitchen");
        assert_eq!(sdata.devices[0].category, "Switch");
    }

    #[tokio::test]
    async fn test_poll_once_failure_clears_cache() {
        let app = Router::new().route(
            "/data_request",
            get(|| async { StatusCode::INTERNAL_SERVER_ERROR }),
        );
        let address = spawn_vera(app).await;

        let cache = Arc::new(VeraCache::new());
        cache.set(Some(Sdata::default()));
        let poller = VeraPoller::new(&address, &test_config(), cache.clone()).unwrap();

        assert!(!poller.poll_once().await);
        assert!(cache.snapshot().is_none());
    }
}
