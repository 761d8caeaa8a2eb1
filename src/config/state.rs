// Application state module
// Read-only shared state handed to every request handler

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use super::types::Config;
use crate::proxy;
use crate::search::SearchClient;

/// Application state
///
/// Built once at startup and shared across connection tasks behind an `Arc`.
/// Nothing in here is mutated per request, so no locking is needed.
pub struct AppState {
    pub config: Config,
    /// Image search provider client
    pub search: SearchClient,
    /// Outbound HTTP client for the image proxy
    pub proxy_client: reqwest::Client,

    // Cached config values for lock-free fast-path access
    pub cached_access_log: Arc<AtomicBool>,
}

impl AppState {
    /// Create `AppState` from loaded configuration
    pub fn new(config: Config) -> Result<Self, reqwest::Error> {
        let search = SearchClient::new(&config.search)?;
        let proxy_client = proxy::build_client(proxy::FETCH_TIMEOUT)?;
        let cached_access_log = Arc::new(AtomicBool::new(config.logging.access_log));

        Ok(Self {
            config,
            search,
            proxy_client,
            cached_access_log,
        })
    }
}
