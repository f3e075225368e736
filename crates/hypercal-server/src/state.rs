//! Shared application state.

use std::sync::Arc;

use hypercal_core::FeedFetcher;
use hypercal_feeds::FetcherConfig;

use crate::store::PreferenceStore;

/// State shared by every request handler.
#[derive(Clone)]
pub struct AppState {
    /// Fetches the feeds named by requests.
    pub fetcher: Arc<dyn FeedFetcher>,
    /// URL policy applied to registered feeds.
    pub feed_policy: Arc<FetcherConfig>,
    /// Registered preferences.
    pub store: Arc<PreferenceStore>,
}

impl AppState {
    /// Creates the state.
    pub fn new(
        fetcher: Arc<dyn FeedFetcher>,
        feed_policy: FetcherConfig,
        store: Arc<PreferenceStore>,
    ) -> Self {
        Self {
            fetcher,
            feed_policy: Arc::new(feed_policy),
            store,
        }
    }
}
