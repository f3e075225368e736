//! Saved feed preferences.
//!
//! A [`PreferenceRecord`] is what a user registers once and then references
//! by identifier on every calendar request. The JSON shape matches the
//! persisted store:
//!
//! ```json
//! [{"url": "https://...", "ignore": ["A-BCDE-123"], "subjects": {"B-INFO-204": "Algo"}}]
//! ```

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::filter::FilterContext;

/// Rules for one feed of a preference record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedPreference {
    /// The feed URL.
    pub url: String,

    /// Subject codes whose events are removed.
    #[serde(default)]
    pub ignore: Vec<String>,

    /// Subject code to title overrides, possibly HTML-encoded.
    #[serde(default)]
    pub subjects: HashMap<String, String>,
}

impl FeedPreference {
    /// Creates a preference for `url` with no rules.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ignore: Vec::new(),
            subjects: HashMap::new(),
        }
    }

    /// Builder method to ignore a subject code.
    pub fn with_ignored(mut self, code: impl Into<String>) -> Self {
        self.ignore.push(code.into());
        self
    }

    /// Builder method to override a subject title.
    pub fn with_subject(mut self, code: impl Into<String>, title: impl Into<String>) -> Self {
        self.subjects.insert(code.into(), title.into());
        self
    }

    /// Builds the filter context for this feed, decoding override titles.
    pub fn filter_context(&self) -> FilterContext {
        FilterContext::from_rules(self.ignore.iter().cloned(), self.subjects.clone())
    }
}

/// An ordered list of feeds with their rules.
///
/// Records are immutable once stored; registering again creates a new one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PreferenceRecord {
    /// Feeds in merge order.
    pub feeds: Vec<FeedPreference>,
}

impl PreferenceRecord {
    /// Creates a record from its feeds.
    pub fn new(feeds: Vec<FeedPreference>) -> Self {
        Self { feeds }
    }

    /// Returns true if the record holds no feed.
    pub fn is_empty(&self) -> bool {
        self.feeds.is_empty()
    }
}
