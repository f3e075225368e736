//! Per-feed filtering and relabeling rules.

use std::collections::{HashMap, HashSet};

use crate::entities::unescape_html;

/// The ignore set and title overrides applied to the events of one feed.
///
/// Override titles are stored HTML-unescaped. An override never rescues an
/// ignored subject: the ignore decision is taken first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterContext {
    ignored_codes: HashSet<String>,
    title_overrides: HashMap<String, String>,
}

impl FilterContext {
    /// Creates a context that keeps every event and renames nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a context from raw caller input.
    ///
    /// Override titles may carry HTML entities; they are decoded here once.
    pub fn from_rules<I, S>(ignored_codes: I, title_overrides: HashMap<String, String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            ignored_codes: ignored_codes.into_iter().map(Into::into).collect(),
            title_overrides: title_overrides
                .into_iter()
                .map(|(code, title)| (code, unescape_html(&title)))
                .collect(),
        }
    }

    /// Builder method to ignore a subject code.
    pub fn with_ignored(mut self, code: impl Into<String>) -> Self {
        self.ignored_codes.insert(code.into());
        self
    }

    /// Builder method to override the title of a subject.
    ///
    /// `title` may carry HTML entities.
    pub fn with_override(mut self, code: impl Into<String>, title: &str) -> Self {
        self.title_overrides.insert(code.into(), unescape_html(title));
        self
    }

    /// Returns true if events of subject `code` must be dropped.
    pub fn is_ignored(&self, code: &str) -> bool {
        self.ignored_codes.contains(code)
    }

    /// Returns the decoded override title for subject `code`, if any.
    pub fn title_override(&self, code: &str) -> Option<&str> {
        self.title_overrides.get(code).map(String::as_str)
    }
}
