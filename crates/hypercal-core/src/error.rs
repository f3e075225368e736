//! Error types for feed retrieval and calendar assembly.
//!
//! Metadata that cannot be parsed is never an error (the event passes
//! through unchanged). The errors here all concern a feed as a whole and
//! abort the assembly of the calendar that requested it.

use std::fmt;

use thiserror::Error;

/// The category of a feed error.
///
/// Gives the transport layer a stable classification to map to statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeedErrorKind {
    /// The feed could not be downloaded.
    SourceUnreachable,
    /// The feed was downloaded but holds no calendar.
    EmptySourceCalendar,
    /// The URL is outside the accepted feed hosts.
    UnsupportedFeedUrl,
    /// The URL cannot be parsed.
    MalformedFeedUrl,
}

impl FeedErrorKind {
    /// Returns a machine-readable name for this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SourceUnreachable => "source_unreachable",
            Self::EmptySourceCalendar => "empty_source_calendar",
            Self::UnsupportedFeedUrl => "unsupported_feed_url",
            Self::MalformedFeedUrl => "malformed_feed_url",
        }
    }
}

impl fmt::Display for FeedErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An error that occurred while fetching a feed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeedError {
    /// Network or download failure.
    #[error("Cannot download calendar {url}: {reason}")]
    SourceUnreachable { url: String, reason: String },

    /// The feed tokenized to zero calendars.
    #[error("The content of {url} must contain at least one iCal calendar")]
    EmptySourceCalendar { url: String },

    /// The URL does not point to an accepted feed host.
    #[error("Not a supported calendar feed URL: {url}")]
    UnsupportedFeedUrl { url: String },

    /// The URL is not well formed.
    #[error("Malformed feed URL {url}: {reason}")]
    MalformedFeedUrl { url: String, reason: String },
}

impl FeedError {
    /// Creates a download failure error.
    pub fn unreachable(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::SourceUnreachable {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Creates an empty calendar error.
    pub fn empty(url: impl Into<String>) -> Self {
        Self::EmptySourceCalendar { url: url.into() }
    }

    /// Creates an unsupported URL error.
    pub fn unsupported_url(url: impl Into<String>) -> Self {
        Self::UnsupportedFeedUrl { url: url.into() }
    }

    /// Creates a malformed URL error.
    pub fn malformed_url(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedFeedUrl {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Returns the kind of this error.
    pub fn kind(&self) -> FeedErrorKind {
        match self {
            Self::SourceUnreachable { .. } => FeedErrorKind::SourceUnreachable,
            Self::EmptySourceCalendar { .. } => FeedErrorKind::EmptySourceCalendar,
            Self::UnsupportedFeedUrl { .. } => FeedErrorKind::UnsupportedFeedUrl,
            Self::MalformedFeedUrl { .. } => FeedErrorKind::MalformedFeedUrl,
        }
    }

    /// Returns the URL of the feed this error concerns.
    pub fn url(&self) -> &str {
        match self {
            Self::SourceUnreachable { url, .. }
            | Self::EmptySourceCalendar { url }
            | Self::UnsupportedFeedUrl { url }
            | Self::MalformedFeedUrl { url, .. } => url,
        }
    }
}

/// A specialized Result type for core operations.
pub type CoreResult<T> = Result<T, FeedError>;
