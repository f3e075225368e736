//! Event types for calendar feeds.
//!
//! This module provides the types that flow through the assembly pipeline:
//! - [`RawEvent`]: an event as tokenized from a source feed
//! - [`OutputEvent`]: an event as emitted into the merged calendar
//! - [`CalendarComponent`]: one component of a tokenized calendar
//! - [`FeedCalendar`]: a tokenized calendar

use serde::{Deserialize, Serialize};

use crate::time::EventTime;

/// A calendar event as it comes out of the iCalendar tokenizer.
///
/// The description (and, on older feeds, the summary) carries the
/// semi-structured metadata parsed by [`crate::parse_event_metadata`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEvent {
    /// Opaque identifier of the event within its feed.
    pub uid: String,

    /// When the event starts.
    pub start: EventTime,

    /// When the event ends.
    pub end: EventTime,

    /// The event location.
    pub location: Option<String>,

    /// Free-text description holding the `key : value` metadata lines.
    pub description: Option<String>,

    /// The event title. Older feeds encode metadata here as well.
    pub summary: Option<String>,

    /// The iCalendar STATUS value (e.g. "CONFIRMED", "CANCELLED").
    pub status: Option<String>,
}

impl RawEvent {
    /// Creates a new raw event with the minimum required fields.
    pub fn new(uid: impl Into<String>, start: EventTime, end: EventTime) -> Self {
        Self {
            uid: uid.into(),
            start,
            end,
            location: None,
            description: None,
            summary: None,
            status: None,
        }
    }

    /// Returns true if the feed marked the event as cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.status
            .as_ref()
            .is_some_and(|s| s.eq_ignore_ascii_case("cancelled"))
    }

    /// Builder method to set the summary.
    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    /// Builder method to set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Builder method to set the location.
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Builder method to set the status.
    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }
}

/// An event of the merged output calendar.
///
/// Same shape as [`RawEvent`] with `summary` holding the rewritten title and
/// the cancellation surfaced as a flag for the serializer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputEvent {
    /// Identifier copied from the source event.
    pub uid: String,
    /// When the event starts.
    pub start: EventTime,
    /// When the event ends.
    pub end: EventTime,
    /// Location copied from the source event.
    pub location: Option<String>,
    /// Original description, kept verbatim.
    pub description: Option<String>,
    /// Display title.
    pub summary: Option<String>,
    /// Whether the event is cancelled.
    pub cancelled: bool,
}

impl OutputEvent {
    /// Builds an output event carrying `raw` through unchanged.
    pub fn passthrough(raw: &RawEvent) -> Self {
        Self {
            uid: raw.uid.clone(),
            start: raw.start,
            end: raw.end,
            location: raw.location.clone(),
            description: raw.description.clone(),
            summary: raw.summary.clone(),
            cancelled: raw.is_cancelled(),
        }
    }
}

/// A component of a tokenized calendar.
///
/// Only [`CalendarComponent::Event`] carries data the assembler uses; every
/// other component kind (timezones, todos, ...) is kept as its name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CalendarComponent {
    /// A VEVENT.
    Event(RawEvent),
    /// Any other component, identified by its iCalendar name.
    Other { name: String },
}

/// A tokenized calendar fetched from a single feed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedCalendar {
    /// Components in feed order.
    pub components: Vec<CalendarComponent>,
}

impl FeedCalendar {
    /// Creates a calendar from its components.
    pub fn new(components: Vec<CalendarComponent>) -> Self {
        Self { components }
    }

    /// Creates a calendar holding only events.
    pub fn from_events(events: impl IntoIterator<Item = RawEvent>) -> Self {
        Self::new(events.into_iter().map(CalendarComponent::Event).collect())
    }

    /// Iterates over the events of the calendar, in feed order.
    pub fn events(&self) -> impl Iterator<Item = &RawEvent> {
        self.components.iter().filter_map(|component| match component {
            CalendarComponent::Event(event) => Some(event),
            CalendarComponent::Other { .. } => None,
        })
    }
}
