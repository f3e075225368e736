//! Per-event title rewriting.
//!
//! The rewriter turns a [`RawEvent`] into an [`OutputEvent`] whose summary is
//! rebuilt from the metadata in its description. Events whose metadata cannot
//! be extracted are never lost: they pass through unchanged.

use tracing::trace;

use crate::event::{OutputEvent, RawEvent};
use crate::filter::FilterContext;
use crate::metadata::{EventMetadata, SourceKind, parse_event_metadata};

/// Separator between the parts of a display title.
const TITLE_SEPARATOR: &str = " - ";

/// Outcome of rewriting a single event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rewrite {
    /// The event belongs in the output calendar.
    Kept(OutputEvent),
    /// The event's subject is ignored.
    Dropped,
}

impl Rewrite {
    /// Returns the kept event, if any.
    pub fn into_event(self) -> Option<OutputEvent> {
        match self {
            Self::Kept(event) => Some(event),
            Self::Dropped => None,
        }
    }
}

/// Rewrites `event` according to `ctx`.
///
/// - No description, or no extractable metadata: passed through unchanged.
/// - Subject code in the ignore set: dropped.
/// - Otherwise the summary becomes `title[ - memo][ - type]`, where `title`
///   is the override for the code when one exists.
pub fn rewrite_event(event: &RawEvent, ctx: &FilterContext) -> Rewrite {
    let Some(metadata) = event
        .description
        .as_deref()
        .and_then(|description| parse_event_metadata(description, SourceKind::Description))
    else {
        trace!(uid = %event.uid, "No metadata, passing event through");
        return Rewrite::Kept(OutputEvent::passthrough(event));
    };

    if ctx.is_ignored(&metadata.code) {
        trace!(uid = %event.uid, code = %metadata.code, "Dropping ignored subject");
        return Rewrite::Dropped;
    }

    let title = ctx
        .title_override(&metadata.code)
        .unwrap_or(metadata.title.as_str());

    Rewrite::Kept(OutputEvent {
        uid: event.uid.clone(),
        start: event.start,
        end: event.end,
        location: event.location.clone(),
        description: event.description.clone(),
        summary: Some(display_title(title, &metadata)),
        cancelled: metadata.is_cancelled,
    })
}

/// Joins the title with the memo and session type, skipping absent parts.
pub fn display_title(title: &str, metadata: &EventMetadata) -> String {
    let mut display = title.to_string();
    for part in [&metadata.memo, &metadata.session_type].into_iter().flatten() {
        display.push_str(TITLE_SEPARATOR);
        display.push_str(part);
    }
    display
}
