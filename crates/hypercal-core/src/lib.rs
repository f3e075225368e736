//! Core of hypercal: metadata extraction, event rewriting and calendar
//! assembly for university timetable feeds.
//!
//! Nothing in this crate performs I/O. Feeds are obtained through the
//! [`FeedFetcher`] trait, implemented over HTTP by `hypercal-feeds`.

pub mod assemble;
pub mod code;
pub mod entities;
pub mod error;
pub mod event;
pub mod filter;
pub mod metadata;
pub mod preference;
pub mod rewrite;
pub mod subjects;
pub mod time;
pub mod tracing;

pub use assemble::{BoxFuture, FeedFetcher, FeedSource, assemble_calendar};
pub use code::is_subject_code;
pub use entities::{escape_html, unescape_html};
pub use error::{CoreResult, FeedError, FeedErrorKind};
pub use event::{CalendarComponent, FeedCalendar, OutputEvent, RawEvent};
pub use filter::FilterContext;
pub use metadata::{EventMetadata, SourceKind, parse_event_metadata};
pub use preference::{FeedPreference, PreferenceRecord};
pub use rewrite::{Rewrite, display_title, rewrite_event};
pub use subjects::list_subjects;
pub use time::EventTime;
pub use self::tracing::{TracingConfig, TracingError, TracingOutputFormat, init_tracing};
