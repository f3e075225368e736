//! Calendar assembly.
//!
//! The assembler fetches every feed of a request in order, rewrites their
//! events and concatenates the results, optionally removing duplicates that
//! several feeds publish for the same session.
//!
//! Fetching is abstracted behind [`FeedFetcher`] so the assembly logic can
//! be driven by an HTTP client in production and by canned calendars in
//! tests.

use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;

use tracing::{debug, warn};

use crate::error::CoreResult;
use crate::event::{FeedCalendar, OutputEvent};
use crate::filter::FilterContext;
use crate::preference::PreferenceRecord;
use crate::rewrite::rewrite_event;
use crate::time::EventTime;

/// A boxed future for async trait methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Retrieves and tokenizes the calendar published at a URL.
///
/// Implementors decide which URLs are acceptable and how long a fetch may
/// take; the assembler only awaits the result.
pub trait FeedFetcher: Send + Sync {
    /// Fetches the calendar at `url`.
    ///
    /// # Errors
    ///
    /// Returns a [`crate::FeedError`] when the feed cannot be downloaded or
    /// holds no calendar.
    fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, CoreResult<FeedCalendar>>;
}

/// One feed of an assembly request with the rules applied to its events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedSource {
    /// The feed URL.
    pub url: String,
    /// Ignore set and title overrides for this feed.
    pub filter: FilterContext,
}

impl FeedSource {
    /// Creates a source for `url` with the given rules.
    pub fn new(url: impl Into<String>, filter: FilterContext) -> Self {
        Self {
            url: url.into(),
            filter,
        }
    }

    /// Builds the source list of a stored preference, in record order.
    pub fn from_preference(record: &PreferenceRecord) -> Vec<Self> {
        record
            .feeds
            .iter()
            .map(|feed| Self::new(&feed.url, feed.filter_context()))
            .collect()
    }
}

/// Identity of an event for duplicate removal.
type DedupKey = (Option<String>, EventTime, EventTime);

fn dedup_key(event: &OutputEvent) -> DedupKey {
    (event.summary.clone(), event.start, event.end)
}

/// Builds the merged event list for `sources`.
///
/// Sources are fetched one after the other in the given order and their
/// rewritten events are concatenated in that same order. With `dedup`, an
/// event whose display title, start and end equal those of an earlier event
/// is left out, whatever its uid.
///
/// # Errors
///
/// The first fetch error aborts the assembly and is returned as-is; no
/// partial calendar is produced.
pub async fn assemble_calendar(
    fetcher: &dyn FeedFetcher,
    sources: &[FeedSource],
    dedup: bool,
) -> CoreResult<Vec<OutputEvent>> {
    let mut events = Vec::new();
    let mut seen: HashSet<DedupKey> = HashSet::new();

    for source in sources {
        let calendar = match fetcher.fetch(&source.url).await {
            Ok(calendar) => calendar,
            Err(e) => {
                warn!(url = %source.url, error = %e, "Aborting calendar assembly");
                return Err(e);
            }
        };

        let before = events.len();
        for event in calendar.events() {
            let Some(out) = rewrite_event(event, &source.filter).into_event() else {
                continue;
            };
            if dedup && !seen.insert(dedup_key(&out)) {
                debug!(uid = %out.uid, "Skipping duplicate event");
                continue;
            }
            events.push(out);
        }

        debug!(
            url = %source.url,
            kept = events.len() - before,
            "Merged feed"
        );
    }

    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{FeedError, FeedErrorKind};
    use crate::event::{CalendarComponent, RawEvent};
    use crate::preference::FeedPreference;
    use chrono::{DateTime, Utc};
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Serves canned calendars and records the URLs it was asked for.
    #[derive(Default)]
    struct MockFetcher {
        feeds: HashMap<String, CoreResult<FeedCalendar>>,
        calls: Mutex<Vec<String>>,
    }

    impl MockFetcher {
        fn with_feed(mut self, url: &str, calendar: FeedCalendar) -> Self {
            self.feeds.insert(url.to_string(), Ok(calendar));
            self
        }

        fn with_error(mut self, url: &str, error: FeedError) -> Self {
            self.feeds.insert(url.to_string(), Err(error));
            self
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl FeedFetcher for MockFetcher {
        fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, CoreResult<FeedCalendar>> {
            self.calls.lock().unwrap().push(url.to_string());
            let result = self
                .feeds
                .get(url)
                .cloned()
                .unwrap_or_else(|| Err(FeedError::unreachable(url, "not found")));
            Box::pin(async move { result })
        }
    }

    fn time(s: &str) -> EventTime {
        let dt: DateTime<Utc> = s.parse().unwrap();
        EventTime::from_utc(dt)
    }

    fn course(uid: &str, code: &str, title: &str, start: &str, end: &str) -> RawEvent {
        RawEvent::new(uid, time(start), time(end))
            .with_summary(format!("{code} - {title}"))
            .with_description(format!(r"Matière : {code} - {title}\nType : CM"))
    }

    fn source(url: &str) -> FeedSource {
        FeedSource::new(url, FilterContext::new())
    }

    const A: &str = "https://hplanning.example/a.ics";
    const B: &str = "https://hplanning.example/b.ics";
    const C: &str = "https://hplanning.example/c.ics";

    fn shared_lecture(uid: &str) -> RawEvent {
        course(
            uid,
            "B-INFO-204",
            "Algorithms",
            "2025-02-05T08:00:00Z",
            "2025-02-05T10:00:00Z",
        )
    }

    #[tokio::test]
    async fn concatenates_sources_in_order() {
        let fetcher = MockFetcher::default()
            .with_feed(
                A,
                FeedCalendar::from_events([course(
                    "a1",
                    "A-MATH-101",
                    "Analyse",
                    "2025-02-06T08:00:00Z",
                    "2025-02-06T10:00:00Z",
                )]),
            )
            .with_feed(B, FeedCalendar::from_events([shared_lecture("b1")]));

        let events = assemble_calendar(&fetcher, &[source(A), source(B)], false)
            .await
            .unwrap();

        let uids: Vec<_> = events.iter().map(|e| e.uid.as_str()).collect();
        assert_eq!(uids, ["a1", "b1"]);
        assert_eq!(events[0].summary.as_deref(), Some("Analyse - CM"));
        assert_eq!(fetcher.calls(), [A, B]);
    }

    #[tokio::test]
    async fn dedup_keeps_first_occurrence() {
        let fetcher = MockFetcher::default()
            .with_feed(A, FeedCalendar::from_events([shared_lecture("a1")]))
            .with_feed(B, FeedCalendar::from_events([shared_lecture("b1")]));
        let sources = [source(A), source(B)];

        let merged = assemble_calendar(&fetcher, &sources, true).await.unwrap();
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].uid, "a1");

        let all = assemble_calendar(&fetcher, &sources, false).await.unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn dedup_compares_display_title_not_uid() {
        let other_time = course(
            "b1",
            "B-INFO-204",
            "Algorithms",
            "2025-02-05T10:00:00Z",
            "2025-02-05T12:00:00Z",
        );
        let fetcher = MockFetcher::default()
            .with_feed(A, FeedCalendar::from_events([shared_lecture("same")]))
            .with_feed(B, FeedCalendar::from_events([other_time, shared_lecture("same")]));

        let events = assemble_calendar(&fetcher, &[source(A), source(B)], true)
            .await
            .unwrap();

        assert_eq!(events.len(), 2);
        assert_eq!(events[1].start, time("2025-02-05T10:00:00Z"));
    }

    #[tokio::test]
    async fn overrides_apply_before_dedup() {
        let fetcher = MockFetcher::default()
            .with_feed(A, FeedCalendar::from_events([shared_lecture("a1")]))
            .with_feed(B, FeedCalendar::from_events([shared_lecture("b1")]));
        let renamed = FeedSource::new(B, FilterContext::new().with_override("B-INFO-204", "Algo"));

        let events = assemble_calendar(&fetcher, &[source(A), renamed], true)
            .await
            .unwrap();

        assert_eq!(events.len(), 2);
        assert_eq!(events[1].summary.as_deref(), Some("Algo - CM"));
    }

    #[tokio::test]
    async fn ignored_subjects_are_dropped_per_source() {
        let fetcher = MockFetcher::default()
            .with_feed(A, FeedCalendar::from_events([shared_lecture("a1")]))
            .with_feed(B, FeedCalendar::from_events([shared_lecture("b1")]));
        let ignoring = FeedSource::new(A, FilterContext::new().with_ignored("B-INFO-204"));

        let events = assemble_calendar(&fetcher, &[ignoring, source(B)], false)
            .await
            .unwrap();

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].uid, "b1");
    }

    #[tokio::test]
    async fn first_failure_aborts_remaining_sources() {
        let fetcher = MockFetcher::default()
            .with_feed(A, FeedCalendar::from_events([shared_lecture("a1")]))
            .with_error(B, FeedError::unreachable(B, "HTTP 503"))
            .with_feed(C, FeedCalendar::from_events([shared_lecture("c1")]));

        let err = assemble_calendar(&fetcher, &[source(A), source(B), source(C)], false)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), FeedErrorKind::SourceUnreachable);
        assert_eq!(
            err,
            FeedError::SourceUnreachable {
                url: B.to_string(),
                reason: "HTTP 503".to_string(),
            }
        );
        assert_eq!(fetcher.calls(), [A, B]);
    }

    #[tokio::test]
    async fn empty_calendar_aborts_like_unreachable() {
        let fetcher = MockFetcher::default()
            .with_feed(A, FeedCalendar::from_events([shared_lecture("a1")]))
            .with_error(B, FeedError::empty(B))
            .with_feed(C, FeedCalendar::from_events([shared_lecture("c1")]));

        let err = assemble_calendar(&fetcher, &[source(A), source(B), source(C)], false)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), FeedErrorKind::EmptySourceCalendar);
        assert_eq!(fetcher.calls(), [A, B]);
    }

    #[tokio::test]
    async fn non_event_components_are_skipped() {
        let calendar = FeedCalendar::new(vec![
            CalendarComponent::Other {
                name: "VTIMEZONE".to_string(),
            },
            CalendarComponent::Event(shared_lecture("a1")),
        ]);
        let fetcher = MockFetcher::default().with_feed(A, calendar);

        let events = assemble_calendar(&fetcher, &[source(A)], false).await.unwrap();
        assert_eq!(events.len(), 1);
    }

    #[tokio::test]
    async fn empty_source_list_yields_empty_calendar() {
        let fetcher = MockFetcher::default();
        let events = assemble_calendar(&fetcher, &[], true).await.unwrap();

        assert!(events.is_empty());
        assert!(fetcher.calls().is_empty());
    }

    #[test]
    fn sources_from_preference_keep_order_and_rules() {
        let record = PreferenceRecord::new(vec![
            FeedPreference::new(A).with_ignored("A-BCDE-123"),
            FeedPreference::new(B).with_subject("B-INFO-204", "Algo &amp; Co"),
        ]);
        let sources = FeedSource::from_preference(&record);

        assert_eq!(sources.len(), 2);
        assert_eq!(sources[0].url, A);
        assert!(sources[0].filter.is_ignored("A-BCDE-123"));
        assert_eq!(sources[1].filter.title_override("B-INFO-204"), Some("Algo & Co"));
    }
}
