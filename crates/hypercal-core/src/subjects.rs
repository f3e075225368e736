//! Subject listing for the preference editor.

use std::collections::BTreeMap;

use crate::event::RawEvent;
use crate::metadata::{EventMetadata, SourceKind, parse_event_metadata};

/// Lists the subjects taught in `events`, keyed by subject code.
///
/// Each event is read from its description first and from its summary when
/// the description holds no metadata. A subject keeps the shortest title it
/// was seen with; on equal length the first one wins.
pub fn list_subjects<'a, I>(events: I) -> BTreeMap<String, String>
where
    I: IntoIterator<Item = &'a RawEvent>,
{
    let mut subjects: BTreeMap<String, String> = BTreeMap::new();

    for metadata in events.into_iter().filter_map(event_metadata) {
        match subjects.get_mut(&metadata.code) {
            Some(title) if metadata.title.chars().count() < title.chars().count() => {
                *title = metadata.title;
            }
            Some(_) => {}
            None => {
                subjects.insert(metadata.code, metadata.title);
            }
        }
    }

    subjects
}

fn event_metadata(event: &RawEvent) -> Option<EventMetadata> {
    event
        .description
        .as_deref()
        .and_then(|d| parse_event_metadata(d, SourceKind::Description))
        .or_else(|| {
            event
                .summary
                .as_deref()
                .and_then(|s| parse_event_metadata(s, SourceKind::Summary))
        })
}
