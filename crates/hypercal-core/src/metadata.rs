//! Extraction of structured metadata from event text.
//!
//! Timetable feeds pack the interesting fields of an event into free text.
//! Two layouts exist:
//!
//! - **Description** (current): `key : value` lines joined by the two
//!   characters `\n` (a backslash and an `n`, not a line feed):
//!
//!   ```text
//!   Matière : B-INFO-204 - Algorithms\nSalle : R101\nType : TD
//!   ```
//!
//! - **Summary** (legacy): a single `code - title - type` line, optionally
//!   prefixed by `ANNULÉ : ` and polluted by sub-audience annotations such as
//!   `<.G1 - Groupe 1> L3 INFO`.
//!
//! # Example
//!
//! ```
//! use hypercal_core::metadata::{parse_event_metadata, SourceKind};
//!
//! let meta = parse_event_metadata(
//!     r"Matière : B-INFO-204 - Algorithms\nSalle : R101\nType : TD",
//!     SourceKind::Description,
//! )
//! .unwrap();
//! assert_eq!(meta.code, "B-INFO-204");
//! assert_eq!(meta.title, "Algorithms");
//! assert_eq!(meta.session_type.as_deref(), Some("TD"));
//! ```

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::code::is_subject_code;

/// Line separator inside a description: the escaped newline, two characters.
pub const LINE_SEPARATOR: &str = "\\n";

/// Separator between a key and its value.
const KEY_VALUE_SEPARATOR: &str = " : ";

/// Separator between code, title and type.
const FIELD_SEPARATOR: &str = " - ";

/// Key flagging a cancelled event.
pub const CANCELLED_KEY: &str = "ANNULÉ";
/// Key holding `<code> - <title>`.
pub const SUBJECT_KEY: &str = "Matière";
/// Key holding the room.
pub const ROOM_KEY: &str = "Salle";
/// Key holding the session type (CM, TD, TP, ...).
pub const SESSION_TYPE_KEY: &str = "Type";
/// Key holding a free memo.
pub const MEMO_KEY: &str = "Mémo";
/// Key holding the tutorial subgroup.
pub const GROUP_KEY: &str = "TD";

/// Prefix of a cancelled legacy summary.
const CANCELLED_PREFIX: &str = "ANNULÉ : ";

/// Regex for the sub-audience annotations injected into legacy summaries.
static AUDIENCE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<\.[A-Z0-9]+ - [^<]+> [^,-]+,?").expect("Invalid audience regex")
});

/// Which event field the text comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// `key : value` lines from the DESCRIPTION property.
    Description,
    /// Single-line `code - title - type` from the SUMMARY property.
    Summary,
}

/// Structured fields extracted from an event.
///
/// A value only exists when both a valid subject code and a title were found.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventMetadata {
    /// Whether the text marks the event as cancelled.
    pub is_cancelled: bool,
    /// Subject code, e.g. `B-INFO-204`.
    pub code: String,
    /// Subject title as written in the feed.
    pub title: String,
    /// Room.
    pub room: Option<String>,
    /// Session type (CM, TD, TP, ...).
    pub session_type: Option<String>,
    /// Free memo.
    pub memo: Option<String>,
    /// Tutorial subgroup.
    pub group_label: Option<String>,
    /// Every unrecognized key, verbatim.
    #[serde(default)]
    pub extra: HashMap<String, String>,
    /// Sub-audience annotations stripped from a legacy summary.
    #[serde(default)]
    pub audiences: Vec<String>,
}

/// Extracts metadata from the text of an event.
///
/// Returns `None` when no subject code and title could be located; callers
/// must then treat the event as opaque.
pub fn parse_event_metadata(raw: &str, kind: SourceKind) -> Option<EventMetadata> {
    match kind {
        SourceKind::Description => parse_description(raw),
        SourceKind::Summary => parse_summary(raw),
    }
}

fn parse_description(raw: &str) -> Option<EventMetadata> {
    let mut is_cancelled = false;
    let mut code = None;
    let mut title = None;
    let mut room = None;
    let mut session_type = None;
    let mut memo = None;
    let mut group_label = None;
    let mut extra = HashMap::new();

    for line in raw.split(LINE_SEPARATOR) {
        let Some((key, value)) = line.split_once(KEY_VALUE_SEPARATOR) else {
            continue;
        };

        match key.trim() {
            CANCELLED_KEY => is_cancelled = true,
            SUBJECT_KEY => {
                let Some((candidate, subject_title)) = value.split_once(FIELD_SEPARATOR) else {
                    continue;
                };
                if is_subject_code(candidate) {
                    code = Some(candidate.to_string());
                }
                title = Some(subject_title.to_string());
            }
            ROOM_KEY => room = Some(value.to_string()),
            SESSION_TYPE_KEY => session_type = Some(value.to_string()),
            MEMO_KEY => memo = Some(value.to_string()),
            GROUP_KEY => group_label = Some(value.to_string()),
            other => {
                extra.insert(other.to_string(), value.to_string());
            }
        }
    }

    Some(EventMetadata {
        is_cancelled,
        code: code?,
        title: title?,
        room,
        session_type,
        memo,
        group_label,
        extra,
        audiences: Vec::new(),
    })
}

fn parse_summary(raw: &str) -> Option<EventMetadata> {
    let (text, is_cancelled) = match raw.strip_prefix(CANCELLED_PREFIX) {
        Some(rest) => (rest, true),
        None => (raw, false),
    };

    let audiences: Vec<String> = AUDIENCE_REGEX
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect();

    // The annotations are removed as one joined span followed by the
    // separator that introduces the title. Annotations that are not
    // contiguous in the source are left in place.
    let text = if audiences.is_empty() {
        text.to_string()
    } else {
        text.replace(&format!("{}- ", audiences.join(" ")), "")
    };

    let (code, rest) = text.split_once(FIELD_SEPARATOR)?;
    if !is_subject_code(code) {
        return None;
    }
    let (title, session_type) = rest.rsplit_once(FIELD_SEPARATOR)?;

    Some(EventMetadata {
        is_cancelled,
        code: code.to_string(),
        title: title.to_string(),
        session_type: Some(session_type.to_string()),
        audiences,
        ..Default::default()
    })
}
