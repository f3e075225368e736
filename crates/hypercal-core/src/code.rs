//! Subject code recognition.

use std::sync::LazyLock;

use regex::Regex;

/// Regex for a full subject code: letter, four letters, three digits.
static SUBJECT_CODE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Z]-[A-Z]{4}-[0-9]{3}$").expect("Invalid subject code regex")
});

/// Returns true if `s` is exactly a subject code such as `A-BCDE-123`.
///
/// The match covers the whole string and is case-sensitive.
pub fn is_subject_code(s: &str) -> bool {
    SUBJECT_CODE_REGEX.is_match(s)
}
