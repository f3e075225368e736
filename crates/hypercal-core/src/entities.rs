//! HTML entity helpers for human-authored titles.
//!
//! Title overrides arrive HTML-encoded from the web front-end
//! (`Algo &amp; Structures`) and subject titles leave the service the same
//! way.

use std::sync::LazyLock;

use quick_xml::escape::{escape, resolve_html5_entity};
use regex::{Captures, Regex};

/// A named entity or a decimal/hexadecimal character reference.
static ENTITY_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&(#[0-9]+|#[xX][0-9a-fA-F]+|[A-Za-z][A-Za-z0-9]*);").expect("Invalid entity regex")
});

/// Decodes named HTML5 entities and numeric character references.
///
/// Each reference is decoded on its own: a bare `&`, an unknown name or an
/// out-of-range code point stays as written while the rest of the text is
/// still decoded.
pub fn unescape_html(s: &str) -> String {
    ENTITY_REGEX
        .replace_all(s, |caps: &Captures<'_>| {
            decode_entity(&caps[1]).unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

fn decode_entity(entity: &str) -> Option<String> {
    let Some(number) = entity.strip_prefix('#') else {
        return resolve_html5_entity(entity).map(str::to_string);
    };
    let code = match number.strip_prefix(['x', 'X']) {
        Some(hex) => u32::from_str_radix(hex, 16).ok()?,
        None => number.parse().ok()?,
    };
    char::from_u32(code).map(String::from)
}

/// Escapes `&`, `<`, `>`, `"` and `'`.
pub fn escape_html(s: &str) -> String {
    escape(s).into_owned()
}
