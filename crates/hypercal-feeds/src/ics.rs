//! iCalendar reading and writing.
//!
//! Feeds are read with the low-level `icalendar` parser so that property
//! values reach the metadata extractor with the escaped line breaks the
//! timetable software writes (`\n`, two characters). The merged calendar is
//! written back with the `icalendar` builder.

use chrono::{NaiveDate, NaiveDateTime, TimeZone};
use chrono_tz::Tz;
use icalendar::parser::{Component as ParsedComponent, Property as ParsedProperty};
use icalendar::parser::{read_calendar, unfold};
use icalendar::{Calendar, Component, Event, EventLike, Property, ValueType};
use tracing::{debug, warn};

use hypercal_core::metadata::LINE_SEPARATOR;
use hypercal_core::{CalendarComponent, EventTime, FeedCalendar, OutputEvent, RawEvent};

const CALENDAR_MARKER: &str = "BEGIN:VCALENDAR";
const DATE_FORMAT: &str = "%Y%m%d";
const DATE_TIME_FORMAT: &str = "%Y%m%dT%H%M%S";
const UTC_FORMAT: &str = "%Y%m%dT%H%M%SZ";

/// Tokenizes feed text into a [`FeedCalendar`].
///
/// Returns `None` when the text holds no `VCALENDAR` or cannot be parsed.
/// Events lacking a UID or a usable DTSTART are skipped; an event without
/// DTEND ends when it starts.
pub fn parse_feed(ics: &str) -> Option<FeedCalendar> {
    if !ics.contains(CALENDAR_MARKER) {
        debug!("Feed body holds no calendar");
        return None;
    }

    let unfolded = unfold(ics);
    let calendar = match read_calendar(&unfolded) {
        Ok(calendar) => calendar,
        Err(e) => {
            warn!(error = %e, "Failed to parse feed");
            return None;
        }
    };

    let components = calendar
        .components
        .iter()
        .filter_map(|component| {
            if component.name == "VEVENT" {
                parse_event(component).map(CalendarComponent::Event)
            } else {
                Some(CalendarComponent::Other {
                    name: component.name.to_string(),
                })
            }
        })
        .collect();

    Some(FeedCalendar::new(components))
}

fn parse_event(component: &ParsedComponent<'_>) -> Option<RawEvent> {
    let Some(uid) = component.find_prop("UID").map(|p| p.val.to_string()) else {
        warn!("Skipping event without UID");
        return None;
    };
    let Some(start) = component.find_prop("DTSTART").and_then(parse_time) else {
        warn!(uid = %uid, "Skipping event without a usable DTSTART");
        return None;
    };
    let end = component
        .find_prop("DTEND")
        .and_then(parse_time)
        .unwrap_or(start);

    let mut event = RawEvent::new(uid, start, end);
    event.summary = text_value(component, "SUMMARY");
    event.description = text_value(component, "DESCRIPTION");
    event.location = text_value(component, "LOCATION");
    event.status = component.find_prop("STATUS").map(|p| p.val.to_string());

    debug!(uid = %event.uid, summary = ?event.summary, "Parsed event from feed");
    Some(event)
}

fn text_value(component: &ParsedComponent<'_>, name: &str) -> Option<String> {
    component
        .find_prop(name)
        .map(|p| normalize_text(p.val.as_ref()))
}

/// Decodes iCalendar text escapes except line breaks.
///
/// `\,`, `\;` and `\\` are decoded; both escaped and literal line breaks
/// end up as the two-character `\n` the metadata extractor splits on.
fn normalize_text(value: &str) -> String {
    let mut result = String::with_capacity(value.len());
    let mut chars = value.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.peek() {
                Some(&(',' | ';' | '\\')) => result.extend(chars.next()),
                Some('n' | 'N') => {
                    chars.next();
                    result.push_str(LINE_SEPARATOR);
                }
                _ => result.push(c),
            },
            '\r' => {}
            '\n' => result.push_str(LINE_SEPARATOR),
            _ => result.push(c),
        }
    }

    result
}

fn param<'a>(prop: &'a ParsedProperty<'_>, key: &str) -> Option<&'a str> {
    prop.params
        .iter()
        .find(|p| p.key == key)
        .and_then(|p| p.val.as_ref())
        .map(|v| v.as_ref())
}

/// Converts a DTSTART or DTEND property.
///
/// Zoned times are resolved with the IANA database; floating times and
/// unknown zones are taken as UTC.
fn parse_time(prop: &ParsedProperty<'_>) -> Option<EventTime> {
    let value = prop.val.as_ref().trim();

    if param(prop, "VALUE") == Some("DATE") || !value.contains('T') {
        return NaiveDate::parse_from_str(value, DATE_FORMAT)
            .ok()
            .map(EventTime::from_date);
    }

    if let Some(utc) = value.strip_suffix('Z') {
        return NaiveDateTime::parse_from_str(utc, DATE_TIME_FORMAT)
            .ok()
            .map(|dt| EventTime::from_utc(dt.and_utc()));
    }

    let naive = NaiveDateTime::parse_from_str(value, DATE_TIME_FORMAT).ok()?;
    let zoned = param(prop, "TZID").and_then(|tzid| match tzid.parse::<Tz>() {
        Ok(tz) => tz.from_local_datetime(&naive).earliest(),
        Err(_) => {
            warn!(tzid = %tzid, "Unknown time zone, assuming UTC");
            None
        }
    });

    Some(match zoned {
        Some(dt) => EventTime::from_local(dt),
        None => EventTime::from_utc(naive.and_utc()),
    })
}

/// Writes the merged events as an iCalendar document.
///
/// Escaped line breaks in descriptions become real line breaks, which the
/// writer escapes again per RFC 5545. Cancelled events carry
/// `STATUS:CANCELLED`.
pub fn render_calendar(events: &[OutputEvent]) -> String {
    let mut calendar = Calendar::new();
    for event in events {
        calendar.push(render_event(event));
    }
    calendar.done().to_string()
}

fn render_event(event: &OutputEvent) -> Event {
    let mut ics = Event::new();
    ics.uid(&event.uid);
    add_time(&mut ics, "DTSTART", &event.start);
    add_time(&mut ics, "DTEND", &event.end);

    if let Some(summary) = &event.summary {
        ics.summary(summary);
    }
    if let Some(location) = &event.location {
        ics.location(location);
    }
    if let Some(description) = &event.description {
        ics.description(&description.replace(LINE_SEPARATOR, "\n"));
    }
    if event.cancelled {
        ics.add_property("STATUS", "CANCELLED");
    }

    ics.done()
}

fn add_time(ics: &mut Event, name: &str, time: &EventTime) {
    match time {
        EventTime::AllDay(date) => {
            let mut prop = Property::new(name, date.format(DATE_FORMAT).to_string());
            prop.append_parameter(ValueType::Date);
            ics.append_property(prop);
        }
        EventTime::DateTime(dt) => {
            ics.add_property(name, dt.format(UTC_FORMAT).to_string());
        }
    }
}
