//! Calendar endpoints.
//!
//! - `GET /?url=&ignore=&subjects=&dedup=`: one feed, rules in the query
//! - `GET /calendar/{id}?dedup=`: the feeds of a registered preference

use std::collections::HashMap;

use axum::{
    Router,
    extract::{Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use hypercal_core::{FeedSource, FilterContext, OutputEvent, assemble_calendar};
use hypercal_feeds::render_calendar;

use crate::error::{ServerError, ServerResult};
use crate::state::AppState;

const CALENDAR_CONTENT_TYPE: &str = "text/calendar; charset=utf-8";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(feed_calendar))
        .route("/calendar/{id}", get(preference_calendar))
}

/// Query of the single-feed endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct FeedQuery {
    pub url: Option<String>,
    /// JSON list of subject codes.
    pub ignore: Option<String>,
    /// JSON object of subject code to title.
    pub subjects: Option<String>,
    pub dedup: Option<String>,
}

impl FeedQuery {
    /// Builds the source described by the query.
    fn source(self) -> ServerResult<FeedSource> {
        let url = self.url.ok_or_else(|| ServerError::missing("url"))?;

        let ignored: Vec<String> = match self.ignore.as_deref() {
            Some(raw) => serde_json::from_str(raw)
                .map_err(|e| ServerError::invalid_filter("ignore", e))?,
            None => Vec::new(),
        };
        let overrides: HashMap<String, String> = match self.subjects.as_deref() {
            Some(raw) => serde_json::from_str(raw)
                .map_err(|e| ServerError::invalid_filter("subjects", e))?,
            None => HashMap::new(),
        };

        Ok(FeedSource::new(url, FilterContext::from_rules(ignored, overrides)))
    }
}

/// Query of the preference endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct DedupQuery {
    pub dedup: Option<String>,
}

/// Reads the `dedup` flag; absent means no deduplication.
fn parse_dedup(raw: Option<&str>) -> ServerResult<bool> {
    match raw.map(str::to_ascii_lowercase).as_deref() {
        None | Some("false" | "0") => Ok(false),
        Some("true" | "1") => Ok(true),
        Some(other) => Err(ServerError::invalid_filter(
            "dedup",
            format!("expected true or false, got '{other}'"),
        )),
    }
}

/// GET / - Rewrite a single feed
async fn feed_calendar(
    State(state): State<AppState>,
    Query(query): Query<FeedQuery>,
) -> ServerResult<Response> {
    let dedup = parse_dedup(query.dedup.as_deref())?;
    let source = query.source()?;
    info!(url = %source.url, dedup, "Calendar request");

    let events = assemble_calendar(state.fetcher.as_ref(), &[source], dedup).await?;
    Ok(calendar_response(&events))
}

/// GET /calendar/{id} - Merge the feeds of a registered preference
async fn preference_calendar(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<DedupQuery>,
) -> ServerResult<Response> {
    let dedup = parse_dedup(query.dedup.as_deref())?;
    let uuid = Uuid::parse_str(&id).map_err(|_| ServerError::unknown_preference(&id))?;
    let record = state
        .store
        .get(&uuid)
        .await
        .ok_or_else(|| ServerError::unknown_preference(&id))?;
    info!(id = %uuid, feeds = record.feeds.len(), dedup, "Calendar request");

    let sources = FeedSource::from_preference(&record);
    let events = assemble_calendar(state.fetcher.as_ref(), &sources, dedup).await?;
    Ok(calendar_response(&events))
}

fn calendar_response(events: &[OutputEvent]) -> Response {
    ([(header::CONTENT_TYPE, CALENDAR_CONTENT_TYPE)], render_calendar(events)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedup_flag_values() {
        assert!(!parse_dedup(None).unwrap());
        assert!(!parse_dedup(Some("false")).unwrap());
        assert!(!parse_dedup(Some("0")).unwrap());
        assert!(parse_dedup(Some("true")).unwrap());
        assert!(parse_dedup(Some("TRUE")).unwrap());
        assert!(parse_dedup(Some("1")).unwrap());
    }

    #[test]
    fn invalid_dedup_flag_is_a_filter_error() {
        let err = parse_dedup(Some("maybe")).unwrap_err();
        assert_eq!(err.status_and_code().1, "INVALID_FILTER_INPUT");
    }
}
