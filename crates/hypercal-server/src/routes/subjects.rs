//! Subject listing used by the preference editor.

use std::collections::BTreeMap;

use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};
use serde::Deserialize;
use tracing::info;

use hypercal_core::{escape_html, list_subjects};

use crate::error::{ServerError, ServerResult};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/subjects/", get(subjects))
}

#[derive(Debug, Deserialize)]
pub struct SubjectsQuery {
    pub url: Option<String>,
}

/// GET /subjects/ - Subject code to HTML-escaped title
async fn subjects(
    State(state): State<AppState>,
    Query(query): Query<SubjectsQuery>,
) -> ServerResult<Json<BTreeMap<String, String>>> {
    let url = query.url.ok_or_else(|| ServerError::missing("url"))?;
    info!(url = %url, "Subjects request");

    let calendar = state.fetcher.fetch(&url).await?;
    let subjects = list_subjects(calendar.events())
        .into_iter()
        .map(|(code, title)| (code, escape_html(&title)))
        .collect();

    Ok(Json(subjects))
}
