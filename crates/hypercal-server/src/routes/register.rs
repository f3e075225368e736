//! Preference registration.

use axum::{Json, Router, body::Bytes, extract::State, routing::post};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use hypercal_core::PreferenceRecord;

use crate::error::{ServerError, ServerResult};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/register", post(register))
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub id: Uuid,
}

/// POST /register - Store a preference record and return its identifier
async fn register(
    State(state): State<AppState>,
    body: Bytes,
) -> ServerResult<Json<RegisterResponse>> {
    let record: PreferenceRecord =
        serde_json::from_slice(&body).map_err(ServerError::invalid_registration)?;

    if record.is_empty() {
        return Err(ServerError::invalid_registration("the preference holds no feed"));
    }
    for feed in &record.feeds {
        state
            .feed_policy
            .check_url(&feed.url)
            .map_err(ServerError::invalid_registration)?;
    }

    let id = state.store.register(record).await?;
    info!(id = %id, "Registered preference");
    Ok(Json(RegisterResponse { id }))
}
