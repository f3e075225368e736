//! HTTP routes.

pub mod calendar;
pub mod health;
pub mod register;
pub mod subjects;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Builds the application router.
///
/// The subject listing and the registration are called from the browser
/// editor and therefore answer cross-origin requests.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let editor = Router::new()
        .merge(subjects::router())
        .merge(register::router())
        .layer(cors);

    Router::new()
        .merge(health::router())
        .merge(calendar::router())
        .merge(editor)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
