pub mod middleware;
pub mod rest;
pub mod state;


use axum::{extract::DefaultBodyLimit, middleware as axum_middleware, routing::post, Router};
use std::sync::Arc;

pub use middleware::require_auth;
pub use rest::{send_chat_message_handler, submit_paper_handler};
pub use state::AppState;

/// Builds the authenticated proofreading routes.
pub fn router(app_state: Arc<AppState>) -> Router {
    let max_upload_bytes = app_state.config.max_upload_bytes;

    Router::new()
        .route("/mooproof/{resource_id}/submit", post(submit_paper_handler))
        .route("/mooproof/{resource_id}/chat", post(send_chat_message_handler))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_auth,
        ))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .with_state(app_state)
}
