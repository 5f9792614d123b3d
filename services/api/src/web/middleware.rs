//! services/api/src/web/middleware.rs
//!
//! Authentication middleware for the proofreading routes.

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::Response,
};
use mooproof_core::domain::Caller;
use std::sync::Arc;
use tracing::warn;

use crate::web::state::AppState;

/// The cookie carrying the host platform's auth session id.
pub const SESSION_COOKIE: &str = "session";

/// Middleware that validates the session cookie and resolves the calling user.
///
/// On success a [`Caller`] is inserted into the request extensions.
/// A missing or unknown session is answered with 401 Unauthorized.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let session_id = req
        .headers()
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(session_from_cookies)
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let user_id = state
        .db
        .validate_auth_session(session_id)
        .await
        .map_err(|e| {
            warn!("Rejected auth session: {}", e);
            StatusCode::UNAUTHORIZED
        })?;

    req.extensions_mut().insert(Caller { user_id });

    Ok(next.run(req).await)
}

fn session_from_cookies(cookie_header: &str) -> Option<&str> {
    cookie_header.split(';').find_map(|c| {
        c.trim()
            .strip_prefix(SESSION_COOKIE)
            .and_then(|rest| rest.strip_prefix('='))
            .filter(|value| !value.is_empty())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_the_session_among_other_cookies() {
        assert_eq!(
            session_from_cookies("theme=dark; session=abc123; lang=en"),
            Some("abc123")
        );
        assert_eq!(session_from_cookies("sessionid=nope"), None);
        assert_eq!(session_from_cookies("session="), None);
    }
}
