use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tracing::debug;

use crate::auth::AppState;
use crate::blocking;
use crate::error::ApiError;

/// Validate the bearer token and attach the resolved `Session` to the
/// request extensions.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let headers = req.headers().clone();
    let session = blocking(&state, move |state| Ok(state.sessions.check(&headers)?))
        .await
        .inspect_err(|e| debug!("Unauthenticated {} {}: {}", req.method(), req.uri(), e))?;

    debug!("Authorized {} for session {}", session.user.username, session.id);
    req.extensions_mut().insert(session);
    Ok(next.run(req).await)
}
