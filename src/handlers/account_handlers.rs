//! Logout and owner account deletion.

use crate::{
    errors::AppError,
    handlers::context::{OwnerContext, RequestContext, clear_session_cookie},
    state::AppState,
};
use axum::{
    extract::State,
    http::{HeaderValue, header},
    response::{IntoResponse, Redirect, Response},
};
use tracing::{info, warn};

/// Redirect home and drop the session cookie.
fn signed_out(state: &AppState) -> Response {
    let mut response = Redirect::to("/").into_response();
    if let Ok(value) = HeaderValue::from_str(&clear_session_cookie(state.config.secure_cookies)) {
        response.headers_mut().insert(header::SET_COOKIE, value);
    }
    response
}

/// `POST /logout`
pub async fn logout(State(state): State<AppState>, ctx: RequestContext) -> Response {
    if let Some(session) = &ctx.session {
        if let Err(err) = state.sessions.destroy(&session.token).await {
            warn!("could not destroy session on logout: {}", err);
        }
    }
    signed_out(&state)
}

/// `DELETE /account/delete`
///
/// Removes the owner's photos, venue and bank account, then the account and
/// every session it holds.
pub async fn delete_account(
    State(state): State<AppState>,
    ctx: OwnerContext,
) -> Result<Response, AppError> {
    let owner_id = ctx.owner.id;
    let had_property = state.media.purge_owner(owner_id).await?;
    let had_account = state.identities.delete_bank_account(owner_id).await?;
    state.identities.delete_owner(owner_id).await?;
    let sessions = state.sessions.destroy_for_user(owner_id).await?;

    info!(
        "deleted owner {} (property: {}, bank account: {}, sessions: {})",
        owner_id, had_property, had_account, sessions
    );
    Ok(signed_out(&state))
}
