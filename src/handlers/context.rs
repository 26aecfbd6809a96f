//! Per-request identity extractors.
//!
//! The `user-session` cookie selects a server-side session, whose stored
//! identity is resolved to a live account for this request only.

use crate::{
    models::{
        session::{CurrentUser, Flash, SessionRow},
        user::Owner,
    },
    state::AppState,
};
use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use cookie::{Cookie, SameSite};
use std::convert::Infallible;
use tracing::warn;

pub const SESSION_COOKIE: &str = "user-session";

/// Where owner pages send everyone else.
pub const LOGIN_PATH: &str = "/login";

/// The resolved user and session of the current request.
pub struct RequestContext {
    pub session: Option<SessionRow>,
    pub user: CurrentUser,
}

impl RequestContext {
    fn anonymous() -> Self {
        Self {
            session: None,
            user: CurrentUser::Anonymous,
        }
    }
}

impl FromRequestParts<AppState> for RequestContext {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(token) = session_token(&parts.headers) else {
            return Ok(Self::anonymous());
        };

        let session = match state.sessions.load(&token).await {
            Ok(Some(session)) => session,
            Ok(None) => return Ok(Self::anonymous()),
            Err(err) => {
                warn!("session lookup failed: {}", err);
                return Ok(Self::anonymous());
            }
        };

        let user = state.resolver.resolve(session.identity()).await;
        Ok(Self {
            session: Some(session),
            user,
        })
    }
}

/// A request made by a signed-in venue owner.
///
/// Anyone else is redirected to [`LOGIN_PATH`].
pub struct OwnerContext {
    pub owner: Owner,
    pub session: SessionRow,
}

impl OwnerContext {
    pub async fn take_flash(&self, state: &AppState) -> Option<Flash> {
        match state.sessions.take_flash(&self.session).await {
            Ok(flash) => flash,
            Err(err) => {
                warn!("could not read flash for owner {}: {}", self.owner.id, err);
                None
            }
        }
    }

    /// Queue a message for the page the owner is redirected to.
    pub async fn flash(&self, state: &AppState, flash: Flash) {
        if let Err(err) = state.sessions.set_flash(&self.session.token, &flash).await {
            warn!("could not store flash for owner {}: {}", self.owner.id, err);
        }
    }
}

impl FromRequestParts<AppState> for OwnerContext {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let ctx = match RequestContext::from_request_parts(parts, state).await {
            Ok(ctx) => ctx,
            Err(never) => match never {},
        };
        match (ctx.user, ctx.session) {
            (CurrentUser::Owner(owner), Some(session)) => Ok(Self { owner, session }),
            _ => Err(Redirect::to(LOGIN_PATH).into_response()),
        }
    }
}

/// Value of the session cookie, if the request carries one.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| Cookie::split_parse(value))
        .filter_map(Result::ok)
        .find(|cookie| cookie.name() == SESSION_COOKIE && !cookie.value().is_empty())
        .map(|cookie| cookie.value().to_string())
}

/// `Set-Cookie` value that removes the session cookie from the browser.
pub fn clear_session_cookie(secure: bool) -> String {
    let mut cookie = Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .build();
    cookie.make_removal();
    cookie.to_string()
}
