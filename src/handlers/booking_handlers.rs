//! Owner dashboard, booking history and approvals.

use crate::{
    errors::AppError,
    handlers::context::OwnerContext,
    models::{booking::BookingEntry, session::Flash, user::Owner},
    services::booking_service::BookingError,
    state::AppState,
};
use axum::{
    Json,
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
};
use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

const BOOKINGS_PATH: &str = "/bookings";

#[derive(Serialize)]
pub struct DashboardView {
    pub user: Owner,
    pub flash: Option<Flash>,
    pub upcoming_events: Vec<BookingEntry>,
}

#[derive(Serialize)]
pub struct HistoryView {
    pub user: Owner,
    pub flash: Option<Flash>,
    pub events: Vec<BookingEntry>,
}

/// `GET /dashboard`: bookings from today on, soonest first.
pub async fn dashboard(
    State(state): State<AppState>,
    ctx: OwnerContext,
) -> Result<Json<DashboardView>, AppError> {
    let today = Utc::now().date_naive();
    let upcoming_events = state.bookings.upcoming(ctx.owner.id, today).await?;
    let flash = ctx.take_flash(&state).await;
    Ok(Json(DashboardView {
        user: ctx.owner,
        flash,
        upcoming_events,
    }))
}

/// `GET /bookings`: every booking, newest submission first.
pub async fn history(
    State(state): State<AppState>,
    ctx: OwnerContext,
) -> Result<Json<HistoryView>, AppError> {
    let events = state.bookings.history(ctx.owner.id).await?;
    let flash = ctx.take_flash(&state).await;
    Ok(Json(HistoryView {
        user: ctx.owner,
        flash,
        events,
    }))
}

/// `POST /bookings/{id}/approve`
pub async fn approve(
    State(state): State<AppState>,
    ctx: OwnerContext,
    Path(booking_id): Path<Uuid>,
) -> Response {
    let flash = match state.bookings.approve(ctx.owner.id, booking_id).await {
        Ok(()) => Flash::success("Booking approved."),
        Err(BookingError::NotFound(_)) => Flash::error("Booking not found."),
        Err(err) => {
            tracing::error!("approving booking {} failed: {}", booking_id, err);
            Flash::error("Could not approve the booking. Please try again.")
        }
    };
    ctx.flash(&state, flash).await;
    Redirect::to(BOOKINGS_PATH).into_response()
}
