//! Defines routes for the owner back office.
//!
//! ## Structure
//! - **Health**: `GET /healthz`, `GET /readyz`
//! - **Owner pages** (redirect to `/login` without an owner session)
//!   - `GET    /dashboard`, upcoming bookings
//!   - `GET    /bookings`, booking history
//!   - `POST   /bookings/{id}/approve`
//!   - `GET    /profile`
//!   - `POST   /profile/prop`, multipart profile update
//!   - `POST   /profile/owner`, owner details form
//!   - `POST   /profile/bankaccount`, bank account form
//!   - `DELETE /account/delete`
//! - **Public**
//!   - `GET    /api/image/props/{filename}`
//!   - `POST   /logout`

use crate::{
    handlers::{
        account_handlers::{delete_account, logout},
        booking_handlers::{approve, dashboard, history},
        health_handlers::{healthz, readyz},
        image_handlers::get_image,
        profile_handlers::{
            show_profile, update_bank_account, update_owner_details, update_profile,
        },
    },
    services::media_service::IMAGE_ROUTE_PREFIX,
    state::AppState,
};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
};

/// Build the router; `max_upload_bytes` bounds the profile submission body.
pub fn routes(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        // health endpoints (mounted at root)
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/dashboard", get(dashboard))
        .route("/bookings", get(history))
        .route("/bookings/{id}/approve", post(approve))
        .route("/profile", get(show_profile))
        .route(
            "/profile/prop",
            post(update_profile).layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .route("/profile/owner", post(update_owner_details))
        .route("/profile/bankaccount", post(update_bank_account))
        .route(&format!("{IMAGE_ROUTE_PREFIX}/{{filename}}"), get(get_image))
        .route("/logout", post(logout))
        .route("/account/delete", delete(delete_account))
}
