use axum::{
    middleware,
    routing::{get, patch, post},
    Router,
};

use crate::handlers::registrations::{
    approve_registration, create_registration, get_registration_by_id, past_passport,
    reject_registration, upcoming_passport,
};
use crate::middleware::auth::auth_middleware;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    // Traveler-facing routes read the caller out of a Bearer token. The
    // review routes are called by the admin dashboard.
    let traveler = Router::new()
        .route("/", post(create_registration))
        .route("/getRegistrationById/:id", get(get_registration_by_id))
        .route("/pastPassport", get(past_passport))
        .route("/upcomingPassport", get(upcoming_passport))
        .route_layer(middleware::from_fn(auth_middleware));

    let admin = Router::new()
        .route("/approve-registration/:id", patch(approve_registration))
        .route("/reject-registration/:id", patch(reject_registration));

    traveler.merge(admin)
}
