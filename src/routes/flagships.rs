use axum::{routing::get, Router};

use crate::handlers::flagships::{get_flagship_by_id, get_flagships};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(get_flagships))
        .route("/getByID/:id", get(get_flagship_by_id))
}
