use axum::{
    routing::{get, post, put},
    Router,
};

use crate::handlers::*;
use crate::services::StateStore;

pub fn create_store_router(store: StateStore) -> Router {
    Router::new()
        .route("/state", get(get_state))
        .route("/state/status", get(get_status))
        .route("/state/save", post(save_now))
        .route("/state/theme/toggle", post(toggle_theme))
        .route("/state/{field}", put(replace_field))
        .with_state(store)
}
