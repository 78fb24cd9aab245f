use std::sync::Arc;

use axum::{routing::post, Router};

use shared_config::AppConfig;

use crate::handlers::*;
use crate::services::AssistantClient;

pub fn create_assistant_router(config: Arc<AppConfig>) -> Router {
    let client = Arc::new(AssistantClient::new(&config));

    Router::new()
        .route("/chat/{agent}", post(chat))
        .route("/transcribe", post(transcribe))
        .with_state(client)
}
