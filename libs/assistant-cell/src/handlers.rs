use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, State},
    Json,
};

use shared_models::error::AppError;

use crate::models::{AgentId, ChatReply, ChatRequest, Transcription};
use crate::services::AssistantClient;

#[axum::debug_handler]
pub async fn chat(
    State(client): State<Arc<AssistantClient>>,
    Path(agent): Path<AgentId>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatReply>, AppError> {
    let thread_id = request.thread_id.unwrap_or_default();
    let reply = client.chat(agent, &thread_id, &request.input).await?;
    Ok(Json(reply))
}

#[axum::debug_handler]
pub async fn transcribe(
    State(client): State<Arc<AssistantClient>>,
    audio: Bytes,
) -> Result<Json<Transcription>, AppError> {
    let text = client.transcribe(audio.to_vec()).await?;
    Ok(Json(Transcription { text }))
}
