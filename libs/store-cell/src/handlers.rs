use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::{json, Value};

use shared_models::error::AppError;

use crate::services::StateStore;
use crate::snapshot::{CrmData, CrmField};

#[axum::debug_handler]
pub async fn get_state(
    State(store): State<StateStore>,
) -> Result<Json<CrmData>, AppError> {
    Ok(Json(store.snapshot().await))
}

#[axum::debug_handler]
pub async fn get_status(
    State(store): State<StateStore>,
) -> Result<Json<Value>, AppError> {
    Ok(Json(json!({
        "storage_key": store.storage_key(),
        "dirty": store.is_dirty(),
        "loaded_from": store.load_source(),
    })))
}

#[axum::debug_handler]
pub async fn replace_field(
    State(store): State<StateStore>,
    Path(field): Path<CrmField>,
    Json(value): Json<Value>,
) -> Result<Json<Value>, AppError> {
    store.replace_field(field, value).await?;

    Ok(Json(json!({
        "field": field.storage_name(),
        "updated": true
    })))
}

#[axum::debug_handler]
pub async fn toggle_theme(
    State(store): State<StateStore>,
) -> Result<Json<Value>, AppError> {
    let theme = store.toggle_theme().await;
    Ok(Json(json!({ "theme": theme })))
}

#[axum::debug_handler]
pub async fn save_now(
    State(store): State<StateStore>,
) -> Result<Json<Value>, AppError> {
    store.save_now().await?;
    Ok(Json(json!({ "saved": true })))
}
