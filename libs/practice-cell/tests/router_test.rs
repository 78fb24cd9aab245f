use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use practice_cell::create_practice_router;
use shared_utils::test_utils::TestPatient;
use store_cell::{MemoryStorage, StateStore, StoreConfig};

async fn test_app() -> (Router, StateStore) {
    let store = StateStore::open(
        Arc::new(MemoryStorage::new()),
        StoreConfig::new("synapsa-crm-data", Duration::from_millis(600)),
    )
    .await;
    (create_practice_router(store.clone()), store)
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_create_and_search_patients() {
    let (app, store) = test_app().await;

    let response = app
        .clone()
        .oneshot(json_request("POST", "/patients", json!({ "name": "Ana", "tags": "luto, TCC" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let created = body_json(response).await;
    assert_eq!(created["name"], "Ana");
    assert_eq!(created["tags"], json!(["luto", "TCC"]));

    let response = app
        .oneshot(Request::builder().uri("/patients?q=an").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["total"], 1);
    assert_eq!(store.snapshot().await.patients.len(), 1);
}

#[tokio::test]
async fn test_validation_errors_map_to_422() {
    let (app, _) = test_app().await;

    let response = app
        .oneshot(json_request("POST", "/patients", json!({ "name": "" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body_json(response).await["error"], "name is required");
}

#[tokio::test]
async fn test_unknown_patient_maps_to_404() {
    let (app, _) = test_app().await;

    let response = app
        .oneshot(json_request(
            "POST",
            "/appointments",
            json!({ "patient_id": "404", "date": "2024-05-02" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_duplicate_payment_maps_to_409() {
    let (app, store) = test_app().await;
    store.set_patients(vec![TestPatient::new("1", "Ana")]).await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/appointments",
            json!({ "patient_id": "1", "date": "2024-05-02", "time": "10:00" }),
        ))
        .await
        .unwrap();
    let appointment = body_json(response).await;
    let pay_uri = format!("/appointments/{}/pay", appointment["id"].as_str().unwrap());

    let response = app
        .clone()
        .oneshot(Request::builder().method("POST").uri(&pay_uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["amount"], 200.0);

    let response = app
        .oneshot(Request::builder().method("POST").uri(&pay_uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_cancel_returns_composed_message() {
    let (app, store) = test_app().await;
    store.set_patients(vec![TestPatient::new("1", "Ana")]).await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/appointments",
            json!({ "patient_id": "1", "date": "2024-05-02", "time": "10:00" }),
        ))
        .await
        .unwrap();
    let appointment = body_json(response).await;
    let cancel_uri = format!("/appointments/{}/cancel", appointment["id"].as_str().unwrap());

    let response = app
        .oneshot(Request::builder().method("POST").uri(&cancel_uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["appointment"]["status"], "cancelled");
    assert_eq!(
        body["message"]["text"],
        "Sua consulta de 02/05/2024 às 10:00 foi cancelada."
    );
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let (app, store) = test_app().await;
    store.set_patients(vec![TestPatient::new("1", "Ana")]).await;

    let response = app
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["total_patients"], 1);
    assert_eq!(body["active_patients"], 1);
}

#[tokio::test]
async fn test_editing_routes() {
    let (app, store) = test_app().await;
    store.set_patients(vec![TestPatient::new("1", "Ana")]).await;

    let response = app
        .clone()
        .oneshot(json_request("PATCH", "/patients/1", json!({ "email": "ana@example.com" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["email"], "ana@example.com");

    let response = app
        .clone()
        .oneshot(json_request("POST", "/patients/1/emotions", json!({ "emotion": "medo" })))
        .await
        .unwrap();
    assert_eq!(body_json(response).await["clinicalRecord"]["frequentEmotions"], json!(["medo"]));

    let response = app
        .clone()
        .oneshot(json_request("POST", "/appointments", json!({ "patient_id": "1", "date": "2024-05-02" })))
        .await
        .unwrap();
    let appointment_id = body_json(response).await["id"].as_str().unwrap().to_string();

    let response = app
        .clone()
        .oneshot(json_request(
            "PATCH",
            &format!("/appointments/{}", appointment_id),
            json!({ "modality": "online" }),
        ))
        .await
        .unwrap();
    assert_eq!(body_json(response).await["modality"], "online");

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/appointments/{}/summary", appointment_id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let summary = body_json(response).await["aiSummary"].as_str().unwrap().to_string();
    assert!(summary.starts_with("Resumo da consulta de Ana em 02/05/2024"));
    assert_eq!(
        store.snapshot().await.patients[0].clinical_record.ai_summary.as_deref(),
        Some(summary.as_str())
    );
}
