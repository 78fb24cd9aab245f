use std::sync::Arc;

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};

use assistant_cell::create_assistant_router;
use practice_cell::create_practice_router;
use shared_config::{AppConfig, AppPath};
use store_cell::create_store_router;

use crate::surfaces::Surfaces;

pub fn create_router(config: Arc<AppConfig>, surfaces: &Surfaces) -> Router {
    let crm = create_store_router(surfaces.crm.clone()).merge(create_practice_router(surfaces.crm.clone()));

    Router::new()
        .route("/", get(|| async { "Synapsa API is running!" }))
        .route("/links/{path}", get(app_link))
        .with_state(config.clone())
        .nest("/crm", crm)
        .nest("/portal", create_store_router(surfaces.portal.clone()))
        .nest("/assistant", create_assistant_router(config))
}

/// Landing page cross-link into the application.
async fn app_link(State(config): State<Arc<AppConfig>>, Path(path): Path<AppPath>) -> Json<Value> {
    Json(json!({
        "path": path,
        "href": config.app_href(path)
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::{Request, StatusCode}};
    use store_cell::MemoryStorage;
    use tower::ServiceExt;

    async fn test_app() -> (Router, Surfaces) {
        let config = Arc::new(AppConfig {
            app_url: "https://app.synapsa.test".to_string(),
            ..AppConfig::default()
        });
        let surfaces = Surfaces::open(&config, Arc::new(MemoryStorage::new())).await;
        (create_router(config, &surfaces), surfaces)
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    #[tokio::test]
    async fn test_links_resolve_to_role_select() {
        let (app, _) = test_app().await;

        let (status, body) = get_json(app.clone(), "/links/login").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["href"], "https://app.synapsa.test/role-select");

        let (status, _) = get_json(app, "/links/admin").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_surfaces_are_mounted_separately() {
        let (app, surfaces) = test_app().await;
        surfaces.crm.set_professional_name("Dra. Lia".into()).await;

        let (status, crm) = get_json(app.clone(), "/crm/state").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(crm["professionalName"], "Dra. Lia");

        let (_, portal) = get_json(app.clone(), "/portal/state").await;
        assert_eq!(portal["professionalName"], "");

        let (status, metrics) = get_json(app.clone(), "/crm/metrics").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(metrics["total_patients"], 0);

        // Practice operations are clinician-only.
        let (status, _) = get_json(app, "/portal/metrics").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
