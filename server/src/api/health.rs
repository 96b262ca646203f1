use axum::extract::State;
use axum::Json;
use serde::Serialize;
use utoipa::{OpenApi, ToSchema};

use crate::AppState;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub storage_available: bool,
}

#[utoipa::path(
    get,
    path = "/api/health",
    tag = "health",
    responses(
        (status = 200, description = "Service is up", body = HealthResponse)
    )
)]
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        storage_available: state.storage.available(),
    })
}

#[derive(OpenApi)]
#[openapi(paths(health), components(schemas(HealthResponse)))]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use crate::api::test_support::{app_with, send};
    use axum::http::{Method, StatusCode};
    use larder_core::storage::CountingStorage;
    use larder_core::{FakeGateway, NoopStorage};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_health_reports_storage() {
        let app = app_with(Arc::new(FakeGateway::new()), Arc::new(NoopStorage));
        let (status, body) = send(app, Method::GET, "/api/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["storage_available"], false);

        let app = app_with(Arc::new(FakeGateway::new()), Arc::new(CountingStorage::default()));
        let (_, body) = send(app, Method::GET, "/api/health", None).await;
        assert_eq!(body["storage_available"], true);
    }
}
