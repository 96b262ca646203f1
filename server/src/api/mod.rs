pub mod generate;
pub mod health;
pub mod receipts;
pub mod recipes;

use axum::extract::rejection::JsonRejection;
use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use larder_core::AiError;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;

use crate::AppState;

/// Shared error response used by all endpoints
pub use larder_core::ai::wire::GenerateErrorBody as ErrorResponse;

/// Base64 of a full-size photo plus JSON framing.
const MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

/// An error on its way to becoming a response.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorResponse,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            body: ErrorResponse::new(message).with_code("invalid_request"),
        }
    }

    /// Replace the user-facing message, keeping status and code.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.body.error = message.into();
        self
    }
}

fn error_status(err: &AiError) -> StatusCode {
    match err {
        AiError::InvalidRequest(_) | AiError::EmptyInput | AiError::MalformedImage(_) => {
            StatusCode::BAD_REQUEST
        }
        AiError::ConfigurationMissing(_) => StatusCode::INTERNAL_SERVER_ERROR,
        // Provider statuses are relayed as-is when they are errors
        AiError::UpstreamRejected { status, .. } | AiError::UpstreamError { status, .. } => {
            StatusCode::from_u16(*status)
                .ok()
                .filter(|s| s.is_client_error() || s.is_server_error())
                .unwrap_or(StatusCode::BAD_GATEWAY)
        }
        AiError::Unreachable(_) | AiError::MalformedModelOutput(_) | AiError::InvalidUpstreamShape(_) => {
            StatusCode::BAD_GATEWAY
        }
    }
}

impl ApiError {
    /// Error for `/api/generate`, whose callers are other services: the
    /// provider's message and details are passed through unchanged.
    pub fn relayed(err: AiError) -> Self {
        let status = error_status(&err);
        let message = match &err {
            AiError::UpstreamRejected { message, .. } => message.clone(),
            AiError::InvalidRequest(_) | AiError::ConfigurationMissing(_) => err.to_string(),
            _ => err.user_message(),
        };

        if status.is_server_error() {
            tracing::warn!(error = %err, "Generation failed");
        }

        let mut body = ErrorResponse::new(message).with_code(err.code());
        if let Some(details) = err.details() {
            body = body.with_details(details);
        }
        Self { status, body }
    }
}

/// Errors on user-facing routes only ever carry `AiError::user_message`;
/// the full error is logged.
impl From<AiError> for ApiError {
    fn from(err: AiError) -> Self {
        let status = error_status(&err);

        if status.is_client_error() {
            tracing::info!(error = %err, "Request rejected");
        } else {
            tracing::warn!(error = %err, "Request failed");
        }

        Self {
            status,
            body: ErrorResponse::new(err.user_message()).with_code(err.code()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

/// Empty 200 for `OPTIONS`; CORS headers come from the layer.
pub async fn preflight() -> StatusCode {
    StatusCode::OK
}

/// All routes with CORS and the body limit applied.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/generate",
            axum::routing::post(generate::generate).options(preflight),
        )
        .route("/api/health", get(health::health).options(preflight))
        .nest("/api/receipts", receipts::router())
        .nest("/api/recipes", recipes::router())
        .route("/api-docs/openapi.json", get(|| async { Json(openapi()) }))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Generate the complete OpenAPI spec by merging all module specs
pub fn openapi() -> utoipa::openapi::OpenApi {
    #[derive(OpenApi)]
    #[openapi(
        info(title = "larder", description = "Receipt scanning and recipe suggestions"),
        components(schemas(ErrorResponse))
    )]
    struct BaseApi;

    let mut spec = BaseApi::openapi();

    let modules: Vec<utoipa::openapi::OpenApi> = vec![
        generate::ApiDoc::openapi(),
        health::ApiDoc::openapi(),
        receipts::ApiDoc::openapi(),
        recipes::ApiDoc::openapi(),
    ];

    for module_spec in modules {
        spec.paths.paths.extend(module_spec.paths.paths);

        if let Some(module_components) = module_spec.components {
            if let Some(spec_components) = spec.components.as_mut() {
                spec_components.schemas.extend(module_components.schemas);
            }
        }
    }

    spec
}
