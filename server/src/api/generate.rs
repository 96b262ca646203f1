use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use larder_core::ai::wire::{GenerateRequestBody, GenerateResponseBody};
use utoipa::OpenApi;

use crate::api::ApiError;
use crate::AppState;

/// Run one generation against the model provider
///
/// This is the endpoint `HttpGateway` clients call. Images may be data URIs or
/// bare base64. Provider failures are relayed with the provider's status.
#[utoipa::path(
    post,
    path = "/api/generate",
    tag = "generate",
    request_body = GenerateRequestBody,
    responses(
        (status = 200, description = "Generated text", body = GenerateResponseBody),
        (status = 400, description = "Missing prompt or invalid parameters", body = crate::api::ErrorResponse),
        (status = 500, description = "Provider credential not configured", body = crate::api::ErrorResponse),
        (status = 502, description = "Provider unreachable", body = crate::api::ErrorResponse)
    )
)]
pub async fn generate(
    State(state): State<AppState>,
    payload: Result<Json<GenerateRequestBody>, JsonRejection>,
) -> Result<Json<GenerateResponseBody>, ApiError> {
    let Json(body) = payload?;
    let request = body.into_request(&state.model).map_err(ApiError::relayed)?;

    let result = state
        .gateway
        .invoke(&request)
        .await
        .map_err(ApiError::relayed)?;

    if let Some(usage) = &result.usage {
        tracing::info!(
            model = request.model_id(),
            total_tokens = usage.total_tokens,
            "Generation complete"
        );
    }

    Ok(Json(GenerateResponseBody {
        text: result.text,
        usage: result.usage,
    }))
}

#[derive(OpenApi)]
#[openapi(
    paths(generate),
    components(schemas(GenerateRequestBody, GenerateResponseBody))
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use crate::api::test_support::{app_with, send, PNG};
    use axum::http::{Method, StatusCode};
    use larder_core::ai::{OutputFormat, Usage};
    use larder_core::image::encode_image;
    use larder_core::{AiError, FakeGateway, NoopStorage};
    use serde_json::json;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_generate_returns_text_and_usage() {
        let gateway = Arc::new(FakeGateway::always("[]").with_usage(Usage {
            prompt_tokens: 1,
            completion_tokens: 2,
            total_tokens: 3,
        }));
        let app = app_with(gateway.clone(), Arc::new(NoopStorage));

        let image = encode_image(PNG).unwrap().to_data_uri();
        let (status, body) = send(
            app,
            Method::POST,
            "/api/generate",
            Some(json!({"prompt": "read it", "images": [image], "format": "json", "temperature": 0.1})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["text"], "[]");
        assert_eq!(body["usage"]["total_tokens"], 3);

        let calls = gateway.calls();
        assert_eq!(calls[0].model_id(), "test/model");
        assert_eq!(calls[0].images()[0].mime_type, "image/png");
        assert_eq!(calls[0].output_format(), OutputFormat::StrictJson);
    }

    #[tokio::test]
    async fn test_blank_prompt_is_400_without_calling_provider() {
        let gateway = Arc::new(FakeGateway::always("unused"));

        for body in [json!({"prompt": "   "}), json!({"max_tokens": 10})] {
            let app = app_with(gateway.clone(), Arc::new(NoopStorage));
            let (status, response) = send(app, Method::POST, "/api/generate", Some(body)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert!(response["error"].as_str().is_some());
        }
        assert_eq!(gateway.call_count(), 0);
    }

    #[tokio::test]
    async fn test_malformed_json_is_400() {
        let app = app_with(Arc::new(FakeGateway::new()), Arc::new(NoopStorage));
        let (status, body) = send(app, Method::POST, "/api/generate", Some(json!(["not", "an", "object"]))).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "invalid_request");
    }

    #[tokio::test]
    async fn test_unconfigured_provider_is_500() {
        let gateway = Arc::new(FakeGateway::failing(AiError::ConfigurationMissing(
            "OPENROUTER_API_KEY is not configured".to_string(),
        )));
        let app = app_with(gateway, Arc::new(NoopStorage));
        let (status, body) =
            send(app, Method::POST, "/api/generate", Some(json!({"prompt": "hi"}))).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["code"], "configuration_missing");
        assert!(body["error"].as_str().unwrap().contains("not configured"));
    }

    #[tokio::test]
    async fn test_provider_rejection_is_relayed() {
        let gateway = Arc::new(FakeGateway::failing(AiError::UpstreamRejected {
            status: 429,
            message: "Rate limit exceeded".to_string(),
            details: Some("try again in 20s".to_string()),
        }));
        let app = app_with(gateway, Arc::new(NoopStorage));
        let (status, body) =
            send(app, Method::POST, "/api/generate", Some(json!({"prompt": "hi"}))).await;

        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(body["error"], "Rate limit exceeded");
        assert_eq!(body["details"], "try again in 20s");
        assert_eq!(body["code"], "upstream_rejected");
    }

    #[tokio::test]
    async fn test_unstructured_provider_failure_carries_preview() {
        let gateway = Arc::new(FakeGateway::failing(AiError::UpstreamError {
            status: 503,
            details: Some("Service Unavailable".to_string()),
        }));
        let app = app_with(gateway, Arc::new(NoopStorage));
        let (status, body) =
            send(app, Method::POST, "/api/generate", Some(json!({"prompt": "hi"}))).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["details"], "Service Unavailable");
    }
}
