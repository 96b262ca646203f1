use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use larder_core::{
    Preferences, RecipeSuggestion, RecipeSuggestionEngine, SuggestRequest, SuggestionOutcome,
};
use utoipa::OpenApi;

use crate::api::{preflight, ApiError};
use crate::AppState;

/// Returns the router for /api/recipes endpoints (mounted at /api/recipes)
pub fn router() -> Router<AppState> {
    Router::new().route("/suggest", post(suggest_recipes).options(preflight))
}

/// Suggest recipes for what is in the pantry
///
/// `pantryItems` lists item names. The older `ingredients` field is still
/// accepted but deprecated.
#[utoipa::path(
    post,
    path = "/api/recipes/suggest",
    tag = "recipes",
    request_body = SuggestRequest,
    responses(
        (status = 200, description = "Suggested recipes", body = SuggestionOutcome),
        (status = 400, description = "No pantry items given", body = crate::api::ErrorResponse),
        (status = 502, description = "Provider returned an unusable response", body = crate::api::ErrorResponse)
    )
)]
pub async fn suggest_recipes(
    State(state): State<AppState>,
    payload: Result<Json<SuggestRequest>, JsonRejection>,
) -> Result<Json<SuggestionOutcome>, ApiError> {
    let Json(request) = payload?;

    let engine = RecipeSuggestionEngine::new(state.gateway.clone())
        .with_model(&state.model)
        .with_validation(state.recipe_validation);

    let outcome = engine
        .suggest(&request.pantry_items, request.preferences.as_ref())
        .await?;

    Ok(Json(outcome))
}

#[derive(OpenApi)]
#[openapi(
    paths(suggest_recipes),
    components(schemas(SuggestRequest, SuggestionOutcome, RecipeSuggestion, Preferences))
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use crate::api::test_support::{app_with, send};
    use axum::http::{Method, StatusCode};
    use larder_core::{AiError, FakeGateway, NoopStorage};
    use serde_json::json;
    use std::sync::Arc;

    const RESPONSE: &str = r#"{"recipes": [
        {"name": "Omelette", "ingredients": ["eggs", "cheese"], "instructions": "Whisk and fry.",
         "prepTime": 10, "servings": 1, "category": "breakfast", "matchPercentage": 100},
        {"name": "Cheese Toast", "ingredients": ["bread", "cheese"], "instructions": "Toast.",
         "prepTime": 5, "servings": 2, "category": "snack", "matchPercentage": 50}
    ]}"#;

    #[tokio::test]
    async fn test_suggest_returns_all_recipes() {
        let gateway = Arc::new(FakeGateway::always(RESPONSE));
        let app = app_with(gateway.clone(), Arc::new(NoopStorage));

        let (status, body) = send(
            app,
            Method::POST,
            "/api/recipes/suggest",
            Some(json!({"pantryItems": ["eggs", "cheese"], "preferences": {"difficulty": "easy"}})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["recipes"].as_array().unwrap().len(), 2);
        assert_eq!(body["recipes"][0]["prepTimeMinutes"], 10);
        assert!(body["durationMs"].is_u64());
        assert!(gateway.calls()[0].prompt().contains("easy"));
    }

    #[tokio::test]
    async fn test_deprecated_ingredients_field_still_works() {
        let app = app_with(Arc::new(FakeGateway::always(RESPONSE)), Arc::new(NoopStorage));
        let (status, body) = send(
            app,
            Method::POST,
            "/api/recipes/suggest",
            Some(json!({"ingredients": ["eggs"]})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["recipes"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_empty_pantry_is_400() {
        let gateway = Arc::new(FakeGateway::always(RESPONSE));
        let app = app_with(gateway.clone(), Arc::new(NoopStorage));
        let (status, body) = send(
            app,
            Method::POST,
            "/api/recipes/suggest",
            Some(json!({"pantryItems": []})),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "empty_input");
        assert_eq!(gateway.call_count(), 0);
    }

    #[tokio::test]
    async fn test_response_without_recipes_is_502() {
        let app = app_with(
            Arc::new(FakeGateway::always(r#"{"meals": []}"#)),
            Arc::new(NoopStorage),
        );
        let (status, body) = send(
            app,
            Method::POST,
            "/api/recipes/suggest",
            Some(json!({"pantryItems": ["rice"]})),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["code"], "invalid_upstream_shape");
    }

    #[tokio::test]
    async fn test_provider_rejection_is_not_shown_to_user() {
        let gateway = Arc::new(FakeGateway::failing(AiError::UpstreamRejected {
            status: 429,
            message: "org-abc123 exceeded quota".to_string(),
            details: Some("tier: free".to_string()),
        }));
        let app = app_with(gateway, Arc::new(NoopStorage));
        let (status, body) = send(
            app,
            Method::POST,
            "/api/recipes/suggest",
            Some(json!({"pantryItems": ["rice"]})),
        )
        .await;

        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(body["code"], "upstream_rejected");
        let text = body.to_string();
        assert!(!text.contains("org-abc123"), "{}", text);
        assert!(!text.contains("tier: free"), "{}", text);
    }
}
