use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use larder_core::image::decode_image;
use larder_core::receipt::scan_error_message;
use larder_core::{AiError, EnrichedPantryItem, ReceiptExtractor};
use serde::{Deserialize, Serialize};
use utoipa::{OpenApi, ToSchema};

use crate::api::{preflight, ApiError};
use crate::AppState;

/// Returns the router for /api/receipts endpoints (mounted at /api/receipts)
pub fn router() -> Router<AppState> {
    Router::new().route("/scan", post(scan_receipt).options(preflight))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ScanReceiptRequest {
    /// Receipt photo as a data URI or bare base64.
    pub image: String,
    /// Predict expiration for refrigerated storage (default true).
    #[serde(default)]
    pub refrigerated: Option<bool>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ScanReceiptResponse {
    pub items: Vec<EnrichedPantryItem>,
}

/// Extract grocery items from a receipt photo
///
/// Stateless: items are returned with category and predicted expiration but
/// are not saved anywhere.
#[utoipa::path(
    post,
    path = "/api/receipts/scan",
    tag = "receipts",
    request_body = ScanReceiptRequest,
    responses(
        (status = 200, description = "Items found on the receipt", body = ScanReceiptResponse),
        (status = 400, description = "Missing or unsupported image", body = crate::api::ErrorResponse),
        (status = 502, description = "Receipt could not be read", body = crate::api::ErrorResponse)
    )
)]
pub async fn scan_receipt(
    State(state): State<AppState>,
    payload: Result<Json<ScanReceiptRequest>, JsonRejection>,
) -> Result<Json<ScanReceiptResponse>, ApiError> {
    let Json(request) = payload?;
    let bytes = decode_image(&request.image)?;

    let extractor = ReceiptExtractor::new(state.gateway.clone())
        .with_model(&state.model)
        .with_refrigerated(request.refrigerated.unwrap_or(true));

    let items = extractor.scan(&bytes).await.map_err(|err| {
        let message = scan_error_message(&err);
        match err {
            AiError::MalformedModelOutput(_) => ApiError::from(err).with_message(message),
            other => ApiError::from(other),
        }
    })?;

    if state.storage.available() {
        state.storage.refresh();
    }

    Ok(Json(ScanReceiptResponse { items }))
}

#[derive(OpenApi)]
#[openapi(
    paths(scan_receipt),
    components(schemas(
        ScanReceiptRequest,
        ScanReceiptResponse,
        EnrichedPantryItem,
        larder_core::Category
    ))
)]
pub struct ApiDoc;
