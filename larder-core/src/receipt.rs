//! Grocery item extraction from receipt photos.
//!
//! The generator is asked for a bare JSON array. Its output is parsed
//! all-or-nothing: one malformed entry rejects the whole batch, and the user is
//! asked to retake the photo rather than getting a silently partial list.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use crate::ai::prompts::{render_receipt_scan_prompt, RECEIPT_SCAN_SYSTEM_INSTRUCTIONS};
use crate::ai::{ExtractionGateway, GenerationRequest, ImageData, OutputFormat, DEFAULT_MODEL};
use crate::category::{classify, Category};
use crate::error::{AiError, ParseError};
use crate::expiration::{predict_for_category, ExpirationPredictor};
use crate::image::encode_image;
use crate::json::strip_code_fence;
use crate::lifecycle::{RequestLifecycle, RequestState};
use crate::storage::StorageCapability;

/// One line item as read by the generator. Unknown fields are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct RawExtractedItem {
    pub name: String,
    pub quantity: f64,
    pub unit: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
}

impl RawExtractedItem {
    fn validate(mut self) -> Result<Self, String> {
        self.name = self.name.trim().to_string();
        if self.name.is_empty() {
            return Err("name is empty".to_string());
        }
        if !self.quantity.is_finite() || self.quantity <= 0.0 {
            return Err(format!("quantity {} is not positive", self.quantity));
        }
        if let Some(price) = self.price {
            if !price.is_finite() || price < 0.0 {
                return Err(format!("price {} is negative", price));
            }
        }
        self.unit = self.unit.trim().to_string();
        Ok(self)
    }
}

/// A pantry-ready item: the extracted fields plus category and expiration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct EnrichedPantryItem {
    #[serde(flatten)]
    pub item: RawExtractedItem,
    pub category: Category,
    pub predicted_expiration_date: NaiveDate,
}

/// Parse generator text into items. Any invalid entry fails the batch.
pub fn parse_items(text: &str) -> Result<Vec<RawExtractedItem>, ParseError> {
    let value: Value = serde_json::from_str(strip_code_fence(text))
        .map_err(|e| ParseError::InvalidJson(e.to_string()))?;

    let Value::Array(entries) = value else {
        return Err(ParseError::NotAnArray);
    };

    entries
        .into_iter()
        .enumerate()
        .map(|(index, entry)| {
            serde_json::from_value::<RawExtractedItem>(entry)
                .map_err(|e| e.to_string())
                .and_then(RawExtractedItem::validate)
                .map_err(|reason| ParseError::InvalidItem { index, reason })
        })
        .collect()
}

/// Attach category and predicted expiration. Pure, so re-enriching yields the same result.
pub fn enrich(item: RawExtractedItem, refrigerated: bool, today: NaiveDate) -> EnrichedPantryItem {
    let category = classify(&item.name);
    let predicted_expiration_date = predict_for_category(category, refrigerated, today);
    EnrichedPantryItem {
        item,
        category,
        predicted_expiration_date,
    }
}

/// Reads receipts through the generator and enriches the result.
pub struct ReceiptExtractor {
    gateway: Arc<dyn ExtractionGateway>,
    predictor: ExpirationPredictor,
    model: String,
    refrigerated: bool,
}

impl ReceiptExtractor {
    pub fn new(gateway: Arc<dyn ExtractionGateway>) -> Self {
        Self {
            gateway,
            predictor: ExpirationPredictor::default(),
            model: DEFAULT_MODEL.to_string(),
            refrigerated: true,
        }
    }

    pub fn with_predictor(mut self, predictor: ExpirationPredictor) -> Self {
        self.predictor = predictor;
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Storage assumed when predicting expiration. Defaults to refrigerated.
    pub fn with_refrigerated(mut self, refrigerated: bool) -> Self {
        self.refrigerated = refrigerated;
        self
    }

    pub fn build_request(&self, image: ImageData) -> Result<GenerationRequest, AiError> {
        GenerationRequest::builder(render_receipt_scan_prompt())
            .image(image)
            .system_instructions(RECEIPT_SCAN_SYSTEM_INSTRUCTIONS)
            .temperature(0.1)
            .max_output_tokens(2048)
            .output_format(OutputFormat::StrictJson)
            .model_id(&self.model)
            .build()
    }

    /// Scan a receipt photo into enriched pantry items.
    pub async fn scan(&self, image_bytes: &[u8]) -> Result<Vec<EnrichedPantryItem>, AiError> {
        let image = encode_image(image_bytes)?;
        let request = self.build_request(image)?;

        let result = self.gateway.invoke(&request).await?;
        if let Some(usage) = &result.usage {
            tracing::debug!(total_tokens = usage.total_tokens, "Receipt scan usage");
        }

        let raw_items = parse_items(&result.text).map_err(|e| {
            tracing::warn!(error = %e, "Receipt scan returned unreadable output");
            AiError::from(e)
        })?;

        let today = self.predictor.today();
        let items: Vec<EnrichedPantryItem> = raw_items
            .into_iter()
            .map(|item| enrich(item, self.refrigerated, today))
            .collect();

        tracing::info!(items = items.len(), "Receipt scan complete");
        Ok(items)
    }
}

/// What a receipt-scanning screen shows.
#[derive(Debug, Clone, PartialEq)]
pub enum ScanState {
    Idle,
    Scanning,
    Success(Vec<EnrichedPantryItem>),
    Error(String),
}

/// User-facing message for a failed scan.
pub fn scan_error_message(error: &AiError) -> String {
    match error {
        AiError::MalformedModelOutput(_) => {
            "Could not read the receipt. Please retake the photo with the whole receipt in frame."
                .to_string()
        }
        other => other.user_message(),
    }
}

impl From<RequestState<Vec<EnrichedPantryItem>>> for ScanState {
    fn from(state: RequestState<Vec<EnrichedPantryItem>>) -> Self {
        match state {
            RequestState::Idle => ScanState::Idle,
            RequestState::InFlight => ScanState::Scanning,
            RequestState::Succeeded(items) => ScanState::Success(items),
            RequestState::Failed(error) => ScanState::Error(scan_error_message(&error)),
        }
    }
}

/// Receipt scanning with an observable lifecycle.
pub struct ReceiptScanner {
    extractor: Arc<ReceiptExtractor>,
    lifecycle: RequestLifecycle<Vec<EnrichedPantryItem>>,
    storage: Arc<dyn StorageCapability>,
}

impl ReceiptScanner {
    pub fn new(extractor: Arc<ReceiptExtractor>, storage: Arc<dyn StorageCapability>) -> Self {
        Self {
            extractor,
            lifecycle: RequestLifecycle::new(),
            storage,
        }
    }

    pub fn state(&self) -> ScanState {
        self.lifecycle.state().into()
    }

    pub fn lifecycle(&self) -> &RequestLifecycle<Vec<EnrichedPantryItem>> {
        &self.lifecycle
    }

    /// Scan a photo and return the resulting state.
    ///
    /// If another scan started meanwhile, this scan's outcome is discarded and
    /// the returned state reflects the newer scan.
    pub async fn scan(&self, image_bytes: &[u8]) -> ScanState {
        let ticket = self.lifecycle.begin();
        let outcome = self.extractor.scan(image_bytes).await;
        let succeeded = outcome.is_ok();

        if self.lifecycle.settle(ticket, outcome) && succeeded {
            self.storage.refresh();
        }

        self.state()
    }

    pub fn reset(&self) {
        self.lifecycle.reset();
    }
}
