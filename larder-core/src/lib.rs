pub mod ai;
pub mod category;
pub mod error;
pub mod expiration;
pub mod image;
pub mod json;
pub mod lifecycle;
pub mod receipt;
pub mod recipes;
pub mod storage;

pub use ai::{ExtractionGateway, FakeGateway, GatewayConfig, GenerationRequest, HttpGateway};
pub use category::{classify, Category};
pub use error::{AiError, ParseError};
pub use expiration::{Clock, ExpirationPredictor, FixedClock, SystemClock};
pub use image::{validate_image, MAX_FILE_SIZE};
pub use lifecycle::{RequestLifecycle, RequestState, Ticket};
pub use receipt::{
    enrich, parse_items, EnrichedPantryItem, RawExtractedItem, ReceiptExtractor, ReceiptScanner,
    ScanState,
};
pub use recipes::{
    parse_recipes, Preferences, RecipeSuggester, RecipeSuggestion, RecipeSuggestionEngine,
    RecipeValidation, SuggestRequest, SuggestionOutcome,
};
pub use storage::{NoopStorage, StorageCapability};
