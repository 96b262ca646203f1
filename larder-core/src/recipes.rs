//! Recipe suggestions from pantry contents.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use tokio::time::Instant;

use crate::ai::prompts::render_recipe_suggest_prompt;
use crate::ai::{ExtractionGateway, GenerationRequest, OutputFormat, Usage, DEFAULT_MODEL};
use crate::error::AiError;
use crate::json::strip_code_fence;
use crate::lifecycle::{RequestLifecycle, RequestState};

/// Optional constraints passed verbatim into the prompt.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Preferences {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dietary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cuisine: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<String>,
}

/// Request for a batch of suggestions.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct SuggestRequest {
    /// Names of items currently in the pantry.
    ///
    /// `ingredients` is still accepted as a deprecated alias for older
    /// clients and will be removed once they have migrated.
    #[serde(default, alias = "ingredients")]
    pub pantry_items: Vec<String>,
    #[serde(default)]
    pub preferences: Option<Preferences>,
}

/// One suggested recipe.
///
/// Fields are only `None` under [`RecipeValidation::Lenient`], when the model
/// left them out or sent something unusable; they are never filled in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct RecipeSuggestion {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub ingredients: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prep_time_minutes: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub servings: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Share of the recipe's ingredients already in the pantry, 0-100.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_percentage: Option<f64>,
}

impl RecipeSuggestion {
    /// The first required field that is missing or out of range.
    pub fn problem(&self) -> Option<&'static str> {
        if self.name.is_none() {
            Some("missing name")
        } else if self.ingredients.is_empty() {
            Some("missing ingredients")
        } else if self.instructions.is_none() {
            Some("missing instructions")
        } else if self.prep_time_minutes.is_none() {
            Some("prep time is not a positive number")
        } else if self.servings.is_none() {
            Some("servings is not a positive number")
        } else if self.category.is_none() {
            Some("missing category")
        } else if self.match_percentage.is_none() {
            Some("match percentage is not within 0-100")
        } else {
            None
        }
    }

    pub fn is_complete(&self) -> bool {
        self.problem().is_none()
    }
}

/// How malformed entries inside the `recipes` array are treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecipeValidation {
    /// Keep every entry. Fields that are missing or out of range are left
    /// empty and logged. An entry that is not an object fails the batch.
    #[default]
    Lenient,
    /// Drop entries that fail validation and keep the rest.
    FilterInvalid,
    /// Fail the whole batch if any entry fails validation.
    Strict,
}

#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct SuggestionOutcome {
    pub recipes: Vec<RecipeSuggestion>,
    pub duration_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_usage: Option<Usage>,
}

fn field<'a>(map: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|key| map.get(*key)).filter(|v| !v.is_null())
}

fn text_field(map: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    match field(map, keys)? {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Array(lines) => {
            let lines: Vec<&str> = lines.iter().filter_map(Value::as_str).collect();
            Some(lines.join("\n"))
        }
        _ => None,
    }
}

fn number_field(map: &Map<String, Value>, keys: &[&str]) -> Option<f64> {
    match field(map, keys)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
    .filter(|n| n.is_finite())
}

fn string_list(map: &Map<String, Value>, keys: &[&str]) -> Option<Vec<String>> {
    let Value::Array(items) = field(map, keys)? else {
        return None;
    };
    Some(
        items
            .iter()
            .filter_map(Value::as_str)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
    )
}

const NAME: &[&str] = &["name", "title"];
const INGREDIENTS: &[&str] = &["ingredients"];
const INSTRUCTIONS: &[&str] = &["instructions", "steps"];
const PREP_TIME: &[&str] = &["prepTime", "prep_time", "prepTimeMinutes", "prep_time_minutes"];
const SERVINGS: &[&str] = &["servings"];
const CATEGORY: &[&str] = &["category"];
const MATCH: &[&str] = &["matchPercentage", "match_percentage"];

fn non_empty_text(map: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    text_field(map, keys).filter(|s| !s.is_empty())
}

fn positive_whole(n: Option<f64>) -> Option<u32> {
    n.filter(|n| (1.0..=u32::MAX as f64).contains(n))
        .map(|n| n.round() as u32)
}

/// Read whatever usable fields an entry has, without substituting values.
fn read_recipe(entry: &Value) -> Result<RecipeSuggestion, &'static str> {
    let map = entry.as_object().ok_or("entry is not an object")?;

    Ok(RecipeSuggestion {
        name: non_empty_text(map, NAME),
        ingredients: string_list(map, INGREDIENTS).unwrap_or_default(),
        instructions: non_empty_text(map, INSTRUCTIONS),
        prep_time_minutes: positive_whole(number_field(map, PREP_TIME)),
        servings: positive_whole(number_field(map, SERVINGS)),
        category: non_empty_text(map, CATEGORY),
        match_percentage: number_field(map, MATCH).filter(|n| (0.0..=100.0).contains(n)),
    })
}

fn validate_recipe(entry: &Value) -> Result<RecipeSuggestion, &'static str> {
    let recipe = read_recipe(entry)?;
    match recipe.problem() {
        Some(reason) => Err(reason),
        None => Ok(recipe),
    }
}

fn entry_error(index: usize, reason: &str) -> AiError {
    AiError::InvalidUpstreamShape(format!("recipe {}: {}", index, reason))
}

/// Parse generator text into recipes under the given policy.
///
/// Text that is not JSON is `MalformedModelOutput`; JSON without a `recipes`
/// array is `InvalidUpstreamShape`.
pub fn parse_recipes(text: &str, policy: RecipeValidation) -> Result<Vec<RecipeSuggestion>, AiError> {
    let value: Value = serde_json::from_str(strip_code_fence(text))
        .map_err(|e| AiError::MalformedModelOutput(format!("recipe response is not JSON: {}", e)))?;

    let entries = value
        .get("recipes")
        .and_then(Value::as_array)
        .ok_or_else(|| {
            AiError::InvalidUpstreamShape("response has no \"recipes\" array".to_string())
        })?;

    match policy {
        RecipeValidation::Lenient => entries
            .iter()
            .enumerate()
            .map(|(index, entry)| -> Result<RecipeSuggestion, AiError> {
                let recipe = read_recipe(entry).map_err(|reason| entry_error(index, reason))?;
                if let Some(reason) = recipe.problem() {
                    tracing::warn!(index, reason, "Keeping incomplete recipe");
                }
                Ok(recipe)
            })
            .collect(),
        RecipeValidation::FilterInvalid => {
            let mut recipes = Vec::with_capacity(entries.len());
            for (index, entry) in entries.iter().enumerate() {
                match validate_recipe(entry) {
                    Ok(recipe) => recipes.push(recipe),
                    Err(reason) => tracing::warn!(index, reason, "Dropping invalid recipe"),
                }
            }
            Ok(recipes)
        }
        RecipeValidation::Strict => entries
            .iter()
            .enumerate()
            .map(|(index, entry)| validate_recipe(entry).map_err(|reason| entry_error(index, reason)))
            .collect(),
    }
}

/// Suggests recipes for what is already in the pantry.
pub struct RecipeSuggestionEngine {
    gateway: Arc<dyn ExtractionGateway>,
    model: String,
    validation: RecipeValidation,
}

impl RecipeSuggestionEngine {
    pub fn new(gateway: Arc<dyn ExtractionGateway>) -> Self {
        Self {
            gateway,
            model: DEFAULT_MODEL.to_string(),
            validation: RecipeValidation::default(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_validation(mut self, validation: RecipeValidation) -> Self {
        self.validation = validation;
        self
    }

    pub fn validation(&self) -> RecipeValidation {
        self.validation
    }

    /// Suggest recipes for the given pantry items.
    ///
    /// Blank names are ignored; if nothing remains this fails with
    /// `EmptyInput` before any call to the generator.
    pub async fn suggest(
        &self,
        pantry_item_names: &[String],
        preferences: Option<&Preferences>,
    ) -> Result<SuggestionOutcome, AiError> {
        let names: Vec<String> = pantry_item_names
            .iter()
            .map(|name| name.trim())
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect();

        if names.is_empty() {
            return Err(AiError::EmptyInput);
        }

        let started = Instant::now();
        let request = GenerationRequest::builder(render_recipe_suggest_prompt(&names, preferences))
            .temperature(0.7)
            .max_output_tokens(4096)
            .output_format(OutputFormat::StrictJson)
            .model_id(&self.model)
            .build()?;

        let result = self.gateway.invoke(&request).await?;
        let recipes = parse_recipes(&result.text, self.validation)?;
        let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        tracing::info!(
            pantry_items = names.len(),
            recipes = recipes.len(),
            duration_ms,
            "Recipe suggestion complete"
        );

        Ok(SuggestionOutcome {
            recipes,
            duration_ms,
            token_usage: result.usage,
        })
    }
}

/// Recipe suggestions with an observable lifecycle.
pub struct RecipeSuggester {
    engine: Arc<RecipeSuggestionEngine>,
    lifecycle: RequestLifecycle<SuggestionOutcome>,
}

impl RecipeSuggester {
    pub fn new(engine: Arc<RecipeSuggestionEngine>) -> Self {
        Self {
            engine,
            lifecycle: RequestLifecycle::new(),
        }
    }

    pub fn state(&self) -> RequestState<SuggestionOutcome> {
        self.lifecycle.state()
    }

    pub fn lifecycle(&self) -> &RequestLifecycle<SuggestionOutcome> {
        &self.lifecycle
    }

    /// Request suggestions and return the resulting state.
    pub async fn suggest(
        &self,
        pantry_item_names: &[String],
        preferences: Option<&Preferences>,
    ) -> RequestState<SuggestionOutcome> {
        let _ = self
            .lifecycle
            .run(self.engine.suggest(pantry_item_names, preferences))
            .await;
        self.state()
    }

    pub fn reset(&self) {
        self.lifecycle.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::FakeGateway;

    const TWO_RECIPES: &str = r#"{"recipes": [
        {"name": "Tomato Pasta", "ingredients": ["pasta", "tomatoes"], "instructions": "Boil. Mix.",
         "prepTime": 20, "servings": 2, "category": "dinner", "matchPercentage": 100},
        {"name": "Bruschetta", "ingredients": ["bread", "tomatoes", "basil"], "instructions": ["Toast.", "Top."],
         "prepTime": 10, "servings": 4, "category": "appetizer", "matchPercentage": 66.7}
    ]}"#;

    const ONE_BROKEN: &str = r#"{"recipes": [
        {"name": "Tomato Pasta", "ingredients": ["pasta"], "instructions": "Boil.",
         "prepTime": 20, "servings": 2, "category": "dinner", "matchPercentage": 90},
        {"name": "Mystery", "prepTime": -5, "matchPercentage": 250}
    ]}"#;

    fn names(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_empty_input_makes_no_call() {
        let gateway = Arc::new(FakeGateway::always(TWO_RECIPES));
        let engine = RecipeSuggestionEngine::new(gateway.clone());

        assert_eq!(engine.suggest(&[], None).await.unwrap_err(), AiError::EmptyInput);
        assert_eq!(
            engine.suggest(&names(&["  ", ""]), None).await.unwrap_err(),
            AiError::EmptyInput
        );
        assert_eq!(gateway.call_count(), 0);
    }

    #[tokio::test]
    async fn test_suggest_returns_every_recipe() {
        let gateway = Arc::new(FakeGateway::always(TWO_RECIPES).with_usage(Usage {
            prompt_tokens: 10,
            completion_tokens: 20,
            total_tokens: 30,
        }));
        let engine = RecipeSuggestionEngine::new(gateway.clone());
        let prefs = Preferences {
            dietary: Some("vegetarian".to_string()),
            ..Default::default()
        };

        let outcome = engine
            .suggest(&names(&["pasta", "tomatoes"]), Some(&prefs))
            .await
            .unwrap();

        assert_eq!(outcome.recipes.len(), 2);
        assert_eq!(outcome.recipes[1].instructions.as_deref(), Some("Toast.\nTop."));
        assert!(outcome.recipes.iter().all(RecipeSuggestion::is_complete));
        assert_eq!(outcome.token_usage.map(|u| u.total_tokens), Some(30));

        let calls = gateway.calls();
        assert!(calls[0].prompt().contains("pasta, tomatoes"));
        assert!(calls[0].prompt().contains("vegetarian"));
        assert_eq!(calls[0].output_format(), OutputFormat::StrictJson);
    }

    #[tokio::test]
    async fn test_missing_recipes_array() {
        let engine = RecipeSuggestionEngine::new(Arc::new(FakeGateway::always(r#"{"meals": []}"#)));
        assert!(matches!(
            engine.suggest(&names(&["rice"]), None).await,
            Err(AiError::InvalidUpstreamShape(_))
        ));

        let engine =
            RecipeSuggestionEngine::new(Arc::new(FakeGateway::always(r#"{"recipes": "none"}"#)));
        assert!(matches!(
            engine.suggest(&names(&["rice"]), None).await,
            Err(AiError::InvalidUpstreamShape(_))
        ));

        let engine = RecipeSuggestionEngine::new(Arc::new(FakeGateway::always("Sorry!")));
        assert!(matches!(
            engine.suggest(&names(&["rice"]), None).await,
            Err(AiError::MalformedModelOutput(_))
        ));
    }

    #[tokio::test]
    async fn test_suggester_tracks_state() {
        let engine = RecipeSuggestionEngine::new(Arc::new(FakeGateway::always(TWO_RECIPES)));
        let suggester = RecipeSuggester::new(Arc::new(engine));

        let state = suggester.suggest(&names(&["tomatoes"]), None).await;
        assert_eq!(state.data().map(|o| o.recipes.len()), Some(2));

        let state = suggester.suggest(&[], None).await;
        assert_eq!(state.error(), Some(&AiError::EmptyInput));
        assert!(state.data().is_none());

        suggester.reset();
        assert!(matches!(suggester.state(), RequestState::Idle));
    }

    #[test]
    fn test_validation_policies() {
        let lenient = parse_recipes(ONE_BROKEN, RecipeValidation::Lenient).unwrap();
        assert_eq!(lenient.len(), 2);
        assert!(lenient[0].is_complete());
        assert_eq!(lenient[1].name.as_deref(), Some("Mystery"));
        assert_eq!(lenient[1].prep_time_minutes, None);
        assert_eq!(lenient[1].servings, None);
        assert_eq!(lenient[1].match_percentage, None);

        let filtered = parse_recipes(ONE_BROKEN, RecipeValidation::FilterInvalid).unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].name.as_deref(), Some("Tomato Pasta"));

        let strict = parse_recipes(ONE_BROKEN, RecipeValidation::Strict).unwrap_err();
        match strict {
            AiError::InvalidUpstreamShape(message) => assert!(message.starts_with("recipe 1")),
            other => panic!("unexpected error {:?}", other),
        }

        assert_eq!(
            parse_recipes(TWO_RECIPES, RecipeValidation::Strict).unwrap().len(),
            2
        );
    }

    #[test]
    fn test_lenient_keeps_count_without_inventing_values() {
        let text = r#"{"recipes": [
            {"name": "Rice Bowl", "ingredients": ["rice"], "instructions": "Cook.",
             "prepTime": 15, "servings": 1, "category": "lunch", "matchPercentage": 100},
            {"title": null},
            {"name": "Fried Rice", "prepTime": "12"}
        ]}"#;

        let recipes = parse_recipes(text, RecipeValidation::Lenient).unwrap();
        assert_eq!(recipes.len(), 3);
        assert_eq!(recipes[1], RecipeSuggestion::default());
        assert_eq!(recipes[2].prep_time_minutes, Some(12));

        let json = serde_json::to_value(&recipes[1]).unwrap();
        assert_eq!(json, serde_json::json!({"ingredients": []}));
    }

    #[test]
    fn test_non_object_entry_fails_every_policy_but_filter() {
        let text = r#"{"recipes": [
            {"name": "Rice Bowl", "ingredients": ["rice"], "instructions": "Cook.",
             "prepTime": 15, "servings": 1, "category": "lunch", "matchPercentage": 100},
            "oops"
        ]}"#;

        for policy in [RecipeValidation::Lenient, RecipeValidation::Strict] {
            match parse_recipes(text, policy).unwrap_err() {
                AiError::InvalidUpstreamShape(message) => {
                    assert_eq!(message, "recipe 1: entry is not an object")
                }
                other => panic!("unexpected error {:?}", other),
            }
        }
        assert_eq!(
            parse_recipes(text, RecipeValidation::FilterInvalid).unwrap().len(),
            1
        );
    }

    #[test]
    fn test_empty_recipes_array_is_valid() {
        for policy in [
            RecipeValidation::Lenient,
            RecipeValidation::FilterInvalid,
            RecipeValidation::Strict,
        ] {
            assert!(parse_recipes(r#"{"recipes": []}"#, policy).unwrap().is_empty());
        }
    }

    #[test]
    fn test_request_accepts_deprecated_ingredients_alias() {
        let current: SuggestRequest =
            serde_json::from_str(r#"{"pantryItems": ["milk"]}"#).unwrap();
        let legacy: SuggestRequest =
            serde_json::from_str(r#"{"ingredients": ["milk"], "preferences": {"cuisine": "thai"}}"#)
                .unwrap();

        assert_eq!(current.pantry_items, vec!["milk"]);
        assert_eq!(legacy.pantry_items, vec!["milk"]);
        assert_eq!(
            legacy.preferences.and_then(|p| p.cuisine),
            Some("thai".to_string())
        );
    }
}
