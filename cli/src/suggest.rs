//! `larder suggest`: recipe ideas for a list of pantry items.

use anyhow::{bail, Result};
use larder_core::ai::ExtractionGateway;
use larder_core::{
    HttpGateway, Preferences, RecipeSuggester, RecipeSuggestionEngine, RecipeValidation,
    RequestState,
};
use std::sync::Arc;

pub async fn suggest(
    items: &[String],
    preferences: Preferences,
    validation: RecipeValidation,
) -> Result<()> {
    let gateway = HttpGateway::from_env()?;
    let model = gateway.config().model.clone();
    let gateway: Arc<dyn ExtractionGateway> = Arc::new(gateway);

    let engine = RecipeSuggestionEngine::new(gateway)
        .with_model(model)
        .with_validation(validation);
    let suggester = RecipeSuggester::new(Arc::new(engine));

    match suggester.suggest(items, Some(&preferences)).await {
        RequestState::Succeeded(outcome) => {
            eprintln!(
                "{} recipe(s) in {} ms",
                outcome.recipes.len(),
                outcome.duration_ms
            );
            crate::print_json(&outcome)
        }
        RequestState::Failed(error) => {
            tracing::debug!(error = %error, "Suggestion failed");
            bail!(error.user_message())
        }
        state => bail!("Suggestion did not finish: {:?}", state),
    }
}
