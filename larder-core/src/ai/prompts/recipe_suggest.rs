//! Recipe suggestion prompt built from pantry contents and preferences.

use crate::recipes::Preferences;

/// Render the recipe suggestion prompt.
pub fn render_recipe_suggest_prompt(
    pantry_items: &[String],
    preferences: Option<&Preferences>,
) -> String {
    let items_list = pantry_items.join(", ");

    let mut constraints = String::new();
    if let Some(prefs) = preferences {
        if let Some(dietary) = &prefs.dietary {
            constraints.push_str(&format!("- Dietary requirements: {}\n", dietary));
        }
        if let Some(cuisine) = &prefs.cuisine {
            constraints.push_str(&format!("- Preferred cuisine: {}\n", cuisine));
        }
        if let Some(difficulty) = &prefs.difficulty {
            constraints.push_str(&format!("- Difficulty level: {}\n", difficulty));
        }
    }
    if constraints.is_empty() {
        constraints.push_str("- None\n");
    }

    format!(
        r#"You are a cooking assistant. Suggest 3 to 5 recipes that make the most of the ingredients the user already has.

Available ingredients: {items_list}

Preferences:
{constraints}
Prefer recipes that use many of the available ingredients and need few extra ones.

Respond with JSON only, no other text, using this exact structure:
{{"recipes": [{{"name": "Recipe name", "ingredients": ["ingredient with amount"], "instructions": "Step-by-step instructions", "prepTime": 30, "servings": 4, "category": "dinner", "matchPercentage": 80}}]}}

- "prepTime" is in minutes
- "matchPercentage" (0-100) is the share of the recipe's ingredients that are in the available list"#,
        items_list = items_list,
        constraints = constraints
    )
}
