//! Food categorization for pantry items.
//!
//! Maps item names to a fixed set of categories with an ordered keyword rule
//! table loaded from `data/categories.json` at compile time. The first rule
//! with a matching keyword wins, so rule order in the file is significant:
//! "chicken soup" is meat because the meat rule precedes the canned rule.
//!
//! A category may have several rules. The table opens with short rules for
//! words that name the form of an item ("frozen", "canned", "juice", "sauce")
//! so they take precedence over the ingredient they describe.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

/// Category tag attached to every pantry item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Produce,
    Dairy,
    Meat,
    Seafood,
    Bakery,
    Frozen,
    Canned,
    Condiments,
    Pantry,
    Beverages,
    Snacks,
    Other,
}

impl Category {
    pub const ALL: [Category; 12] = [
        Category::Produce,
        Category::Dairy,
        Category::Meat,
        Category::Seafood,
        Category::Bakery,
        Category::Frozen,
        Category::Canned,
        Category::Condiments,
        Category::Pantry,
        Category::Beverages,
        Category::Snacks,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Produce => "produce",
            Category::Dairy => "dairy",
            Category::Meat => "meat",
            Category::Seafood => "seafood",
            Category::Bakery => "bakery",
            Category::Frozen => "frozen",
            Category::Canned => "canned",
            Category::Condiments => "condiments",
            Category::Pantry => "pantry",
            Category::Beverages => "beverages",
            Category::Snacks => "snacks",
            Category::Other => "other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shelf-life pair in days, as stored in the data file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub(crate) struct ShelfLifeDays {
    pub refrigerated: u32,
    pub pantry: u32,
}

#[derive(Deserialize)]
pub(crate) struct CategoryRule {
    pub category: Category,
    pub keywords: Vec<String>,
}

/// The raw JSON structure for the categories data file.
#[derive(Deserialize)]
pub(crate) struct CategoryTable {
    /// Used for `Other` and any category missing from `shelf_life`.
    pub default_shelf_life: ShelfLifeDays,
    pub shelf_life: HashMap<Category, ShelfLifeDays>,
    pub rules: Vec<CategoryRule>,
}

pub(crate) static CATEGORY_TABLE: LazyLock<CategoryTable> = LazyLock::new(|| {
    let json = include_str!("../../data/categories.json");
    serde_json::from_str(json).expect("Failed to parse categories.json")
});

/// Lowercase, trim, and collapse internal whitespace.
fn normalize(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn at_boundary(rest: &str) -> bool {
    rest.chars().next().map_or(true, |c| !c.is_alphanumeric())
}

/// Whole-word containment, allowing a trailing plural "s" or "es".
fn contains_keyword(haystack: &str, keyword: &str) -> bool {
    haystack.match_indices(keyword).any(|(start, _)| {
        let starts_word = haystack[..start]
            .chars()
            .next_back()
            .map_or(true, |c| !c.is_alphanumeric());
        if !starts_word {
            return false;
        }

        let rest = &haystack[start + keyword.len()..];
        at_boundary(rest)
            || rest.strip_prefix('s').is_some_and(at_boundary)
            || rest.strip_prefix("es").is_some_and(at_boundary)
    })
}

/// Categorize an item by name.
///
/// Total and deterministic: returns `Category::Other` when no rule matches.
pub fn classify(item_name: &str) -> Category {
    let normalized = normalize(item_name);
    if normalized.is_empty() {
        return Category::Other;
    }

    CATEGORY_TABLE
        .rules
        .iter()
        .find(|rule| {
            rule.keywords
                .iter()
                .any(|keyword| contains_keyword(&normalized, keyword))
        })
        .map(|rule| rule.category)
        .unwrap_or(Category::Other)
}
