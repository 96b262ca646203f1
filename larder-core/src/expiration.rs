//! Shelf-life estimation for pantry items.
//!
//! Durations come from the same data file as the category rules. Every
//! category keeps longer when refrigerated, and items with no matching rule get
//! a short default so the user reviews them early.

use chrono::{Days, Local, NaiveDate};
use std::sync::Arc;

use crate::category::{classify, Category, ShelfLifeDays, CATEGORY_TABLE};

/// Source of "today". Injected so predictions never read the wall clock directly.
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// The local calendar date.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// A clock stuck on one date.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

/// Estimated number of days before an item should be reviewed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ShelfLife {
    pub days: u32,
}

fn table_entry(category: Category) -> ShelfLifeDays {
    CATEGORY_TABLE
        .shelf_life
        .get(&category)
        .copied()
        .unwrap_or(CATEGORY_TABLE.default_shelf_life)
}

/// Shelf life for a category under the given storage.
pub fn shelf_life(category: Category, refrigerated: bool) -> ShelfLife {
    let entry = table_entry(category);
    let days = if refrigerated {
        entry.refrigerated
    } else {
        entry.pantry
    };
    ShelfLife { days: days.max(1) }
}

/// Predicted expiration date for a category, counted from `today`.
pub fn predict_for_category(category: Category, refrigerated: bool, today: NaiveDate) -> NaiveDate {
    let life = shelf_life(category, refrigerated);
    today
        .checked_add_days(Days::new(u64::from(life.days)))
        .unwrap_or(NaiveDate::MAX)
}

/// Predicted expiration date for an item name, counted from `today`.
pub fn predict_from(item_name: &str, refrigerated: bool, today: NaiveDate) -> NaiveDate {
    predict_for_category(classify(item_name), refrigerated, today)
}

/// Expiration predictor bound to a clock.
#[derive(Clone)]
pub struct ExpirationPredictor {
    clock: Arc<dyn Clock>,
}

impl Default for ExpirationPredictor {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

impl ExpirationPredictor {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    /// Predictor pinned to a fixed date, mostly for tests.
    pub fn fixed(today: NaiveDate) -> Self {
        Self::new(Arc::new(FixedClock(today)))
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    pub fn predict(&self, item_name: &str, refrigerated: bool) -> NaiveDate {
        predict_from(item_name, refrigerated, self.clock.today())
    }
}

impl std::fmt::Debug for ExpirationPredictor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExpirationPredictor")
            .field("today", &self.clock.today())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_every_prediction_is_in_the_future() {
        let today = day(2024, 3, 1);
        for category in Category::ALL {
            for refrigerated in [true, false] {
                assert!(
                    predict_for_category(category, refrigerated, today) > today,
                    "{} refrigerated={}",
                    category,
                    refrigerated
                );
            }
        }
    }

    #[test]
    fn test_refrigeration_always_extends_shelf_life() {
        for category in Category::ALL {
            assert!(
                shelf_life(category, true) > shelf_life(category, false),
                "{}",
                category
            );
        }
    }

    #[test]
    fn test_unknown_default_is_short() {
        let other = shelf_life(Category::Other, true);
        assert!(other.days <= shelf_life(Category::Produce, true).days);
        assert!(other.days < shelf_life(Category::Pantry, true).days);
    }

    #[test]
    fn test_predictor_uses_injected_clock() {
        let predictor = ExpirationPredictor::fixed(day(2024, 1, 1));
        assert_eq!(predictor.predict("Milk", true), day(2024, 1, 11));
        assert_eq!(predictor.predict("Milk", false), day(2024, 1, 2));
        assert_eq!(predictor.predict("unknown thing", true), day(2024, 1, 6));
        assert_eq!(predictor.predict("Canned Peaches", false), day(2025, 12, 1));
    }

    #[test]
    fn test_prediction_saturates_at_max_date() {
        assert_eq!(
            predict_for_category(Category::Canned, true, NaiveDate::MAX),
            NaiveDate::MAX
        );
    }
}
