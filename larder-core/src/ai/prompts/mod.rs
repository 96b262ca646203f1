//! AI prompt templates.

pub mod receipt_scan;
pub mod recipe_suggest;

pub use receipt_scan::{render_receipt_scan_prompt, RECEIPT_SCAN_SYSTEM_INSTRUCTIONS};
pub use recipe_suggest::render_recipe_suggest_prompt;
