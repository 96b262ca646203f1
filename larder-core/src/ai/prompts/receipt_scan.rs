//! Prompt template for extracting grocery items from a receipt photo.

/// Fixed system instruction for receipt scans.
pub const RECEIPT_SCAN_SYSTEM_INSTRUCTIONS: &str = r#"You are a grocery receipt reader. You are given a photo of a store receipt.

Return ONLY a JSON array, no other text. Each element must have this exact structure:
{"name": "Item name", "quantity": 1, "unit": "pcs", "price": 2.99}

Rules:
- Include only food and drink items. Exclude bags, deposits, discounts, taxes, totals, and household goods
- "name" is a readable product name, expanded from receipt abbreviations where obvious (e.g. "MLK 2%" -> "Milk 2%")
- "quantity" is a positive number; use 1 when the receipt does not show one
- "unit" is the unit of quantity, e.g. "pcs", "kg", "g", "L", "ml", "lb", "oz"
- "price" is the line total as a number, or omit it if it cannot be read
- If no food items are visible, return []"#;

/// Render the user prompt that accompanies the receipt image.
pub fn render_receipt_scan_prompt() -> String {
    "Extract every food and drink item from this receipt as a JSON array.".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_instructions_demand_json_array() {
        assert!(RECEIPT_SCAN_SYSTEM_INSTRUCTIONS.contains("ONLY a JSON array"));
        assert!(RECEIPT_SCAN_SYSTEM_INSTRUCTIONS.contains("Exclude"));
    }
}
