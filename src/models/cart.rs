use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub type ProductId = u64;

/// Largest unit price the cart accepts. Keeps a full `u32` quantity of the item
/// far inside `Decimal` range.
pub const MAX_UNIT_PRICE: Decimal = Decimal::from_parts(1_000_000_000, 0, 0, false, 0);

/// A catalog entry as it is handed to the cart.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub unit_price: Decimal,
    pub category: Option<String>,
}

impl Product {
    pub fn new(id: ProductId, name: impl Into<String>, unit_price: Decimal) -> Self {
        Self {
            id,
            name: name.into(),
            unit_price,
            category: None,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }
}

/// One line of the cart.
///
/// Numeric fields fall back to zero when absent from a persisted record so that a
/// damaged entry never takes the pricing path down with it.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CartItem {
    pub product_id: ProductId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub unit_price: Decimal,
    #[serde(default)]
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl CartItem {
    pub fn from_product(product: Product, quantity: u32) -> Self {
        Self {
            product_id: product.id,
            name: product.name,
            unit_price: product.unit_price,
            quantity,
            category: product.category,
        }
    }

    /// Price used for totals; negative stored prices count as zero.
    pub fn effective_unit_price(&self) -> Decimal {
        self.unit_price.max(Decimal::ZERO)
    }

    /// Saturates at `Decimal::MAX` instead of overflowing.
    pub fn line_total(&self) -> Decimal {
        self.effective_unit_price()
            .checked_mul(Decimal::from(self.quantity))
            .unwrap_or(Decimal::MAX)
    }
}

/// Whether `unit_price` is something the cart will store: not negative and no
/// larger than `MAX_UNIT_PRICE`.
pub fn is_valid_unit_price(unit_price: Decimal) -> bool {
    unit_price >= Decimal::ZERO && unit_price <= MAX_UNIT_PRICE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_numeric_fields_default_to_zero() {
        let item: CartItem = serde_json::from_str(r#"{"product_id": 3, "name": "Stapler"}"#).unwrap();
        assert_eq!(item.unit_price, Decimal::ZERO);
        assert_eq!(item.quantity, 0);
        assert_eq!(item.line_total(), Decimal::ZERO);
    }

    #[test]
    fn test_line_total_ignores_negative_price() {
        let item = CartItem {
            product_id: 1,
            name: "Refund?".to_string(),
            unit_price: Decimal::new(-500, 2),
            quantity: 3,
            category: None,
        };
        assert_eq!(item.line_total(), Decimal::ZERO);
    }

    #[test]
    fn test_line_total_saturates_instead_of_overflowing() {
        let item = CartItem {
            product_id: 1,
            name: "Gold plated stapler".to_string(),
            unit_price: Decimal::MAX,
            quantity: 2,
            category: None,
        };
        assert_eq!(item.line_total(), Decimal::MAX);
    }

    #[test]
    fn test_unit_price_range() {
        assert!(is_valid_unit_price(Decimal::ZERO));
        assert!(is_valid_unit_price(MAX_UNIT_PRICE));
        assert!(!is_valid_unit_price(MAX_UNIT_PRICE + Decimal::ONE));
        assert!(!is_valid_unit_price(Decimal::new(-1, 2)));
    }

    #[test]
    fn test_from_product_keeps_category() {
        let product = Product::new(9, "Whiteboard markers", Decimal::new(1250, 2)).with_category("Classroom");
        let item = CartItem::from_product(product, 2);
        assert_eq!(item.category.as_deref(), Some("Classroom"));
        assert_eq!(item.line_total(), Decimal::new(2500, 2));
    }
}
