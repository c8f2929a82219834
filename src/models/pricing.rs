use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Flat VAT applied to every cart.
pub const TAX_RATE: Decimal = Decimal::from_parts(15, 0, 0, false, 2);

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
pub struct PricingResult {
    pub subtotal: Decimal,
    pub tax_amount: Decimal,
    pub grand_total: Decimal,
}

impl PricingResult {
    /// Same figures rounded to cents for display.
    pub fn rounded(&self) -> Self {
        Self {
            subtotal: round_money(self.subtotal),
            tax_amount: round_money(self.tax_amount),
            grand_total: round_money(self.grand_total),
        }
    }
}

pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}
