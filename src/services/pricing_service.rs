//! Cart totals. Pure functions over a cart snapshot: nothing is cached, callers
//! recompute from the live cart on every read. Sums are exact decimals and are only
//! rounded at display time (`PricingResult::rounded`). Overflow saturates at
//! `Decimal::MAX`; these functions never panic.

use rust_decimal::Decimal;

use crate::models::{cart::CartItem, pricing::PricingResult, pricing::TAX_RATE};

pub fn subtotal(items: &[CartItem]) -> Decimal {
    items
        .iter()
        .map(CartItem::line_total)
        .fold(Decimal::ZERO, saturating_add)
}

pub fn tax(items: &[CartItem]) -> Decimal {
    tax_on(subtotal(items))
}

pub fn grand_total(items: &[CartItem]) -> Decimal {
    price(items).grand_total
}

pub fn price(items: &[CartItem]) -> PricingResult {
    let subtotal = subtotal(items);
    let tax_amount = tax_on(subtotal);

    PricingResult {
        subtotal,
        tax_amount,
        grand_total: saturating_add(subtotal, tax_amount),
    }
}

fn tax_on(subtotal: Decimal) -> Decimal {
    subtotal.checked_mul(TAX_RATE).unwrap_or(Decimal::MAX)
}

fn saturating_add(a: Decimal, b: Decimal) -> Decimal {
    a.checked_add(b).unwrap_or(Decimal::MAX)
}
