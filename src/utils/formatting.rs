use chrono::{DateTime, Local, Utc};
use console::style;
use rust_decimal::Decimal;
use tabled::{
    settings::{Alignment, Style},
    Table, Tabled,
};

use crate::models::{
    approval::{ApprovalTier, Severity},
    budget::{BudgetStatus, BudgetUtilization},
    cart::CartItem,
    pricing::{round_money, PricingResult},
};

#[derive(Tabled)]
struct CartTableRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Product")]
    name: String,
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Unit Price")]
    unit_price: String,
    #[tabled(rename = "Qty")]
    quantity: String,
    #[tabled(rename = "Line Total")]
    line_total: String,
}

pub fn format_cart_table(items: &[CartItem]) -> String {
    if items.is_empty() {
        return String::new();
    }

    let rows: Vec<CartTableRow> = items
        .iter()
        .map(|item| CartTableRow {
            id: item.product_id.to_string(),
            name: truncate(&item.name, 30),
            category: item.category.clone().unwrap_or_else(|| "-".to_string()),
            unit_price: format_money(item.unit_price),
            quantity: item.quantity.to_string(),
            line_total: format_money(item.line_total()),
        })
        .collect();

    let mut table = Table::new(rows);
    table.with(Style::rounded()).with(Alignment::left());

    table.to_string()
}

pub fn format_pricing(pricing: &PricingResult) -> String {
    let rounded = pricing.rounded();
    let mut output = String::new();

    output.push_str(&format!("{}: {}\n", style("Subtotal").bold(), format_money(rounded.subtotal)));
    output.push_str(&format!(
        "{}: {}\n",
        style("VAT (15%)").bold(),
        style(format_money(rounded.tax_amount)).dim()
    ));
    output.push_str(&format!(
        "{}: {}\n",
        style("Grand Total").bold(),
        style(format_money(rounded.grand_total)).green().bold()
    ));

    output
}

pub fn format_tier(tier: &ApprovalTier) -> String {
    let label = match tier.severity {
        Severity::Info => style(&tier.label).green(),
        Severity::Warning => style(&tier.label).yellow(),
        Severity::Critical => style(&tier.label).red().bold(),
    };

    match tier.approver {
        Some(role) => format!("{} ({} or above)", label, role),
        None => label.to_string(),
    }
}

pub fn format_budget(utilization: &BudgetUtilization) -> String {
    let pct = format!("{}%", utilization.pct.round_dp(1));
    let pct = match utilization.status {
        BudgetStatus::Normal => style(pct).green(),
        BudgetStatus::Warning => style(pct).yellow(),
        BudgetStatus::Over => style(pct).red().bold(),
    };

    let remaining = if utilization.is_overrun() {
        format!("{} over budget", style(format_money(utilization.overrun())).red())
    } else {
        format!("{} left", style(format_money(utilization.remaining)).green())
    };

    format!("{}: {}  {}\n", style("Utilization").bold(), pct, remaining)
}

/// Two decimals with thousands separators, e.g. `12,345.60`.
pub fn format_money(value: Decimal) -> String {
    let rounded = round_money(value);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    let text = format!("{:.2}", rounded.abs());
    let (whole, fraction) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    format!("{}{}.{}", if negative { "-" } else { "" }, grouped, fraction)
}

pub fn format_date(dt: &DateTime<Utc>) -> String {
    dt.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string()
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let cut: String = text.chars().take(max - 3).collect();
        format!("{}...", cut)
    } else {
        text.to_string()
    }
}
