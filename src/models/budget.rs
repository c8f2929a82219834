use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Allocated/spent figures as reported by the backend for one budget period.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
pub struct BudgetSnapshot {
    #[serde(default)]
    pub allocated: Decimal,
    #[serde(default)]
    pub spent: Decimal,
}

impl BudgetSnapshot {
    pub fn new(allocated: Decimal, spent: Decimal) -> Self {
        Self { allocated, spent }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BudgetStatus {
    Normal,
    Warning,
    Over,
}

impl fmt::Display for BudgetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BudgetStatus::Normal => write!(f, "normal"),
            BudgetStatus::Warning => write!(f, "warning"),
            BudgetStatus::Over => write!(f, "over"),
        }
    }
}

/// `pct` is clamped to 100 for display while `remaining` is left signed: a negative
/// value is the overrun.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct BudgetUtilization {
    pub pct: Decimal,
    pub remaining: Decimal,
    pub status: BudgetStatus,
}

impl BudgetUtilization {
    pub fn is_overrun(&self) -> bool {
        self.remaining < Decimal::ZERO
    }

    /// Amount over budget, zero when within budget.
    pub fn overrun(&self) -> Decimal {
        if self.is_overrun() {
            -self.remaining
        } else {
            Decimal::ZERO
        }
    }
}
