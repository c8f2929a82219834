use rust_decimal::Decimal;

use crate::models::budget::{BudgetSnapshot, BudgetStatus, BudgetUtilization};

/// Utilization above this percentage is flagged as a warning.
pub const WARNING_PCT: Decimal = Decimal::from_parts(80, 0, 0, false, 0);

/// Percentage is clamped at 100, `remaining` is not: overspend shows up as a
/// negative remainder while the gauge simply reads full. A ratio too large for
/// `Decimal` reads as fully over budget.
pub fn utilization(allocated: Decimal, spent: Decimal) -> BudgetUtilization {
    let remaining = allocated.checked_sub(spent).unwrap_or(if spent > allocated {
        Decimal::MIN
    } else {
        Decimal::MAX
    });

    if allocated <= Decimal::ZERO {
        let status = if spent > Decimal::ZERO {
            BudgetStatus::Over
        } else {
            BudgetStatus::Normal
        };
        return BudgetUtilization {
            pct: Decimal::ZERO,
            remaining,
            status,
        };
    }

    let raw_pct = spent
        .checked_div(allocated)
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        .unwrap_or(Decimal::MAX);
    let status = if raw_pct > Decimal::ONE_HUNDRED {
        BudgetStatus::Over
    } else if raw_pct > WARNING_PCT {
        BudgetStatus::Warning
    } else {
        BudgetStatus::Normal
    };

    BudgetUtilization {
        pct: raw_pct.min(Decimal::ONE_HUNDRED),
        remaining,
        status,
    }
}

pub fn snapshot_utilization(snapshot: &BudgetSnapshot) -> BudgetUtilization {
    utilization(snapshot.allocated, snapshot.spent)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overspent_budget() {
        let result = utilization(Decimal::from(1000), Decimal::from(1200));
        assert_eq!(result.pct, Decimal::from(100));
        assert_eq!(result.remaining, Decimal::from(-200));
        assert_eq!(result.status, BudgetStatus::Over);
        assert!(result.is_overrun());
        assert_eq!(result.overrun(), Decimal::from(200));
    }

    #[test]
    fn test_warning_above_eighty_percent() {
        let result = utilization(Decimal::from(1000), Decimal::from(801));
        assert_eq!(result.status, BudgetStatus::Warning);
        assert_eq!(result.remaining, Decimal::from(199));

        let at_eighty = utilization(Decimal::from(1000), Decimal::from(800));
        assert_eq!(at_eighty.status, BudgetStatus::Normal);
        assert_eq!(at_eighty.pct, Decimal::from(80));
    }

    #[test]
    fn test_exactly_spent_is_not_over() {
        let result = utilization(Decimal::from(500), Decimal::from(500));
        assert_eq!(result.pct, Decimal::from(100));
        assert_eq!(result.remaining, Decimal::ZERO);
        assert_eq!(result.status, BudgetStatus::Warning);
        assert!(!result.is_overrun());
    }

    #[test]
    fn test_zero_allocation() {
        let idle = utilization(Decimal::ZERO, Decimal::ZERO);
        assert_eq!(idle.pct, Decimal::ZERO);
        assert_eq!(idle.status, BudgetStatus::Normal);

        let spent = snapshot_utilization(&BudgetSnapshot::new(Decimal::ZERO, Decimal::from(50)));
        assert_eq!(spent.pct, Decimal::ZERO);
        assert_eq!(spent.remaining, Decimal::from(-50));
        assert_eq!(spent.status, BudgetStatus::Over);
    }

    #[test]
    fn test_huge_ratio_reads_as_over() {
        let spent = Decimal::from_i128_with_scale(10_i128.pow(27), 0);
        let result = utilization(Decimal::ONE, spent);

        assert_eq!(result.pct, Decimal::from(100));
        assert_eq!(result.status, BudgetStatus::Over);
        assert_eq!(result.remaining, Decimal::ONE - spent);

        let tiny = utilization(Decimal::new(1, 28), Decimal::MAX);
        assert_eq!(tiny.status, BudgetStatus::Over);
        assert_eq!(tiny.pct, Decimal::from(100));
    }
}
