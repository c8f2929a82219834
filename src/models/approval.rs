use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::role::Role;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Critical => write!(f, "critical"),
        }
    }
}

/// One row of the approval threshold table. `upper_bound` is exclusive; `None` is
/// the catch-all band.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ApprovalBand {
    pub upper_bound: Option<Decimal>,
    pub label: String,
    pub severity: Severity,
    pub approver: Option<Role>,
}

impl ApprovalBand {
    pub fn below(upper_bound: Decimal, label: impl Into<String>, severity: Severity) -> Self {
        Self {
            upper_bound: Some(upper_bound),
            label: label.into(),
            severity,
            approver: None,
        }
    }

    pub fn unbounded(label: impl Into<String>, severity: Severity) -> Self {
        Self {
            upper_bound: None,
            label: label.into(),
            severity,
            approver: None,
        }
    }

    pub fn approved_by(mut self, role: Role) -> Self {
        self.approver = Some(role);
        self
    }

    pub fn contains(&self, grand_total: Decimal) -> bool {
        match self.upper_bound {
            Some(bound) => grand_total < bound,
            None => true,
        }
    }

    pub fn tier(&self) -> ApprovalTier {
        ApprovalTier {
            label: self.label.clone(),
            severity: self.severity,
            approver: self.approver,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ApprovalTier {
    pub label: String,
    pub severity: Severity,
    pub approver: Option<Role>,
}

impl ApprovalTier {
    /// Advisory only: whether `role` could sign off an order at this tier. The backend
    /// routes approvals on its own totals.
    pub fn is_satisfied_by(&self, role: Role) -> bool {
        match self.approver {
            Some(required) => role.at_least(required),
            None => true,
        }
    }
}

/// Bands shared by the office and school storefronts.
pub fn default_bands() -> Vec<ApprovalBand> {
    vec![
        ApprovalBand::below(Decimal::from(5_000), "auto-approved", Severity::Info),
        ApprovalBand::below(Decimal::from(20_000), "manager approval", Severity::Warning)
            .approved_by(Role::Manager),
        ApprovalBand::below(Decimal::from(50_000), "director approval", Severity::Warning)
            .approved_by(Role::Director),
        ApprovalBand::unbounded("executive approval", Severity::Critical).approved_by(Role::Admin),
    ]
}
