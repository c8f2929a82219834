use rust_decimal::Decimal;
use thiserror::Error;
use tracing::debug;

use crate::models::approval::{default_bands, ApprovalBand, ApprovalTier};

#[derive(Error, Debug, PartialEq)]
pub enum ApprovalError {
    #[error("Approval table has no bands")]
    Empty,
    #[error("Approval bands must be sorted by strictly ascending bound (band {index})")]
    NotAscending { index: usize },
    #[error("Approval table must end with exactly one unbounded band")]
    MissingCatchAll,
}

/// Maps a grand total to the approval tier it falls into.
///
/// Client-side hint only; the order-approval backend re-classifies every order.
#[derive(Debug, Clone)]
pub struct ApprovalClassifier {
    bands: Vec<ApprovalBand>,
}

impl ApprovalClassifier {
    pub fn new(bands: Vec<ApprovalBand>) -> Result<Self, ApprovalError> {
        if bands.is_empty() {
            return Err(ApprovalError::Empty);
        }

        let (last, bounded) = bands.split_last().ok_or(ApprovalError::Empty)?;
        if last.upper_bound.is_some() {
            return Err(ApprovalError::MissingCatchAll);
        }

        let mut previous: Option<Decimal> = None;
        for (index, band) in bounded.iter().enumerate() {
            let bound = band.upper_bound.ok_or(ApprovalError::MissingCatchAll)?;
            if previous.map_or(false, |prev| bound <= prev) {
                return Err(ApprovalError::NotAscending { index });
            }
            previous = Some(bound);
        }

        Ok(Self { bands })
    }

    pub fn bands(&self) -> &[ApprovalBand] {
        &self.bands
    }

    /// First band whose exclusive upper bound is strictly greater than `grand_total`.
    /// A total sitting exactly on a bound belongs to the next band up.
    pub fn classify(&self, grand_total: Decimal) -> ApprovalTier {
        let band = self
            .bands
            .iter()
            .find(|band| band.contains(grand_total))
            .or_else(|| self.bands.last());

        let tier = match band {
            Some(band) => band.tier(),
            // unreachable for a table built through `new`
            None => default_bands()[0].tier(),
        };

        debug!("Classified total {} as '{}'", grand_total, tier.label);
        tier
    }
}

impl Default for ApprovalClassifier {
    fn default() -> Self {
        Self {
            bands: default_bands(),
        }
    }
}
