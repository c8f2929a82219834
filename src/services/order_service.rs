use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, error, info, warn};
use validator::Validate;

use crate::{
    api::{ApiError, ProcurementApi},
    models::{
        budget::BudgetUtilization,
        order::{CheckoutOutcome, CheckoutRequest, OrderPayload},
        session::Storefront,
    },
    services::{
        approval_service::ApprovalClassifier, budget_service, cart_service::CartStore,
        pricing_service,
    },
};

pub const GENERIC_SUBMISSION_FAILURE: &str = "Order submission failed, please try again";

#[derive(Error, Debug)]
pub enum OrderServiceError {
    #[error("Cart is empty")]
    EmptyCart,

    #[error("Validation error: {message}")]
    ValidationError { message: String },

    /// Checkout failed; the cart is left as it was so the user can retry.
    #[error("{message}")]
    Submission {
        message: String,
        #[source]
        source: ApiError,
    },

    #[error("Budget unavailable: {0}")]
    Budget(#[source] ApiError),
}

pub struct OrderService {
    api: Arc<dyn ProcurementApi>,
    classifier: ApprovalClassifier,
}

impl OrderService {
    pub fn new(api: Arc<dyn ProcurementApi>) -> Self {
        Self::with_classifier(api, ApprovalClassifier::default())
    }

    pub fn with_classifier(api: Arc<dyn ProcurementApi>, classifier: ApprovalClassifier) -> Self {
        Self { api, classifier }
    }

    pub fn classifier(&self) -> &ApprovalClassifier {
        &self.classifier
    }

    /// Submit the live cart as an order. The cart is cleared only once the backend
    /// confirms the order.
    pub async fn checkout(
        &self,
        storefront: Storefront,
        cart: &CartStore,
        request: CheckoutRequest,
    ) -> Result<CheckoutOutcome, OrderServiceError> {
        let items = cart.items();
        if items.is_empty() {
            warn!("Checkout attempted with an empty cart");
            return Err(OrderServiceError::EmptyCart);
        }

        request
            .validate()
            .map_err(|e| OrderServiceError::ValidationError {
                message: format!("Checkout validation failed: {}", e),
            })?;

        let pricing = pricing_service::price(&items);
        let tier = self.classifier.classify(pricing.grand_total);
        debug!(
            "Client estimate: grand total {} ({})",
            pricing.rounded().grand_total,
            tier.label
        );

        let payload = OrderPayload::new(storefront, &items, request);
        info!(
            "Checking out {} lines for department '{}'",
            payload.items.len(),
            payload.department
        );

        let receipt = self.api.submit_order(&payload).await.map_err(|e| {
            error!("Order submission failed: {}", e);
            let message = e
                .backend_message()
                .map(str::to_string)
                .unwrap_or_else(|| GENERIC_SUBMISSION_FAILURE.to_string());
            OrderServiceError::Submission { message, source: e }
        })?;

        cart.clear();
        info!("Checkout complete, order {}", receipt.order_id);

        Ok(CheckoutOutcome {
            receipt,
            pricing,
            tier,
        })
    }

    /// Server-reported budget for `department` with derived utilization.
    pub async fn budget(&self, department: &str) -> Result<BudgetUtilization, OrderServiceError> {
        let snapshot = self.api.fetch_budget(department).await.map_err(|e| {
            warn!("Failed to fetch budget for '{}': {}", department, e);
            OrderServiceError::Budget(e)
        })?;

        Ok(budget_service::snapshot_utilization(&snapshot))
    }
}
