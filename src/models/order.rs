use chrono::{NaiveDate, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::models::{
    approval::ApprovalTier,
    cart::{CartItem, ProductId},
    pricing::PricingResult,
    session::Storefront,
};

lazy_static::lazy_static! {
    static ref PHONE_REGEX: Regex = Regex::new(r"^\+?[0-9 ()-]{6,20}$").unwrap();
}

// request dto
#[derive(Debug, Serialize, Deserialize, Validate, Clone, Default)]
pub struct CheckoutRequest {
    #[validate(length(min = 1, max = 200, message = "Destination must be 1-200 characters"))]
    #[validate(custom = "validate_not_blank")]
    pub destination: String,

    #[validate(length(min = 1, max = 100, message = "Department must be 1-100 characters"))]
    #[validate(custom = "validate_not_blank")]
    pub department: String,

    #[validate(custom = "validate_delivery_date")]
    pub deliver_by: Option<NaiveDate>,

    #[validate(regex(path = "PHONE_REGEX", message = "Invalid contact phone number"))]
    pub contact_phone: Option<String>,

    #[validate(length(max = 1000, message = "Notes must be less than 1000 characters"))]
    pub notes: Option<String>,
}

fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

fn validate_delivery_date(date: &NaiveDate) -> Result<(), ValidationError> {
    if *date < Utc::now().date_naive() {
        return Err(ValidationError::new("delivery_date_in_past"));
    }
    Ok(())
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct OrderLine {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// Body of `POST /orders`. Totals are left out on purpose: the backend prices the
/// order and routes the approval itself.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct OrderPayload {
    pub storefront: Storefront,
    pub items: Vec<OrderLine>,
    pub destination: String,
    pub department: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deliver_by: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl OrderPayload {
    pub fn new(storefront: Storefront, items: &[CartItem], request: CheckoutRequest) -> Self {
        Self {
            storefront,
            items: items
                .iter()
                .map(|item| OrderLine {
                    product_id: item.product_id,
                    quantity: item.quantity,
                })
                .collect(),
            destination: request.destination.trim().to_string(),
            department: request.department.trim().to_string(),
            deliver_by: request.deliver_by,
            contact_phone: request.contact_phone.map(|p| p.trim().to_string()),
            notes: request
                .notes
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty()),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct OrderReceipt {
    #[serde(alias = "id")]
    pub order_id: String,
    #[serde(default)]
    pub status: Option<String>,
}

/// What a successful checkout hands back to the caller. Pricing and tier are the
/// client's own figures, for display next to the receipt.
#[derive(Debug, Clone)]
pub struct CheckoutOutcome {
    pub receipt: OrderReceipt,
    pub pricing: PricingResult,
    pub tier: ApprovalTier,
}
