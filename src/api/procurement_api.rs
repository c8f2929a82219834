use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info, warn};
use url::Url;

use crate::models::{
    budget::BudgetSnapshot,
    order::{OrderPayload, OrderReceipt},
};

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{message}")]
    Rejected { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid configuration: {0}")]
    Configuration(String),
}

impl ApiError {
    /// Message from the backend itself, when it sent one.
    pub fn backend_message(&self) -> Option<&str> {
        match self {
            ApiError::Rejected { message, .. } if !message.is_empty() => Some(message),
            _ => None,
        }
    }
}

/// The remote procurement backend.
#[async_trait]
pub trait ProcurementApi: Send + Sync {
    async fn submit_order(&self, payload: &OrderPayload) -> Result<OrderReceipt, ApiError>;
    async fn fetch_budget(&self, department: &str) -> Result<BudgetSnapshot, ApiError>;
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
    error: Option<String>,
}

/// reqwest-backed client for the REST backend.
pub struct HttpProcurementApi {
    client: Client,
    base_url: Url,
    token: Option<String>,
}

impl HttpProcurementApi {
    pub fn new(base_url: &str, token: Option<String>, timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Configuration(e.to_string()))?;

        let base_url = Url::parse(base_url.trim_end_matches('/'))
            .map_err(|e| ApiError::Configuration(format!("bad base URL '{}': {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::Configuration(format!(
                "base URL '{}' cannot carry a path",
                base_url
            )));
        }

        Ok(Self {
            client,
            base_url,
            token: token.filter(|t| !t.is_empty()),
        })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    /// Base URL with `segments` appended, each percent-encoded as a single segment.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::Configuration(format!("base URL '{}' cannot carry a path", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn check(response: Response) -> Result<Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = rejection_message(status, &body);
        warn!("Backend rejected request with {}: {}", status, message);
        Err(ApiError::Rejected {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl ProcurementApi for HttpProcurementApi {
    async fn submit_order(&self, payload: &OrderPayload) -> Result<OrderReceipt, ApiError> {
        let url = self.endpoint(&["orders"])?;
        info!("Submitting order with {} lines to {}", payload.items.len(), url);

        let response = self
            .authorize(self.client.post(url).json(payload))
            .send()
            .await?;
        let receipt: OrderReceipt = Self::check(response).await?.json().await?;

        info!("Order {} created", receipt.order_id);
        Ok(receipt)
    }

    async fn fetch_budget(&self, department: &str) -> Result<BudgetSnapshot, ApiError> {
        let url = self.endpoint(&["budgets", department])?;
        debug!("Fetching budget from {}", url);

        let response = self.authorize(self.client.get(url)).send().await?;
        let snapshot: BudgetSnapshot = Self::check(response).await?.json().await?;
        Ok(snapshot)
    }
}

/// Prefer the backend's own `message`/`error` field, fall back to the status text.
fn rejection_message(status: StatusCode, body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|body| body.message.or(body.error))
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("Request failed")
                .to_string()
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_message_prefers_backend_text() {
        let message = rejection_message(
            StatusCode::UNPROCESSABLE_ENTITY,
            r#"{"message": "Product 7 is discontinued"}"#,
        );
        assert_eq!(message, "Product 7 is discontinued");

        let message = rejection_message(StatusCode::BAD_REQUEST, r#"{"error": "Missing department"}"#);
        assert_eq!(message, "Missing department");
    }

    #[test]
    fn test_rejection_message_falls_back_to_status() {
        assert_eq!(
            rejection_message(StatusCode::SERVICE_UNAVAILABLE, "<html>oops</html>"),
            "Service Unavailable"
        );
        assert_eq!(
            rejection_message(StatusCode::INTERNAL_SERVER_ERROR, r#"{"message": "  "}"#),
            "Internal Server Error"
        );
    }

    #[test]
    fn test_backend_message() {
        let rejected = ApiError::Rejected {
            status: 409,
            message: "Budget frozen".to_string(),
        };
        assert_eq!(rejected.backend_message(), Some("Budget frozen"));
        assert!(ApiError::Configuration("bad".to_string()).backend_message().is_none());
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let api = HttpProcurementApi::new("https://shop.example/api/", None, Duration::from_secs(5)).unwrap();
        assert_eq!(api.base_url(), "https://shop.example/api");
    }

    #[test]
    fn test_department_is_a_single_encoded_segment() {
        let api = HttpProcurementApi::new("http://localhost:8080/api", None, Duration::from_secs(5)).unwrap();

        let url = api.endpoint(&["budgets", "R&D/Labs?x=1"]).unwrap();
        assert_eq!(url.path(), "/api/budgets/R&D%2FLabs%3Fx=1");
        assert!(url.query().is_none());

        let url = api.endpoint(&["budgets", "Grade 4"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/api/budgets/Grade%204");
    }

    #[test]
    fn test_orders_endpoint() {
        let api = HttpProcurementApi::new("https://shop.example/api/", None, Duration::from_secs(5)).unwrap();
        assert_eq!(
            api.endpoint(&["orders"]).unwrap().as_str(),
            "https://shop.example/api/orders"
        );
    }

    #[test]
    fn test_rejects_unparseable_base_url() {
        assert!(matches!(
            HttpProcurementApi::new("not a url", None, Duration::from_secs(5)),
            Err(ApiError::Configuration(_))
        ));
    }
}
