//! Paddle API client implementation.

use reqwest::Client;
use std::time::Duration;

use canchas_core::MonthlyStatement;

use super::types::{
    CheckoutSettings, CreateTransactionRequest, Money, NonCatalogPrice, NonCatalogProduct,
    PaddleErrorResponse, PaddleResponse, StatementCustomData, Transaction, TransactionItem,
};

/// Error type for Paddle operations.
#[derive(Debug, thiserror::Error)]
pub enum PaddleError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Paddle API returned an error.
    #[error("Paddle API error: {status} {error_type} - {detail}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error type.
        error_type: String,
        /// Error detail.
        detail: String,
        /// Error code.
        code: Option<String>,
    },

    /// The transaction came back without a checkout URL.
    #[error("transaction {0} has no checkout URL")]
    MissingCheckoutUrl(String),
}

/// A created checkout for a statement.
#[derive(Debug, Clone)]
pub struct Checkout {
    /// Paddle transaction ID.
    pub transaction_id: String,
    /// Hosted checkout URL.
    pub checkout_url: String,
}

/// Paddle Billing API client.
#[derive(Debug, Clone)]
pub struct PaddleClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl PaddleClient {
    /// Create a new Paddle client.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Paddle API URL (`https://api.paddle.com` or the sandbox)
    /// * `api_key` - Paddle API key
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Result<Self, PaddleError> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    /// Create a transaction charging the amount due on `statement`.
    ///
    /// `return_url` is where Paddle sends the payer after checkout.
    pub async fn create_statement_checkout(
        &self,
        statement: &MonthlyStatement,
        field_name: &str,
        currency: &str,
        return_url: &str,
    ) -> Result<Checkout, PaddleError> {
        let period = format!("{:02}/{}", statement.month, statement.year);
        let request = CreateTransactionRequest {
            items: vec![TransactionItem {
                quantity: 1,
                price: NonCatalogPrice {
                    description: format!("Comisión {period} - {field_name}"),
                    name: format!("Comisión {period}"),
                    unit_price: Money {
                        amount: statement.amount_due_cents.to_string(),
                        currency_code: currency.to_string(),
                    },
                    product: NonCatalogProduct {
                        name: format!("Comisión de reservas - {field_name}"),
                        tax_category: "standard".to_string(),
                    },
                },
            }],
            custom_data: StatementCustomData {
                statement_id: Some(statement.id.to_string()),
            },
            checkout: Some(CheckoutSettings {
                url: return_url.to_string(),
            }),
        };

        tracing::debug!(
            statement_id = %statement.id,
            amount_cents = statement.amount_due_cents,
            currency = %currency,
            "Creating Paddle transaction"
        );

        let response = self
            .client
            .post(format!("{}/transactions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let transaction: Transaction = Self::handle_response(response).await?;
        let checkout_url = transaction
            .checkout
            .and_then(|c| c.url)
            .ok_or_else(|| PaddleError::MissingCheckoutUrl(transaction.id.clone()))?;

        Ok(Checkout {
            transaction_id: transaction.id,
            checkout_url,
        })
    }

    /// Handle API response and convert errors.
    async fn handle_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, PaddleError> {
        let status = response.status();

        if status.is_success() {
            let envelope: PaddleResponse<T> = response.json().await?;
            return Ok(envelope.data);
        }

        // Try to parse error response
        let error_body: Result<PaddleErrorResponse, _> = response.json().await;

        match error_body {
            Ok(paddle_error) => Err(PaddleError::Api {
                status: status.as_u16(),
                error_type: paddle_error.error.error_type,
                detail: paddle_error.error.detail,
                code: paddle_error.error.code,
            }),
            Err(_) => Err(PaddleError::Api {
                status: status.as_u16(),
                error_type: "unknown".to_string(),
                detail: format!("HTTP {status}"),
                code: None,
            }),
        }
    }
}
