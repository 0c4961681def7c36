//! Paddle API types.

use serde::{Deserialize, Serialize};

/// Envelope wrapping every successful Paddle response.
#[derive(Debug, Clone, Deserialize)]
pub struct PaddleResponse<T> {
    /// Response payload.
    pub data: T,
}

/// Paddle error response.
#[derive(Debug, Clone, Deserialize)]
pub struct PaddleErrorResponse {
    /// Error details.
    pub error: PaddleErrorBody,
}

/// Paddle error details.
#[derive(Debug, Clone, Deserialize)]
pub struct PaddleErrorBody {
    /// Error type (`request_error`, `api_error`).
    #[serde(rename = "type")]
    pub error_type: String,
    /// Machine-readable error code.
    #[serde(default)]
    pub code: Option<String>,
    /// Human-readable description.
    #[serde(default)]
    pub detail: String,
}

// =============================================================================
// Requests
// =============================================================================

/// Body of `POST /transactions`.
#[derive(Debug, Clone, Serialize)]
pub struct CreateTransactionRequest {
    /// Line items.
    pub items: Vec<TransactionItem>,
    /// Opaque data echoed back in webhooks.
    pub custom_data: StatementCustomData,
    /// Checkout settings.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checkout: Option<CheckoutSettings>,
}

/// A transaction line item with an inline (non-catalog) price.
#[derive(Debug, Clone, Serialize)]
pub struct TransactionItem {
    /// Quantity purchased.
    pub quantity: u32,
    /// Inline price.
    pub price: NonCatalogPrice,
}

/// A price that only exists on this transaction.
#[derive(Debug, Clone, Serialize)]
pub struct NonCatalogPrice {
    /// Price description shown internally.
    pub description: String,
    /// Name shown at checkout.
    pub name: String,
    /// Amount per unit.
    pub unit_price: Money,
    /// Inline product the price belongs to.
    pub product: NonCatalogProduct,
}

/// A product that only exists on this transaction.
#[derive(Debug, Clone, Serialize)]
pub struct NonCatalogProduct {
    /// Product name.
    pub name: String,
    /// Tax category.
    pub tax_category: String,
}

/// Amount in the lowest denomination of a currency, as Paddle expects it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Money {
    /// Amount as a decimal string of minor units (e.g. `"1500"` for 15.00).
    pub amount: String,
    /// ISO 4217 currency code.
    pub currency_code: String,
}

/// Checkout settings on a transaction.
#[derive(Debug, Clone, Serialize)]
pub struct CheckoutSettings {
    /// Page the customer returns to after paying.
    pub url: String,
}

/// Custom data attached to commission transactions.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StatementCustomData {
    /// The statement being paid.
    #[serde(default)]
    pub statement_id: Option<String>,
}

// =============================================================================
// Objects
// =============================================================================

/// Paddle transaction object (the subset this service reads).
#[derive(Debug, Clone, Deserialize)]
pub struct Transaction {
    /// Transaction ID (`txn_...`).
    pub id: String,
    /// Transaction status.
    #[serde(default)]
    pub status: Option<String>,
    /// Custom data echoed from creation.
    #[serde(default)]
    pub custom_data: Option<StatementCustomData>,
    /// Checkout details.
    #[serde(default)]
    pub checkout: Option<TransactionCheckout>,
    /// Payment attempts, most recent first.
    #[serde(default)]
    pub payments: Vec<TransactionPayment>,
}

impl Transaction {
    /// Statement ID carried in `custom_data`, if any.
    #[must_use]
    pub fn statement_id(&self) -> Option<&str> {
        self.custom_data
            .as_ref()
            .and_then(|c| c.statement_id.as_deref())
    }

    /// Payment method type of the first payment (e.g. `"card"`).
    #[must_use]
    pub fn payment_method(&self) -> Option<&str> {
        self.payments
            .first()
            .and_then(|p| p.method_details.as_ref())
            .map(|m| m.method_type.as_str())
    }
}

/// Checkout details of a transaction.
#[derive(Debug, Clone, Deserialize)]
pub struct TransactionCheckout {
    /// Hosted checkout URL.
    #[serde(default)]
    pub url: Option<String>,
}

/// One payment attempt on a transaction.
#[derive(Debug, Clone, Deserialize)]
pub struct TransactionPayment {
    /// Attempt status.
    #[serde(default)]
    pub status: Option<String>,
    /// How the customer paid.
    #[serde(default)]
    pub method_details: Option<MethodDetails>,
}

/// Payment method details.
#[derive(Debug, Clone, Deserialize)]
pub struct MethodDetails {
    /// Method type (`card`, `paypal`, ...).
    #[serde(rename = "type")]
    pub method_type: String,
}

/// Webhook notification payload.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEvent {
    /// Event ID (`evt_...`).
    #[serde(default)]
    pub event_id: Option<String>,
    /// Event type (`transaction.completed`, ...).
    pub event_type: String,
    /// When the event occurred (RFC 3339).
    #[serde(default)]
    pub occurred_at: Option<String>,
    /// Event object.
    pub data: serde_json::Value,
}
