//! # Order Types
//!
//! Order and hosted-session types for the checkout workflow.

use crate::product::Product;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A pending order as recorded in the order store.
///
/// An order is immutable once created except for `is_paid`, which is
/// flipped by the payment provider's confirmation callback.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    /// Store-assigned identifier
    pub id: String,

    /// Owning user
    pub user_id: String,

    /// Identifiers of the payable products in this order
    pub product_ids: Vec<String>,

    /// Whether payment has been confirmed
    pub is_paid: bool,

    /// Store-assigned creation timestamp
    pub created_at: DateTime<Utc>,
}

/// Data for an order about to be created (id and timestamp are assigned
/// by the order store).
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: String,
    pub product_ids: Vec<String>,
}

/// A line item in a hosted checkout session
///
/// References the provider-side price configuration; quantity is fixed at 1
/// per distinct product because the cart dedups upstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    /// Provider price reference
    pub price_id: String,

    /// Quantity (always 1 per distinct product)
    pub quantity: u32,
}

impl LineItem {
    /// Build a line item from a payable product. Returns `None` when the
    /// product has no provider price reference.
    pub fn from_product(product: &Product) -> Option<Self> {
        let price_id = product.price_id.as_deref().filter(|p| !p.is_empty())?;
        Some(Self {
            price_id: price_id.to_string(),
            quantity: 1,
        })
    }
}

/// A hosted checkout session created by the payment provider.
/// Ephemeral: referenced by URL, never persisted locally.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostedSession {
    /// Provider's session ID
    pub session_id: String,

    /// Our internal order ID (embedded in the session metadata)
    pub order_id: String,

    /// URL to redirect the customer to for payment
    pub url: String,

    /// When the session expires, if the provider reports it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

/// Outcome of the checkout workflow.
///
/// A provider failure after the pending order has been recorded is not a
/// hard error; it yields `Unavailable` and the caller shows a soft error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutRedirect {
    /// Provider session created; redirect the customer here
    Hosted { url: String },
    /// No session URL could be obtained. The pending order persists and
    /// session creation can be retried.
    Unavailable,
}

impl CheckoutRedirect {
    /// The redirect URL, if a session was obtained
    pub fn url(&self) -> Option<&str> {
        match self {
            CheckoutRedirect::Hosted { url } => Some(url),
            CheckoutRedirect::Unavailable => None,
        }
    }
}

/// Snapshot of an order's payment state, for client polling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderStatus {
    pub is_paid: bool,
}

/// Webhook event types we care about
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WebhookEventType {
    /// Checkout session completed
    CheckoutCompleted,
    /// Payment failed
    PaymentFailed,
    /// Unknown event (passthrough)
    Unknown(String),
}

/// A verified, parsed webhook event from the payment provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookEvent {
    /// Event ID from provider
    pub event_id: String,

    /// Event type
    pub event_type: WebhookEventType,

    /// Provider name
    pub provider: String,

    /// Related provider session ID (if applicable)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,

    /// Our order ID, recovered from the session metadata
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,

    /// Provider-reported payment status (e.g. "paid")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_status: Option<String>,

    /// Raw event data (for debugging)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_data: Option<serde_json::Value>,

    /// Timestamp
    pub timestamp: DateTime<Utc>,
}

impl WebhookEvent {
    /// True when this event confirms payment for an order
    pub fn confirms_payment(&self) -> bool {
        self.event_type == WebhookEventType::CheckoutCompleted
            && self.payment_status.as_deref() == Some("paid")
    }
}
