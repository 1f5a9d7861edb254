//! # Payment Gateway Trait
//!
//! Seam between the checkout workflow and the hosted-payment provider.
//! The workflow builds a `SessionRequest`; the gateway turns it into a
//! provider-hosted payment page and later verifies the provider's
//! confirmation callbacks.

use crate::error::ShopResult;
use crate::order::{HostedSession, LineItem, WebhookEvent};
use async_trait::async_trait;
use std::sync::Arc;

/// Everything a provider needs to host a payment page for one order.
///
/// The order named here must already exist in the order store: the session
/// metadata embeds its id for later correlation, so session creation is
/// only valid after the pending order write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRequest {
    /// Pending order being paid for
    pub order_id: String,

    /// Authenticated user on whose behalf the session is created
    pub user_id: String,

    /// One line item per payable product, quantity 1
    pub line_items: Vec<LineItem>,

    /// Where the provider redirects after payment; carries the order id so
    /// the client can poll status afterwards
    pub success_url: String,

    /// Where the provider redirects on cancellation
    pub cancel_url: String,
}

/// Payment provider implementations.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create a hosted checkout session and return its redirect URL.
    ///
    /// Payment-only mode; the session is tagged with the order and user
    /// identifiers as metadata.
    async fn create_session(&self, request: &SessionRequest) -> ShopResult<HostedSession>;

    /// Verify a webhook signature and parse the event.
    async fn verify_webhook(&self, payload: &[u8], signature: &str) -> ShopResult<WebhookEvent>;

    /// Provider name (for logging and routing)
    fn provider_name(&self) -> &'static str;
}

/// Type alias for a shared payment gateway (dynamic dispatch)
pub type BoxedPaymentGateway = Arc<dyn PaymentGateway>;

/// Builds the client redirect targets used in checkout sessions.
#[derive(Debug, Clone)]
pub struct RedirectUrls {
    /// Base URL of the storefront (e.g. "https://shop.example.com")
    base_url: String,
}

impl RedirectUrls {
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url: String = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self { base_url }
    }

    /// Post-payment landing page. Encodes the order id so the client can
    /// resolve payment status after the redirect back.
    pub fn success_url(&self, order_id: &str) -> String {
        format!("{}/thank-you?orderId={}", self.base_url, order_id)
    }

    /// Cancellation returns the customer to their cart
    pub fn cancel_url(&self) -> String {
        format!("{}/cart", self.base_url)
    }
}

impl Default for RedirectUrls {
    fn default() -> Self {
        Self::new("http://localhost:3000")
    }
}
