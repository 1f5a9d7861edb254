//! # Stripe Checkout Sessions
//!
//! Implementation of the payment gateway against Stripe's Checkout
//! Sessions API. Line items reference provider-side price configurations
//! (`price_...` ids); no amounts are sent from this layer.

use crate::config::StripeConfig;
use crate::webhook;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use serde::Deserialize;
use shop_core::{
    HostedSession, PaymentGateway, SessionRequest, ShopError, ShopResult, WebhookEvent,
};
use tracing::{debug, error, info, instrument};

/// Payment method types offered on the hosted page
const PAYMENT_METHOD_TYPES: &[&str] = &["card", "paypal"];

/// Stripe Checkout Session gateway
///
/// Uses Stripe's hosted checkout page for secure payments.
/// This is the recommended approach for PCI compliance.
pub struct StripeGateway {
    config: StripeConfig,
    client: Client,
}

impl StripeGateway {
    /// Create a new Stripe gateway
    pub fn new(config: StripeConfig) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self { config, client }
    }

    /// Create from environment variables
    pub fn from_env() -> ShopResult<Self> {
        let config = StripeConfig::from_env()?;
        Ok(Self::new(config))
    }

    /// Build the form body for the Checkout Sessions API
    fn build_form(request: &SessionRequest) -> Vec<(String, String)> {
        let mut form_params: Vec<(String, String)> = vec![
            ("mode".to_string(), "payment".to_string()),
            ("success_url".to_string(), request.success_url.clone()),
            ("cancel_url".to_string(), request.cancel_url.clone()),
        ];

        for (i, method) in PAYMENT_METHOD_TYPES.iter().enumerate() {
            form_params.push((format!("payment_method_types[{i}]"), (*method).to_string()));
        }

        for (i, item) in request.line_items.iter().enumerate() {
            form_params.push((format!("line_items[{i}][price]"), item.price_id.clone()));
            form_params.push((
                format!("line_items[{i}][quantity]"),
                item.quantity.to_string(),
            ));
        }

        // Correlation metadata: the confirmation callback resolves the
        // order through these keys.
        form_params.push(("metadata[userId]".to_string(), request.user_id.clone()));
        form_params.push(("metadata[orderId]".to_string(), request.order_id.clone()));

        form_params
    }
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    #[instrument(skip(self, request), fields(order_id = %request.order_id))]
    async fn create_session(&self, request: &SessionRequest) -> ShopResult<HostedSession> {
        let form_params = Self::build_form(request);

        debug!(
            line_items = request.line_items.len(),
            "Creating Stripe checkout session"
        );

        let url = format!("{}/v1/checkout/sessions", self.config.api_base_url);

        let response = self
            .client
            .post(&url)
            .header("Authorization", self.config.auth_header())
            .header("Stripe-Version", &self.config.api_version)
            .header("Idempotency-Key", &request.order_id)
            .form(&form_params)
            .send()
            .await
            .map_err(|e| ShopError::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ShopError::Network(e.to_string()))?;

        if !status.is_success() {
            error!("Stripe API error: status={}, body={}", status, body);

            // Parse Stripe error
            if let Ok(error_response) = serde_json::from_str::<StripeErrorResponse>(&body) {
                return Err(ShopError::Provider {
                    provider: "stripe".to_string(),
                    message: error_response.error.message,
                });
            }

            return Err(ShopError::Provider {
                provider: "stripe".to_string(),
                message: format!("HTTP {status}: {body}"),
            });
        }

        let session_response: StripeCheckoutSessionResponse = serde_json::from_str(&body)
            .map_err(|e| ShopError::Serialization(format!("Failed to parse Stripe response: {e}")))?;

        info!(
            "Created Stripe checkout session: id={}, url={}",
            session_response.id, session_response.url
        );

        let expires_at = session_response
            .expires_at
            .map(|ts| DateTime::from_timestamp(ts, 0).unwrap_or(Utc::now() + Duration::hours(24)));

        Ok(HostedSession {
            session_id: session_response.id,
            order_id: request.order_id.clone(),
            url: session_response.url,
            expires_at,
        })
    }

    #[instrument(skip(self, payload, signature))]
    async fn verify_webhook(&self, payload: &[u8], signature: &str) -> ShopResult<WebhookEvent> {
        let event = webhook::verify_and_parse(&self.config.webhook_secret, payload, signature)?;
        debug!(event_type = ?event.event_type, "Verified Stripe webhook");
        Ok(event)
    }

    fn provider_name(&self) -> &'static str {
        "stripe"
    }
}

// =============================================================================
// Stripe API Types
// =============================================================================

#[derive(Debug, Deserialize)]
struct StripeCheckoutSessionResponse {
    id: String,
    url: String,
    #[serde(default)]
    expires_at: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct StripeErrorResponse {
    error: StripeError,
}

#[derive(Debug, Deserialize)]
struct StripeError {
    message: String,
}
