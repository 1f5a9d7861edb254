//! # Stripe Webhook Verification
//!
//! Signature verification and event parsing for Stripe webhooks. The
//! `checkout.session.completed` event is what flips an order to paid; the
//! order id travels in the session metadata set at session creation.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use shop_core::{ShopError, ShopResult, WebhookEvent, WebhookEventType};

/// Signature timestamp tolerance in seconds (5 minutes)
const TIMESTAMP_TOLERANCE_SECS: i64 = 300;

/// Events the Stripe endpoint should subscribe to
pub const REQUIRED_WEBHOOK_EVENTS: &[&str] = &[
    "checkout.session.completed",
    "payment_intent.payment_failed",
];

#[derive(Debug, Deserialize)]
struct StripeWebhookEvent {
    id: String,
    #[serde(rename = "type")]
    event_type: String,
    created: i64,
    data: StripeEventData,
}

#[derive(Debug, Deserialize)]
struct StripeEventData {
    object: serde_json::Map<String, serde_json::Value>,
}

pub(crate) struct SignatureHeader {
    pub timestamp: i64,
    pub signatures: Vec<String>,
}

/// Parse Stripe's `Stripe-Signature` header (`t=...,v1=...`)
pub(crate) fn parse_signature_header(header: &str) -> ShopResult<SignatureHeader> {
    let mut timestamp = None;
    let mut signatures = Vec::new();

    for part in header.split(',') {
        let kv: Vec<&str> = part.split('=').collect();
        if kv.len() != 2 {
            continue;
        }
        match kv[0] {
            "t" => {
                timestamp = kv[1].parse().ok();
            }
            "v1" => {
                signatures.push(kv[1].to_string());
            }
            _ => {}
        }
    }

    let timestamp = timestamp.ok_or_else(|| {
        ShopError::WebhookVerificationFailed("Missing timestamp in signature".to_string())
    })?;

    if signatures.is_empty() {
        return Err(ShopError::WebhookVerificationFailed(
            "No v1 signature found".to_string(),
        ));
    }

    Ok(SignatureHeader {
        timestamp,
        signatures,
    })
}

pub(crate) fn compute_hmac_sha256(secret: &str, message: &str) -> String {
    use hmac::{Hmac, Mac};
    use sha2::Sha256;

    type HmacSha256 = Hmac<Sha256>;

    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(message.as_bytes());
    let result = mac.finalize();
    hex::encode(result.into_bytes())
}

pub(crate) fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.bytes()
        .zip(b.bytes())
        .fold(0, |acc, (x, y)| acc | (x ^ y))
        == 0
}

/// Verify a webhook payload against its signature header and parse it.
///
/// The signed message is `"{timestamp}.{payload}"`; the timestamp must be
/// within tolerance of `now`.
pub(crate) fn verify_and_parse(
    webhook_secret: &str,
    payload: &[u8],
    signature: &str,
) -> ShopResult<WebhookEvent> {
    let sig_parts = parse_signature_header(signature)?;

    let now = Utc::now().timestamp();
    if (now - sig_parts.timestamp).abs() > TIMESTAMP_TOLERANCE_SECS {
        return Err(ShopError::WebhookVerificationFailed(
            "Timestamp outside tolerance".to_string(),
        ));
    }

    let signed_payload = format!(
        "{}.{}",
        sig_parts.timestamp,
        String::from_utf8_lossy(payload)
    );
    let expected_sig = compute_hmac_sha256(webhook_secret, &signed_payload);

    let valid = sig_parts
        .signatures
        .iter()
        .any(|sig| constant_time_compare(sig, &expected_sig));

    if !valid {
        return Err(ShopError::WebhookVerificationFailed(
            "Signature mismatch".to_string(),
        ));
    }

    parse_event(payload)
}

/// Parse an already-verified event payload
fn parse_event(payload: &[u8]) -> ShopResult<WebhookEvent> {
    let event: StripeWebhookEvent = serde_json::from_slice(payload)
        .map_err(|e| ShopError::WebhookParseError(format!("Failed to parse webhook: {e}")))?;

    let event_type = match event.event_type.as_str() {
        "checkout.session.completed" => WebhookEventType::CheckoutCompleted,
        "payment_intent.payment_failed" => WebhookEventType::PaymentFailed,
        other => WebhookEventType::Unknown(other.to_string()),
    };

    let object = &event.data.object;

    let session_id = object.get("id").and_then(|v| v.as_str()).map(String::from);

    let order_id = object
        .get("metadata")
        .and_then(|m| m.get("orderId"))
        .and_then(|v| v.as_str())
        .map(String::from);

    let payment_status = object
        .get("payment_status")
        .and_then(|v| v.as_str())
        .map(String::from);

    Ok(WebhookEvent {
        event_id: event.id,
        event_type,
        provider: "stripe".to_string(),
        session_id,
        order_id,
        payment_status,
        raw_data: Some(serde_json::Value::Object(event.data.object)),
        timestamp: DateTime::from_timestamp(event.created, 0).unwrap_or_else(Utc::now),
    })
}
