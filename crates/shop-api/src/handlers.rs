//! # Request Handlers
//!
//! Axum request handlers for the storefront commerce API: account
//! operations, checkout, order status polling, and the Stripe webhook.

use crate::state::AppState;
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use shop_core::{AuthContext, Credentials, ShopError};
use tracing::{debug, info, instrument, warn};

// =============================================================================
// Request/Response Types
// =============================================================================

/// Sign-in / registration request body
#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    pub email: String,
    pub password: String,
}

impl From<CredentialsRequest> for Credentials {
    fn from(request: CredentialsRequest) -> Self {
        Credentials::new(request.email, request.password)
    }
}

/// Successful sign-in response
#[derive(Debug, Serialize)]
pub struct SignInResponse {
    /// Bearer token for subsequent authenticated calls
    pub token: String,
}

/// Successful registration response
#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub id: String,
    pub email: String,
}

/// Create checkout request
#[derive(Debug, Deserialize)]
pub struct CreateCheckoutRequest {
    /// Product identifiers from the client cart; prices are resolved
    /// server-side, never taken from the client
    #[serde(rename = "productIds")]
    pub product_ids: Vec<String>,
}

/// Create checkout response. `url` is null when no provider session could
/// be obtained; the pending order still exists.
#[derive(Debug, Serialize)]
pub struct CreateCheckoutResponse {
    pub url: Option<String>,
}

/// Order status response
#[derive(Debug, Serialize)]
pub struct OrderStatusResponse {
    #[serde(rename = "isPaid")]
    pub is_paid: bool,
}

/// Field detail inside a validation error response
#[derive(Debug, Serialize)]
pub struct FieldErrorBody {
    pub field: String,
    pub message: String,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<FieldErrorBody>>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, code: u16) -> Self {
        Self {
            error: error.into(),
            code,
            fields: None,
        }
    }
}

fn shop_error_to_response(err: ShopError) -> (StatusCode, Json<ErrorResponse>) {
    let code = err.status_code();

    // Collaborator detail stays out of responses
    let message = match &err {
        ShopError::Configuration(_)
        | ShopError::Serialization(_)
        | ShopError::Internal(_) => "Internal server error".to_string(),
        ShopError::Provider { .. } | ShopError::Network(_) => {
            "Payment provider unavailable".to_string()
        }
        other => other.to_string(),
    };

    let fields = match &err {
        ShopError::Validation { fields } => Some(
            fields
                .iter()
                .map(|f| FieldErrorBody {
                    field: f.field.to_string(),
                    message: f.message.clone(),
                })
                .collect(),
        ),
        _ => None,
    };

    let response = ErrorResponse {
        error: message,
        code,
        fields,
    };

    (
        StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        Json(response),
    )
}

/// Resolve the bearer token in `Authorization` to an identity, if any
fn bearer_context(state: &AppState, headers: &HeaderMap) -> Option<AuthContext> {
    let token = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))?;
    state.sessions.resolve(token)
}

// =============================================================================
// Handlers
// =============================================================================

/// Health check endpoint
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "shopfront",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Sign in with email and password
#[instrument(skip(state, request))]
pub async fn sign_in(
    State(state): State<AppState>,
    Json(request): Json<CredentialsRequest>,
) -> Result<Json<SignInResponse>, (StatusCode, Json<ErrorResponse>)> {
    let token = state
        .auth
        .sign_in(&request.into())
        .await
        .map_err(shop_error_to_response)?;

    Ok(Json(SignInResponse { token }))
}

/// Create a new account
#[instrument(skip(state, request))]
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<CredentialsRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), (StatusCode, Json<ErrorResponse>)> {
    let user = state
        .auth
        .create_account(&request.into())
        .await
        .map_err(shop_error_to_response)?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            id: user.id,
            email: user.email.into_inner(),
        }),
    ))
}

/// Create a checkout session for the authenticated user's selection
#[instrument(skip(state, headers, request), fields(products = request.product_ids.len()))]
pub async fn create_checkout(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<CreateCheckoutRequest>,
) -> Result<Json<CreateCheckoutResponse>, (StatusCode, Json<ErrorResponse>)> {
    let Some(auth) = bearer_context(&state, &headers) else {
        return Err(shop_error_to_response(ShopError::Unauthenticated));
    };

    let redirect = state
        .checkout
        .create_session(&request.product_ids, &auth)
        .await
        .map_err(shop_error_to_response)?;

    Ok(Json(CreateCheckoutResponse {
        url: redirect.url().map(String::from),
    }))
}

/// Report whether an order has been paid. Cheap and side-effect-free;
/// clients poll it after redirecting back from the provider.
#[instrument(skip(state))]
pub async fn order_status(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
) -> Result<Json<OrderStatusResponse>, (StatusCode, Json<ErrorResponse>)> {
    let status = state
        .checkout
        .order_status(&order_id)
        .await
        .map_err(shop_error_to_response)?;

    Ok(Json(OrderStatusResponse {
        is_paid: status.is_paid,
    }))
}

/// Handle the Stripe webhook: verify the signature, then mark the order
/// named in the event metadata as paid.
#[instrument(skip(state, headers, body))]
pub async fn stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, (StatusCode, Json<ErrorResponse>)> {
    let signature = headers
        .get("stripe-signature")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::new("Missing Stripe-Signature header", 400)),
            )
        })?;

    let event = state
        .gateway
        .verify_webhook(&body, signature)
        .await
        .map_err(|e| {
            warn!("Webhook verification failed: {}", e);
            shop_error_to_response(e)
        })?;

    info!(
        "Received webhook: type={:?}, id={}",
        event.event_type, event.event_id
    );

    if event.confirms_payment() {
        match event.order_id.as_deref() {
            Some(order_id) => match state.orders.mark_paid(order_id).await {
                Ok(order) => info!(order_id = %order.id, "order marked paid"),
                // Acknowledge anyway: the provider would retry forever on
                // an order we will never know about.
                Err(err) => warn!(order_id, error = %err, "could not mark order paid"),
            },
            None => warn!(event_id = %event.event_id, "completed session without orderId metadata"),
        }
    } else {
        debug!(event_type = ?event.event_type, "ignoring webhook event");
    }

    Ok(StatusCode::OK)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::create_router;
    use crate::state::{AppConfig, AppState};
    use async_trait::async_trait;
    use axum::http::header::AUTHORIZATION;
    use axum::http::HeaderValue;
    use axum_test::TestServer;
    use serde_json::{json, Value};
    use shop_core::{
        Currency, HostedSession, MemoryOrderStore, MemoryUserStore, NewOrder, OrderStore,
        PaymentGateway, Price, Product, ProductCatalog, SessionRequest, ShopResult, WebhookEvent,
    };
    use shop_stripe::{StripeConfig, StripeGateway};
    use std::sync::Arc;

    /// Gateway double: session URL embeds the order id so tests can
    /// recover it from the response
    struct FakeGateway;

    #[async_trait]
    impl PaymentGateway for FakeGateway {
        async fn create_session(&self, request: &SessionRequest) -> ShopResult<HostedSession> {
            Ok(HostedSession {
                session_id: "cs_fake_1".to_string(),
                order_id: request.order_id.clone(),
                url: format!("https://pay.example.com/s/{}", request.order_id),
                expires_at: None,
            })
        }

        async fn verify_webhook(
            &self,
            _payload: &[u8],
            _signature: &str,
        ) -> ShopResult<WebhookEvent> {
            Err(ShopError::WebhookVerificationFailed("no secret".to_string()))
        }

        fn provider_name(&self) -> &'static str {
            "fake"
        }
    }

    fn test_config() -> AppConfig {
        AppConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            base_url: "http://localhost:3000".to_string(),
            environment: "test".to_string(),
        }
    }

    fn catalog() -> ProductCatalog {
        let mut catalog = ProductCatalog::new();
        catalog.add(
            Product::new("P1", "UI Kit", Price::new(10.0, Currency::USD)).with_price_id("pr_1"),
        );
        catalog.add(Product::new("P2", "Poster", Price::new(5.0, Currency::USD)));
        catalog
    }

    fn test_state() -> (AppState, Arc<MemoryOrderStore>) {
        let orders = Arc::new(MemoryOrderStore::new());
        let state = AppState::assemble(
            Arc::new(catalog()),
            orders.clone(),
            Arc::new(MemoryUserStore::new()),
            Arc::new(FakeGateway),
            test_config(),
        );
        (state, orders)
    }

    fn server(state: AppState) -> TestServer {
        TestServer::new(create_router(state)).expect("failed to build test server")
    }

    async fn sign_up_and_in(server: &TestServer) -> String {
        let body = json!({"email": "buyer@example.com", "password": "correct horse"});

        let response = server.post("/api/v1/auth/register").json(&body).await;
        assert_eq!(response.status_code(), StatusCode::CREATED);

        let response = server.post("/api/v1/auth/sign-in").json(&body).await;
        assert_eq!(response.status_code(), StatusCode::OK);

        response.json::<Value>()["token"]
            .as_str()
            .expect("token missing")
            .to_string()
    }

    fn bearer(token: &str) -> HeaderValue {
        HeaderValue::from_str(&format!("Bearer {token}")).expect("invalid header")
    }

    #[tokio::test]
    async fn test_checkout_requires_session() {
        let (state, orders) = test_state();
        let server = server(state);

        let response = server
            .post("/api/v1/checkout")
            .json(&json!({"productIds": ["P1"]}))
            .await;

        assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
        assert!(orders.is_empty());
    }

    #[tokio::test]
    async fn test_checkout_empty_product_set() {
        let (state, orders) = test_state();
        let server = server(state);
        let token = sign_up_and_in(&server).await;

        let response = server
            .post("/api/v1/checkout")
            .add_header(AUTHORIZATION, bearer(&token))
            .json(&json!({"productIds": []}))
            .await;

        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
        assert!(orders.is_empty());
    }

    #[tokio::test]
    async fn test_checkout_and_status_polling() {
        let (state, orders) = test_state();
        let server = server(state);
        let token = sign_up_and_in(&server).await;

        let response = server
            .post("/api/v1/checkout")
            .add_header(AUTHORIZATION, bearer(&token))
            .json(&json!({"productIds": ["P1", "P2"]}))
            .await;

        assert_eq!(response.status_code(), StatusCode::OK);
        let url = response.json::<Value>()["url"]
            .as_str()
            .expect("url missing")
            .to_string();

        // The fake gateway embeds the order id in the session URL
        let order_id = url.rsplit('/').next().unwrap().to_string();
        let order = orders.get(&order_id).await.unwrap().unwrap();
        assert_eq!(order.product_ids, vec!["P1"]); // P2 has no price reference

        let response = server
            .get(&format!("/api/v1/orders/{order_id}/status"))
            .await;
        assert_eq!(response.status_code(), StatusCode::OK);
        assert_eq!(response.json::<Value>()["isPaid"], json!(false));

        // The out-of-band confirmation lands
        orders.mark_paid(&order_id).await.unwrap();

        let response = server
            .get(&format!("/api/v1/orders/{order_id}/status"))
            .await;
        assert_eq!(response.json::<Value>()["isPaid"], json!(true));
    }

    #[tokio::test]
    async fn test_order_status_unknown() {
        let (state, _orders) = test_state();
        let server = server(state);

        let response = server.get("/api/v1/orders/nope/status").await;
        assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_sign_in_failures_are_generic() {
        let (state, _orders) = test_state();
        let server = server(state);

        server
            .post("/api/v1/auth/register")
            .json(&json!({"email": "buyer@example.com", "password": "correct horse"}))
            .await;

        let wrong_password = server
            .post("/api/v1/auth/sign-in")
            .json(&json!({"email": "buyer@example.com", "password": "battery staple"}))
            .await;
        let unknown_email = server
            .post("/api/v1/auth/sign-in")
            .json(&json!({"email": "nobody@example.com", "password": "correct horse"}))
            .await;

        assert_eq!(wrong_password.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(unknown_email.status_code(), StatusCode::UNAUTHORIZED);

        // Identical bodies: no account enumeration
        assert_eq!(
            wrong_password.json::<Value>()["error"],
            unknown_email.json::<Value>()["error"]
        );
        assert_eq!(
            wrong_password.json::<Value>()["error"],
            json!("Invalid email or password")
        );
    }

    #[tokio::test]
    async fn test_register_validation_lists_fields() {
        let (state, _orders) = test_state();
        let server = server(state);

        let response = server
            .post("/api/v1/auth/register")
            .json(&json!({"email": "not-an-email", "password": "x"}))
            .await;

        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

        let body = response.json::<Value>();
        let fields = body["fields"].as_array().expect("fields missing");
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0]["field"], json!("email"));
        assert_eq!(fields[1]["field"], json!("password"));
    }

    #[tokio::test]
    async fn test_register_duplicate_email() {
        let (state, _orders) = test_state();
        let server = server(state);
        let body = json!({"email": "buyer@example.com", "password": "correct horse"});

        server.post("/api/v1/auth/register").json(&body).await;
        let response = server.post("/api/v1/auth/register").json(&body).await;

        assert_eq!(response.status_code(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_webhook_missing_signature() {
        let (state, _orders) = test_state();
        let server = server(state);

        let response = server.post("/webhook/stripe").text("{}").await;
        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    }

    /// Full confirmation path against the real Stripe verification code
    #[tokio::test]
    async fn test_webhook_marks_order_paid() {
        use hmac::{Hmac, Mac};
        use sha2::Sha256;

        let orders = Arc::new(MemoryOrderStore::new());
        let gateway = StripeGateway::new(StripeConfig::new(
            "sk_test_x",
            "pk_test_x",
            "whsec_test",
        ));
        let state = AppState::assemble(
            Arc::new(catalog()),
            orders.clone(),
            Arc::new(MemoryUserStore::new()),
            Arc::new(gateway),
            test_config(),
        );
        let server = server(state);

        let order = orders
            .create(NewOrder {
                user_id: "user-1".to_string(),
                product_ids: vec!["P1".to_string()],
            })
            .await
            .unwrap();

        let payload = json!({
            "id": "evt_1",
            "type": "checkout.session.completed",
            "created": chrono::Utc::now().timestamp(),
            "data": {
                "object": {
                    "id": "cs_1",
                    "payment_status": "paid",
                    "metadata": { "orderId": order.id, "userId": "user-1" }
                }
            }
        })
        .to_string();

        let timestamp = chrono::Utc::now().timestamp();
        let mut mac = Hmac::<Sha256>::new_from_slice(b"whsec_test").unwrap();
        mac.update(format!("{timestamp}.{payload}").as_bytes());
        let signature = hex::encode(mac.finalize().into_bytes());

        let response = server
            .post("/webhook/stripe")
            .add_header(
                axum::http::HeaderName::from_static("stripe-signature"),
                HeaderValue::from_str(&format!("t={timestamp},v1={signature}")).unwrap(),
            )
            .text(payload)
            .await;

        assert_eq!(response.status_code(), StatusCode::OK);
        assert!(orders.get(&order.id).await.unwrap().unwrap().is_paid);
    }

    #[tokio::test]
    async fn test_webhook_bad_signature_rejected() {
        let orders = Arc::new(MemoryOrderStore::new());
        let gateway = StripeGateway::new(StripeConfig::new(
            "sk_test_x",
            "pk_test_x",
            "whsec_test",
        ));
        let state = AppState::assemble(
            Arc::new(catalog()),
            orders.clone(),
            Arc::new(MemoryUserStore::new()),
            Arc::new(gateway),
            test_config(),
        );
        let server = server(state);

        let response = server
            .post("/webhook/stripe")
            .add_header(
                axum::http::HeaderName::from_static("stripe-signature"),
                HeaderValue::from_static("t=1,v1=deadbeef"),
            )
            .text("{}")
            .await;

        assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
    }
}
