//! # Routes
//!
//! Axum router configuration for the storefront commerce API.

use crate::handlers;
use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Create the main application router
///
/// Routes:
/// - Accounts:
///   - POST /api/v1/auth/sign-in - Sign in, returns a bearer token
///   - POST /api/v1/auth/register - Create an account
///
/// - Checkout:
///   - POST /api/v1/checkout - Create a pending order + hosted session
///   - GET  /api/v1/orders/{order_id}/status - Poll payment status
///
/// - Webhooks:
///   - POST /webhook/stripe - Stripe confirmation callback
pub fn create_router(state: AppState) -> Router {
    // CORS: the storefront frontend runs on its own origin
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let auth_routes = Router::new()
        .route("/sign-in", post(handlers::sign_in))
        .route("/register", post(handlers::register));

    let api_routes = Router::new()
        .route("/checkout", post(handlers::create_checkout))
        .route("/orders/{order_id}/status", get(handlers::order_status))
        .nest("/auth", auth_routes);

    // Webhook routes (no CORS, must accept raw body)
    let webhook_routes = Router::new().route("/stripe", post(handlers::stripe_webhook));

    Router::new()
        // Health check at root
        .route("/health", get(handlers::health))
        .route("/", get(handlers::health))
        // API v1
        .nest("/api/v1", api_routes)
        // Webhooks
        .nest("/webhook", webhook_routes)
        // Middleware
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        // State
        .with_state(state)
}
