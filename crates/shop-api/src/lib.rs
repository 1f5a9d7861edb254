//! # shop-api
//!
//! HTTP API layer for the shopfront order engine.
//!
//! This crate provides:
//! - Axum-based HTTP server
//! - Account endpoints (sign-in, registration) with bearer sessions
//! - Checkout and order-status endpoints
//! - Stripe webhook handler that marks orders paid
//!
//! ## Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | GET | `/health` | Health check |
//! | POST | `/api/v1/auth/sign-in` | Sign in |
//! | POST | `/api/v1/auth/register` | Create account |
//! | POST | `/api/v1/checkout` | Create checkout session |
//! | GET | `/api/v1/orders/{id}/status` | Poll order payment status |
//! | POST | `/webhook/stripe` | Stripe webhook |

pub mod auth;
pub mod handlers;
pub mod routes;
pub mod state;

pub use auth::{AuthGateway, SessionStore};
pub use routes::create_router;
pub use state::{AppConfig, AppState};
