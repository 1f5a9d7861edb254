//! # shop-stripe
//!
//! Stripe payment gateway for the shopfront order engine.
//!
//! Two responsibilities:
//!
//! 1. **Checkout Sessions** - hosted payment pages built from provider
//!    price references, tagged with order/user correlation metadata.
//! 2. **Webhooks** - signature verification and event parsing for the
//!    asynchronous payment confirmation that marks orders paid.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use shop_stripe::StripeGateway;
//! use shop_core::PaymentGateway;
//!
//! // Create gateway from environment
//! let gateway = StripeGateway::from_env()?;
//!
//! // Create a hosted checkout session
//! let session = gateway.create_session(&request).await?;
//!
//! // Redirect the customer to session.url
//! ```

pub mod checkout;
pub mod config;
pub mod webhook;

// Re-exports
pub use checkout::StripeGateway;
pub use config::StripeConfig;
pub use webhook::REQUIRED_WEBHOOK_EVENTS;
