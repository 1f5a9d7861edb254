//! # shop-core
//!
//! Core types and traits for the shopfront order engine.
//!
//! This crate provides:
//! - `CartStore` for the client-held cart (dedup by product identity)
//! - `Credentials` and `Email` for the shared credential schema
//! - `CheckoutService` for the order-creation and payment-session workflow
//! - `ProductStore`, `OrderStore`, and `UserStore` seams over the external
//!   collaborators, with in-memory implementations
//! - `PaymentGateway` trait for hosted-payment providers
//! - `ShopError` for typed error handling
//!
//! ## Example
//!
//! ```rust,ignore
//! use shop_core::{AuthContext, CheckoutService, RedirectUrls};
//!
//! let checkout = CheckoutService::new(products, orders, gateway, RedirectUrls::new(base_url));
//!
//! // One pending order + one hosted session per call
//! let redirect = checkout.create_session(&product_ids, &auth).await?;
//!
//! match redirect.url() {
//!     Some(url) => redirect_customer(url),
//!     None => show_soft_error(), // order persists, session can be retried
//! }
//! ```

pub mod cart;
pub mod checkout;
pub mod credentials;
pub mod error;
pub mod gateway;
pub mod order;
pub mod product;
pub mod store;

// Re-exports for convenience
pub use cart::{CartItem, CartStore};
pub use checkout::CheckoutService;
pub use credentials::{AuthContext, Credentials, Email, EmailError, MIN_PASSWORD_LENGTH};
pub use error::{FieldError, ShopError, ShopResult};
pub use gateway::{BoxedPaymentGateway, PaymentGateway, RedirectUrls, SessionRequest};
pub use order::{
    CheckoutRedirect, HostedSession, LineItem, NewOrder, Order, OrderStatus, WebhookEvent,
    WebhookEventType,
};
pub use product::{Currency, Price, Product, ProductCatalog};
pub use store::{
    BoxedOrderStore, BoxedProductStore, BoxedUserStore, MemoryOrderStore, MemoryUserStore,
    OrderStore, ProductStore, User, UserStore,
};
