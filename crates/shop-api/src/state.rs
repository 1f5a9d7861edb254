//! # Application State
//!
//! Shared state for the axum application: store handles, the payment
//! gateway, the checkout service, and the auth gateway.

use crate::auth::{AuthGateway, SessionStore};
use shop_core::{
    BoxedOrderStore, BoxedPaymentGateway, BoxedProductStore, BoxedUserStore, CheckoutService,
    MemoryOrderStore, MemoryUserStore, ProductCatalog, RedirectUrls,
};
use shop_stripe::StripeGateway;
use std::sync::Arc;

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Base URL of the storefront (redirect targets)
    pub base_url: String,
    /// Environment (development, staging, production)
    pub environment: String,
}

impl AppConfig {
    /// Load from environment variables
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            base_url: std::env::var("BASE_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            environment: std::env::var("ENVIRONMENT")
                .unwrap_or_else(|_| "development".to_string()),
        }
    }

    /// Get the socket address to bind to
    pub fn socket_addr(&self) -> std::net::SocketAddr {
        format!("{}:{}", self.host, self.port)
            .parse()
            .expect("Invalid socket address")
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Checkout orchestrator
    pub checkout: CheckoutService,
    /// Sign-in / account creation
    pub auth: AuthGateway,
    /// Bearer session registry
    pub sessions: SessionStore,
    /// Order store handle (read by status polling, written by the webhook)
    pub orders: BoxedOrderStore,
    /// Payment gateway (webhook verification)
    pub gateway: BoxedPaymentGateway,
    /// Application config
    pub config: AppConfig,
}

impl AppState {
    /// Create state from the environment: TOML product catalog, in-memory
    /// order/user stores, Stripe gateway.
    pub fn new() -> anyhow::Result<Self> {
        let config = AppConfig::from_env();

        let catalog = load_product_catalog()?;

        let gateway = StripeGateway::from_env()
            .map_err(|e| anyhow::anyhow!("Failed to initialize Stripe: {e}"))?;

        Ok(Self::assemble(
            Arc::new(catalog),
            Arc::new(MemoryOrderStore::new()),
            Arc::new(MemoryUserStore::new()),
            Arc::new(gateway),
            config,
        ))
    }

    /// Assemble state from explicit collaborators
    pub fn assemble(
        products: BoxedProductStore,
        orders: BoxedOrderStore,
        users: BoxedUserStore,
        gateway: BoxedPaymentGateway,
        config: AppConfig,
    ) -> Self {
        let sessions = SessionStore::new();
        let checkout = CheckoutService::new(
            products,
            orders.clone(),
            gateway.clone(),
            RedirectUrls::new(&config.base_url),
        );
        let auth = AuthGateway::new(users, sessions.clone());

        Self {
            checkout,
            auth,
            sessions,
            orders,
            gateway,
            config,
        }
    }
}

/// Load product catalog from config file
fn load_product_catalog() -> anyhow::Result<ProductCatalog> {
    let config_paths = [
        "config/products.toml",
        "../config/products.toml",
        "../../config/products.toml",
    ];

    for path in config_paths {
        if let Ok(content) = std::fs::read_to_string(path) {
            let catalog: ProductCatalog = toml::from_str(&content)
                .map_err(|e| anyhow::anyhow!("Failed to parse {path}: {e}"))?;
            tracing::info!("Loaded {} products from {}", catalog.products.len(), path);
            return Ok(catalog);
        }
    }

    // Empty catalog if no config found
    tracing::warn!("No product catalog found, using empty catalog");
    Ok(ProductCatalog::new())
}
