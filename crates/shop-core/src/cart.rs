//! # Cart Store
//!
//! Client-held collection of selected products. Pure state container: no
//! network calls, no server authority. The server recomputes authoritative
//! pricing at checkout time from product identifiers alone.

use crate::product::{Currency, Price, Product};
use serde::{Deserialize, Serialize};

/// A product placed in the cart.
///
/// The cart is a set of distinct products; there is no quantity field.
/// Adding a product that is already present is a no-op.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartItem {
    pub product: Product,
}

/// The client-side cart.
///
/// Persistence across reloads is the caller's concern; the store exposes a
/// JSON snapshot for whatever storage the client has (see `to_json` /
/// `from_json`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CartStore {
    items: Vec<CartItem>,
}

impl CartStore {
    /// Create an empty cart
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Current cart contents, in insertion order
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// Number of distinct products in the cart
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Whether a product is already in the cart
    pub fn contains(&self, product_id: &str) -> bool {
        self.items.iter().any(|item| item.product.id == product_id)
    }

    /// Add a product. Deduplicated by product identity: returns `false`
    /// and leaves the cart unchanged when the product is already present.
    pub fn add_item(&mut self, product: Product) -> bool {
        if self.contains(&product.id) {
            return false;
        }
        self.items.push(CartItem { product });
        true
    }

    /// Remove a product by id. Removing a product that is not in the cart
    /// is a no-op.
    pub fn remove_item(&mut self, product_id: &str) {
        self.items.retain(|item| item.product.id != product_id);
    }

    /// Empty the cart
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Sum of the constituent product prices, recomputed on every call so
    /// it cannot drift from the cart contents.
    pub fn total(&self) -> Price {
        let currency = self
            .items
            .first()
            .map(|item| item.product.price.currency)
            .unwrap_or(Currency::default());
        let amount = self.items.iter().map(|item| item.product.price.amount).sum();
        Price { amount, currency }
    }

    /// The product identifiers to send at checkout. Prices stay behind;
    /// the server resolves them itself.
    pub fn product_ids(&self) -> Vec<String> {
        self.items.iter().map(|item| item.product.id.clone()).collect()
    }

    /// Snapshot the cart for client-side persistence
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Restore a cart from a persisted snapshot
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
