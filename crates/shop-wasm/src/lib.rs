//! # shop-wasm
//!
//! WebAssembly bindings for the client-side cart store.
//!
//! The cart lives entirely in the browser: a set of distinct products,
//! deduplicated by identity, with the total recomputed on demand. The
//! snapshot methods let the page persist the cart across reloads in
//! whatever storage it has (typically `localStorage`); at checkout time
//! only product identifiers are sent to the server.
//!
//! ## Usage (JavaScript)
//!
//! ```javascript
//! import init, { WasmCart } from 'shop-wasm';
//!
//! await init();
//!
//! const cart = WasmCart.from_json(localStorage.getItem('cart') ?? '') ?? new WasmCart();
//! cart.add_item(JSON.stringify(product));
//! localStorage.setItem('cart', cart.to_json());
//!
//! // Checkout sends identifiers only
//! fetch('/api/v1/checkout', { body: JSON.stringify({ productIds: cart.product_ids() }), ... });
//! ```
//!
//! ## Building
//!
//! ```bash
//! wasm-pack build --target web
//! ```

use shop_core::{CartStore, Product};
use wasm_bindgen::prelude::*;

/// Initialize the WASM module (called automatically)
#[wasm_bindgen(start)]
pub fn init() {
    // Set up panic hook for better error messages
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Browser handle to the cart store
#[wasm_bindgen]
#[derive(Default)]
pub struct WasmCart {
    inner: CartStore,
}

#[wasm_bindgen]
impl WasmCart {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self {
            inner: CartStore::new(),
        }
    }

    /// Add a product (serialized as JSON). Returns false when the product
    /// was already in the cart.
    pub fn add_item(&mut self, product_json: &str) -> Result<bool, JsValue> {
        let product: Product = serde_json::from_str(product_json)
            .map_err(|e| JsValue::from_str(&format!("Invalid product: {e}")))?;
        Ok(self.inner.add_item(product))
    }

    /// Remove a product by id; unknown ids are a no-op
    pub fn remove_item(&mut self, product_id: &str) {
        self.inner.remove_item(product_id);
    }

    /// Empty the cart
    pub fn clear(&mut self) {
        self.inner.clear();
    }

    /// Number of distinct products
    pub fn item_count(&self) -> usize {
        self.inner.item_count()
    }

    /// Whether a product is in the cart
    pub fn contains(&self, product_id: &str) -> bool {
        self.inner.contains(product_id)
    }

    /// Cart total in the smallest currency unit
    pub fn total_cents(&self) -> i64 {
        self.inner.total().amount
    }

    /// Cart total formatted for display
    pub fn total_display(&self) -> String {
        self.inner.total().display()
    }

    /// The product identifiers to send at checkout
    pub fn product_ids(&self) -> Vec<String> {
        self.inner.product_ids()
    }

    /// Snapshot the cart for persistence
    pub fn to_json(&self) -> Result<String, JsValue> {
        self.inner
            .to_json()
            .map_err(|e| JsValue::from_str(&format!("Serialize failed: {e}")))
    }

    /// Restore a cart from a snapshot; returns undefined for bad input so
    /// a fresh cart can be used instead
    pub fn from_json(json: &str) -> Option<WasmCart> {
        CartStore::from_json(json)
            .ok()
            .map(|inner| WasmCart { inner })
    }
}

/// Format a price in cents to a display string
#[wasm_bindgen]
pub fn format_price(cents: i64) -> String {
    format!("${:.2}", cents as f64 / 100.0)
}

/// Log to browser console
#[wasm_bindgen]
pub fn log(message: &str) {
    web_sys::console::log_1(&JsValue::from_str(message));
}

/// Get library version
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
