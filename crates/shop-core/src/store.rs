//! # External Store Interfaces
//!
//! Narrow interfaces over the external collaborators: the product store
//! (read), the order store (create/read plus the paid flip performed by the
//! payment confirmation callback), and the identity store. In-memory
//! implementations back the server and the test suites.

use crate::credentials::Email;
use crate::error::{ShopError, ShopResult};
use crate::order::{NewOrder, Order};
use crate::product::{Product, ProductCatalog};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use uuid::Uuid;

/// An identity record in the user store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: Email,
    pub created_at: DateTime<Utc>,
}

/// Read-only product lookup.
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Resolve a set of product identifiers. Unknown identifiers are
    /// simply absent from the result, never an error.
    async fn find_by_ids(&self, ids: &[String]) -> ShopResult<Vec<Product>>;
}

/// Order persistence.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Create a pending order (`is_paid = false`); the store assigns the
    /// id and creation timestamp.
    async fn create(&self, order: NewOrder) -> ShopResult<Order>;

    /// Look up an order by id
    async fn get(&self, order_id: &str) -> ShopResult<Option<Order>>;

    /// Flip an order to paid. Entry point for the payment confirmation
    /// callback; fails with `NotFound` for unknown ids.
    async fn mark_paid(&self, order_id: &str) -> ShopResult<Order>;
}

/// Identity store.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Create an identity record; fails with `Conflict` when the email is
    /// already registered.
    async fn create(&self, email: &Email, password_hash: &str) -> ShopResult<User>;

    /// Find a user and their password hash by email
    async fn find_by_email(&self, email: &Email) -> ShopResult<Option<(User, String)>>;
}

/// Type aliases for shared store handles (dynamic dispatch)
pub type BoxedProductStore = Arc<dyn ProductStore>;
pub type BoxedOrderStore = Arc<dyn OrderStore>;
pub type BoxedUserStore = Arc<dyn UserStore>;

#[async_trait]
impl ProductStore for ProductCatalog {
    async fn find_by_ids(&self, ids: &[String]) -> ShopResult<Vec<Product>> {
        Ok(self
            .products
            .iter()
            .filter(|p| ids.iter().any(|id| *id == p.id))
            .cloned()
            .collect())
    }
}

/// In-memory order store
#[derive(Debug, Default)]
pub struct MemoryOrderStore {
    orders: RwLock<HashMap<String, Order>>,
}

impl MemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of orders ever created
    pub fn len(&self) -> usize {
        self.orders.read().expect("order store lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl OrderStore for MemoryOrderStore {
    async fn create(&self, order: NewOrder) -> ShopResult<Order> {
        let order = Order {
            id: Uuid::new_v4().to_string(),
            user_id: order.user_id,
            product_ids: order.product_ids,
            is_paid: false,
            created_at: Utc::now(),
        };

        self.orders
            .write()
            .expect("order store lock poisoned")
            .insert(order.id.clone(), order.clone());

        Ok(order)
    }

    async fn get(&self, order_id: &str) -> ShopResult<Option<Order>> {
        Ok(self
            .orders
            .read()
            .expect("order store lock poisoned")
            .get(order_id)
            .cloned())
    }

    async fn mark_paid(&self, order_id: &str) -> ShopResult<Order> {
        let mut orders = self.orders.write().expect("order store lock poisoned");
        let order = orders
            .get_mut(order_id)
            .ok_or_else(|| ShopError::NotFound(format!("order {order_id}")))?;
        order.is_paid = true;
        Ok(order.clone())
    }
}

/// In-memory identity store, keyed by email
#[derive(Debug, Default)]
pub struct MemoryUserStore {
    users: RwLock<HashMap<String, (User, String)>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn create(&self, email: &Email, password_hash: &str) -> ShopResult<User> {
        let mut users = self.users.write().expect("user store lock poisoned");

        if users.contains_key(email.as_str()) {
            return Err(ShopError::Conflict("email already registered".to_string()));
        }

        let user = User {
            id: Uuid::new_v4().to_string(),
            email: email.clone(),
            created_at: Utc::now(),
        };

        users.insert(
            email.as_str().to_string(),
            (user.clone(), password_hash.to_string()),
        );

        Ok(user)
    }

    async fn find_by_email(&self, email: &Email) -> ShopResult<Option<(User, String)>> {
        Ok(self
            .users
            .read()
            .expect("user store lock poisoned")
            .get(email.as_str())
            .cloned())
    }
}
