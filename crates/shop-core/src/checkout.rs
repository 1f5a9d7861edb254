//! # Checkout Workflow
//!
//! The order-creation and payment-session orchestrator, plus the status
//! resolver the client polls after redirecting back from the provider.

use crate::credentials::AuthContext;
use crate::error::{ShopError, ShopResult};
use crate::gateway::{BoxedPaymentGateway, RedirectUrls, SessionRequest};
use crate::order::{CheckoutRedirect, LineItem, NewOrder, OrderStatus};
use crate::store::{BoxedOrderStore, BoxedProductStore};
use tracing::{debug, info, instrument, warn};

/// Orchestrates checkout: resolves client-supplied product identifiers into
/// a priced, provider-hosted payment session backed by a pending order.
#[derive(Clone)]
pub struct CheckoutService {
    products: BoxedProductStore,
    orders: BoxedOrderStore,
    gateway: BoxedPaymentGateway,
    urls: RedirectUrls,
}

impl CheckoutService {
    pub fn new(
        products: BoxedProductStore,
        orders: BoxedOrderStore,
        gateway: BoxedPaymentGateway,
        urls: RedirectUrls,
    ) -> Self {
        Self {
            products,
            orders,
            gateway,
            urls,
        }
    }

    /// Create a pending order and a hosted payment session for it.
    ///
    /// Not idempotent: calling twice with the same product set creates two
    /// distinct pending orders.
    #[instrument(skip(self, auth), fields(user_id = %auth.user_id, requested = product_ids.len()))]
    pub async fn create_session(
        &self,
        product_ids: &[String],
        auth: &AuthContext,
    ) -> ShopResult<CheckoutRedirect> {
        if product_ids.is_empty() {
            return Err(ShopError::BadRequest(
                "checkout requires at least one product".to_string(),
            ));
        }

        // Stage one: unknown identifiers are absent from the lookup result.
        let resolved = self.products.find_by_ids(product_ids).await?;
        if resolved.len() < product_ids.len() {
            debug!(
                requested = product_ids.len(),
                resolved = resolved.len(),
                "dropped unknown product identifiers"
            );
        }

        // Stage two: keep products with a provider price reference. The
        // rest exist in the catalog but are not sellable online.
        let payable: Vec<_> = resolved.iter().filter(|p| p.is_payable()).collect();
        if payable.len() < resolved.len() {
            debug!(
                resolved = resolved.len(),
                payable = payable.len(),
                "dropped products without a price reference"
            );
        }

        // The pending order must exist before the session is requested:
        // the session metadata embeds the order id for later correlation.
        let order = self
            .orders
            .create(NewOrder {
                user_id: auth.user_id.clone(),
                product_ids: payable.iter().map(|p| p.id.clone()).collect(),
            })
            .await?;

        let line_items: Vec<LineItem> = payable
            .iter()
            .filter_map(|p| LineItem::from_product(p))
            .collect();

        let request = SessionRequest {
            order_id: order.id.clone(),
            user_id: auth.user_id.clone(),
            line_items,
            success_url: self.urls.success_url(&order.id),
            cancel_url: self.urls.cancel_url(),
        };

        match self.gateway.create_session(&request).await {
            Ok(session) => {
                info!(order_id = %order.id, session_id = %session.session_id, "checkout session created");
                Ok(CheckoutRedirect::Hosted { url: session.url })
            }
            Err(err) => {
                // The order row is already durable; session creation alone
                // can be retried, so the caller gets a soft no-url result.
                warn!(order_id = %order.id, error = %err, "checkout session unavailable");
                Ok(CheckoutRedirect::Unavailable)
            }
        }
    }

    /// Report whether an order has been marked paid.
    ///
    /// Re-reads the order store on every call; safe for tight client
    /// polling while the out-of-band confirmation is pending.
    #[instrument(skip(self))]
    pub async fn order_status(&self, order_id: &str) -> ShopResult<OrderStatus> {
        let order = self
            .orders
            .get(order_id)
            .await?
            .ok_or_else(|| ShopError::NotFound(format!("order {order_id}")))?;

        Ok(OrderStatus {
            is_paid: order.is_paid,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::Email;
    use crate::error::ShopError;
    use crate::gateway::PaymentGateway;
    use crate::order::{HostedSession, WebhookEvent};
    use crate::product::{Currency, Price, Product, ProductCatalog};
    use crate::store::{MemoryOrderStore, OrderStore};
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};

    /// Gateway double: records requests, returns a canned session or error
    struct FakeGateway {
        requests: Mutex<Vec<SessionRequest>>,
        fail: bool,
    }

    impl FakeGateway {
        fn new() -> Self {
            Self {
                requests: Mutex::new(Vec::new()),
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                requests: Mutex::new(Vec::new()),
                fail: true,
            }
        }

        fn recorded(&self) -> Vec<SessionRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PaymentGateway for FakeGateway {
        async fn create_session(&self, request: &SessionRequest) -> ShopResult<HostedSession> {
            self.requests.lock().unwrap().push(request.clone());

            if self.fail {
                return Err(ShopError::Provider {
                    provider: "fake".to_string(),
                    message: "session create failed".to_string(),
                });
            }

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
            Err(ShopError::Internal("not used in these tests".to_string()))
        }

        fn provider_name(&self) -> &'static str {
            "fake"
        }
    }

    fn catalog() -> ProductCatalog {
        let mut catalog = ProductCatalog::new();
        catalog.add(
            Product::new("P1", "UI Kit", Price::new(10.0, Currency::USD))
                .with_price_id("pr_1"),
        );
        catalog.add(Product::new("P2", "Poster", Price::new(5.0, Currency::USD)));
        catalog.add(
            Product::new("P3", "Icon Set", Price::new(8.0, Currency::USD))
                .with_price_id("pr_3"),
        );
        catalog
    }

    fn service(
        orders: Arc<MemoryOrderStore>,
        gateway: Arc<FakeGateway>,
    ) -> CheckoutService {
        CheckoutService::new(
            Arc::new(catalog()),
            orders,
            gateway,
            RedirectUrls::new("http://localhost:3000"),
        )
    }

    fn buyer() -> AuthContext {
        AuthContext::new("user-1", Email::parse("buyer@example.com").unwrap())
    }

    #[tokio::test]
    async fn test_empty_product_set_rejected_before_any_call() {
        let orders = Arc::new(MemoryOrderStore::new());
        let gateway = Arc::new(FakeGateway::new());
        let service = service(orders.clone(), gateway.clone());

        let err = service.create_session(&[], &buyer()).await.unwrap_err();

        assert!(matches!(err, ShopError::BadRequest(_)));
        assert!(orders.is_empty());
        assert!(gateway.recorded().is_empty());
    }

    #[tokio::test]
    async fn test_happy_path_creates_order_then_session() {
        let orders = Arc::new(MemoryOrderStore::new());
        let gateway = Arc::new(FakeGateway::new());
        let service = service(orders.clone(), gateway.clone());

        let redirect = service
            .create_session(&["P1".to_string(), "P3".to_string()], &buyer())
            .await
            .unwrap();

        assert!(redirect.url().is_some());
        assert_eq!(orders.len(), 1);

        let requests = gateway.recorded();
        assert_eq!(requests.len(), 1);
        let request = &requests[0];

        // The order existed before the session request and is embedded in
        // the success URL for later status polling.
        let order = orders.get(&request.order_id).await.unwrap().unwrap();
        assert!(!order.is_paid);
        assert_eq!(order.product_ids, vec!["P1", "P3"]);
        assert_eq!(order.user_id, "user-1");
        assert!(request
            .success_url
            .ends_with(&format!("/thank-you?orderId={}", order.id)));
        assert!(request.cancel_url.ends_with("/cart"));

        assert_eq!(request.line_items.len(), 2);
        assert_eq!(request.line_items[0].price_id, "pr_1");
        assert_eq!(request.line_items[0].quantity, 1);
        assert_eq!(request.line_items[1].price_id, "pr_3");
    }

    #[tokio::test]
    async fn test_unpayable_products_dropped_silently() {
        let orders = Arc::new(MemoryOrderStore::new());
        let gateway = Arc::new(FakeGateway::new());
        let service = service(orders.clone(), gateway.clone());

        // P2 has no price reference, "ghost" is not in the catalog
        let redirect = service
            .create_session(
                &["P1".to_string(), "P2".to_string(), "ghost".to_string()],
                &buyer(),
            )
            .await
            .unwrap();

        assert!(redirect.url().is_some());

        let request = &gateway.recorded()[0];
        let order = orders.get(&request.order_id).await.unwrap().unwrap();
        assert_eq!(order.product_ids, vec!["P1"]);
        assert_eq!(request.line_items.len(), 1);
        assert_eq!(request.line_items[0].price_id, "pr_1");
    }

    #[tokio::test]
    async fn test_all_unpayable_still_creates_empty_order() {
        let orders = Arc::new(MemoryOrderStore::new());
        let gateway = Arc::new(FakeGateway::new());
        let service = service(orders.clone(), gateway.clone());

        let redirect = service
            .create_session(&["P2".to_string()], &buyer())
            .await
            .unwrap();

        // The workflow proceeds: an order with zero line items is recorded
        assert!(redirect.url().is_some());
        let request = &gateway.recorded()[0];
        let order = orders.get(&request.order_id).await.unwrap().unwrap();
        assert!(order.product_ids.is_empty());
        assert!(request.line_items.is_empty());
    }

    #[tokio::test]
    async fn test_provider_failure_is_soft() {
        let orders = Arc::new(MemoryOrderStore::new());
        let gateway = Arc::new(FakeGateway::failing());
        let service = service(orders.clone(), gateway.clone());

        let redirect = service
            .create_session(&["P1".to_string()], &buyer())
            .await
            .unwrap();

        assert_eq!(redirect, CheckoutRedirect::Unavailable);
        // The pending order survives the provider failure
        assert_eq!(orders.len(), 1);
    }

    #[tokio::test]
    async fn test_two_calls_create_two_orders() {
        let orders = Arc::new(MemoryOrderStore::new());
        let gateway = Arc::new(FakeGateway::new());
        let service = service(orders.clone(), gateway.clone());

        let ids = vec!["P1".to_string()];
        service.create_session(&ids, &buyer()).await.unwrap();
        service.create_session(&ids, &buyer()).await.unwrap();

        assert_eq!(orders.len(), 2);
    }

    #[tokio::test]
    async fn test_order_status_rereads_store() {
        let orders = Arc::new(MemoryOrderStore::new());
        let gateway = Arc::new(FakeGateway::new());
        let service = service(orders.clone(), gateway.clone());

        service
            .create_session(&["P1".to_string()], &buyer())
            .await
            .unwrap();
        let order_id = gateway.recorded()[0].order_id.clone();

        assert!(!service.order_status(&order_id).await.unwrap().is_paid);
        // Polling again with nothing changed returns the same answer
        assert!(!service.order_status(&order_id).await.unwrap().is_paid);

        // The confirmation callback flips the flag out of band
        orders.mark_paid(&order_id).await.unwrap();

        assert!(service.order_status(&order_id).await.unwrap().is_paid);
    }

    #[tokio::test]
    async fn test_order_status_unknown_order() {
        let orders = Arc::new(MemoryOrderStore::new());
        let gateway = Arc::new(FakeGateway::new());
        let service = service(orders, gateway);

        let err = service.order_status("missing").await.unwrap_err();
        assert!(matches!(err, ShopError::NotFound(_)));
    }
}
