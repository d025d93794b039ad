//! Shared fixtures and fault-injecting stores for checkout integration tests.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use kahera_checkout::memory::{InMemoryDraftStore, InMemoryProductStore, InMemorySaleStore};
use kahera_checkout::{
    CheckoutConfig, DraftConversion, DraftStore, ProductStore, SaleCheckoutTransaction, SaleStore,
    StockDecrement, StoreError, StoreResult,
};
use kahera_core::{Cart, CartAction, Money, Product, SaleRecord};

pub fn product(id: &str, price_centavos: i64, stock: i64) -> Product {
    Product {
        id: id.to_string(),
        sku: format!("SKU-{}", id.to_uppercase()),
        name: format!("Product {}", id),
        unit: "pc".to_string(),
        price: Money::from_centavos(price_centavos),
        cost: Some(Money::from_centavos(price_centavos / 2)),
        cost_code: None,
        current_stock: stock,
        is_active: true,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

/// Builds a cart from (product, quantity) pairs and a tendered amount.
pub fn cart_of(lines: &[(&Product, i64)], received_centavos: i64) -> Cart {
    let mut cart = Cart::new();
    for (product, quantity) in lines {
        cart = cart
            .apply(CartAction::AddProduct {
                product: (*product).clone(),
                quantity: *quantity,
            })
            .unwrap();
    }
    cart.apply(CartAction::SetAmountReceived(Money::from_centavos(
        received_centavos,
    )))
    .unwrap()
}

/// Config with no backoff so retry tests run fast.
pub fn fast_config() -> CheckoutConfig {
    let mut config = CheckoutConfig::default();
    config.device.id = "register-01".to_string();
    config.checkout.persist_backoff_ms = 0;
    config
}

/// In-memory stores plus a transaction wired to them.
pub struct Harness {
    pub products: Arc<InMemoryProductStore>,
    pub sales: Arc<InMemorySaleStore>,
    pub drafts: Arc<InMemoryDraftStore>,
    pub checkout: SaleCheckoutTransaction,
}

impl Harness {
    pub fn new(products: Vec<Product>) -> Self {
        Self::with_config(products, fast_config())
    }

    pub fn with_config(products: Vec<Product>, config: CheckoutConfig) -> Self {
        let products = Arc::new(InMemoryProductStore::with_products(products));
        let sales = Arc::new(InMemorySaleStore::new());
        let drafts = Arc::new(InMemoryDraftStore::new());
        let checkout = SaleCheckoutTransaction::new(
            products.clone(),
            sales.clone(),
            drafts.clone(),
            config,
        );
        Harness {
            products,
            sales,
            drafts,
            checkout,
        }
    }
}

// =============================================================================
// Fault-injecting stores
// =============================================================================

/// Product store that can fail decrements for chosen products and fail
/// the first `failing_increments` compensation calls.
pub struct FaultyProductStore {
    pub inner: Arc<InMemoryProductStore>,
    pub fail_decrement_for: HashSet<String>,
    pub failing_increments: AtomicU32,
    pub increment_calls: AtomicU32,
}

impl FaultyProductStore {
    pub fn new(inner: Arc<InMemoryProductStore>) -> Self {
        FaultyProductStore {
            inner,
            fail_decrement_for: HashSet::new(),
            failing_increments: AtomicU32::new(0),
            increment_calls: AtomicU32::new(0),
        }
    }

    pub fn failing_decrement(mut self, product_id: &str) -> Self {
        self.fail_decrement_for.insert(product_id.to_string());
        self
    }

    pub fn failing_increments(self, count: u32) -> Self {
        self.failing_increments.store(count, Ordering::SeqCst);
        self
    }
}

#[async_trait]
impl ProductStore for FaultyProductStore {
    async fn conditional_decrement_stock(
        &self,
        product_id: &str,
        quantity: i64,
    ) -> StoreResult<StockDecrement> {
        if self.fail_decrement_for.contains(product_id) {
            return Err(StoreError::Transient("connection reset".to_string()));
        }
        self.inner.conditional_decrement_stock(product_id, quantity).await
    }

    async fn increment_stock(&self, product_id: &str, quantity: i64) -> StoreResult<()> {
        self.increment_calls.fetch_add(1, Ordering::SeqCst);
        let remaining = self.failing_increments.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failing_increments.store(remaining - 1, Ordering::SeqCst);
            return Err(StoreError::Transient("database is locked".to_string()));
        }
        self.inner.increment_stock(product_id, quantity).await
    }
}

/// Sale store that fails the first calls with a chosen error.
pub struct FaultySaleStore {
    pub inner: Arc<InMemorySaleStore>,
    pub failures: AtomicU32,
    pub error: StoreError,
    pub calls: AtomicU32,
    pub delay: Duration,
}

impl FaultySaleStore {
    pub fn new(inner: Arc<InMemorySaleStore>, failures: u32, error: StoreError) -> Self {
        FaultySaleStore {
            inner,
            failures: AtomicU32::new(failures),
            error,
            calls: AtomicU32::new(0),
            delay: Duration::ZERO,
        }
    }

    /// A store that never fails but answers after `delay`.
    pub fn slow(inner: Arc<InMemorySaleStore>, delay: Duration) -> Self {
        FaultySaleStore {
            delay,
            ..Self::new(inner, 0, StoreError::Internal("unused".to_string()))
        }
    }
}

#[async_trait]
impl SaleStore for FaultySaleStore {
    async fn create_sale(&self, sale: &SaleRecord) -> StoreResult<SaleRecord> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let remaining = self.failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failures.store(remaining - 1, Ordering::SeqCst);
            return Err(self.error.clone());
        }
        self.inner.create_sale(sale).await
    }

    async fn void_sale(&self, sale_id: &str) -> StoreResult<SaleRecord> {
        self.inner.void_sale(sale_id).await
    }
}

/// Draft store that always errors.
pub struct BrokenDraftStore;

#[async_trait]
impl DraftStore for BrokenDraftStore {
    async fn mark_converted(&self, _draft_id: &str, _sale_id: &str) -> StoreResult<DraftConversion> {
        Err(StoreError::Internal("disk I/O error".to_string()))
    }
}
