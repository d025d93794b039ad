//! # In-Memory Stores
//!
//! Process-local implementations of the store traits. Each store keeps its
//! records behind a `tokio::sync::Mutex`, which makes every trait call a
//! single critical section and gives the conditional decrement its
//! atomicity.
//!
//! Used by the integration tests and by callers that want a register
//! simulation without a database.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use kahera_core::{DraftRecord, Product, SaleRecord, SaleStatus};
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::store::{DraftConversion, DraftStore, ProductStore, SaleStore, StockDecrement};

// =============================================================================
// Products
// =============================================================================

#[derive(Debug, Default)]
pub struct InMemoryProductStore {
    products: Mutex<HashMap<String, Product>>,
}

impl InMemoryProductStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store holding `products`.
    pub fn with_products(products: impl IntoIterator<Item = Product>) -> Self {
        let products = products.into_iter().map(|p| (p.id.clone(), p)).collect();
        InMemoryProductStore {
            products: Mutex::new(products),
        }
    }

    /// Inserts or replaces a product.
    pub async fn insert(&self, product: Product) {
        self.products.lock().await.insert(product.id.clone(), product);
    }

    pub async fn get(&self, product_id: &str) -> Option<Product> {
        self.products.lock().await.get(product_id).cloned()
    }

    /// Current stock, or `None` for an unknown product.
    pub async fn stock(&self, product_id: &str) -> Option<i64> {
        self.products
            .lock()
            .await
            .get(product_id)
            .map(|p| p.current_stock)
    }
}

#[async_trait]
impl ProductStore for InMemoryProductStore {
    async fn conditional_decrement_stock(
        &self,
        product_id: &str,
        quantity: i64,
    ) -> StoreResult<StockDecrement> {
        let mut products = self.products.lock().await;
        let product = products
            .get_mut(product_id)
            .ok_or_else(|| StoreError::not_found("Product", product_id))?;

        if product.current_stock < quantity {
            return Ok(StockDecrement::Insufficient {
                available: product.current_stock,
            });
        }

        product.current_stock -= quantity;
        product.updated_at = Utc::now();
        Ok(StockDecrement::Decremented {
            remaining: product.current_stock,
        })
    }

    async fn increment_stock(&self, product_id: &str, quantity: i64) -> StoreResult<()> {
        let mut products = self.products.lock().await;
        let product = products
            .get_mut(product_id)
            .ok_or_else(|| StoreError::not_found("Product", product_id))?;

        product.current_stock += quantity;
        product.updated_at = Utc::now();
        debug!(product_id = %product_id, quantity, stock = product.current_stock, "Stock incremented");
        Ok(())
    }
}

// =============================================================================
// Sales
// =============================================================================

#[derive(Debug, Default)]
pub struct InMemorySaleStore {
    sales: Mutex<HashMap<String, SaleRecord>>,
}

impl InMemorySaleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, sale_id: &str) -> Option<SaleRecord> {
        self.sales.lock().await.get(sale_id).cloned()
    }

    /// All stored sales, oldest first.
    pub async fn all(&self) -> Vec<SaleRecord> {
        let mut sales: Vec<SaleRecord> = self.sales.lock().await.values().cloned().collect();
        sales.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        sales
    }

    pub async fn count(&self) -> usize {
        self.sales.lock().await.len()
    }
}

#[async_trait]
impl SaleStore for InMemorySaleStore {
    async fn create_sale(&self, sale: &SaleRecord) -> StoreResult<SaleRecord> {
        let mut sales = self.sales.lock().await;

        if sales.contains_key(&sale.id) {
            return Err(StoreError::Conflict(format!("sale id {} already exists", sale.id)));
        }
        if sales.values().any(|s| s.sale_number == sale.sale_number) {
            return Err(StoreError::Conflict(format!(
                "sale number {} already exists",
                sale.sale_number
            )));
        }

        sales.insert(sale.id.clone(), sale.clone());
        Ok(sale.clone())
    }

    async fn void_sale(&self, sale_id: &str) -> StoreResult<SaleRecord> {
        let mut sales = self.sales.lock().await;
        let sale = sales
            .get_mut(sale_id)
            .ok_or_else(|| StoreError::not_found("Sale", sale_id))?;

        if !sale.status.can_transition_to(SaleStatus::Voided) {
            return Err(StoreError::InvalidTransition(format!(
                "sale {} is {:?}, cannot void",
                sale.sale_number, sale.status
            )));
        }

        sale.status = SaleStatus::Voided;
        sale.voided_at = Some(Utc::now());
        Ok(sale.clone())
    }
}

// =============================================================================
// Drafts
// =============================================================================

#[derive(Debug, Default)]
pub struct InMemoryDraftStore {
    drafts: Mutex<HashMap<String, DraftRecord>>,
}

impl InMemoryDraftStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, draft: DraftRecord) {
        self.drafts.lock().await.insert(draft.id.clone(), draft);
    }

    pub async fn get(&self, draft_id: &str) -> Option<DraftRecord> {
        self.drafts.lock().await.get(draft_id).cloned()
    }
}

#[async_trait]
impl DraftStore for InMemoryDraftStore {
    async fn mark_converted(&self, draft_id: &str, sale_id: &str) -> StoreResult<DraftConversion> {
        let mut drafts = self.drafts.lock().await;
        let Some(draft) = drafts.get_mut(draft_id) else {
            return Ok(DraftConversion::NotFound);
        };

        if draft.is_converted {
            return Ok(DraftConversion::AlreadyConverted);
        }

        draft.is_converted = true;
        draft.converted_to_sale_id = Some(sale_id.to_string());
        draft.updated_at = Utc::now();
        Ok(DraftConversion::Converted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kahera_core::{Cart, DiscountType, Money, PaymentMethod};

    fn product(id: &str, stock: i64) -> Product {
        Product {
            id: id.to_string(),
            sku: format!("SKU-{}", id),
            name: format!("Product {}", id),
            unit: "pc".to_string(),
            price: Money::from_centavos(1000),
            cost: None,
            cost_code: None,
            current_stock: stock,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn sale(id: &str, number: &str) -> SaleRecord {
        SaleRecord {
            id: id.to_string(),
            sale_number: number.to_string(),
            lines: vec![],
            discount_type: DiscountType::Amount,
            subtotal: Money::zero(),
            total_discount: Money::zero(),
            grand_total: Money::zero(),
            amount_received: Money::zero(),
            change_given: Money::zero(),
            payment_method: PaymentMethod::Cash,
            cashier_id: "cashier-1".to_string(),
            draft_id: None,
            status: SaleStatus::Completed,
            created_at: Utc::now(),
            voided_at: None,
        }
    }

    #[tokio::test]
    async fn test_conditional_decrement() {
        let store = InMemoryProductStore::with_products([product("a", 3)]);

        assert_eq!(
            store.conditional_decrement_stock("a", 2).await.unwrap(),
            StockDecrement::Decremented { remaining: 1 }
        );
        assert_eq!(
            store.conditional_decrement_stock("a", 2).await.unwrap(),
            StockDecrement::Insufficient { available: 1 }
        );
        assert_eq!(store.stock("a").await, Some(1));

        store.increment_stock("a", 2).await.unwrap();
        assert_eq!(store.stock("a").await, Some(3));

        assert!(matches!(
            store.conditional_decrement_stock("missing", 1).await,
            Err(StoreError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_duplicate_sale_number_conflicts() {
        let store = InMemorySaleStore::new();
        store.create_sale(&sale("s1", "20260101-00-aaaaaaaa")).await.unwrap();

        let err = store
            .create_sale(&sale("s2", "20260101-00-aaaaaaaa"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
        assert_eq!(store.count().await, 1);
    }

    #[tokio::test]
    async fn test_void_only_once() {
        let store = InMemorySaleStore::new();
        store.create_sale(&sale("s1", "N-1")).await.unwrap();

        let voided = store.void_sale("s1").await.unwrap();
        assert_eq!(voided.status, SaleStatus::Voided);
        assert!(voided.voided_at.is_some());

        assert!(matches!(
            store.void_sale("s1").await,
            Err(StoreError::InvalidTransition(_))
        ));
        assert!(matches!(
            store.void_sale("nope").await,
            Err(StoreError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_mark_converted() {
        let store = InMemoryDraftStore::new();
        store
            .insert(DraftRecord {
                id: "d1".to_string(),
                label: Some("Table 4".to_string()),
                cashier_id: "cashier-1".to_string(),
                cart: Cart::new(),
                is_converted: false,
                converted_to_sale_id: None,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            })
            .await;

        assert_eq!(
            store.mark_converted("d1", "s1").await.unwrap(),
            DraftConversion::Converted
        );
        assert_eq!(
            store.mark_converted("d1", "s2").await.unwrap(),
            DraftConversion::AlreadyConverted
        );
        assert_eq!(
            store.mark_converted("d2", "s1").await.unwrap(),
            DraftConversion::NotFound
        );
        assert_eq!(
            store.get("d1").await.unwrap().converted_to_sale_id.as_deref(),
            Some("s1")
        );
    }
}
