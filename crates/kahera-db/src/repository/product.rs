//! # Product Repository
//!
//! Database operations for products.
//!
//! ## Key Operations
//! - CRUD operations
//! - Atomic conditional stock decrement (the checkout's serialization point)
//! - Receiving: restock or mint a cost variation
//!
//! ## Conditional Decrement
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                 One statement, no read-modify-write                     │
//! │                                                                         │
//! │  UPDATE products                                                        │
//! │     SET current_stock = current_stock - :qty                            │
//! │   WHERE id = :id AND current_stock >= :qty                              │
//! │  RETURNING current_stock                                                │
//! │       │                                                                 │
//! │       ├── row returned  → Decremented { remaining }                     │
//! │       └── no row        → SELECT current_stock                          │
//! │                              ├── found   → Insufficient { available }   │
//! │                              └── missing → NotFound                     │
//! │                                                                         │
//! │  Register A: sells 3 ─┐                                                 │
//! │  Register B: sells 2 ─┼─► SQLite serializes writers, each UPDATE sees   │
//! │                       │   the other's committed stock                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::{debug, info, warn};
use uuid::Uuid;

use kahera_checkout::{ProductStore, StockDecrement, StoreError, StoreResult};
use kahera_core::validation::{
    validate_non_negative, validate_price, validate_product_name, validate_received_quantity,
    validate_sku,
};
use kahera_core::{receiving, sku, CostCodeMapping, Money, Product, ReceivingPlan};

use crate::error::{DbError, DbResult};

const SELECT_PRODUCT: &str = r#"
    SELECT
        id, sku, name, unit,
        price_centavos, cost_centavos, cost_code,
        current_stock, is_active,
        created_at, updated_at
    FROM products
"#;

/// Row shape of the `products` table.
#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: String,
    sku: String,
    name: String,
    unit: String,
    price_centavos: i64,
    cost_centavos: Option<i64>,
    cost_code: Option<String>,
    current_stock: i64,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product {
            id: row.id,
            sku: row.sku,
            name: row.name,
            unit: row.unit,
            price: Money::from_centavos(row.price_centavos),
            cost: row.cost_centavos.map(Money::from_centavos),
            cost_code: row.cost_code,
            current_stock: row.current_stock,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = ProductRepository::new(pool);
///
/// let product = repo.get_by_sku("RICE-ABCD2345").await?;
/// let (plan, stocked) = repo
///     .receive(&product.id, Money::from_centavos(5200), 10, &mapping)
///     .await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Gets a product by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let sql = format!("{} WHERE id = ?1", SELECT_PRODUCT);
        let row = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Product::from))
    }

    /// Gets a product by its SKU.
    pub async fn get_by_sku(&self, sku: &str) -> DbResult<Option<Product>> {
        let sql = format!("{} WHERE sku = ?1", SELECT_PRODUCT);
        let row = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(sku)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Product::from))
    }

    /// Lists active products ordered by name.
    pub async fn list_active(&self, limit: u32) -> DbResult<Vec<Product>> {
        let sql = format!(
            "{} WHERE is_active = 1 ORDER BY name, sku LIMIT ?1",
            SELECT_PRODUCT
        );
        let rows = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    /// Inserts a new product.
    ///
    /// ## Returns
    /// * `Ok(Product)` - Inserted product
    /// * `Err(DbError::Validation)` - SKU, name, price or stock rejected
    /// * `Err(DbError::UniqueViolation)` - SKU already exists
    pub async fn insert(&self, product: &Product) -> DbResult<Product> {
        validate_sku(&product.sku)?;
        validate_product_name(&product.name)?;
        validate_price(product.price)?;
        validate_non_negative("current_stock", product.current_stock)?;

        debug!(sku = %product.sku, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, sku, name, unit,
                price_centavos, cost_centavos, cost_code,
                current_stock, is_active,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
        )
        .bind(&product.id)
        .bind(&product.sku)
        .bind(&product.name)
        .bind(&product.unit)
        .bind(product.price.centavos())
        .bind(product.cost.map(|c| c.centavos()))
        .bind(&product.cost_code)
        .bind(product.current_stock)
        .bind(product.is_active)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } => DbError::duplicate(field, &product.sku),
            other => other,
        })?;

        Ok(product.clone())
    }

    /// Soft-deletes a product by setting is_active = false.
    ///
    /// Historical sale lines still reference the row.
    pub async fn soft_delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Soft-deleting product");

        let result = sqlx::query("UPDATE products SET is_active = 0, updated_at = ?2 WHERE id = ?1")
            .bind(id)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Current stock, or `None` for an unknown product.
    pub async fn stock(&self, id: &str) -> DbResult<Option<i64>> {
        let stock = sqlx::query_scalar::<_, i64>("SELECT current_stock FROM products WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(stock)
    }

    /// Every SKU equal to `base` or of the form `base-<suffix>`.
    ///
    /// Feeds [`sku::next_variation_number`], which ignores suffixes that are
    /// not plain integers.
    pub async fn skus_with_base(&self, base: &str) -> DbResult<Vec<String>> {
        let pattern = format!("{}-%", escape_like(base));
        let skus = sqlx::query_scalar::<_, String>(
            r#"SELECT sku FROM products WHERE sku = ?1 OR sku LIKE ?2 ESCAPE '\' ORDER BY sku"#,
        )
        .bind(base)
        .bind(pattern)
        .fetch_all(&self.pool)
        .await?;

        Ok(skus)
    }

    /// Takes `quantity` units if at least that many are on hand.
    pub async fn decrement_stock_if_available(
        &self,
        id: &str,
        quantity: i64,
    ) -> DbResult<StockDecrement> {
        let remaining = sqlx::query_scalar::<_, i64>(
            r#"
            UPDATE products
            SET current_stock = current_stock - ?1, updated_at = ?2
            WHERE id = ?3 AND current_stock >= ?1
            RETURNING current_stock
            "#,
        )
        .bind(quantity)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(remaining) = remaining {
            debug!(id = %id, quantity, remaining, "Stock decremented");
            return Ok(StockDecrement::Decremented { remaining });
        }

        match self.stock(id).await? {
            Some(available) => Ok(StockDecrement::Insufficient { available }),
            None => Err(DbError::not_found("Product", id)),
        }
    }

    /// Adds `quantity` units to a product.
    pub async fn add_stock(&self, id: &str, quantity: i64) -> DbResult<i64> {
        validate_received_quantity(quantity)?;

        let stock = sqlx::query_scalar::<_, i64>(
            r#"
            UPDATE products
            SET current_stock = current_stock + ?1, updated_at = ?2
            WHERE id = ?3
            RETURNING current_stock
            "#,
        )
        .bind(quantity)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("Product", id))?;

        debug!(id = %id, quantity, stock, "Stock incremented");
        Ok(stock)
    }

    /// Executes a receiving plan and returns the product that got the stock.
    ///
    /// ## Plans
    /// - `Restock`: adds stock and, when the product had no cost, records
    ///   the incoming cost and its code. One transaction.
    /// - `MintVariation`: inserts the variant, which already carries the
    ///   received stock.
    pub async fn apply_receiving_plan(&self, plan: &ReceivingPlan) -> DbResult<Product> {
        match plan {
            ReceivingPlan::Restock {
                product_id,
                quantity,
                cost_update,
            } => {
                let now = Utc::now();
                let mut tx = self
                    .pool
                    .begin()
                    .await
                    .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

                let result = sqlx::query(
                    "UPDATE products SET current_stock = current_stock + ?1, updated_at = ?2 WHERE id = ?3",
                )
                .bind(*quantity)
                .bind(now)
                .bind(product_id)
                .execute(&mut *tx)
                .await?;

                if result.rows_affected() == 0 {
                    return Err(DbError::not_found("Product", product_id));
                }

                if let Some(update) = cost_update {
                    sqlx::query(
                        r#"
                        UPDATE products
                        SET cost_centavos = ?1, cost_code = ?2, updated_at = ?3
                        WHERE id = ?4 AND cost_centavos IS NULL
                        "#,
                    )
                    .bind(update.cost.centavos())
                    .bind(&update.cost_code)
                    .bind(now)
                    .bind(product_id)
                    .execute(&mut *tx)
                    .await?;
                }

                tx.commit()
                    .await
                    .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

                info!(product_id = %product_id, quantity, "Stock received");

                self.get_by_id(product_id)
                    .await?
                    .ok_or_else(|| DbError::not_found("Product", product_id))
            }
            ReceivingPlan::MintVariation { variant, quantity } => {
                let inserted = self.insert(variant).await?;
                info!(
                    sku = %inserted.sku,
                    quantity,
                    cost_code = ?inserted.cost_code,
                    "Cost variation created"
                );
                Ok(inserted)
            }
        }
    }

    /// Receives a delivery for `product_id` at `incoming_cost`.
    ///
    /// Plans against the current row and the SKUs sharing its base, then
    /// applies the plan. If a concurrent receiving took the same variation
    /// number, the SKU list is re-read and the number recomputed once.
    pub async fn receive(
        &self,
        product_id: &str,
        incoming_cost: Money,
        quantity: i64,
        mapping: &CostCodeMapping,
    ) -> DbResult<(ReceivingPlan, Product)> {
        let product = self
            .get_by_id(product_id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", product_id))?;

        let existing = self.skus_with_base(sku::base_sku(&product.sku)).await?;
        self.receive_against(&product, incoming_cost, quantity, mapping, &existing)
            .await
    }

    async fn receive_against(
        &self,
        product: &Product,
        incoming_cost: Money,
        quantity: i64,
        mapping: &CostCodeMapping,
        existing: &[String],
    ) -> DbResult<(ReceivingPlan, Product)> {
        let plan = receiving::plan_receiving(product, incoming_cost, quantity, existing, mapping)?;

        match self.apply_receiving_plan(&plan).await {
            Err(DbError::UniqueViolation { value, .. }) if plan.is_new_variation() => {
                warn!(sku = %value, "Variation number taken, recomputing");
                let existing = self.skus_with_base(sku::base_sku(&product.sku)).await?;
                let plan =
                    receiving::plan_receiving(product, incoming_cost, quantity, &existing, mapping)?;
                let stocked = self.apply_receiving_plan(&plan).await?;
                Ok((plan, stocked))
            }
            result => result.map(|stocked| (plan, stocked)),
        }
    }

    /// Counts active products (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE is_active = 1")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

#[async_trait]
impl ProductStore for ProductRepository {
    async fn conditional_decrement_stock(
        &self,
        product_id: &str,
        quantity: i64,
    ) -> StoreResult<StockDecrement> {
        self.decrement_stock_if_available(product_id, quantity)
            .await
            .map_err(StoreError::from)
    }

    async fn increment_stock(&self, product_id: &str, quantity: i64) -> StoreResult<()> {
        self.add_stock(product_id, quantity)
            .await
            .map(|_| ())
            .map_err(StoreError::from)
    }
}

fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Helper to generate a new product ID.
pub fn generate_product_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};

    fn product(sku: &str, cost: Option<i64>, stock: i64) -> Product {
        Product {
            id: generate_product_id(),
            sku: sku.to_string(),
            name: "Rice 1kg".to_string(),
            unit: "pack".to_string(),
            price: Money::from_centavos(6_500),
            cost: cost.map(Money::from_centavos),
            cost_code: None,
            current_stock: stock,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    async fn repo() -> ProductRepository {
        Database::new(DbConfig::in_memory()).await.unwrap().products()
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let repo = repo().await;
        let p = product("RICE-ABCD2345", Some(5_000), 4);
        repo.insert(&p).await.unwrap();

        let by_id = repo.get_by_id(&p.id).await.unwrap().unwrap();
        assert_eq!(by_id.sku, p.sku);
        assert_eq!(by_id.price, Money::from_centavos(6_500));
        assert_eq!(by_id.cost, Some(Money::from_centavos(5_000)));

        let by_sku = repo.get_by_sku("RICE-ABCD2345").await.unwrap().unwrap();
        assert_eq!(by_sku.id, p.id);
        assert!(repo.get_by_sku("NOPE").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_sku_rejected() {
        let repo = repo().await;
        repo.insert(&product("RICE-ABCD2345", None, 0)).await.unwrap();

        let err = repo
            .insert(&product("RICE-ABCD2345", None, 0))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { ref value, .. } if value == "RICE-ABCD2345"));
    }

    #[tokio::test]
    async fn test_invalid_product_rejected_before_sql() {
        let repo = repo().await;
        let err = repo.insert(&product("BAD SKU", None, 0)).await.unwrap_err();
        assert!(matches!(err, DbError::Validation(_)));
        assert_eq!(repo.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_conditional_decrement() {
        let repo = repo().await;
        let p = product("RICE-ABCD2345", None, 5);
        repo.insert(&p).await.unwrap();

        assert_eq!(
            repo.decrement_stock_if_available(&p.id, 3).await.unwrap(),
            StockDecrement::Decremented { remaining: 2 }
        );
        assert_eq!(
            repo.decrement_stock_if_available(&p.id, 3).await.unwrap(),
            StockDecrement::Insufficient { available: 2 }
        );
        assert_eq!(
            repo.decrement_stock_if_available(&p.id, 2).await.unwrap(),
            StockDecrement::Decremented { remaining: 0 }
        );
        assert_eq!(repo.stock(&p.id).await.unwrap(), Some(0));

        let err = repo.decrement_stock_if_available("missing", 1).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_store_trait_maps_errors() {
        let repo = repo().await;
        let err = repo.increment_stock("missing", 1).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_skus_with_base() {
        let repo = repo().await;
        for sku in ["RICE-AB", "RICE-AB-1", "RICE-AB-2", "RICE-ABC", "SUGAR-AB-1"] {
            repo.insert(&product(sku, None, 0)).await.unwrap();
        }

        let skus = repo.skus_with_base("RICE-AB").await.unwrap();
        assert_eq!(skus, vec!["RICE-AB", "RICE-AB-1", "RICE-AB-2"]);
        assert_eq!(sku::next_variation_number("RICE-AB", &skus), 3);
    }

    #[tokio::test]
    async fn test_receive_same_cost_restocks() {
        let repo = repo().await;
        let p = product("RICE-ABCD2345", Some(5_000), 4);
        repo.insert(&p).await.unwrap();

        let (plan, stocked) = repo
            .receive(&p.id, Money::from_centavos(5_000), 6, &CostCodeMapping::default())
            .await
            .unwrap();

        assert!(!plan.is_new_variation());
        assert_eq!(stocked.id, p.id);
        assert_eq!(stocked.current_stock, 10);
    }

    #[tokio::test]
    async fn test_receive_without_cost_adopts_incoming() {
        let repo = repo().await;
        let p = product("RICE-ABCD2345", None, 0);
        repo.insert(&p).await.unwrap();

        let (_, stocked) = repo
            .receive(&p.id, Money::from_centavos(5_200), 3, &CostCodeMapping::default())
            .await
            .unwrap();

        assert_eq!(stocked.current_stock, 3);
        assert_eq!(stocked.cost, Some(Money::from_centavos(5_200)));
        // 52 pesos with BLACKHORSE
        assert_eq!(stocked.cost_code.as_deref(), Some("KL"));
    }

    #[tokio::test]
    async fn test_receive_new_cost_mints_next_variation() {
        let repo = repo().await;
        let p = product("RICE-ABCD2345", Some(5_000), 4);
        repo.insert(&p).await.unwrap();
        repo.insert(&product("RICE-ABCD2345-1", Some(5_100), 0))
            .await
            .unwrap();

        let (plan, variant) = repo
            .receive(&p.id, Money::from_centavos(5_200), 10, &CostCodeMapping::default())
            .await
            .unwrap();

        assert!(plan.is_new_variation());
        assert_eq!(variant.sku, "RICE-ABCD2345-2");
        assert_eq!(variant.current_stock, 10);
        assert_eq!(variant.cost, Some(Money::from_centavos(5_200)));
        assert_eq!(repo.stock(&p.id).await.unwrap(), Some(4));
        assert!(repo.get_by_sku("RICE-ABCD2345-2").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_receive_recomputes_taken_variation_number() {
        let repo = repo().await;
        let p = product("RICE-ABCD2345", Some(5_000), 4);
        repo.insert(&p).await.unwrap();
        // minted by another register after our SKU list was read
        repo.insert(&product("RICE-ABCD2345-1", Some(5_100), 0))
            .await
            .unwrap();

        let stale = vec![p.sku.clone()];
        let (plan, variant) = repo
            .receive_against(
                &p,
                Money::from_centavos(5_200),
                10,
                &CostCodeMapping::default(),
                &stale,
            )
            .await
            .unwrap();

        assert!(plan.is_new_variation());
        assert_eq!(variant.sku, "RICE-ABCD2345-2");
        assert_eq!(variant.current_stock, 10);
        assert_eq!(repo.skus_with_base("RICE-ABCD2345").await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_receive_rejects_non_positive_quantity() {
        let repo = repo().await;
        let p = product("RICE-ABCD2345", Some(5_000), 4);
        repo.insert(&p).await.unwrap();

        let err = repo
            .receive(&p.id, Money::from_centavos(5_000), 0, &CostCodeMapping::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(_)));
        assert_eq!(repo.stock(&p.id).await.unwrap(), Some(4));
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("A_B%C\\"), "A\\_B\\%C\\\\");
        assert_eq!(escape_like("RICE-AB"), "RICE-AB");
    }
}
