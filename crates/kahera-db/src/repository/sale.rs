//! # Sale Repository
//!
//! Database operations for committed sales and their frozen lines.
//!
//! ## Sale Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sale Lifecycle                                    │
//! │                                                                         │
//! │  1. INSERT (one transaction)                                           │
//! │     └── sales row      { status: completed }                           │
//! │     └── sale_lines     (line_no 0..n, snapshot of cart lines)          │
//! │                                                                         │
//! │  2. (OPTIONAL) VOID                                                    │
//! │     └── void() → { status: voided, voided_at }                         │
//! │         only from completed; a second void is rejected                 │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::{debug, info};

use kahera_checkout::{SaleStore, StoreError, StoreResult};
use kahera_core::{DiscountType, Money, PaymentMethod, SaleLine, SaleRecord, SaleStatus};

use crate::error::{DbError, DbResult};

const SELECT_SALE: &str = r#"
    SELECT
        id, sale_number, discount_type,
        subtotal_centavos, total_discount_centavos, grand_total_centavos,
        amount_received_centavos, change_given_centavos,
        payment_method, cashier_id, draft_id, status,
        created_at, voided_at
    FROM sales
"#;

#[derive(Debug, sqlx::FromRow)]
struct SaleRow {
    id: String,
    sale_number: String,
    discount_type: DiscountType,
    subtotal_centavos: i64,
    total_discount_centavos: i64,
    grand_total_centavos: i64,
    amount_received_centavos: i64,
    change_given_centavos: i64,
    payment_method: PaymentMethod,
    cashier_id: String,
    draft_id: Option<String>,
    status: SaleStatus,
    created_at: DateTime<Utc>,
    voided_at: Option<DateTime<Utc>>,
}

impl SaleRow {
    fn into_record(self, lines: Vec<SaleLine>) -> SaleRecord {
        SaleRecord {
            id: self.id,
            sale_number: self.sale_number,
            lines,
            discount_type: self.discount_type,
            subtotal: Money::from_centavos(self.subtotal_centavos),
            total_discount: Money::from_centavos(self.total_discount_centavos),
            grand_total: Money::from_centavos(self.grand_total_centavos),
            amount_received: Money::from_centavos(self.amount_received_centavos),
            change_given: Money::from_centavos(self.change_given_centavos),
            payment_method: self.payment_method,
            cashier_id: self.cashier_id,
            draft_id: self.draft_id,
            status: self.status,
            created_at: self.created_at,
            voided_at: self.voided_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SaleLineRow {
    product_id: String,
    sku: String,
    name: String,
    unit: String,
    quantity: i64,
    unit_price_centavos: i64,
    unit_cost_centavos: i64,
    gross_centavos: i64,
    discount_centavos: i64,
    net_centavos: i64,
}

impl From<SaleLineRow> for SaleLine {
    fn from(row: SaleLineRow) -> Self {
        SaleLine {
            product_id: row.product_id,
            sku: row.sku,
            name: row.name,
            unit: row.unit,
            quantity: row.quantity,
            unit_price: Money::from_centavos(row.unit_price_centavos),
            unit_cost: Money::from_centavos(row.unit_cost_centavos),
            gross_amount: Money::from_centavos(row.gross_centavos),
            discount_amount: Money::from_centavos(row.discount_centavos),
            net_amount: Money::from_centavos(row.net_centavos),
        }
    }
}

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Gets a sale with its lines by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<SaleRecord>> {
        let sql = format!("{} WHERE id = ?1", SELECT_SALE);
        let row = sqlx::query_as::<_, SaleRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let lines = self.get_lines(&row.id).await?;
                Ok(Some(row.into_record(lines)))
            }
            None => Ok(None),
        }
    }

    /// Gets a sale by the number printed on its receipt.
    pub async fn get_by_sale_number(&self, sale_number: &str) -> DbResult<Option<SaleRecord>> {
        let sql = format!("{} WHERE sale_number = ?1", SELECT_SALE);
        let row = sqlx::query_as::<_, SaleRow>(&sql)
            .bind(sale_number)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let lines = self.get_lines(&row.id).await?;
                Ok(Some(row.into_record(lines)))
            }
            None => Ok(None),
        }
    }

    /// Gets the lines of a sale in cart order.
    pub async fn get_lines(&self, sale_id: &str) -> DbResult<Vec<SaleLine>> {
        let rows = sqlx::query_as::<_, SaleLineRow>(
            r#"
            SELECT
                product_id, sku, name, unit, quantity,
                unit_price_centavos, unit_cost_centavos,
                gross_centavos, discount_centavos, net_centavos
            FROM sale_lines
            WHERE sale_id = ?1
            ORDER BY line_no
            "#,
        )
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(SaleLine::from).collect())
    }

    /// Inserts a sale header and all of its lines in one transaction.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - id or sale number already used;
    ///   nothing was written
    pub async fn insert(&self, sale: &SaleRecord) -> DbResult<SaleRecord> {
        debug!(sale_number = %sale.sale_number, lines = sale.lines.len(), "Inserting sale");

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO sales (
                id, sale_number, discount_type,
                subtotal_centavos, total_discount_centavos, grand_total_centavos,
                amount_received_centavos, change_given_centavos,
                payment_method, cashier_id, draft_id, status,
                created_at, voided_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
            "#,
        )
        .bind(&sale.id)
        .bind(&sale.sale_number)
        .bind(sale.discount_type)
        .bind(sale.subtotal.centavos())
        .bind(sale.total_discount.centavos())
        .bind(sale.grand_total.centavos())
        .bind(sale.amount_received.centavos())
        .bind(sale.change_given.centavos())
        .bind(sale.payment_method)
        .bind(&sale.cashier_id)
        .bind(&sale.draft_id)
        .bind(sale.status)
        .bind(sale.created_at)
        .bind(sale.voided_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } => DbError::duplicate(field, &sale.sale_number),
            other => other,
        })?;

        for (line_no, line) in sale.lines.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO sale_lines (
                    sale_id, line_no, product_id, sku, name, unit, quantity,
                    unit_price_centavos, unit_cost_centavos,
                    gross_centavos, discount_centavos, net_centavos
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
                "#,
            )
            .bind(&sale.id)
            .bind(line_no as i64)
            .bind(&line.product_id)
            .bind(&line.sku)
            .bind(&line.name)
            .bind(&line.unit)
            .bind(line.quantity)
            .bind(line.unit_price.centavos())
            .bind(line.unit_cost.centavos())
            .bind(line.gross_amount.centavos())
            .bind(line.discount_amount.centavos())
            .bind(line.net_amount.centavos())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(
            sale_id = %sale.id,
            sale_number = %sale.sale_number,
            grand_total = %sale.grand_total,
            "Sale recorded"
        );

        Ok(sale.clone())
    }

    /// Voids a completed sale.
    ///
    /// ## Returns
    /// * `Err(DbError::InvalidTransition)` - sale is already voided
    /// * `Err(DbError::NotFound)` - no such sale
    pub async fn void(&self, sale_id: &str) -> DbResult<SaleRecord> {
        let result = sqlx::query(
            "UPDATE sales SET status = 'voided', voided_at = ?2 WHERE id = ?1 AND status = 'completed'",
        )
        .bind(sale_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        let sale = self
            .get_by_id(sale_id)
            .await?
            .ok_or_else(|| DbError::not_found("Sale", sale_id))?;

        if result.rows_affected() == 0 {
            return Err(DbError::InvalidTransition(format!(
                "sale {} is {:?}, cannot void",
                sale.sale_number, sale.status
            )));
        }

        info!(sale_id = %sale_id, sale_number = %sale.sale_number, "Sale voided");
        Ok(sale)
    }

    /// Most recent sales first.
    pub async fn list_recent(&self, limit: u32) -> DbResult<Vec<SaleRecord>> {
        let sql = format!("{} ORDER BY created_at DESC LIMIT ?1", SELECT_SALE);
        let rows = sqlx::query_as::<_, SaleRow>(&sql)
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await?;

        let mut sales = Vec::with_capacity(rows.len());
        for row in rows {
            let lines = self.get_lines(&row.id).await?;
            sales.push(row.into_record(lines));
        }
        Ok(sales)
    }

    /// Counts all sales, voided included.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

#[async_trait]
impl SaleStore for SaleRepository {
    async fn create_sale(&self, sale: &SaleRecord) -> StoreResult<SaleRecord> {
        self.insert(sale).await.map_err(StoreError::from)
    }

    async fn void_sale(&self, sale_id: &str) -> StoreResult<SaleRecord> {
        self.void(sale_id).await.map_err(StoreError::from)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::product::ProductRepository;
    use crate::{Database, DbConfig};
    use kahera_core::Product;

    async fn setup() -> (SaleRepository, Product) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let product = Product {
            id: "p-1".to_string(),
            sku: "COKE-330".to_string(),
            name: "Coke 330ml".to_string(),
            unit: "can".to_string(),
            price: Money::from_centavos(2_500),
            cost: Some(Money::from_centavos(1_800)),
            cost_code: None,
            current_stock: 10,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        ProductRepository::new(db.pool().clone())
            .insert(&product)
            .await
            .unwrap();
        (db.sales(), product)
    }

    fn sale(id: &str, number: &str, product: &Product) -> SaleRecord {
        let line = SaleLine {
            product_id: product.id.clone(),
            sku: product.sku.clone(),
            name: product.name.clone(),
            unit: product.unit.clone(),
            quantity: 2,
            unit_price: product.price,
            unit_cost: Money::from_centavos(1_800),
            gross_amount: Money::from_centavos(5_000),
            discount_amount: Money::from_centavos(500),
            net_amount: Money::from_centavos(4_500),
        };
        SaleRecord {
            id: id.to_string(),
            sale_number: number.to_string(),
            lines: vec![line.clone(), SaleLine { quantity: 1, ..line }],
            discount_type: DiscountType::Amount,
            subtotal: Money::from_centavos(7_500),
            total_discount: Money::from_centavos(1_000),
            grand_total: Money::from_centavos(6_500),
            amount_received: Money::from_centavos(10_000),
            change_given: Money::from_centavos(3_500),
            payment_method: PaymentMethod::EWallet,
            cashier_id: "cashier-1".to_string(),
            draft_id: None,
            status: SaleStatus::Completed,
            created_at: Utc::now(),
            voided_at: None,
        }
    }

    #[tokio::test]
    async fn test_insert_and_read_back() {
        let (repo, product) = setup().await;
        let record = sale("s-1", "20261014-01-0000abcd", &product);
        repo.insert(&record).await.unwrap();

        let stored = repo.get_by_id("s-1").await.unwrap().unwrap();
        assert_eq!(stored.sale_number, record.sale_number);
        assert_eq!(stored.lines, record.lines);
        assert_eq!(stored.grand_total, Money::from_centavos(6_500));
        assert_eq!(stored.payment_method, PaymentMethod::EWallet);
        assert_eq!(stored.status, SaleStatus::Completed);
        assert_eq!(stored.total_quantity(), 3);

        let by_number = repo
            .get_by_sale_number("20261014-01-0000abcd")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_number.id, "s-1");
    }

    #[tokio::test]
    async fn test_duplicate_sale_number_is_conflict() {
        let (repo, product) = setup().await;
        repo.insert(&sale("s-1", "N-1", &product)).await.unwrap();

        let err = repo.insert(&sale("s-2", "N-1", &product)).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
        assert!(matches!(StoreError::from(err), StoreError::Conflict(_)));

        // header and lines rolled back together
        assert_eq!(repo.count().await.unwrap(), 1);
        assert!(repo.get_lines("s-2").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_line_rolls_back_header() {
        let (repo, product) = setup().await;
        let mut record = sale("s-1", "N-1", &product);
        record.lines[1].product_id = "missing".to_string();

        let err = repo.insert(&record).await.unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
        assert!(repo.get_by_id("s-1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_void_once() {
        let (repo, product) = setup().await;
        repo.insert(&sale("s-1", "N-1", &product)).await.unwrap();

        let voided = repo.void("s-1").await.unwrap();
        assert_eq!(voided.status, SaleStatus::Voided);
        assert!(voided.voided_at.is_some());

        let err = repo.void("s-1").await.unwrap_err();
        assert!(matches!(err, DbError::InvalidTransition(_)));

        let err = repo.void_sale("missing").await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_list_recent() {
        let (repo, product) = setup().await;
        let mut older = sale("s-1", "N-1", &product);
        older.created_at = Utc::now() - chrono::Duration::minutes(5);
        repo.insert(&older).await.unwrap();
        repo.insert(&sale("s-2", "N-2", &product)).await.unwrap();

        let recent = repo.list_recent(10).await.unwrap();
        let ids: Vec<&str> = recent.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["s-2", "s-1"]);
        assert_eq!(recent[0].lines.len(), 2);
    }
}
