//! # Draft Repository
//!
//! Saved carts a cashier can resume later. The cart is stored as JSON;
//! a draft becomes read-only once a checkout marks it converted.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::{debug, info};

use kahera_checkout::{DraftConversion, DraftStore, StoreError, StoreResult};
use kahera_core::validation::validate_cashier_id;
use kahera_core::{Cart, DraftRecord};

use crate::error::{DbError, DbResult};

const SELECT_DRAFT: &str = r#"
    SELECT
        id, label, cashier_id, cart_json,
        is_converted, converted_to_sale_id,
        created_at, updated_at
    FROM drafts
"#;

#[derive(Debug, sqlx::FromRow)]
struct DraftRow {
    id: String,
    label: Option<String>,
    cashier_id: String,
    cart_json: String,
    is_converted: bool,
    converted_to_sale_id: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<DraftRow> for DraftRecord {
    type Error = DbError;

    fn try_from(row: DraftRow) -> DbResult<Self> {
        let cart: Cart = serde_json::from_str(&row.cart_json)?;
        Ok(DraftRecord {
            id: row.id,
            label: row.label,
            cashier_id: row.cashier_id,
            cart,
            is_converted: row.is_converted,
            converted_to_sale_id: row.converted_to_sale_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Repository for draft carts.
#[derive(Debug, Clone)]
pub struct DraftRepository {
    pool: SqlitePool,
}

impl DraftRepository {
    /// Creates a new DraftRepository.
    pub fn new(pool: SqlitePool) -> Self {
        DraftRepository { pool }
    }

    /// Inserts a draft or replaces the cart and label of an open one.
    ///
    /// ## Returns
    /// * `Err(DbError::InvalidTransition)` - the draft was already converted
    pub async fn save(&self, draft: &DraftRecord) -> DbResult<()> {
        validate_cashier_id(&draft.cashier_id)?;
        let cart_json = serde_json::to_string(&draft.cart)?;

        debug!(draft_id = %draft.id, items = draft.cart.items.len(), "Saving draft");

        let result = sqlx::query(
            r#"
            INSERT INTO drafts (
                id, label, cashier_id, cart_json,
                is_converted, converted_to_sale_id,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, 0, NULL, ?5, ?6)
            ON CONFLICT (id) DO UPDATE SET
                label = excluded.label,
                cart_json = excluded.cart_json,
                updated_at = excluded.updated_at
            WHERE drafts.is_converted = 0
            "#,
        )
        .bind(&draft.id)
        .bind(&draft.label)
        .bind(&draft.cashier_id)
        .bind(cart_json)
        .bind(draft.created_at)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::InvalidTransition(format!(
                "draft {} is already converted",
                draft.id
            )));
        }

        Ok(())
    }

    /// Gets a draft by ID.
    pub async fn get(&self, id: &str) -> DbResult<Option<DraftRecord>> {
        let sql = format!("{} WHERE id = ?1", SELECT_DRAFT);
        let row = sqlx::query_as::<_, DraftRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(DraftRecord::try_from).transpose()
    }

    /// Open drafts, most recently touched first. Optionally only one cashier's.
    pub async fn list_open(&self, cashier_id: Option<&str>) -> DbResult<Vec<DraftRecord>> {
        let sql = format!(
            "{} WHERE is_converted = 0 AND (?1 IS NULL OR cashier_id = ?1) ORDER BY updated_at DESC",
            SELECT_DRAFT
        );
        let rows = sqlx::query_as::<_, DraftRow>(&sql)
            .bind(cashier_id)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(DraftRecord::try_from).collect()
    }

    /// Deletes an open draft. Converted drafts are kept as sale history.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM drafts WHERE id = ?1 AND is_converted = 0")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return match self.get(id).await? {
                Some(_) => Err(DbError::InvalidTransition(format!(
                    "draft {} is already converted",
                    id
                ))),
                None => Err(DbError::not_found("Draft", id)),
            };
        }

        Ok(())
    }

    /// Marks an open draft as converted into `sale_id`.
    pub async fn convert(&self, draft_id: &str, sale_id: &str) -> DbResult<DraftConversion> {
        let result = sqlx::query(
            r#"
            UPDATE drafts
            SET is_converted = 1, converted_to_sale_id = ?2, updated_at = ?3
            WHERE id = ?1 AND is_converted = 0
            "#,
        )
        .bind(draft_id)
        .bind(sale_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 1 {
            info!(draft_id = %draft_id, sale_id = %sale_id, "Draft converted");
            return Ok(DraftConversion::Converted);
        }

        let exists: Option<i64> = sqlx::query_scalar("SELECT 1 FROM drafts WHERE id = ?1")
            .bind(draft_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(match exists {
            Some(_) => DraftConversion::AlreadyConverted,
            None => DraftConversion::NotFound,
        })
    }
}

#[async_trait]
impl DraftStore for DraftRepository {
    async fn mark_converted(&self, draft_id: &str, sale_id: &str) -> StoreResult<DraftConversion> {
        self.convert(draft_id, sale_id)
            .await
            .map_err(StoreError::from)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use kahera_core::{CartAction, DiscountType, Money, Product};

    fn cart() -> Cart {
        let product = Product {
            id: "p-1".to_string(),
            sku: "COKE-330".to_string(),
            name: "Coke 330ml".to_string(),
            unit: "can".to_string(),
            price: Money::from_centavos(2_500),
            cost: None,
            cost_code: None,
            current_stock: 10,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        Cart::new()
            .apply(CartAction::AddProduct {
                product,
                quantity: 3,
            })
            .unwrap()
            .apply(CartAction::SetDiscountType(DiscountType::Percent))
            .unwrap()
    }

    fn draft(id: &str, cashier: &str) -> DraftRecord {
        DraftRecord {
            id: id.to_string(),
            label: Some("Table 4".to_string()),
            cashier_id: cashier.to_string(),
            cart: cart(),
            is_converted: false,
            converted_to_sale_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    async fn setup() -> (Database, DraftRepository) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let drafts = db.drafts();
        (db, drafts)
    }

    /// Converted drafts reference a real sale row.
    async fn insert_sale_row(db: &Database, sale_id: &str) {
        sqlx::query(
            r#"
            INSERT INTO sales (
                id, sale_number, discount_type,
                subtotal_centavos, total_discount_centavos, grand_total_centavos,
                amount_received_centavos, change_given_centavos,
                payment_method, cashier_id, status, created_at
            ) VALUES (?1, ?1, 'amount', 0, 0, 0, 0, 0, 'cash', 'cashier-1', 'completed', ?2)
            "#,
        )
        .bind(sale_id)
        .bind(Utc::now())
        .execute(db.pool())
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_save_and_get_round_trips_cart() {
        let (_db, repo) = setup().await;
        let d = draft("d-1", "cashier-1");
        repo.save(&d).await.unwrap();

        let stored = repo.get("d-1").await.unwrap().unwrap();
        assert_eq!(stored.cart, d.cart);
        assert_eq!(stored.label.as_deref(), Some("Table 4"));
        assert!(!stored.is_converted);
        assert!(repo.get("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_updates_open_draft() {
        let (_db, repo) = setup().await;
        let mut d = draft("d-1", "cashier-1");
        repo.save(&d).await.unwrap();

        d.label = Some("Mrs. Santos".to_string());
        d.cart = Cart::new();
        repo.save(&d).await.unwrap();

        let stored = repo.get("d-1").await.unwrap().unwrap();
        assert_eq!(stored.label.as_deref(), Some("Mrs. Santos"));
        assert!(stored.cart.items.is_empty());
    }

    #[tokio::test]
    async fn test_convert_once() {
        let (db, repo) = setup().await;
        repo.save(&draft("d-1", "cashier-1")).await.unwrap();
        insert_sale_row(&db, "s-1").await;

        assert_eq!(
            repo.mark_converted("d-1", "s-1").await.unwrap(),
            DraftConversion::Converted
        );
        assert_eq!(
            repo.mark_converted("d-1", "s-1").await.unwrap(),
            DraftConversion::AlreadyConverted
        );
        assert_eq!(
            repo.mark_converted("missing", "s-1").await.unwrap(),
            DraftConversion::NotFound
        );

        let stored = repo.get("d-1").await.unwrap().unwrap();
        assert!(stored.is_converted);
        assert_eq!(stored.converted_to_sale_id.as_deref(), Some("s-1"));

        // converted drafts are frozen
        let err = repo.save(&draft("d-1", "cashier-1")).await.unwrap_err();
        assert!(matches!(err, DbError::InvalidTransition(_)));
        let err = repo.delete("d-1").await.unwrap_err();
        assert!(matches!(err, DbError::InvalidTransition(_)));
    }

    #[tokio::test]
    async fn test_list_open_filters() {
        let (db, repo) = setup().await;
        repo.save(&draft("d-1", "cashier-1")).await.unwrap();
        repo.save(&draft("d-2", "cashier-2")).await.unwrap();
        repo.save(&draft("d-3", "cashier-1")).await.unwrap();
        insert_sale_row(&db, "s-1").await;
        repo.convert("d-3", "s-1").await.unwrap();

        let all = repo.list_open(None).await.unwrap();
        assert_eq!(all.len(), 2);

        let mine = repo.list_open(Some("cashier-1")).await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].id, "d-1");
    }

    #[tokio::test]
    async fn test_delete_open_draft() {
        let (_db, repo) = setup().await;
        repo.save(&draft("d-1", "cashier-1")).await.unwrap();
        repo.delete("d-1").await.unwrap();
        assert!(repo.get("d-1").await.unwrap().is_none());

        let err = repo.delete("d-1").await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_blank_cashier_rejected() {
        let (_db, repo) = setup().await;
        let err = repo.save(&draft("d-1", "")).await.unwrap_err();
        assert!(matches!(err, DbError::Validation(_)));
    }
}
