//! # Store Traits
//!
//! The checkout transaction talks to persistence only through these traits.
//! `kahera-db` implements them on SQLite; [`crate::memory`] implements them
//! in process for tests and demos.
//!
//! ```text
//! ┌──────────────────────────┐      ┌─────────────────────────────────┐
//! │ SaleCheckoutTransaction  │─────►│ ProductStore                    │
//! │                          │      │  conditional_decrement_stock    │
//! │  Arc<dyn ProductStore>   │      │  increment_stock (compensation) │
//! │  Arc<dyn SaleStore>      │      ├─────────────────────────────────┤
//! │  Arc<dyn DraftStore>     │─────►│ SaleStore                       │
//! │                          │      │  create_sale / void_sale        │
//! │                          │      ├─────────────────────────────────┤
//! │                          │─────►│ DraftStore                      │
//! │                          │      │  mark_converted                 │
//! └──────────────────────────┘      └─────────────────────────────────┘
//! ```

use async_trait::async_trait;
use kahera_core::SaleRecord;
use serde::{Deserialize, Serialize};

use crate::error::StoreResult;

/// Result of an atomic conditional stock decrement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StockDecrement {
    /// Stock was decremented; `remaining` is the stock afterwards.
    Decremented { remaining: i64 },
    /// Stock was left untouched because only `available` units exist.
    Insufficient { available: i64 },
}

/// Result of linking a draft to the sale it became.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DraftConversion {
    Converted,
    NotFound,
    /// The draft was already linked to a sale; nothing changed.
    AlreadyConverted,
}

/// Per-product stock owned by the catalog.
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Decrements stock by `quantity` only if at least `quantity` units
    /// remain at the instant of the update.
    ///
    /// Must be atomic per product: the check and the write cannot be
    /// interleaved with another decrement of the same product.
    async fn conditional_decrement_stock(
        &self,
        product_id: &str,
        quantity: i64,
    ) -> StoreResult<StockDecrement>;

    /// Returns `quantity` units to stock. Used to undo a reservation.
    async fn increment_stock(&self, product_id: &str, quantity: i64) -> StoreResult<()>;
}

/// Committed sales.
#[async_trait]
pub trait SaleStore: Send + Sync {
    /// Writes a new sale.
    ///
    /// ## Errors
    /// - `StoreError::Conflict` if the sale number is already taken
    /// - `StoreError::Transient` if nothing was written and the call may be repeated
    async fn create_sale(&self, sale: &SaleRecord) -> StoreResult<SaleRecord>;

    /// Moves a completed sale to voided.
    ///
    /// ## Errors
    /// - `StoreError::NotFound` for an unknown id
    /// - `StoreError::InvalidTransition` if the sale is already voided
    async fn void_sale(&self, sale_id: &str) -> StoreResult<SaleRecord>;
}

/// Saved carts.
#[async_trait]
pub trait DraftStore: Send + Sync {
    /// Flags the draft as converted and links it to `sale_id`.
    async fn mark_converted(&self, draft_id: &str, sale_id: &str) -> StoreResult<DraftConversion>;
}
