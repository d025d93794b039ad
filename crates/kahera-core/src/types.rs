//! # Domain Types
//!
//! Core domain types used throughout Kahera POS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │   SaleRecord    │   │  DraftRecord    │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  sku (business) │   │  sale_number    │   │  cart (frozen)  │       │
//! │  │  price / cost   │   │  lines (frozen) │   │  is_converted   │       │
//! │  │  cost_code      │   │  status         │   │  converted_to   │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │  DiscountType   │   │   SaleStatus    │   │ PaymentMethod   │       │
//! │  │  Amount         │   │  Completed      │   │  Cash           │       │
//! │  │  Percent        │   │  Voided         │   │  Card / EWallet │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every entity has:
//! - `id`: UUID v4 - immutable, used for relations
//! - Business ID: (sku, sale_number) - human-readable

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::cart::Cart;
use crate::money::Money;

// =============================================================================
// Product
// =============================================================================

/// A catalog product (a base SKU or one of its cost variations).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Stock Keeping Unit - business identifier.
    pub sku: String,

    /// Display name shown to cashier and on receipt.
    pub name: String,

    /// Unit of sale ("pc", "pack", "kg", ...).
    pub unit: String,

    /// Selling price.
    pub price: Money,

    /// Unit cost; `None` until first received with a cost.
    pub cost: Option<Money>,

    /// Obfuscated cost code derived from `cost`.
    pub cost_code: Option<String>,

    /// Units on hand. Never negative.
    pub current_stock: i64,

    /// Whether product is active (soft delete).
    pub is_active: bool,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Checks whether `quantity` units could be sold from current stock.
    pub fn can_sell(&self, quantity: i64) -> bool {
        self.is_active && quantity > 0 && self.current_stock >= quantity
    }
}

// =============================================================================
// Discount Type
// =============================================================================

/// How every line discount in a cart is interpreted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum DiscountType {
    /// `discount_value` is a centavo amount off the line.
    #[default]
    Amount,
    /// `discount_value` is basis points (1/100 of a percent) off the line.
    Percent,
}

// =============================================================================
// Sale Status
// =============================================================================

/// The status of a persisted sale.
///
/// A sale only ever moves Completed → Voided.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum SaleStatus {
    /// Sale has been paid and committed.
    #[default]
    Completed,
    /// Sale was cancelled after the fact.
    Voided,
}

impl SaleStatus {
    /// Returns true if moving from `self` to `next` is allowed.
    pub fn can_transition_to(self, next: SaleStatus) -> bool {
        matches!((self, next), (SaleStatus::Completed, SaleStatus::Voided))
    }
}

// =============================================================================
// Payment Method
// =============================================================================

#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Physical cash payment.
    #[default]
    Cash,
    /// Card payment on external terminal.
    Card,
    /// Mobile wallet transfer.
    EWallet,
}

// =============================================================================
// Sale Record
// =============================================================================

/// A frozen line of a committed sale.
/// Uses snapshot pattern to freeze product data at time of sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleLine {
    pub product_id: String,
    /// SKU at time of sale (frozen).
    pub sku: String,
    /// Product name at time of sale (frozen).
    pub name: String,
    pub unit: String,
    pub quantity: i64,
    pub unit_price: Money,
    pub unit_cost: Money,
    /// unit_price × quantity
    pub gross_amount: Money,
    pub discount_amount: Money,
    /// gross − discount
    pub net_amount: Money,
}

/// An immutable committed sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleRecord {
    pub id: String,
    /// Human-readable unique number printed on the receipt.
    pub sale_number: String,
    pub lines: Vec<SaleLine>,
    pub discount_type: DiscountType,
    pub subtotal: Money,
    pub total_discount: Money,
    pub grand_total: Money,
    pub amount_received: Money,
    pub change_given: Money,
    pub payment_method: PaymentMethod,
    pub cashier_id: String,
    /// Draft this sale was converted from, if any.
    pub draft_id: Option<String>,
    pub status: SaleStatus,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub voided_at: Option<DateTime<Utc>>,
}

impl SaleRecord {
    /// Total units across all lines.
    pub fn total_quantity(&self) -> i64 {
        self.lines.iter().map(|l| l.quantity).sum()
    }
}

// =============================================================================
// Draft Record
// =============================================================================

/// A saved, not-yet-finalized cart.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DraftRecord {
    pub id: String,
    /// Cashier-facing label ("Table 4", "Mrs. Santos").
    pub label: Option<String>,
    pub cashier_id: String,
    pub cart: Cart,
    pub is_converted: bool,
    pub converted_to_sale_id: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================
