//! # kahera-core: Pure Business Logic for Kahera POS
//!
//! This crate is the **heart** of Kahera POS. It contains all register
//! business rules as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Kahera POS Architecture                          │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 Register UI (external glue)                     │   │
//! │  │    Product Pick ──► Cart ──► Tender ──► Receiving              │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ kahera-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   cart    │  │ cost_code │  │    sku    │  │ receiving │  │   │
//! │  │   │  ledger   │  │   codec   │  │ variations│  │  policy   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │          kahera-checkout  ──►  kahera-db (SQLite)               │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, SaleRecord, DraftRecord, etc.)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`cart`] - Cart state, reducer actions and ledger totals
//! - [`cost_code`] - Reversible cost-obfuscation codec
//! - [`sku`] - SKU generation and variation numbering
//! - [`receiving`] - Variation policy for stock received at a new cost
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//!
//! ## Example Usage
//!
//! ```rust
//! use kahera_core::cost_code::{self, CostCodeMapping};
//! use kahera_core::money::Money;
//!
//! let mapping = CostCodeMapping::default();
//! let code = cost_code::encode(&mapping, Money::from_major_minor(1000, 0));
//! assert_eq!(cost_code::decode(&mapping, &code).unwrap(), 1000);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod cost_code;
pub mod error;
pub mod money;
pub mod receiving;
pub mod sku;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cart::{Cart, CartAction, CartItem, CartTotals};
pub use cost_code::CostCodeMapping;
pub use error::{CodecError, CoreError, MappingError, ValidationError};
pub use money::Money;
pub use receiving::ReceivingPlan;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum distinct lines allowed in a single cart.
pub const MAX_CART_ITEMS: usize = 100;

/// Maximum quantity of a single line in the cart.
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g., typing 1000 instead of 10)
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Maximum SKU length accepted anywhere in the system.
pub const MAX_SKU_LENGTH: usize = 50;
