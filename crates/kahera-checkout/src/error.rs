//! # Checkout Error Types
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Checkout Error Categories                           │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │   Validation    │  │     Stock       │  │       Store             │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  EmptyCart      │  │  Insufficient   │  │  Transient  (retryable) │ │
//! │  │  Insufficient   │  │  Stock          │  │  NotFound / Conflict    │ │
//! │  │  Payment        │  │                 │  │  InvalidTransition      │ │
//! │  │  Validation     │  │                 │  │  Internal               │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐                              │
//! │  │ Configuration   │  │    Internal     │                              │
//! │  │  InvalidConfig  │  │  task failures  │                              │
//! │  │  ConfigLoad/Save│  │                 │                              │
//! │  └─────────────────┘  └─────────────────┘                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use kahera_core::{Money, ValidationError};
use thiserror::Error;

/// Result type alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Result type alias for checkout operations.
pub type CheckoutResult<T> = Result<T, CheckoutError>;

// =============================================================================
// Store Error
// =============================================================================

/// Failure reported by a backing store.
///
/// Implementations map their native errors onto these categories; the
/// checkout transaction decides retry and compensation from the category
/// alone.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The store could not be reached or timed out. Nothing was written.
    #[error("Store temporarily unavailable: {0}")]
    Transient(String),

    /// The referenced record does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// A uniqueness constraint was violated (e.g. duplicate sale number).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The record is not in a state that allows the requested change.
    #[error("Invalid status transition: {0}")]
    InvalidTransition(String),

    /// Anything else.
    #[error("Store error: {0}")]
    Internal(String),
}

impl StoreError {
    /// Creates a NotFound error.
    pub fn not_found(entity: &str, id: &str) -> Self {
        StoreError::NotFound {
            entity: entity.to_string(),
            id: id.to_string(),
        }
    }

    /// Returns true if the same call may succeed when repeated.
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Transient(_))
    }
}

// =============================================================================
// Checkout Error
// =============================================================================

/// Why a checkout aborted (or never started).
#[derive(Debug, Error)]
pub enum CheckoutError {
    // =========================================================================
    // Validation Errors
    // =========================================================================
    /// The cart has no lines.
    #[error("Cart is empty")]
    EmptyCart,

    /// Tendered amount does not cover the grand total.
    #[error("Insufficient payment: {amount_received} received, {amount_due} due")]
    InsufficientPayment {
        amount_due: Money,
        amount_received: Money,
    },

    /// Cashier or cart lines failed validation.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    // =========================================================================
    // Stock Errors
    // =========================================================================
    /// A product did not have enough stock at the instant of decrement.
    ///
    /// ## When This Occurs
    /// Another register sold the last units between the cashier scanning
    /// the item and pressing "Pay". Earlier reservations of the same
    /// checkout have already been returned.
    #[error("Insufficient stock for {name} ({product_id}): requested {requested}, available {available}")]
    InsufficientStock {
        product_id: String,
        name: String,
        requested: i64,
        available: i64,
    },

    // =========================================================================
    // Store Errors
    // =========================================================================
    /// A backing store failed during reservation or persistence.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Invalid checkout configuration.
    #[error("Invalid checkout configuration: {0}")]
    InvalidConfig(String),

    /// Failed to load config file.
    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    /// Failed to save config file.
    #[error("Failed to save config: {0}")]
    ConfigSaveFailed(String),

    // =========================================================================
    // Internal Errors
    // =========================================================================
    /// The checkout task itself failed.
    #[error("Internal error: {0}")]
    Internal(String),
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<std::io::Error> for CheckoutError {
    fn from(err: std::io::Error) -> Self {
        CheckoutError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for CheckoutError {
    fn from(err: toml::de::Error) -> Self {
        CheckoutError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for CheckoutError {
    fn from(err: toml::ser::Error) -> Self {
        CheckoutError::ConfigSaveFailed(err.to_string())
    }
}

impl From<tokio::task::JoinError> for CheckoutError {
    fn from(err: tokio::task::JoinError) -> Self {
        CheckoutError::Internal(format!("checkout task failed: {}", err))
    }
}

// =============================================================================
// Error Categorization (for retry logic)
// =============================================================================

impl CheckoutError {
    /// Returns true if repeating the whole checkout may succeed.
    ///
    /// Only transient store failures qualify. Stock and payment problems
    /// need a cashier decision first.
    pub fn is_retryable(&self) -> bool {
        matches!(self, CheckoutError::Store(StoreError::Transient(_)))
    }

    /// Returns true if the checkout was rejected before touching any store.
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            CheckoutError::EmptyCart
                | CheckoutError::InsufficientPayment { .. }
                | CheckoutError::Validation(_)
        )
    }
}
