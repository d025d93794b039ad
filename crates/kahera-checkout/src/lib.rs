//! # kahera-checkout: Checkout Orchestration for Kahera POS
//!
//! Commits a paid cart as an immutable sale while keeping product stock
//! consistent across registers that sell the same products at once.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        kahera-checkout                                  │
//! │                                                                         │
//! │   Cart snapshot + cashier + draft id                                   │
//! │              │                                                          │
//! │              ▼                                                          │
//! │   ┌──────────────────────────┐     ┌──────────────────────────────┐    │
//! │   │ SaleCheckoutTransaction  │────►│ store traits                 │    │
//! │   │ (transaction.rs)         │     │ (store.rs)                   │    │
//! │   │                          │     │                              │    │
//! │   │ validate → reserve →     │     │ ProductStore  SaleStore      │    │
//! │   │ persist → convert draft  │     │ DraftStore                   │    │
//! │   └────────────┬─────────────┘     └──────────────┬───────────────┘    │
//! │                │                                  │                     │
//! │   ┌────────────▼─────────────┐     ┌──────────────▼───────────────┐    │
//! │   │ CheckoutConfig           │     │ memory.rs (in-process)       │    │
//! │   │ sale_number.rs           │     │ kahera-db (SQLite)           │    │
//! │   └──────────────────────────┘     └──────────────────────────────┘    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use chrono::Utc;
//! use kahera_checkout::memory::{InMemoryDraftStore, InMemoryProductStore, InMemorySaleStore};
//! use kahera_checkout::{CheckoutConfig, CheckoutRequest, SaleCheckoutTransaction};
//! use kahera_core::{Cart, CartAction, Money, Product};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let rice = Product {
//!     id: "p-rice".into(),
//!     sku: "RICE-ABCD2345".into(),
//!     name: "Rice 1kg".into(),
//!     unit: "pack".into(),
//!     price: Money::from_centavos(6500),
//!     cost: None,
//!     cost_code: None,
//!     current_stock: 10,
//!     is_active: true,
//!     created_at: Utc::now(),
//!     updated_at: Utc::now(),
//! };
//!
//! let products = Arc::new(InMemoryProductStore::with_products([rice.clone()]));
//! let checkout = SaleCheckoutTransaction::new(
//!     products.clone(),
//!     Arc::new(InMemorySaleStore::new()),
//!     Arc::new(InMemoryDraftStore::new()),
//!     CheckoutConfig::default(),
//! );
//!
//! let cart = Cart::new()
//!     .apply(CartAction::AddProduct { product: rice, quantity: 2 })
//!     .unwrap()
//!     .apply(CartAction::SetAmountReceived(Money::from_centavos(20000)))
//!     .unwrap();
//!
//! let outcome = checkout
//!     .checkout(CheckoutRequest::new(cart, "cashier-1"))
//!     .await
//!     .unwrap();
//! assert_eq!(outcome.sale.change_given, Money::from_centavos(7000));
//! assert_eq!(products.stock("p-rice").await, Some(8));
//! # }
//! ```

pub mod config;
pub mod error;
pub mod memory;
pub mod sale_number;
pub mod store;
pub mod transaction;

pub use config::{CheckoutConfig, CheckoutSettings, DeviceConfig};
pub use error::{CheckoutError, CheckoutResult, StoreError, StoreResult};
pub use store::{DraftConversion, DraftStore, ProductStore, SaleStore, StockDecrement};
pub use transaction::{
    CheckoutOutcome, CheckoutRequest, CheckoutState, CheckoutWarning, SaleCheckoutTransaction,
};
