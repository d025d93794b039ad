//! # Repository Module
//!
//! Database repository implementations for Kahera POS.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repositories and Store Traits                        │
//! │                                                                         │
//! │  SaleCheckoutTransaction (kahera-checkout)                             │
//! │       │                                                                 │
//! │       │  Arc<dyn ProductStore> / SaleStore / DraftStore                │
//! │       ▼                                                                 │
//! │  ProductRepository ── conditional_decrement_stock, increment_stock     │
//! │  SaleRepository    ── create_sale, void_sale                           │
//! │  DraftRepository   ── mark_converted                                   │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! │  SettingsRepository is used directly (cost code mapping).              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`ProductRepository`](product::ProductRepository) - Products, stock, receiving
//! - [`SaleRepository`](sale::SaleRepository) - Committed sales and lines
//! - [`DraftRepository`](draft::DraftRepository) - Saved carts
//! - [`SettingsRepository`](settings::SettingsRepository) - JSON settings

pub mod draft;
pub mod product;
pub mod sale;
pub mod settings;
