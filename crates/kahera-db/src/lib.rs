//! # kahera-db: Database Layer for Kahera POS
//!
//! This crate provides database access for the Kahera POS system.
//! It uses SQLite for local storage with sqlx for async operations, and
//! implements the checkout store traits from `kahera-checkout`.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Kahera POS Data Flow                             │
//! │                                                                         │
//! │  SaleCheckoutTransaction (kahera-checkout)                             │
//! │       │  Arc<dyn ProductStore / SaleStore / DraftStore>                │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     kahera-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │               │    │  (embedded)  │  │   │
//! │  │   │               │    │ ProductRepo   │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ SaleRepo      │    │ 001_initial_ │  │   │
//! │  │   │ Connection    │    │ DraftRepo     │    │   schema.sql │  │   │
//! │  │   │ Management    │    │ SettingsRepo  │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database (WAL)                       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations (product, sale, draft, settings)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use kahera_checkout::{CheckoutConfig, CheckoutRequest};
//! use kahera_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("path/to/kahera.db")).await?;
//!
//! // Receiving
//! let mapping = db.settings().load_cost_code_mapping().await?;
//! db.products().receive(&product_id, cost, 24, &mapping).await?;
//!
//! // Checkout
//! let checkout = db.checkout(CheckoutConfig::load_or_default(None));
//! let outcome = checkout.checkout(CheckoutRequest::new(cart, "cashier-1")).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use migrations::MigrationStatus;
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::draft::DraftRepository;
pub use repository::product::ProductRepository;
pub use repository::sale::SaleRepository;
pub use repository::settings::{SettingsRepository, COST_CODE_MAPPING_KEY};
