//! # Sale Checkout Transaction
//!
//! Turns a paid cart into a committed sale, or aborts leaving stock as it
//! was.
//!
//! ## State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Validating ──► ReservingStock ──► Persisting ──► ConvertingDraft      │
//! │      │               │                 │                 │              │
//! │      │               │ insufficient /  │ store error     │ failure is   │
//! │      │               │ store error     │ (after retries) │ a warning    │
//! │      ▼               ▼                 ▼                 ▼              │
//! │   Aborted    Aborted + compensate  Aborted + compensate  Committed     │
//! │                                                                         │
//! │  compensate = increment_stock for every product already decremented    │
//! │                                                                         │
//! │  ─────────── caller's future ───────────┬───── spawned task ─────────── │
//! │  Validating runs inline; everything after it runs on a tokio task, so  │
//! │  dropping the caller's future never strands a half-finished checkout.  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Ordering
//! Products are reserved in ascending product id order. For a single
//! product the conditional decrement is the serialization point: N
//! concurrent checkouts net out to some serial order of their decrements.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use kahera_core::cart;
use kahera_core::validation::validate_cashier_id;
use kahera_core::{Cart, SaleLine, SaleRecord, SaleStatus, ValidationError};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::CheckoutConfig;
use crate::error::{CheckoutError, CheckoutResult, StoreError};
use crate::sale_number;
use crate::store::{DraftConversion, DraftStore, ProductStore, SaleStore, StockDecrement};

// =============================================================================
// Request / Outcome
// =============================================================================

/// Input to a checkout.
#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    /// Cart snapshot. Later edits to the live cart do not affect the checkout.
    pub cart: Cart,
    pub cashier_id: String,
    /// Draft the cart was loaded from, if any.
    pub draft_id: Option<String>,
}

impl CheckoutRequest {
    pub fn new(cart: Cart, cashier_id: impl Into<String>) -> Self {
        CheckoutRequest {
            cart,
            cashier_id: cashier_id.into(),
            draft_id: None,
        }
    }

    pub fn from_draft(mut self, draft_id: impl Into<String>) -> Self {
        self.draft_id = Some(draft_id.into());
        self
    }
}

/// States of a single checkout attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutState {
    Validating,
    ReservingStock,
    Persisting,
    ConvertingDraft,
    Committed,
    Aborted,
}

impl fmt::Display for CheckoutState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckoutState::Validating => write!(f, "validating"),
            CheckoutState::ReservingStock => write!(f, "reserving_stock"),
            CheckoutState::Persisting => write!(f, "persisting"),
            CheckoutState::ConvertingDraft => write!(f, "converting_draft"),
            CheckoutState::Committed => write!(f, "committed"),
            CheckoutState::Aborted => write!(f, "aborted"),
        }
    }
}

/// Non-fatal findings attached to a committed sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CheckoutWarning {
    /// The sale committed but its source draft was not marked converted.
    DraftNotConverted { draft_id: String, reason: String },
    /// The sale took the last units.
    OutOfStock { product_id: String, name: String },
    /// Stock fell to the low-stock threshold or below.
    LowStock {
        product_id: String,
        name: String,
        remaining: i64,
    },
}

impl fmt::Display for CheckoutWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckoutWarning::DraftNotConverted { draft_id, reason } => {
                write!(f, "draft {} could not be marked converted: {}", draft_id, reason)
            }
            CheckoutWarning::OutOfStock { name, .. } => write!(f, "{} is now out of stock", name),
            CheckoutWarning::LowStock { name, remaining, .. } => {
                write!(f, "{} is low on stock ({} left)", name, remaining)
            }
        }
    }
}

/// A committed checkout.
#[derive(Debug, Clone)]
pub struct CheckoutOutcome {
    pub sale: SaleRecord,
    pub warnings: Vec<CheckoutWarning>,
}

/// One product's share of the cart.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Reservation {
    product_id: String,
    name: String,
    quantity: i64,
}

// =============================================================================
// Transaction
// =============================================================================

/// Commits carts against the configured stores.
///
/// Cheap to clone; every clone shares the same stores.
#[derive(Clone)]
pub struct SaleCheckoutTransaction {
    products: Arc<dyn ProductStore>,
    sales: Arc<dyn SaleStore>,
    drafts: Arc<dyn DraftStore>,
    config: Arc<CheckoutConfig>,
}

impl SaleCheckoutTransaction {
    pub fn new(
        products: Arc<dyn ProductStore>,
        sales: Arc<dyn SaleStore>,
        drafts: Arc<dyn DraftStore>,
        config: CheckoutConfig,
    ) -> Self {
        SaleCheckoutTransaction {
            products,
            sales,
            drafts,
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &CheckoutConfig {
        &self.config
    }

    /// Runs a checkout to a definite outcome.
    ///
    /// Validation errors return before any store is touched. Once
    /// validation passes the remaining steps run on a spawned task and
    /// complete even if this future is dropped; a caller that timed out
    /// should look the sale up rather than retry blindly.
    pub async fn checkout(&self, request: CheckoutRequest) -> CheckoutResult<CheckoutOutcome> {
        debug!(state = %CheckoutState::Validating, cashier_id = %request.cashier_id, lines = request.cart.items.len(), "Checkout state");

        let reservations = match validate(&request) {
            Ok(reservations) => reservations,
            Err(err) => {
                warn!(state = %CheckoutState::Aborted, reason = %err, "Checkout rejected");
                return Err(err);
            }
        };

        let worker = self.clone();
        let handle = tokio::spawn(async move { worker.run(request, reservations).await });
        handle.await?
    }

    /// Voids a completed sale. Stock is not returned.
    pub async fn void_sale(&self, sale_id: &str) -> CheckoutResult<SaleRecord> {
        let sale = self.sales.void_sale(sale_id).await?;
        info!(sale_id = %sale.id, sale_number = %sale.sale_number, "Sale voided");
        Ok(sale)
    }

    async fn run(
        self,
        request: CheckoutRequest,
        reservations: Vec<Reservation>,
    ) -> CheckoutResult<CheckoutOutcome> {
        let mut warnings = Vec::new();

        // ReservingStock
        debug!(state = %CheckoutState::ReservingStock, products = reservations.len(), "Checkout state");
        let mut reserved: Vec<&Reservation> = Vec::with_capacity(reservations.len());
        for reservation in &reservations {
            let result = self
                .products
                .conditional_decrement_stock(&reservation.product_id, reservation.quantity)
                .await;

            match result {
                Ok(StockDecrement::Decremented { remaining }) => {
                    debug!(product_id = %reservation.product_id, quantity = reservation.quantity, remaining, "Stock reserved");
                    reserved.push(reservation);
                    if let Some(warning) = self.stock_warning(reservation, remaining) {
                        warnings.push(warning);
                    }
                }
                Ok(StockDecrement::Insufficient { available }) => {
                    self.compensate(&reserved).await;
                    return Err(abort(CheckoutError::InsufficientStock {
                        product_id: reservation.product_id.clone(),
                        name: reservation.name.clone(),
                        requested: reservation.quantity,
                        available,
                    }));
                }
                Err(err) => {
                    self.compensate(&reserved).await;
                    return Err(abort(err.into()));
                }
            }
        }

        // Persisting
        debug!(state = %CheckoutState::Persisting, "Checkout state");
        let sale = match self.persist(&request).await {
            Ok(sale) => sale,
            Err(err) => {
                self.compensate(&reserved).await;
                return Err(abort(err.into()));
            }
        };

        // ConvertingDraft
        if let Some(draft_id) = &request.draft_id {
            debug!(state = %CheckoutState::ConvertingDraft, draft_id = %draft_id, "Checkout state");
            if let Some(warning) = self.convert_draft(draft_id, &sale.id).await {
                warnings.push(warning);
            }
        }

        info!(
            state = %CheckoutState::Committed,
            sale_id = %sale.id,
            sale_number = %sale.sale_number,
            grand_total = %sale.grand_total,
            warnings = warnings.len(),
            "Sale committed"
        );

        Ok(CheckoutOutcome { sale, warnings })
    }

    fn stock_warning(&self, reservation: &Reservation, remaining: i64) -> Option<CheckoutWarning> {
        if remaining <= 0 {
            Some(CheckoutWarning::OutOfStock {
                product_id: reservation.product_id.clone(),
                name: reservation.name.clone(),
            })
        } else if remaining <= self.config.checkout.low_stock_threshold {
            Some(CheckoutWarning::LowStock {
                product_id: reservation.product_id.clone(),
                name: reservation.name.clone(),
                remaining,
            })
        } else {
            None
        }
    }

    /// Writes the sale, retrying transient failures and sale-number clashes.
    async fn persist(&self, request: &CheckoutRequest) -> Result<SaleRecord, StoreError> {
        let mut sale = build_sale_record(request, sale_number::generate(self.config.device_id()));
        let attempts = self.config.checkout.persist_attempts.max(1);

        let mut attempt = 1;
        loop {
            match self.sales.create_sale(&sale).await {
                Ok(saved) => return Ok(saved),
                Err(StoreError::Transient(reason)) if attempt < attempts => {
                    warn!(attempt, attempts, reason = %reason, "Sale write failed, retrying");
                    tokio::time::sleep(self.config.persist_backoff()).await;
                }
                Err(StoreError::Conflict(reason)) if attempt < attempts => {
                    sale.sale_number = sale_number::generate(self.config.device_id());
                    warn!(attempt, reason = %reason, sale_number = %sale.sale_number, "Sale number taken, regenerated");
                }
                Err(err) => return Err(err),
            }
            attempt += 1;
        }
    }

    /// Returns every reserved quantity, newest first.
    ///
    /// A product whose stock cannot be returned after all attempts is
    /// logged for manual reconciliation; the abort reason is unchanged.
    async fn compensate(&self, reserved: &[&Reservation]) {
        let attempts = self.config.checkout.compensation_attempts.max(1);

        for reservation in reserved.iter().rev() {
            let mut attempt = 1;
            loop {
                match self
                    .products
                    .increment_stock(&reservation.product_id, reservation.quantity)
                    .await
                {
                    Ok(()) => {
                        debug!(product_id = %reservation.product_id, quantity = reservation.quantity, "Reservation returned");
                        break;
                    }
                    Err(err) if attempt < attempts => {
                        warn!(product_id = %reservation.product_id, attempt, error = %err, "Returning stock failed, retrying");
                        tokio::time::sleep(self.config.persist_backoff()).await;
                        attempt += 1;
                    }
                    Err(err) => {
                        error!(
                            product_id = %reservation.product_id,
                            quantity = reservation.quantity,
                            error = %err,
                            "Returning stock failed; manual reconciliation required"
                        );
                        break;
                    }
                }
            }
        }
    }

    async fn convert_draft(&self, draft_id: &str, sale_id: &str) -> Option<CheckoutWarning> {
        let reason = match self.drafts.mark_converted(draft_id, sale_id).await {
            Ok(DraftConversion::Converted) => return None,
            Ok(DraftConversion::NotFound) => "draft not found".to_string(),
            Ok(DraftConversion::AlreadyConverted) => "draft was already converted".to_string(),
            Err(err) => err.to_string(),
        };

        warn!(draft_id = %draft_id, sale_id = %sale_id, reason = %reason, "Draft not marked converted");
        Some(CheckoutWarning::DraftNotConverted {
            draft_id: draft_id.to_string(),
            reason,
        })
    }
}

fn abort(err: CheckoutError) -> CheckoutError {
    warn!(state = %CheckoutState::Aborted, reason = %err, retryable = err.is_retryable(), "Checkout aborted");
    err
}

// =============================================================================
// Validation
// =============================================================================

/// Checks the request and sums quantities per product in id order.
fn validate(request: &CheckoutRequest) -> CheckoutResult<Vec<Reservation>> {
    let cart = &request.cart;

    if cart.is_empty() {
        return Err(CheckoutError::EmptyCart);
    }

    validate_cashier_id(&request.cashier_id)?;

    let mut by_product: BTreeMap<&str, Reservation> = BTreeMap::new();
    for item in &cart.items {
        if item.quantity <= 0 {
            return Err(ValidationError::MustBePositive {
                field: format!("quantity of {}", item.sku),
            }
            .into());
        }

        by_product
            .entry(item.product_id.as_str())
            .and_modify(|r| r.quantity += item.quantity)
            .or_insert_with(|| Reservation {
                product_id: item.product_id.clone(),
                name: item.name.clone(),
                quantity: item.quantity,
            });
    }

    let amount_due = cart.grand_total();
    if cart.amount_received < amount_due {
        return Err(CheckoutError::InsufficientPayment {
            amount_due,
            amount_received: cart.amount_received,
        });
    }

    Ok(by_product.into_values().collect())
}

/// Freezes the cart into an immutable sale record.
fn build_sale_record(request: &CheckoutRequest, sale_number: String) -> SaleRecord {
    let cart = &request.cart;
    let lines = cart
        .items
        .iter()
        .map(|item| SaleLine {
            product_id: item.product_id.clone(),
            sku: item.sku.clone(),
            name: item.name.clone(),
            unit: item.unit.clone(),
            quantity: item.quantity,
            unit_price: item.unit_price,
            unit_cost: item.unit_cost,
            gross_amount: item.gross_amount(),
            discount_amount: cart::discount_amount(item, cart.discount_type),
            net_amount: cart::net_amount(item, cart.discount_type),
        })
        .collect();

    SaleRecord {
        id: Uuid::new_v4().to_string(),
        sale_number,
        lines,
        discount_type: cart.discount_type,
        subtotal: cart.subtotal(),
        total_discount: cart.total_discount(),
        grand_total: cart.grand_total(),
        amount_received: cart.amount_received,
        change_given: cart.change(),
        payment_method: cart.payment_method,
        cashier_id: request.cashier_id.clone(),
        draft_id: request.draft_id.clone(),
        status: SaleStatus::Completed,
        created_at: Utc::now(),
        voided_at: None,
    }
}
