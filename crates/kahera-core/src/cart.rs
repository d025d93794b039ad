//! # Cart Module
//!
//! The in-progress transaction at the register, and the ledger math over it.
//!
//! ## Reducer Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart State Operations                                │
//! │                                                                         │
//! │  Register Action            CartAction               Cart Change        │
//! │  ───────────────            ──────────               ───────────        │
//! │                                                                         │
//! │  Pick Product ────────────► AddProduct ────────────► items.push(line)  │
//! │  Change Quantity ─────────► SetQuantity ───────────► items[i].qty = n  │
//! │  Toggle ₱ / % ────────────► SetDiscountType ───────► all discounts = 0 │
//! │  Line Discount ───────────► SetItemDiscount ───────► items[i].discount │
//! │  Tender ──────────────────► SetAmountReceived ─────► amount_received   │
//! │  New Sale ────────────────► Reset ─────────────────► Cart::default()   │
//! │                                                                         │
//! │  Cart::apply(&cart, action) returns a NEW cart; the old one is intact. │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Ledger
//! The free functions ([`subtotal`], [`total_discount`], [`grand_total`],
//! [`change`], [`can_checkout`]) are pure sums over a snapshot, so the
//! result never depends on line order.
//!
//! ```rust
//! use kahera_core::cart::{self, CartItem};
//! use kahera_core::{DiscountType, Money};
//!
//! let item = CartItem {
//!     product_id: "p-1".into(),
//!     sku: "SOAP-ABCDEFGH".into(),
//!     name: "Soap".into(),
//!     unit: "pc".into(),
//!     quantity: 2,
//!     unit_price: Money::from_centavos(10000),
//!     unit_cost: Money::from_centavos(7000),
//!     discount_value: 1000,
//! };
//! let items = [item];
//! assert_eq!(cart::subtotal(&items).centavos(), 20000);
//! assert_eq!(cart::grand_total(&items, DiscountType::Amount).centavos(), 19000);
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::{Money, BPS_PER_WHOLE};
use crate::types::{DiscountType, PaymentMethod, Product};
use crate::validation::{validate_non_negative, validate_quantity};
use crate::{MAX_CART_ITEMS, MAX_ITEM_QUANTITY};

// =============================================================================
// Cart Item
// =============================================================================

/// A line in the cart.
///
/// ## Design Notes
/// sku, name, unit, price and cost are frozen when the product is added,
/// so the cart stays consistent if the catalog changes mid-sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub product_id: String,
    pub sku: String,
    pub name: String,
    pub unit: String,
    pub quantity: i64,
    pub unit_price: Money,
    pub unit_cost: Money,
    /// Centavos off in `Amount` mode, basis points off in `Percent` mode.
    pub discount_value: i64,
}

impl CartItem {
    /// Freezes a product into a new line.
    pub fn from_product(product: &Product, quantity: i64) -> Self {
        CartItem {
            product_id: product.id.clone(),
            sku: product.sku.clone(),
            name: product.name.clone(),
            unit: product.unit.clone(),
            quantity,
            unit_price: product.price,
            unit_cost: product.cost.unwrap_or_default(),
            discount_value: 0,
        }
    }

    /// unit_price × quantity
    #[inline]
    pub fn gross_amount(&self) -> Money {
        self.unit_price.multiply_quantity(self.quantity)
    }
}

// =============================================================================
// Ledger
// =============================================================================

/// Discount on one line under the cart's discount type.
///
/// - `Amount`: `discount_value` centavos, clamped to `[0, gross]`
/// - `Percent`: `discount_value` basis points clamped to `[0, 10000]`,
///   applied to gross and rounded half-up
pub fn discount_amount(item: &CartItem, discount_type: DiscountType) -> Money {
    let gross = item.gross_amount();
    match discount_type {
        DiscountType::Amount => {
            Money::from_centavos(item.discount_value).clamp_between(Money::zero(), gross)
        }
        DiscountType::Percent => {
            let bps = item.discount_value.clamp(0, BPS_PER_WHOLE);
            gross.basis_points(bps)
        }
    }
}

/// gross − discount for one line.
pub fn net_amount(item: &CartItem, discount_type: DiscountType) -> Money {
    item.gross_amount() - discount_amount(item, discount_type)
}

/// Σ gross
pub fn subtotal(items: &[CartItem]) -> Money {
    items.iter().map(CartItem::gross_amount).sum()
}

/// Σ line discount
pub fn total_discount(items: &[CartItem], discount_type: DiscountType) -> Money {
    items
        .iter()
        .map(|item| discount_amount(item, discount_type))
        .sum()
}

/// max(0, subtotal − total discount)
pub fn grand_total(items: &[CartItem], discount_type: DiscountType) -> Money {
    (subtotal(items) - total_discount(items, discount_type)).non_negative()
}

/// max(0, received − due)
pub fn change(amount_received: Money, grand_total: Money) -> Money {
    (amount_received - grand_total).non_negative()
}

/// Non-empty, fully paid, and every quantity positive.
pub fn can_checkout(cart: &Cart) -> bool {
    !cart.items.is_empty()
        && cart.items.iter().all(|i| i.quantity > 0)
        && cart.amount_received >= cart.grand_total()
}

// =============================================================================
// Cart
// =============================================================================

/// The shopping cart.
///
/// ## Invariants
/// - Items are unique by `product_id` (adding same product increases quantity)
/// - Changing `discount_type` zeroes every line's `discount_value`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    pub items: Vec<CartItem>,
    pub discount_type: DiscountType,
    pub payment_method: PaymentMethod,
    pub amount_received: Money,
}

/// Everything the register can do to a cart.
#[derive(Debug, Clone)]
pub enum CartAction {
    AddProduct { product: Product, quantity: i64 },
    /// Quantity 0 removes the line.
    SetQuantity { product_id: String, quantity: i64 },
    Remove { product_id: String },
    SetDiscountType(DiscountType),
    SetItemDiscount { product_id: String, value: i64 },
    SetPaymentMethod(PaymentMethod),
    SetAmountReceived(Money),
    Reset,
}

impl Cart {
    /// Creates a new empty cart.
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies `action` and returns the resulting cart.
    ///
    /// On error the original cart is untouched.
    pub fn apply(&self, action: CartAction) -> CoreResult<Cart> {
        let mut next = self.clone();
        match action {
            CartAction::AddProduct { product, quantity } => next.add_product(&product, quantity)?,
            CartAction::SetQuantity {
                product_id,
                quantity,
            } => next.set_quantity(&product_id, quantity)?,
            CartAction::Remove { product_id } => next.remove(&product_id)?,
            CartAction::SetDiscountType(discount_type) => next.set_discount_type(discount_type),
            CartAction::SetItemDiscount { product_id, value } => {
                next.set_item_discount(&product_id, value)?
            }
            CartAction::SetPaymentMethod(method) => next.payment_method = method,
            CartAction::SetAmountReceived(amount) => {
                validate_non_negative("amount received", amount.centavos())?;
                next.amount_received = amount;
            }
            CartAction::Reset => next = Cart::default(),
        }
        Ok(next)
    }

    fn add_product(&mut self, product: &Product, quantity: i64) -> CoreResult<()> {
        validate_quantity(quantity)?;
        if !product.is_active {
            return Err(ValidationError::InvalidFormat {
                field: "product".to_string(),
                reason: format!("{} is no longer sold", product.sku),
            }
            .into());
        }

        if let Some(item) = self.items.iter_mut().find(|i| i.product_id == product.id) {
            let new_qty = item.quantity + quantity;
            if new_qty > MAX_ITEM_QUANTITY {
                return Err(CoreError::QuantityTooLarge {
                    requested: new_qty,
                    max: MAX_ITEM_QUANTITY,
                });
            }
            item.quantity = new_qty;
            return Ok(());
        }

        if self.items.len() >= MAX_CART_ITEMS {
            return Err(CoreError::CartTooLarge {
                max: MAX_CART_ITEMS,
            });
        }

        self.items.push(CartItem::from_product(product, quantity));
        Ok(())
    }

    fn set_quantity(&mut self, product_id: &str, quantity: i64) -> CoreResult<()> {
        if quantity == 0 {
            return self.remove(product_id);
        }
        validate_quantity(quantity)?;

        let item = self.item_mut(product_id)?;
        item.quantity = quantity;
        Ok(())
    }

    fn remove(&mut self, product_id: &str) -> CoreResult<()> {
        let initial_len = self.items.len();
        self.items.retain(|i| i.product_id != product_id);

        if self.items.len() == initial_len {
            Err(CoreError::NotInCart(product_id.to_string()))
        } else {
            Ok(())
        }
    }

    fn set_discount_type(&mut self, discount_type: DiscountType) {
        if self.discount_type == discount_type {
            return;
        }
        self.discount_type = discount_type;
        for item in &mut self.items {
            item.discount_value = 0;
        }
    }

    fn set_item_discount(&mut self, product_id: &str, value: i64) -> CoreResult<()> {
        validate_non_negative("discount", value)?;
        let item = self.item_mut(product_id)?;
        item.discount_value = value;
        Ok(())
    }

    fn item_mut(&mut self, product_id: &str) -> CoreResult<&mut CartItem> {
        self.items
            .iter_mut()
            .find(|i| i.product_id == product_id)
            .ok_or_else(|| CoreError::NotInCart(product_id.to_string()))
    }

    /// Looks up a line by product.
    pub fn item(&self, product_id: &str) -> Option<&CartItem> {
        self.items.iter().find(|i| i.product_id == product_id)
    }

    /// Checks if the cart is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns the total quantity of all items.
    pub fn total_quantity(&self) -> i64 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    pub fn subtotal(&self) -> Money {
        subtotal(&self.items)
    }

    pub fn total_discount(&self) -> Money {
        total_discount(&self.items, self.discount_type)
    }

    pub fn grand_total(&self) -> Money {
        grand_total(&self.items, self.discount_type)
    }

    pub fn change(&self) -> Money {
        change(self.amount_received, self.grand_total())
    }

    pub fn can_checkout(&self) -> bool {
        can_checkout(self)
    }
}

/// Cart totals summary for the register display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CartTotals {
    pub item_count: usize,
    pub total_quantity: i64,
    pub subtotal: Money,
    pub total_discount: Money,
    pub grand_total: Money,
    pub amount_received: Money,
    pub change: Money,
    pub can_checkout: bool,
}

impl From<&Cart> for CartTotals {
    fn from(cart: &Cart) -> Self {
        CartTotals {
            item_count: cart.items.len(),
            total_quantity: cart.total_quantity(),
            subtotal: cart.subtotal(),
            total_discount: cart.total_discount(),
            grand_total: cart.grand_total(),
            amount_received: cart.amount_received,
            change: cart.change(),
            can_checkout: cart.can_checkout(),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
