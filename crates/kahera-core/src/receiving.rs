//! # Receiving Module
//!
//! Decides what happens to the catalog when stock is received.
//!
//! ## Decision
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  receive(product, incoming_cost, qty)                                  │
//! │       │                                                                 │
//! │       ├── product has no cost yet ──────────► Restock + adopt cost      │
//! │       │                                                                 │
//! │       ├── |incoming − cost| <= tolerance ───► Restock                   │
//! │       │                                                                 │
//! │       └── otherwise ────────────────────────► MintVariation             │
//! │                                               sku  = base-<next n>      │
//! │                                               cost = incoming          │
//! │                                               cost_code = encode(..)   │
//! │                                               stock = qty              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The existing product's cost is never rewritten once set. Each cost lives
//! on its own SKU so margins on already-shelved stock stay correct.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::cost_code::{self, CostCodeMapping};
use crate::error::CoreResult;
use crate::money::Money;
use crate::sku;
use crate::types::Product;
use crate::validation::{validate_price, validate_received_quantity};

/// Cost differences at or below this (₱0.01) are treated as the same cost.
pub const DEFAULT_COST_TOLERANCE: Money = Money::from_centavos(1);

/// A cost set on a product that had none.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostUpdate {
    pub cost: Money,
    pub cost_code: String,
}

/// What to do with a delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReceivingPlan {
    /// Add `quantity` to an existing product.
    Restock {
        product_id: String,
        quantity: i64,
        /// Present when the product had no recorded cost.
        cost_update: Option<CostUpdate>,
    },
    /// Insert `variant` as a new product. Its stock already equals `quantity`.
    MintVariation { variant: Product, quantity: i64 },
}

impl ReceivingPlan {
    /// Quantity being received.
    pub fn quantity(&self) -> i64 {
        match self {
            ReceivingPlan::Restock { quantity, .. } => *quantity,
            ReceivingPlan::MintVariation { quantity, .. } => *quantity,
        }
    }

    pub fn is_new_variation(&self) -> bool {
        matches!(self, ReceivingPlan::MintVariation { .. })
    }
}

/// Plans a delivery using the default cost tolerance.
///
/// `existing_skus` should contain every SKU sharing the product's base;
/// it drives the next variation number.
///
/// ## Example
/// ```rust
/// use chrono::Utc;
/// use kahera_core::{receiving, CostCodeMapping, Money, Product, ReceivingPlan};
///
/// let product = Product {
///     id: "p-1".into(),
///     sku: "RICE-ABCD2345".into(),
///     name: "Rice 1kg".into(),
///     unit: "pack".into(),
///     price: Money::from_centavos(6500),
///     cost: Some(Money::from_centavos(5000)),
///     cost_code: None,
///     current_stock: 4,
///     is_active: true,
///     created_at: Utc::now(),
///     updated_at: Utc::now(),
/// };
///
/// let plan = receiving::plan_receiving(
///     &product,
///     Money::from_centavos(5200),
///     10,
///     &["RICE-ABCD2345"],
///     &CostCodeMapping::default(),
/// )
/// .unwrap();
///
/// match plan {
///     ReceivingPlan::MintVariation { variant, .. } => assert_eq!(variant.sku, "RICE-ABCD2345-1"),
///     other => panic!("unexpected plan {:?}", other),
/// }
/// ```
pub fn plan_receiving<S: AsRef<str>>(
    product: &Product,
    incoming_cost: Money,
    quantity: i64,
    existing_skus: &[S],
    mapping: &CostCodeMapping,
) -> CoreResult<ReceivingPlan> {
    plan_receiving_with_tolerance(
        product,
        incoming_cost,
        quantity,
        existing_skus,
        mapping,
        DEFAULT_COST_TOLERANCE,
    )
}

/// Plans a delivery, treating cost differences up to `tolerance` as equal.
pub fn plan_receiving_with_tolerance<S: AsRef<str>>(
    product: &Product,
    incoming_cost: Money,
    quantity: i64,
    existing_skus: &[S],
    mapping: &CostCodeMapping,
    tolerance: Money,
) -> CoreResult<ReceivingPlan> {
    validate_received_quantity(quantity)?;
    validate_price(incoming_cost)?;

    let current = match product.cost {
        None => {
            return Ok(ReceivingPlan::Restock {
                product_id: product.id.clone(),
                quantity,
                cost_update: Some(CostUpdate {
                    cost: incoming_cost,
                    cost_code: cost_code::encode(mapping, incoming_cost),
                }),
            });
        }
        Some(cost) => cost,
    };

    if (incoming_cost - current).abs() <= tolerance.abs() {
        return Ok(ReceivingPlan::Restock {
            product_id: product.id.clone(),
            quantity,
            cost_update: None,
        });
    }

    let number = sku::next_variation_number(&product.sku, existing_skus);
    let now = Utc::now();
    let variant = Product {
        id: Uuid::new_v4().to_string(),
        sku: sku::generate_variation(&product.sku, number),
        name: product.name.clone(),
        unit: product.unit.clone(),
        price: product.price,
        cost: Some(incoming_cost),
        cost_code: Some(cost_code::encode(mapping, incoming_cost)),
        current_stock: quantity,
        is_active: true,
        created_at: now,
        updated_at: now,
    };

    Ok(ReceivingPlan::MintVariation { variant, quantity })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CoreError, ValidationError};

    fn product(sku: &str, cost: Option<i64>) -> Product {
        Product {
            id: "p-1".to_string(),
            sku: sku.to_string(),
            name: "Sardines 155g".to_string(),
            unit: "can".to_string(),
            price: Money::from_centavos(2800),
            cost: cost.map(Money::from_centavos),
            cost_code: None,
            current_stock: 12,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_same_cost_restocks() {
        let p = product("SAR-ABCDEFGH", Some(2100));
        let plan = plan_receiving(
            &p,
            Money::from_centavos(2100),
            24,
            &["SAR-ABCDEFGH"],
            &CostCodeMapping::default(),
        )
        .unwrap();

        assert_eq!(
            plan,
            ReceivingPlan::Restock {
                product_id: "p-1".to_string(),
                quantity: 24,
                cost_update: None,
            }
        );
    }

    #[test]
    fn test_first_cost_is_adopted() {
        let mapping = CostCodeMapping::default();
        let p = product("SAR-ABCDEFGH", None);
        let plan = plan_receiving(&p, Money::from_centavos(100_000), 6, &["SAR-ABCDEFGH"], &mapping)
            .unwrap();

        match plan {
            ReceivingPlan::Restock {
                cost_update: Some(update),
                ..
            } => {
                assert_eq!(update.cost, Money::from_centavos(100_000));
                assert_eq!(update.cost_code, cost_code::encode_units(&mapping, 1000));
            }
            other => panic!("expected restock with cost update, got {:?}", other),
        }
    }

    #[test]
    fn test_new_cost_mints_next_variation() {
        let mapping = CostCodeMapping::default();
        let p = product("SAR-ABCDEFGH-1", Some(2100));
        let existing = ["SAR-ABCDEFGH", "SAR-ABCDEFGH-1", "SAR-ABCDEFGH-2"];

        let plan = plan_receiving(&p, Money::from_centavos(2350), 48, &existing, &mapping).unwrap();
        assert!(plan.is_new_variation());
        assert_eq!(plan.quantity(), 48);

        let ReceivingPlan::MintVariation { variant, .. } = plan else {
            panic!("expected a variation");
        };
        assert_eq!(variant.sku, "SAR-ABCDEFGH-3");
        assert_ne!(variant.id, p.id);
        assert_eq!(variant.name, p.name);
        assert_eq!(variant.price, p.price);
        assert_eq!(variant.unit, p.unit);
        assert_eq!(variant.cost, Some(Money::from_centavos(2350)));
        assert_eq!(variant.current_stock, 48);

        // 23.50 rounds half-up to 24 pesos
        let code = variant.cost_code.unwrap();
        assert_eq!(cost_code::decode(&mapping, &code).unwrap(), 24);
    }

    #[test]
    fn test_tolerance_absorbs_small_differences() {
        let p = product("SAR-ABCDEFGH", Some(2100));
        let plan = plan_receiving_with_tolerance(
            &p,
            Money::from_centavos(2105),
            1,
            &["SAR-ABCDEFGH"],
            &CostCodeMapping::default(),
            Money::from_centavos(5),
        )
        .unwrap();
        assert!(!plan.is_new_variation());

        let plan = plan_receiving(
            &p,
            Money::from_centavos(2101),
            1,
            &["SAR-ABCDEFGH"],
            &CostCodeMapping::default(),
        )
        .unwrap();
        assert!(!plan.is_new_variation());
    }

    #[test]
    fn test_one_centavo_difference_is_same_cost() {
        let p = product("SAR-ABCDEFGH", Some(2100));
        for incoming in [2099, 2100, 2101] {
            let plan = plan_receiving(
                &p,
                Money::from_centavos(incoming),
                1,
                &["SAR-ABCDEFGH"],
                &CostCodeMapping::default(),
            )
            .unwrap();
            assert!(!plan.is_new_variation(), "incoming {} minted", incoming);
        }
    }

    #[test]
    fn test_two_centavo_difference_mints_variation() {
        let p = product("SAR-ABCDEFGH", Some(2100));
        for incoming in [2098, 2102] {
            let plan = plan_receiving(
                &p,
                Money::from_centavos(incoming),
                1,
                &["SAR-ABCDEFGH"],
                &CostCodeMapping::default(),
            )
            .unwrap();
            assert!(plan.is_new_variation(), "incoming {} restocked", incoming);
        }
    }

    #[test]
    fn test_rejects_non_positive_quantity() {
        let p = product("SAR-ABCDEFGH", Some(2100));
        let err = plan_receiving(
            &p,
            Money::from_centavos(2100),
            0,
            &["SAR-ABCDEFGH"],
            &CostCodeMapping::default(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::MustBePositive { .. })
        ));
    }
}
