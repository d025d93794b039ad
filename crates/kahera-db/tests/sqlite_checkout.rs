//! Checkout against the SQLite repositories.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use kahera_checkout::{CheckoutConfig, CheckoutError, CheckoutRequest, CheckoutWarning, StoreError};
use kahera_core::{Cart, CartAction, DraftRecord, Money, Product, SaleStatus};
use kahera_db::{Database, DbConfig};
use tokio::task::JoinSet;

fn product(id: &str, price_centavos: i64, stock: i64) -> Product {
    Product {
        id: id.to_string(),
        sku: format!("SKU-{}", id.to_uppercase()),
        name: format!("Product {}", id),
        unit: "pc".to_string(),
        price: Money::from_centavos(price_centavos),
        cost: Some(Money::from_centavos(price_centavos / 2)),
        cost_code: None,
        current_stock: stock,
        is_active: true,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

fn cart_of(lines: &[(&Product, i64)], received_centavos: i64) -> Cart {
    let mut cart = Cart::new();
    for (product, quantity) in lines {
        cart = cart
            .apply(CartAction::AddProduct {
                product: (*product).clone(),
                quantity: *quantity,
            })
            .unwrap();
    }
    cart.apply(CartAction::SetAmountReceived(Money::from_centavos(
        received_centavos,
    )))
    .unwrap()
}

fn config() -> CheckoutConfig {
    let mut config = CheckoutConfig::default();
    config.device.id = "register-02".to_string();
    config.checkout.persist_backoff_ms = 5;
    config.checkout.persist_attempts = 5;
    config
}

async fn database(products: &[&Product]) -> Database {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    for p in products {
        db.products().insert(p).await.unwrap();
    }
    db
}

/// File-backed database so several pooled connections really contend.
struct TempDb {
    path: PathBuf,
    db: Database,
}

impl TempDb {
    async fn new() -> Self {
        let path = std::env::temp_dir().join(format!("kahera-{}.db", uuid::Uuid::new_v4()));
        let db = Database::new(DbConfig::new(&path).max_connections(5))
            .await
            .unwrap();
        TempDb { path, db }
    }
}

impl Drop for TempDb {
    fn drop(&mut self) {
        for suffix in ["", "-wal", "-shm"] {
            let mut name = self.path.clone().into_os_string();
            name.push(suffix);
            let _ = std::fs::remove_file(name);
        }
    }
}

#[tokio::test]
async fn test_checkout_persists_sale_and_deducts_stock() {
    let a = product("a", 5_500, 10);
    let b = product("b", 2_750, 10);
    let db = database(&[&a, &b]).await;
    let checkout = db.checkout(config());

    let outcome = checkout
        .checkout(CheckoutRequest::new(cart_of(&[(&a, 2), (&b, 1)], 20_000), "cashier-1"))
        .await
        .unwrap();

    assert_eq!(outcome.sale.grand_total, Money::from_centavos(13_750));
    assert_eq!(outcome.sale.change_given, Money::from_centavos(6_250));
    assert!(outcome.sale.sale_number.contains("-02-"));

    let stored = db.sales().get_by_id(&outcome.sale.id).await.unwrap().unwrap();
    assert_eq!(stored.sale_number, outcome.sale.sale_number);
    assert_eq!(stored.lines, outcome.sale.lines);
    assert_eq!(stored.cashier_id, "cashier-1");

    assert_eq!(db.products().stock("a").await.unwrap(), Some(8));
    assert_eq!(db.products().stock("b").await.unwrap(), Some(9));
}

#[tokio::test]
async fn test_short_payment_touches_nothing() {
    let a = product("a", 5_500, 10);
    let db = database(&[&a]).await;

    let err = db
        .checkout(config())
        .checkout(CheckoutRequest::new(cart_of(&[(&a, 1)], 5_000), "cashier-1"))
        .await
        .unwrap_err();

    assert!(matches!(err, CheckoutError::InsufficientPayment { .. }));
    assert_eq!(db.products().stock("a").await.unwrap(), Some(10));
    assert_eq!(db.sales().count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_insufficient_stock_rolls_back_reservations() {
    let a = product("a", 1_000, 5);
    let b = product("b", 1_000, 1);
    let db = database(&[&a, &b]).await;

    let err = db
        .checkout(config())
        .checkout(CheckoutRequest::new(cart_of(&[(&a, 3), (&b, 2)], 10_000), "cashier-1"))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        CheckoutError::InsufficientStock { ref product_id, available: 1, .. } if product_id == "b"
    ));
    assert_eq!(db.products().stock("a").await.unwrap(), Some(5));
    assert_eq!(db.products().stock("b").await.unwrap(), Some(1));
    assert_eq!(db.sales().count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_draft_checkout_and_void() {
    let a = product("a", 1_000, 10);
    let db = database(&[&a]).await;
    let cart = cart_of(&[(&a, 1)], 1_000);

    db.drafts()
        .save(&DraftRecord {
            id: "d-1".to_string(),
            label: None,
            cashier_id: "cashier-1".to_string(),
            cart: cart.clone(),
            is_converted: false,
            converted_to_sale_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        })
        .await
        .unwrap();

    let checkout = db.checkout(config());
    let outcome = checkout
        .checkout(CheckoutRequest::new(cart.clone(), "cashier-1").from_draft("d-1"))
        .await
        .unwrap();
    assert!(outcome.warnings.is_empty());

    let draft = db.drafts().get("d-1").await.unwrap().unwrap();
    assert!(draft.is_converted);
    assert_eq!(draft.converted_to_sale_id.as_deref(), Some(outcome.sale.id.as_str()));

    // reusing the draft still sells, with a warning
    let again = checkout
        .checkout(CheckoutRequest::new(cart, "cashier-1").from_draft("d-1"))
        .await
        .unwrap();
    assert!(matches!(
        again.warnings.as_slice(),
        [CheckoutWarning::DraftNotConverted { .. }]
    ));

    let voided = checkout.void_sale(&outcome.sale.id).await.unwrap();
    assert_eq!(voided.status, SaleStatus::Voided);
    let err = checkout.void_sale(&outcome.sale.id).await.unwrap_err();
    assert!(matches!(err, CheckoutError::Store(StoreError::InvalidTransition(_))));

    // voiding does not restock
    assert_eq!(db.products().stock("a").await.unwrap(), Some(8));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_registers_racing_on_file_database_never_oversell() {
    let temp = TempDb::new().await;
    let a = product("a", 1_000, 7);
    temp.db.products().insert(&a).await.unwrap();

    let checkout = Arc::new(temp.db.checkout(config()));
    let mut set = JoinSet::new();
    for i in 0..20 {
        let checkout = checkout.clone();
        let cart = cart_of(&[(&a, 1)], 1_000);
        set.spawn(async move {
            checkout
                .checkout(CheckoutRequest::new(cart, format!("cashier-{}", i)))
                .await
        });
    }

    let mut committed = 0;
    let mut out_of_stock = 0;
    while let Some(joined) = set.join_next().await {
        match joined.unwrap() {
            Ok(_) => committed += 1,
            Err(CheckoutError::InsufficientStock { .. }) => out_of_stock += 1,
            Err(other) => panic!("unexpected checkout error: {:?}", other),
        }
    }

    assert_eq!(committed, 7);
    assert_eq!(out_of_stock, 13);
    assert_eq!(temp.db.products().stock("a").await.unwrap(), Some(0));
    assert_eq!(temp.db.sales().count().await.unwrap(), 7);

    temp.db.close().await;
}
