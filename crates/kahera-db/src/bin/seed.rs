//! # Seed Data Generator
//!
//! Populates the database with catalog products for development.
//!
//! ## Usage
//! ```bash
//! # Generate 500 products (default)
//! cargo run -p kahera-db --bin seed
//!
//! # Generate custom amount
//! cargo run -p kahera-db --bin seed -- --count 2000
//!
//! # Specify database path
//! cargo run -p kahera-db --bin seed -- --db ./data/kahera.db
//!
//! # More detail
//! RUST_LOG=kahera_db=debug cargo run -p kahera-db --bin seed
//! ```
//!
//! ## Generated Products
//! Each product has:
//! - SKU: `{CATEGORY}-{8 random symbols}`
//! - Price: ₱10.00 - ₱249.75 (base plus size addon)
//! - Cost at 60-85% of price, with its cost code
//! - Stock: 0 - 120
//!
//! Every tenth product then gets a delivery at a higher cost, which mints
//! a `-1` cost variation through the normal receiving path.

use chrono::Utc;
use rand::Rng;
use std::env;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use kahera_core::{cost_code, sku, CostCodeMapping, Money, Product};
use kahera_db::{Database, DbConfig};

/// Product categories for realistic test data
const CATEGORIES: &[(&str, &[&str])] = &[
    (
        "BEV",
        &[
            "Coke Mismo",
            "Royal Tru-Orange",
            "Sprite",
            "C2 Green Tea",
            "Zesto Orange",
            "Nature Spring Water",
            "Kopiko Brown",
            "Nescafe Classic",
            "Milo",
            "Cobra Energy",
        ],
    ),
    (
        "SNK",
        &[
            "Piattos",
            "Nova",
            "Chippy",
            "Oishi Prawn Crackers",
            "Boy Bawang",
            "SkyFlakes",
            "Fita",
            "Hansel Mocha",
            "Choc Nut",
            "Mik-Mik",
        ],
    ),
    (
        "GRO",
        &[
            "Sinandomeng Rice",
            "Lucky Me Pancit Canton",
            "Payless Noodles",
            "Argentina Corned Beef",
            "555 Sardines",
            "Datu Puti Vinegar",
            "Silver Swan Soy Sauce",
            "Ufc Banana Ketchup",
            "Washed Sugar",
            "Iodized Salt",
        ],
    ),
    (
        "HHD",
        &[
            "Surf Powder",
            "Tide Bar",
            "Joy Dishwashing",
            "Safeguard Soap",
            "Colgate Toothpaste",
            "Palmolive Shampoo",
            "Downy Fabcon",
            "Baygon Spray",
            "Katinko",
            "Candle",
        ],
    ),
];

/// Size variants for products (name, price addon in centavos)
const SIZES: &[(&str, i64, &str)] = &[
    ("Sachet", 0, "pc"),
    ("Small", 1_000, "pc"),
    ("Medium", 2_500, "pc"),
    ("Large", 5_000, "pc"),
    ("Pack", 8_000, "pack"),
    ("Box", 12_000, "box"),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = env::args().collect();

    let mut count: usize = 500;
    let mut db_path = String::from("./kahera_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(500);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Kahera POS Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>    Number of products to generate (default: 500)");
                println!("  -d, --db <PATH>    Database file path (default: ./kahera_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            other => warn!(argument = %other, "Ignoring unknown argument"),
        }
        i += 1;
    }

    info!(database = %db_path, products = count, "Seeding database");

    let db = Database::new(DbConfig::new(&db_path)).await?;

    let existing = db.products().count().await?;
    if existing > 0 {
        warn!(
            existing,
            "Database already has products, skipping seed. Delete the file to regenerate."
        );
        return Ok(());
    }

    let mapping = db.settings().load_cost_code_mapping().await?;
    let products = db.products();
    let mut rng = rand::thread_rng();

    let start = std::time::Instant::now();
    let mut generated = Vec::with_capacity(count);

    'outer: for (category, names) in CATEGORIES {
        for name in names.iter() {
            for (size, price_addon, unit) in SIZES {
                if generated.len() >= count {
                    break 'outer;
                }

                let product =
                    generate_product(&mut rng, &mapping, category, name, size, *price_addon, unit);

                match products.insert(&product).await {
                    Ok(p) => generated.push(p),
                    Err(e) => warn!(sku = %product.sku, error = %e, "Failed to insert product"),
                }

                if generated.len() % 100 == 0 && !generated.is_empty() {
                    info!(generated = generated.len(), "Progress");
                }
            }
        }
    }

    let elapsed = start.elapsed();
    info!(
        generated = generated.len(),
        elapsed_ms = elapsed.as_millis() as u64,
        "Products generated"
    );

    // Price increase on every tenth product exercises variation minting
    let mut variations = 0;
    for product in generated.iter().step_by(10) {
        let Some(cost) = product.cost else { continue };
        let incoming = cost + Money::from_centavos(500);
        match products.receive(&product.id, incoming, 12, &mapping).await {
            Ok((plan, variant)) if plan.is_new_variation() => {
                variations += 1;
                info!(
                    base = %product.sku,
                    variant = %variant.sku,
                    cost_code = ?variant.cost_code,
                    "Variation received"
                );
            }
            Ok(_) => {}
            Err(e) => warn!(sku = %product.sku, error = %e, "Receiving failed"),
        }
    }

    info!(
        products = products.count().await?,
        variations, "Seed complete"
    );

    Ok(())
}

/// Generates a single product with realistic data.
fn generate_product<R: Rng + ?Sized>(
    rng: &mut R,
    mapping: &CostCodeMapping,
    category: &str,
    name: &str,
    size: &str,
    price_addon: i64,
    unit: &str,
) -> Product {
    let now = Utc::now();

    // ₱10.00 - ₱129.75 in 25-centavo steps, plus the size addon
    let price = Money::from_centavos(1_000 + rng.gen_range(0..480) * 25 + price_addon);

    // 60-85% of price, rounded to whole pesos
    let cost_pct = rng.gen_range(60..=85);
    let cost_pesos = Money::from_centavos(price.centavos() * cost_pct / 100).round_to_whole_units();
    let cost = Money::from_centavos(cost_pesos as i64 * 100);

    Product {
        id: uuid::Uuid::new_v4().to_string(),
        sku: sku::generate_with(rng, category),
        name: format!("{} {}", name, size),
        unit: unit.to_string(),
        price,
        cost: Some(cost),
        cost_code: Some(cost_code::encode(mapping, cost)),
        current_stock: rng.gen_range(0..=120),
        is_active: true,
        created_at: now,
        updated_at: now,
    }
}
