//! # Seed Data Generator
//!
//! Populates the database with two tenants worth of development data.
//!
//! ## Usage
//! ```bash
//! # Seed ./orderdesk_dev.db
//! cargo run -p orderdesk-db --bin seed
//!
//! # Specify database path
//! cargo run -p orderdesk-db --bin seed -- --db ./data/orderdesk.db
//! ```
//!
//! ## Generated Data
//! For each tenant (`client-a`, `client-b`):
//! - Products `{PREFIX}-{INDEX}` with one or two price batches
//! - A handful of synced customers
//! - Users `admin` (role "Admin"), `lead` (role "Level 3") and `rep`
//!   (role "Sales"), all with password `password`

use std::env;

use orderdesk_core::{Customer, CustomerSource, Money, Product, ProductBatch};
use orderdesk_db::{Database, DbConfig};

const TENANTS: &[(&str, &str)] = &[("client-a", "A"), ("client-b", "B")];

/// (name, brand, unit, base price in cents)
const PRODUCTS: &[(&str, &str, &str, i64)] = &[
    ("Basmati Rice 5kg", "Falak", "bag", 1850),
    ("Cooking Oil 1L", "Dalda", "bottle", 620),
    ("Sugar 1kg", "Local", "kg", 145),
    ("Black Tea 475g", "Tapal", "box", 980),
    ("Detergent 1kg", "Surf", "pack", 540),
    ("Soap Bar", "Lux", "piece", 120),
    ("Toothpaste 150g", "Colgate", "tube", 310),
    ("Flour 10kg", "Sunridge", "bag", 1320),
    ("Lentils 1kg", "Local", "kg", 390),
    ("Mineral Water 1.5L", "Nestle", "bottle", 90),
];

const CUSTOMERS: &[(&str, &str, &str)] = &[
    ("Al-Noor Traders", "0300-1112233", "Shop 4, Main Bazaar"),
    ("City Mart", "0321-4455667", "12 Mall Road"),
    ("Green Grocers", "0333-7788990", "Block C, Market"),
];

const USERS: &[(&str, &str)] = &[("admin", "Admin"), ("lead", "Level 3"), ("rep", "Sales")];

const PASSWORD: &str = "password";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./orderdesk_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("OrderDesk Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./orderdesk_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("OrderDesk Seed Data Generator");
    println!("=============================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    for (client_id, prefix) in TENANTS {
        let existing = db.catalog().count_products(client_id).await?;
        if existing > 0 {
            println!("⚠ {} already has {} products, skipping", client_id, existing);
            continue;
        }

        println!();
        println!("Seeding {}...", client_id);

        for (index, (name, brand, unit, cents)) in PRODUCTS.iter().enumerate() {
            let code = format!("{}-{:03}", prefix, index + 1);

            db.catalog()
                .upsert_product(&Product {
                    code: code.clone(),
                    name: Some(name.to_string()),
                    brand: Some(brand.to_string()),
                    unit: Some(unit.to_string()),
                    company: None,
                    client_id: client_id.to_string(),
                })
                .await?;

            for batch in generate_batches(&code, client_id, *cents, index) {
                db.catalog().insert_batch(&batch).await?;
            }
        }
        println!("  ✓ {} products", PRODUCTS.len());

        for (index, (name, phone, address)) in CUSTOMERS.iter().enumerate() {
            db.customers()
                .upsert_synced(&Customer {
                    code: Some(format!("{}-C{:02}", prefix, index + 1)),
                    name: name.to_string(),
                    phone: Some(phone.to_string()),
                    address: Some(address.to_string()),
                    client_id: client_id.to_string(),
                    source: CustomerSource::Synced,
                })
                .await?;
        }
        println!("  ✓ {} customers", CUSTOMERS.len());

        for (user_id, role) in USERS {
            db.users().upsert(user_id, client_id, PASSWORD, Some(*role)).await?;
        }
        println!("  ✓ {} users (password: {})", USERS.len(), PASSWORD);
    }

    println!();
    println!("✓ Seed complete!");

    db.close().await;
    Ok(())
}

/// One batch per product, plus an older cheaper batch for every third one.
fn generate_batches(code: &str, client_id: &str, cents: i64, seed: usize) -> Vec<ProductBatch> {
    let price = |c: i64| Some(Money::from_minor_units(c, 2));

    let mut current = ProductBatch::new(code, client_id);
    current.cost = price(cents * 80 / 100);
    current.sales_price = price(cents);
    current.bmrp = price(cents * 110 / 100);
    current.second_price = price(cents * 95 / 100);
    // Leave some tiers empty so the fallback order is exercised
    if seed % 2 == 0 {
        current.third_price = price(cents * 90 / 100);
    }

    let mut batches = vec![current];

    if seed % 3 == 0 {
        let mut older = ProductBatch::new(code, client_id);
        older.cost = price(cents * 75 / 100);
        older.sales_price = price(cents * 95 / 100);
        batches.push(older);
    }

    batches
}
