//! # Seed Data Generator
//!
//! Populates the database with the two-member sample shop for development.
//!
//! ## Usage
//! ```bash
//! # Seed ./orderdesk_dev.db
//! cargo run -p orderdesk-db --bin seed
//!
//! # Specify database path
//! cargo run -p orderdesk-db --bin seed -- --db ./data/orderdesk.db
//!
//! # More log output
//! RUST_LOG=orderdesk_db=debug cargo run -p orderdesk-db --bin seed
//! ```
//!
//! ## Generated Data
//! - `userA` (Seoul) orders JPA1 BOOK ×1 and JPA2 BOOK ×2
//! - `userB` (Busan) orders SPRING1 BOOK ×3 and SPRING2 BOOK ×4
//!
//! After seeding, the projected order rows are printed as JSON.

use std::env;
use tracing_subscriber::EnvFilter;

use orderdesk_core::{Address, Item, OrderLine, OrderSearch};
use orderdesk_db::{Database, DbConfig};

/// (member, address, [(book, price_cents, stock, quantity)])
type SampleOrder = (
    &'static str,
    (&'static str, &'static str, &'static str),
    [(&'static str, i64, i64, i64); 2],
);

const SAMPLE_ORDERS: [SampleOrder; 2] = [
    (
        "userA",
        ("Seoul", "1", "1111"),
        [("JPA1 BOOK", 10_000, 100, 1), ("JPA2 BOOK", 20_000, 100, 2)],
    ),
    (
        "userB",
        ("Busan", "2", "2222"),
        [("SPRING1 BOOK", 20_000, 200, 3), ("SPRING2 BOOK", 40_000, 300, 4)],
    ),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

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
                println!("orderdesk Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./orderdesk_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            other => {
                eprintln!("Ignoring unknown argument: {}", other);
            }
        }
        i += 1;
    }

    println!("orderdesk Seed Data Generator");
    println!("=============================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.members().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} members", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
    } else {
        seed(&db).await?;
    }

    println!();
    println!("Orders:");
    let rows = db.order_queries().search_projected(&OrderSearch::new()).await?;
    println!("{}", serde_json::to_string_pretty(&rows)?);

    db.close().await;
    Ok(())
}

async fn seed(db: &Database) -> Result<(), Box<dyn std::error::Error>> {
    for (name, (city, street, zipcode), books) in SAMPLE_ORDERS {
        let member = db
            .members()
            .register(name, Address::new(city, street, zipcode))
            .await?;

        let mut lines = Vec::with_capacity(books.len());
        for (title, price_cents, stock, quantity) in books {
            let item = db.items().insert(&Item::new(title, price_cents, stock)).await?;
            lines.push(OrderLine::new(item.id, quantity));
        }

        let order = db.orders().place_order(&member.id, &lines).await?;
        println!("✓ {} placed order {}", member.name, order.id);
    }

    Ok(())
}
