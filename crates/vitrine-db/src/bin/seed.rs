//! # Demo Catalog Seeder
//!
//! Populates the database with a small demo shop for development.
//!
//! ## Usage
//! ```bash
//! # Seed ./vitrine.db (or $VITRINE_DATABASE_PATH)
//! cargo run -p vitrine-db --bin seed
//!
//! # Specify database path
//! cargo run -p vitrine-db --bin seed -- --db ./data/vitrine.db
//!
//! # Also place a demo order
//! cargo run -p vitrine-db --bin seed -- --order
//! ```
//!
//! ## Generated Catalog
//! ```text
//! Shoes            (category, +10, supplier "Acme Footwear")
//! ├── Boots        (product,  +45)
//! └── Sneaker      (product,  +35)
//!     ├── 40..44   (variations, +0 / +2, stock per size)
//! Apparel          (category, +0)
//! └── T-Shirt      (product,  +15, supplier "Cotton & Co")
//!     └── S, M, L  (variations)
//! ```
//! Prices are read in the configured default currency (`VITRINE_CURRENCY`).

use std::env;
use tracing_subscriber::EnvFilter;
use vitrine_core::lists::ItemListKind;
use vitrine_core::{CoreConfig, NodeDraft, NodeId};
use vitrine_db::{Database, Settings};

/// Sneaker sizes: (size, price addon, stock)
const SNEAKER_SIZES: &[(&str, &str, i64)] = &[
    ("40", "0", 4),
    ("41", "0", 6),
    ("42", "0", 9),
    ("43", "2", 5),
    ("44", "2", 0),
];

/// T-shirt sizes: (size, stock)
const SHIRT_SIZES: &[(&str, i64)] = &[("S", 12), ("M", 20), ("L", 8)];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,vitrine_db=debug,sqlx=warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    let mut settings = Settings::from_env()?;
    let mut place_order = false;

    // Parse command line arguments
    let args: Vec<String> = env::args().collect();
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    settings.database_path = args[i + 1].clone().into();
                    i += 1;
                }
            }
            "--order" | "-o" => place_order = true,
            "--help" | "-h" => {
                println!("Vitrine Demo Catalog Seeder");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./vitrine.db)");
                println!("  -o, --order        Place a demo order after seeding");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            other => {
                eprintln!("Unknown argument: {}", other);
                return Ok(());
            }
        }
        i += 1;
    }

    let config = settings.core_config();

    println!("🌱 Vitrine Demo Catalog Seeder");
    println!("==============================");
    println!("Database: {}", settings.database_path.display());
    println!("Currency: {}", config.default_currency());
    println!();

    let db = Database::new(settings.db_config()).await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.nodes().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} catalog nodes", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let start = std::time::Instant::now();
    let demo = seed_catalog(&db, &config).await?;
    println!();
    println!("✓ Created {} catalog nodes in {:?}", db.nodes().count().await?, start.elapsed());

    println!();
    println!("Sneaker 42:");
    let summary = db.nodes().summary(demo.sneaker_42).await?;
    println!("{}", serde_json::to_string_pretty(&summary)?);

    if place_order {
        println!();
        println!("Placing demo order...");
        let lists = db.lists();
        let cart = lists.create(ItemListKind::Cart, Some("demo-session")).await?;
        lists.add_item(cart.id(), demo.sneaker_42, 1, &config).await?;
        lists.add_item(cart.id(), demo.shirt_m, 2, &config).await?;

        let order = lists.place_order(cart.id()).await?;
        println!("  Order {}", order.id());
        for item in order.active_items() {
            let price = item
                .order_price
                .map(|p| p.to_string())
                .unwrap_or_else(|| "-".to_string());
            println!("    node {} × {} @ {}", item.node_id, item.quantity, price);
        }
        println!("  Total: {}", lists.total(order.id(), &config).await?);
    }

    println!();
    println!("✓ Seed complete!");

    db.close().await;
    Ok(())
}

/// Nodes the demo order refers to.
struct Demo {
    sneaker_42: NodeId,
    shirt_m: NodeId,
}

async fn seed_catalog(db: &Database, config: &CoreConfig) -> Result<Demo, Box<dyn std::error::Error>> {
    let nodes = db.nodes();
    let currency = config.default_currency();
    let price = |amount: &str| config.parse_money(amount);

    let shoes = nodes
        .insert(
            NodeDraft::category("Shoes", "shoes", currency)
                .with_price(price("10")?)
                .with_supplier("Acme Footwear")
                .with_description("Everything for your feet"),
        )
        .await?;
    println!("  + {} ({:?})", shoes.name, shoes.kind);

    let boots = nodes
        .insert(
            NodeDraft::product("Boots", "boots", price("45")?)
                .under(shoes.id)
                .with_stock(7),
        )
        .await?;
    println!("  + {} ({:?})", boots.name, boots.kind);

    let sneaker = nodes
        .insert(
            NodeDraft::product("Sneaker", "sneaker", price("35")?)
                .under(shoes.id)
                .with_pending(0, 12),
        )
        .await?;
    println!("  + {} ({:?})", sneaker.name, sneaker.kind);

    let mut sneaker_42 = None;
    for (size, addon, stock) in SNEAKER_SIZES {
        let variation = nodes
            .insert(
                NodeDraft::product(
                    format!("Sneaker {}", size),
                    format!("sneaker-{}", size),
                    price(*addon)?,
                )
                .under(sneaker.id)
                .with_stock(*stock),
            )
            .await?;
        if *size == "42" {
            sneaker_42 = Some(variation.id);
        }
        println!("    + {} ({:?})", variation.name, variation.kind);
    }

    let apparel = nodes
        .insert(NodeDraft::category("Apparel", "apparel", currency))
        .await?;
    println!("  + {} ({:?})", apparel.name, apparel.kind);

    let shirt = nodes
        .insert(
            NodeDraft::product("T-Shirt", "t-shirt", price("15")?)
                .under(apparel.id)
                .with_supplier("Cotton & Co"),
        )
        .await?;
    println!("  + {} ({:?})", shirt.name, shirt.kind);

    let mut shirt_m = None;
    for (size, stock) in SHIRT_SIZES {
        let variation = nodes
            .insert(
                NodeDraft::product(
                    format!("T-Shirt {}", size),
                    format!("t-shirt-{}", size.to_lowercase()),
                    price("0")?,
                )
                .under(shirt.id)
                .with_stock(*stock),
            )
            .await?;
        if *size == "M" {
            shirt_m = Some(variation.id);
        }
        println!("    + {} ({:?})", variation.name, variation.kind);
    }

    Ok(Demo {
        sneaker_42: sneaker_42.ok_or("sneaker 42 was not created")?,
        shirt_m: shirt_m.ok_or("t-shirt M was not created")?,
    })
}
