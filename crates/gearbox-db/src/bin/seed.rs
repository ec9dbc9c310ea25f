//! # Seed Data Generator
//!
//! Populates a database with the demo store: staff, categories, a car-parts
//! catalog, default settings and a handful of sales spread over past months.
//!
//! ## Usage
//! ```bash
//! # Seed ./gearbox.db with 12 sales (default)
//! cargo run -p gearbox-db --bin seed
//!
//! # Custom path and sale count
//! cargo run -p gearbox-db --bin seed -- --db ./data/gearbox.db --sales 40
//! ```
//!
//! Staff and categories are looked up before they are created, so running
//! the seed twice does not fail. Products are only seeded into an empty
//! catalog. Sales go through the regular checkout, so stock is decremented
//! and sale numbers are allocated exactly as at the counter.

use chrono::{Duration, Utc};
use std::collections::HashMap;
use std::env;
use tracing_subscriber::EnvFilter;

use gearbox_core::checkout::{CreateSaleRequest, SaleLineRequest};
use gearbox_core::{Customer, PaymentMethod, SettingsUpdate, StaffRole};
use gearbox_db::{Database, DbConfig, NewProduct};

const CATEGORIES: &[(&str, &str)] = &[
    ("Engine Parts", "Pistons, valves, gaskets and other engine internals"),
    ("Brake System", "Brake pads, rotors, calipers and brake fluid"),
    ("Suspension", "Shocks, struts and springs"),
    ("Electrical", "Batteries, alternators, starters and lighting"),
    ("Body Parts", "Panels, mirrors and trim"),
    ("Filters", "Air, oil, fuel and cabin filters"),
    ("Belts & Hoses", "Timing belts, serpentine belts and radiator hoses"),
    ("Transmission", "Clutches, transmission parts and drivetrain"),
    ("Cooling System", "Radiators, water pumps and thermostats"),
    ("Exhaust System", "Mufflers, catalytic converters and pipes"),
];

/// (name, barcode, category, price_cents, stock, manufacturer, part_number)
const PRODUCTS: &[(&str, &str, &str, i64, i64, &str, &str)] = &[
    ("Brake Pads - Front Set", "1234567890123", "Brake System", 8999, 25, "Brembo", "BP-FRONT-001"),
    ("Engine Oil Filter", "2345678901234", "Filters", 2499, 50, "Mann Filter", "OF-ENG-002"),
    ("Spark Plugs Set (4 pieces)", "3456789012345", "Engine Parts", 4599, 30, "NGK", "SP-IRD-003"),
    ("Air Filter", "4567890123456", "Filters", 3599, 40, "K&N", "AF-HF-004"),
    ("Timing Belt", "5678901234567", "Belts & Hoses", 6599, 20, "Gates", "TB-TIM-005"),
    ("Radiator", "6789012345678", "Cooling System", 18999, 15, "Mishimoto", "RAD-ALU-006"),
    ("Shock Absorber - Rear", "7890123456789", "Suspension", 12599, 18, "Bilstein", "SA-REAR-007"),
    ("Headlight Assembly - LED", "8901234567890", "Electrical", 29999, 12, "Philips", "HL-LED-008"),
    ("Exhaust Muffler", "9012345678901", "Exhaust System", 15999, 22, "Borla", "EX-MUF-009"),
    ("Transmission Filter Kit", "0123456789012", "Transmission", 7599, 28, "ATP", "TF-KIT-010"),
];

const CUSTOMERS: &[(&str, Option<&str>, Option<&str>)] = &[
    ("John Smith", Some("john@example.com"), Some("555-0123")),
    ("Sarah Johnson", None, Some("555-0456")),
    ("Mike Wilson", Some("mike@example.com"), None),
    ("Lisa Brown", Some("lisa@example.com"), Some("555-0789")),
    ("David Lee", None, None),
    ("Emma Davis", Some("emma@example.com"), None),
];

const PAYMENT_METHODS: &[PaymentMethod] = &[
    PaymentMethod::Card,
    PaymentMethod::Cash,
    PaymentMethod::BankTransfer,
    PaymentMethod::Check,
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let args: Vec<String> = env::args().collect();

    let mut sale_count: usize = 12;
    let mut db_path = String::from("./gearbox.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--sales" | "-s" => {
                if i + 1 < args.len() {
                    sale_count = args[i + 1].parse().unwrap_or(12);
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
                println!("Gearbox POS Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -s, --sales <N>    Number of sales to record (default: 12)");
                println!("  -d, --db <PATH>    Database file path (default: ./gearbox.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("Gearbox POS Seed Data Generator");
    println!("===============================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected, migrations applied");

    // Staff
    let admin = match db.staff().get_by_email("admin@gearbox.local").await? {
        Some(admin) => admin,
        None => {
            db.staff()
                .insert("System Administrator", "admin@gearbox.local", StaffRole::Admin)
                .await?
        }
    };
    let staff = match db.staff().get_by_email("staff@gearbox.local").await? {
        Some(staff) => staff,
        None => {
            db.staff()
                .insert("Staff User", "staff@gearbox.local", StaffRole::Staff)
                .await?
        }
    };
    println!("✓ Staff ready");

    // Categories
    let mut category_ids: HashMap<&str, String> = HashMap::new();
    for &(name, description) in CATEGORIES {
        let category = match db.categories().get_by_name(name).await? {
            Some(existing) => existing,
            None => db.categories().create(name, description, &admin.id).await?,
        };
        category_ids.insert(name, category.id);
    }
    println!("✓ {} categories", category_ids.len());

    // Settings
    let settings = db
        .settings()
        .update(
            SettingsUpdate {
                tax_rate_bps: Some(800),
                ..Default::default()
            },
            &admin.id,
        )
        .await?;
    println!("✓ Settings (tax rate {}%)", settings.tax_rate().percentage());

    // Products
    if db.products().count().await? > 0 {
        println!("⚠ Catalog already has products, skipping products and sales.");
        print_staff(&admin.id, &staff.id);
        return Ok(());
    }

    let mut product_ids = Vec::with_capacity(PRODUCTS.len());
    for (name, barcode, category, price_cents, stock, manufacturer, part_number) in PRODUCTS {
        let product = db
            .products()
            .insert(&NewProduct {
                barcode: barcode.to_string(),
                name: name.to_string(),
                description: None,
                price_cents: *price_cents,
                stock: *stock,
                category_id: category_ids.get(category).cloned(),
                manufacturer: Some(manufacturer.to_string()),
                part_number: Some(part_number.to_string()),
            })
            .await?;
        product_ids.push(product.id);
    }
    println!("✓ {} products", product_ids.len());

    // Sales, newest first, roughly nine days apart
    let now = Utc::now();
    let mut recorded = 0;
    for n in 0..sale_count {
        let (name, email, phone) = CUSTOMERS[n % CUSTOMERS.len()];
        let mut items = vec![SaleLineRequest::new(&product_ids[n % product_ids.len()], 1 + (n % 2) as i64)];
        if n % 3 == 0 {
            items.push(SaleLineRequest::new(&product_ids[(n + 3) % product_ids.len()], 1));
        }

        let mut request = CreateSaleRequest {
            items: Some(items),
            customer: Some(Customer {
                name: Some(name.to_string()),
                email: email.map(str::to_string),
                phone: phone.map(str::to_string),
                address: None,
            }),
            payment_method: Some(PAYMENT_METHODS[n % PAYMENT_METHODS.len()]),
            discount_cents: (n % 4 == 1).then_some(500),
            ..Default::default()
        };

        let quote = match db.sales().quote(&request).await {
            Ok(quote) => quote,
            Err(e) => {
                eprintln!("Skipping sale {}: {}", n + 1, e);
                continue;
            }
        };
        request.tax_cents = Some(quote.suggested_tax_cents);

        let sale_date = now - Duration::days(9 * n as i64);
        match db.sales().create_sale_at(&request, &staff.id, sale_date).await {
            Ok(sale) => {
                recorded += 1;
                println!(
                    "  {} {} {:>10} {}",
                    sale.sale_number,
                    sale.sale_date.format("%Y-%m-%d"),
                    sale.total().to_string(),
                    name
                );
            }
            Err(e) => eprintln!("Failed to record sale {}: {}", n + 1, e),
        }
    }
    println!("✓ {} sales", recorded);

    print_staff(&admin.id, &staff.id);
    println!();
    println!("✓ Seed complete!");

    Ok(())
}

fn print_staff(admin_id: &str, staff_id: &str) {
    println!();
    println!("Send one of these as the x-staff-id header:");
    println!("  admin: {}", admin_id);
    println!("  staff: {}", staff_id);
}
