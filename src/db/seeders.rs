//! Database seeders for starter data
//!
//! Seeds a small catalog so a fresh install has something to browse.
//! Runs once: skipped as soon as any product exists.

use anyhow::Result;
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

/// Seed the starter product catalog (no-op once products exist)
pub async fn seed_catalog(pool: &SqlitePool) -> Result<()> {
    let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM products")
        .fetch_one(pool)
        .await?;
    if count.0 > 0 {
        return Ok(());
    }

    info!("Seeding starter catalog...");

    // Format: (name, description, price, sale_price, category, brand, stock)
    let products: Vec<(&str, &str, f64, Option<f64>, &str, &str, i64)> = vec![
        (
            "Ryzen 7 7800X3D",
            "8-core AM5 gaming CPU with 3D V-Cache.",
            449.0,
            Some(399.0),
            "cpu",
            "AMD",
            12,
        ),
        (
            "Core i5-14600K",
            "14-core LGA1700 CPU for gaming and productivity.",
            319.0,
            None,
            "cpu",
            "Intel",
            20,
        ),
        (
            "GeForce RTX 4070 SUPER",
            "12 GB GDDR6X graphics card for 1440p gaming.",
            599.0,
            None,
            "gpu",
            "NVIDIA",
            8,
        ),
        (
            "Radeon RX 7800 XT",
            "16 GB GDDR6 graphics card.",
            499.0,
            Some(469.0),
            "gpu",
            "AMD",
            10,
        ),
        (
            "B650 Tomahawk WiFi",
            "AM5 ATX mainboard with WiFi 6E.",
            219.0,
            None,
            "mainboard",
            "MSI",
            15,
        ),
        (
            "Vengeance 32GB DDR5-6000",
            "2x16 GB DDR5 kit, CL30.",
            114.0,
            None,
            "ram",
            "Corsair",
            30,
        ),
        (
            "980 PRO 2TB",
            "PCIe 4.0 NVMe SSD, 7000 MB/s reads.",
            169.0,
            Some(139.0),
            "storage",
            "Samsung",
            25,
        ),
        (
            "RM850x",
            "850 W fully modular 80+ Gold PSU.",
            139.0,
            None,
            "psu",
            "Corsair",
            18,
        ),
        (
            "H5 Flow",
            "Mid-tower airflow case with two 120 mm fans.",
            94.0,
            None,
            "case",
            "NZXT",
            14,
        ),
        (
            "Kraken 240",
            "240 mm AIO liquid cooler.",
            129.0,
            None,
            "cooling",
            "NZXT",
            9,
        ),
        (
            "Odyssey G7 27\"",
            "1440p 240 Hz curved gaming monitor.",
            549.0,
            Some(499.0),
            "monitor",
            "Samsung",
            6,
        ),
    ];

    let now = chrono::Utc::now().to_rfc3339();
    for (name, description, price, sale_price, category, brand, stock) in products {
        sqlx::query(
            "INSERT INTO products (id, name, description, price, sale_price, image, category, brand, stock, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, '', ?, ?, ?, ?, ?)",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(name)
        .bind(description)
        .bind(price)
        .bind(sale_price)
        .bind(category)
        .bind(brand)
        .bind(stock)
        .bind(&now)
        .bind(&now)
        .execute(pool)
        .await?;
    }

    info!("Starter catalog seeded");
    Ok(())
}
