//! # Seed Data Generator
//!
//! Populates a scan database with sample history for development.
//!
//! ## Usage
//! ```bash
//! # 200 scans at the current schema (default)
//! cargo run -p codescan-db --bin seed
//!
//! # Custom amount and path
//! cargo run -p codescan-db --bin seed -- --count 1000 --db ./data/scan_database
//!
//! # A schema-version-1 file, for trying out the upgrade path
//! cargo run -p codescan-db --bin seed -- --legacy-v1 --db ./legacy_v1.db
//! ```
//!
//! ## Generated Scans
//! Contents cycle through the shapes the history screen sees in practice:
//! EAN-13 numbers, short numeric labels, web links, free text and short
//! codes. Timestamps step back one minute per record from now.

use chrono::{Duration, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::env;

use codescan_core::classify::infer_code_type;
use codescan_core::NewScanResult;
use codescan_db::{Database, DbConfig};

const REMARKS: &[&str] = &["", "shelf 3", "returned", "", "check price", ""];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut count: usize = 200;
    let mut db_path = String::from("./scan_database");
    let mut legacy_v1 = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(200);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--legacy-v1" => legacy_v1 = true,
            "--help" | "-h" => {
                println!("CodeScan Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>    Number of scans to generate (default: 200)");
                println!("  -d, --db <PATH>    Database file path (default: ./scan_database)");
                println!("      --legacy-v1    Write a schema-version-1 file instead");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("CodeScan Seed Data Generator");
    println!("============================");
    println!("Database: {}", db_path);
    println!("Scans:    {}", count);
    println!();

    let scans: Vec<NewScanResult> = (0..count).map(generate_scan).collect();

    if legacy_v1 {
        write_legacy_v1(&db_path, &scans).await?;
        println!("✓ Wrote {} scans at schema version 1", scans.len());
        println!("  Open it with the app to run the upgrade.");
        return Ok(());
    }

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected to database (schema v{})", db.schema_version().await?);

    let existing = db.scan_results().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} scans", existing);
        println!("  Skipping seed to avoid duplicates.");
        return Ok(());
    }

    let start = std::time::Instant::now();
    let inserted = db.scan_results().insert_many(&scans).await?;
    println!("✓ Generated {} scans in {:?}", inserted, start.elapsed());

    db.close().await;
    Ok(())
}

/// Generates one sample scan.
fn generate_scan(seed: usize) -> NewScanResult {
    let content = match seed % 5 {
        0 => format!("590{:010}", seed),
        1 => format!("{:08}", seed * 7),
        2 => format!("https://example.com/item/{}", seed),
        3 => format!("Meeting room {} booking reference", seed % 40),
        _ => format!("A{}", seed % 100),
    };
    let timestamp = (Utc::now() - Duration::minutes(seed as i64)).timestamp_millis();

    NewScanResult::new(content.as_str())
        .with_code_type(infer_code_type(&content))
        .with_remark(Some(REMARKS[seed % REMARKS.len()]))
        .with_timestamp(timestamp)
}

/// Writes the version 1 layout: no remark, no code type.
async fn write_legacy_v1(
    path: &str,
    scans: &[NewScanResult],
) -> Result<(), Box<dyn std::error::Error>> {
    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await?;

    let version: i64 = sqlx::query_scalar("PRAGMA user_version")
        .fetch_one(&pool)
        .await?;
    if version != 0 {
        pool.close().await;
        return Err(format!("{path} already has schema version {version}").into());
    }

    let mut tx = pool.begin().await?;
    sqlx::query(
        "CREATE TABLE scan_results (
            id INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
            content TEXT NOT NULL,
            timestamp INTEGER NOT NULL
        )",
    )
    .execute(&mut *tx)
    .await?;
    for scan in scans {
        sqlx::query("INSERT INTO scan_results (content, timestamp) VALUES (?1, ?2)")
            .bind(&scan.content)
            .bind(scan.timestamp)
            .execute(&mut *tx)
            .await?;
    }
    sqlx::query("PRAGMA user_version = 1")
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    pool.close().await;
    Ok(())
}
