//! CSV Import Binary
//!
//! Loads a purchase export and replaces the `purchases` table of a SQLite
//! database with it, so the server can run with `DATA_SOURCE=sqlite:<db>`.
//!
//! Run with: `cargo run --bin import-csv -- viagens_clickbus.csv purchases.db`

use nextride::{init_tracing, CsvSource, PurchaseSource, SqliteSource};
use tracing::info;

const DEFAULT_CSV: &str = "viagens_clickbus.csv";
const DEFAULT_DB: &str = "purchases.db";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let mut args = std::env::args().skip(1);
    let csv_path = args.next().unwrap_or_else(|| DEFAULT_CSV.to_string());
    let db_path = args.next().unwrap_or_else(|| DEFAULT_DB.to_string());

    let records = CsvSource::new(&csv_path).load_batch()?;
    info!(path = %csv_path, record_count = records.len(), "loaded export");

    let inserted = SqliteSource::new(&db_path).replace_batch(&records)?;
    println!("Saved {} purchases from {} into {} (table purchases)", inserted, csv_path, db_path);

    Ok(())
}
