use crate::csv_source::PurchaseRow;
use crate::purchase::PurchaseRecord;
use crate::source::{PurchaseSource, SourceError};
use rusqlite::{params, Connection, OpenFlags, Result as SqliteResult};
use std::path::{Path, PathBuf};

const SELECT_PURCHASES: &str = "SELECT nk_ota_localizer_id, fk_contact, date_purchase, time_purchase,
        place_origin_departure, place_destination_departure,
        place_origin_return, place_destination_return,
        fk_departure_ota_bus_company, fk_return_ota_bus_company,
        gmv_success, total_tickets_quantity_success
     FROM purchases
     ORDER BY rowid";

/// SQLite-backed purchase source.
///
/// Holds only the database path. Every load opens its own read-only
/// connection and closes it before returning, so the engine never keeps a
/// live connection between queries.
#[derive(Debug, Clone)]
pub struct SqliteSource {
    path: PathBuf,
}

impl SqliteSource {
    /// Creates a source for the database at `db_path`.
    ///
    /// The file is not touched until the first load or write.
    pub fn new<P: AsRef<Path>>(db_path: P) -> Self {
        SqliteSource {
            path: db_path.as_ref().to_path_buf(),
        }
    }

    /// Path of the backing database.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Creates the purchases table if it doesn't exist.
    pub fn ensure_schema(&self) -> SqliteResult<()> {
        let conn = Connection::open(&self.path)?;
        create_schema(&conn)
    }

    /// Appends `records` to the purchases table in a single transaction.
    ///
    /// # Returns
    /// The number of rows inserted.
    pub fn insert_batch(&self, records: &[PurchaseRecord]) -> SqliteResult<usize> {
        self.write_batch(records, false)
    }

    /// Replaces the contents of the purchases table with `records`.
    ///
    /// The delete and the inserts share one transaction, so readers see
    /// either the old table or the new one.
    pub fn replace_batch(&self, records: &[PurchaseRecord]) -> SqliteResult<usize> {
        self.write_batch(records, true)
    }

    fn write_batch(&self, records: &[PurchaseRecord], replace: bool) -> SqliteResult<usize> {
        let mut conn = Connection::open(&self.path)?;
        create_schema(&conn)?;

        let tx = conn.transaction()?;
        if replace {
            tx.execute("DELETE FROM purchases", [])?;
        }
        {
            let mut stmt = tx.prepare(
                "INSERT INTO purchases (
                    nk_ota_localizer_id, fk_contact, date_purchase, time_purchase,
                    place_origin_departure, place_destination_departure,
                    place_origin_return, place_destination_return,
                    fk_departure_ota_bus_company, fk_return_ota_bus_company,
                    gmv_success, total_tickets_quantity_success
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            )?;
            for record in records {
                let row = PurchaseRow::from_record(record);
                stmt.execute(params![
                    row.nk_ota_localizer_id,
                    row.fk_contact,
                    row.date_purchase,
                    row.time_purchase,
                    row.place_origin_departure,
                    row.place_destination_departure,
                    row.place_origin_return,
                    row.place_destination_return,
                    row.fk_departure_ota_bus_company,
                    row.fk_return_ota_bus_company,
                    row.gmv_success,
                    row.total_tickets_quantity_success,
                ])?;
            }
        }
        tx.commit()?;

        Ok(records.len())
    }

    /// Checks if a table exists in the database.
    fn table_exists(conn: &Connection, table_name: &str) -> SqliteResult<bool> {
        let mut stmt = conn.prepare("SELECT name FROM sqlite_master WHERE type='table' AND name=?1")?;
        stmt.exists([table_name])
    }
}

fn create_schema(conn: &Connection) -> SqliteResult<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS purchases (
            nk_ota_localizer_id TEXT NOT NULL,
            fk_contact TEXT NOT NULL,
            date_purchase TEXT NOT NULL,
            time_purchase TEXT NOT NULL,
            place_origin_departure TEXT NOT NULL,
            place_destination_departure TEXT NOT NULL,
            place_origin_return TEXT NOT NULL,
            place_destination_return TEXT NOT NULL,
            fk_departure_ota_bus_company TEXT NOT NULL,
            fk_return_ota_bus_company TEXT NOT NULL,
            gmv_success REAL NOT NULL,
            total_tickets_quantity_success INTEGER NOT NULL
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_purchases_contact ON purchases(fk_contact)",
        [],
    )?;
    Ok(())
}

impl PurchaseSource for SqliteSource {
    fn load_batch(&self) -> Result<Vec<PurchaseRecord>, SourceError> {
        let conn = Connection::open_with_flags(&self.path, OpenFlags::SQLITE_OPEN_READ_ONLY)?;

        if !Self::table_exists(&conn, "purchases")? {
            return Err(SourceError::Database(format!(
                "table 'purchases' not found in {}",
                self.path.display()
            )));
        }

        let mut stmt = conn.prepare(SELECT_PURCHASES)?;
        let rows = stmt.query_map([], |row| {
            Ok(PurchaseRow {
                nk_ota_localizer_id: row.get(0)?,
                fk_contact: row.get(1)?,
                date_purchase: row.get(2)?,
                time_purchase: row.get(3)?,
                place_origin_departure: row.get(4)?,
                place_destination_departure: row.get(5)?,
                place_origin_return: row.get(6)?,
                place_destination_return: row.get(7)?,
                fk_departure_ota_bus_company: row.get(8)?,
                fk_return_ota_bus_company: row.get(9)?,
                gmv_success: row.get(10)?,
                total_tickets_quantity_success: row.get(11)?,
            })
        })?;

        let mut records = Vec::new();
        for (index, row_result) in rows.enumerate() {
            let row = row_result.map_err(|e| SourceError::Parse {
                row: index + 1,
                reason: e.to_string(),
            })?;
            records.push(row.into_record(index + 1)?);
        }

        log::info!(
            "Loaded {} purchases from {}",
            records.len(),
            self.path.display()
        );
        Ok(records)
    }

    fn describe(&self) -> String {
        format!("sqlite:{}", self.path.display())
    }
}
