use crate::purchase::PurchaseRecord;
use crate::source::{PurchaseSource, SourceError};
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M:%S";

/// One row of the purchase export, using the export's column names.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct PurchaseRow {
    pub nk_ota_localizer_id: String,
    pub fk_contact: String,
    pub date_purchase: String,
    pub time_purchase: String,
    pub place_origin_departure: String,
    pub place_destination_departure: String,
    pub place_origin_return: String,
    pub place_destination_return: String,
    pub fk_departure_ota_bus_company: String,
    pub fk_return_ota_bus_company: String,
    pub gmv_success: f64,
    pub total_tickets_quantity_success: u32,
}

impl PurchaseRow {
    /// Converts the row into a validated purchase.
    ///
    /// `row` is the 1-based data row number used in error messages.
    pub(crate) fn into_record(self, row: usize) -> Result<PurchaseRecord, SourceError> {
        let purchase_date = NaiveDate::parse_from_str(&self.date_purchase, DATE_FORMAT)
            .map_err(|e| SourceError::Parse {
                row,
                reason: format!("invalid date '{}': {}", self.date_purchase, e),
            })?;
        let purchase_time = NaiveTime::parse_from_str(&self.time_purchase, TIME_FORMAT)
            .map_err(|e| SourceError::Parse {
                row,
                reason: format!("invalid time '{}': {}", self.time_purchase, e),
            })?;

        let record = PurchaseRecord {
            order_id: self.nk_ota_localizer_id,
            customer_id: self.fk_contact,
            purchase_date,
            purchase_time,
            origin_out: self.place_origin_departure,
            destination_out: self.place_destination_departure,
            origin_return: self.place_origin_return,
            destination_return: self.place_destination_return,
            carrier_out: self.fk_departure_ota_bus_company,
            carrier_return: self.fk_return_ota_bus_company,
            gross_value: self.gmv_success,
            ticket_count: self.total_tickets_quantity_success,
        };
        record.validate()?;
        Ok(record)
    }

    pub(crate) fn from_record(record: &PurchaseRecord) -> Self {
        PurchaseRow {
            nk_ota_localizer_id: record.order_id.clone(),
            fk_contact: record.customer_id.clone(),
            date_purchase: record.purchase_date.format(DATE_FORMAT).to_string(),
            time_purchase: record.purchase_time.format(TIME_FORMAT).to_string(),
            place_origin_departure: record.origin_out.clone(),
            place_destination_departure: record.destination_out.clone(),
            place_origin_return: record.origin_return.clone(),
            place_destination_return: record.destination_return.clone(),
            fk_departure_ota_bus_company: record.carrier_out.clone(),
            fk_return_ota_bus_company: record.carrier_return.clone(),
            gmv_success: record.gross_value,
            total_tickets_quantity_success: record.ticket_count,
        }
    }
}

/// CSV-file purchase source.
///
/// Reads the whole file on every load. A malformed row fails the entire load;
/// partial batches are never returned.
#[derive(Debug, Clone)]
pub struct CsvSource {
    path: PathBuf,
}

impl CsvSource {
    /// Creates a source reading from `path`.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        CsvSource {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes `records` to `path` in the export layout, replacing the file.
    pub fn write_batch<P: AsRef<Path>>(path: P, records: &[PurchaseRecord]) -> Result<(), SourceError> {
        let mut writer = csv::Writer::from_path(path).map_err(csv_error)?;
        for record in records {
            writer
                .serialize(PurchaseRow::from_record(record))
                .map_err(csv_error)?;
        }
        writer.flush()?;
        Ok(())
    }
}

impl PurchaseSource for CsvSource {
    fn load_batch(&self) -> Result<Vec<PurchaseRecord>, SourceError> {
        let mut reader = csv::Reader::from_path(&self.path).map_err(csv_error)?;

        let mut records = Vec::new();
        for (index, row) in reader.deserialize::<PurchaseRow>().enumerate() {
            let row_number = index + 1;
            let row = row.map_err(|e| SourceError::Parse {
                row: row_number,
                reason: e.to_string(),
            })?;
            records.push(row.into_record(row_number)?);
        }

        log::info!(
            "Loaded {} purchases from {}",
            records.len(),
            self.path.display()
        );
        Ok(records)
    }

    fn describe(&self) -> String {
        format!("csv:{}", self.path.display())
    }
}

fn csv_error(err: csv::Error) -> SourceError {
    if err.is_io_error() {
        SourceError::Io(err.to_string())
    } else {
        SourceError::Parse {
            row: err.position().map(|p| p.record() as usize).unwrap_or(0),
            reason: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const HEADER: &str = "nk_ota_localizer_id,fk_contact,date_purchase,time_purchase,place_origin_departure,place_destination_departure,place_origin_return,place_destination_return,fk_departure_ota_bus_company,fk_return_ota_bus_company,gmv_success,total_tickets_quantity_success";

    fn write_csv(rows: &[&str]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{}", HEADER).unwrap();
        for row in rows {
            writeln!(file, "{}", row).unwrap();
        }
        file
    }

    #[test]
    fn loads_one_way_and_round_trip_rows() {
        let file = write_csv(&[
            "a1,c1,2023-05-14,08:26:00,\"São Paulo, SP\",\"Curitiba, PR\",0,0,Viacao Cometa,1,199.9,2",
            "a2,c2,2023-06-01,22:10:05,\"Curitiba, PR\",\"São Paulo, SP\",\"São Paulo, SP\",\"Curitiba, PR\",Viacao 1001,Expresso do Sul,310.5,1",
        ]);

        let records = CsvSource::new(file.path()).load_batch().unwrap();
        assert_eq!(records.len(), 2);
        assert!(!records[0].is_round_trip());
        assert_eq!(records[0].origin_out, "São Paulo, SP");
        assert_eq!(records[0].ticket_count, 2);
        assert!(records[1].is_round_trip());
        assert_eq!(records[1].gross_value, 310.5);
    }

    #[test]
    fn invalid_date_fails_whole_load() {
        let file = write_csv(&[
            "a1,c1,2023-05-14,08:26:00,A,B,0,0,X,1,10.0,1",
            "a2,c1,14/05/2023,08:26:00,A,B,0,0,X,1,10.0,1",
        ]);

        let err = CsvSource::new(file.path()).load_batch().unwrap_err();
        match err {
            SourceError::Parse { row, reason } => {
                assert_eq!(row, 2);
                assert!(reason.contains("invalid date"));
            }
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn invariant_violation_is_reported() {
        let file = write_csv(&["a1,c1,2023-05-14,08:26:00,A,A,0,0,X,1,10.0,1"]);
        let err = CsvSource::new(file.path()).load_batch().unwrap_err();
        assert!(matches!(err, SourceError::InvalidRecord(_)));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = CsvSource::new("/nonexistent/purchases.csv")
            .load_batch()
            .unwrap_err();
        assert!(matches!(err, SourceError::Io(_)));
    }

    #[test]
    fn written_batch_loads_back() {
        let file = write_csv(&["a1,c1,2023-05-14,08:26:00,A,B,0,0,X,1,10.25,3"]);
        let records = CsvSource::new(file.path()).load_batch().unwrap();

        let out = NamedTempFile::new().unwrap();
        CsvSource::write_batch(out.path(), &records).unwrap();
        let reloaded = CsvSource::new(out.path()).load_batch().unwrap();
        assert_eq!(reloaded, records);
    }
}
