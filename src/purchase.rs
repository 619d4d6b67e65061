use chrono::{Datelike, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Sentinel stored in both return-city fields of a one-way purchase.
pub const NO_RETURN_CITY: &str = "0";

/// Sentinel stored in the return carrier field of a one-way purchase.
pub const NO_RETURN_CARRIER: &str = "1";

/// A single ticket purchase.
///
/// One-way purchases carry [`NO_RETURN_CITY`] in both return-city fields and
/// [`NO_RETURN_CARRIER`] as return carrier. Use [`PurchaseRecord::is_round_trip`]
/// rather than testing the fields for emptiness.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseRecord {
    /// Opaque order identifier
    pub order_id: String,
    /// Customer identifier
    pub customer_id: String,
    /// Calendar date of the purchase
    pub purchase_date: NaiveDate,
    /// Time of day of the purchase
    pub purchase_time: NaiveTime,
    /// Outbound origin city
    pub origin_out: String,
    /// Outbound destination city
    pub destination_out: String,
    /// Return origin city, or the no-leg sentinel
    pub origin_return: String,
    /// Return destination city, or the no-leg sentinel
    pub destination_return: String,
    /// Outbound bus company
    pub carrier_out: String,
    /// Return bus company, or the no-leg sentinel
    pub carrier_return: String,
    /// Gross merchandise value of the purchase
    pub gross_value: f64,
    /// Number of tickets in the purchase
    pub ticket_count: u32,
}

impl PurchaseRecord {
    /// Creates a one-way purchase with the return fields set to the sentinels.
    ///
    /// # Errors
    /// Returns a [`RecordError`] if the record violates a purchase invariant.
    #[allow(clippy::too_many_arguments)]
    pub fn one_way(
        order_id: impl Into<String>,
        customer_id: impl Into<String>,
        purchase_date: NaiveDate,
        purchase_time: NaiveTime,
        origin: impl Into<String>,
        destination: impl Into<String>,
        carrier: impl Into<String>,
        gross_value: f64,
        ticket_count: u32,
    ) -> Result<Self, RecordError> {
        let record = PurchaseRecord {
            order_id: order_id.into(),
            customer_id: customer_id.into(),
            purchase_date,
            purchase_time,
            origin_out: origin.into(),
            destination_out: destination.into(),
            origin_return: NO_RETURN_CITY.to_string(),
            destination_return: NO_RETURN_CITY.to_string(),
            carrier_out: carrier.into(),
            carrier_return: NO_RETURN_CARRIER.to_string(),
            gross_value,
            ticket_count,
        };
        record.validate()?;
        Ok(record)
    }

    /// Creates a round-trip purchase whose return leg reverses the outbound leg.
    ///
    /// # Errors
    /// Returns a [`RecordError`] if the record violates a purchase invariant.
    #[allow(clippy::too_many_arguments)]
    pub fn round_trip(
        order_id: impl Into<String>,
        customer_id: impl Into<String>,
        purchase_date: NaiveDate,
        purchase_time: NaiveTime,
        origin: impl Into<String>,
        destination: impl Into<String>,
        carrier_out: impl Into<String>,
        carrier_return: impl Into<String>,
        gross_value: f64,
        ticket_count: u32,
    ) -> Result<Self, RecordError> {
        let origin = origin.into();
        let destination = destination.into();
        let record = PurchaseRecord {
            order_id: order_id.into(),
            customer_id: customer_id.into(),
            purchase_date,
            purchase_time,
            origin_return: destination.clone(),
            destination_return: origin.clone(),
            origin_out: origin,
            destination_out: destination,
            carrier_out: carrier_out.into(),
            carrier_return: carrier_return.into(),
            gross_value,
            ticket_count,
        };
        record.validate()?;
        Ok(record)
    }

    /// Checks the purchase invariants.
    ///
    /// Loaders build records field by field and must call this before handing
    /// them to the engine.
    pub fn validate(&self) -> Result<(), RecordError> {
        if self.origin_out == self.destination_out {
            return Err(RecordError::SameOriginAndDestination {
                order_id: self.order_id.clone(),
                city: self.origin_out.clone(),
            });
        }
        if !self.gross_value.is_finite() || self.gross_value < 0.0 {
            return Err(RecordError::InvalidGrossValue {
                order_id: self.order_id.clone(),
                value: self.gross_value,
            });
        }
        if self.ticket_count == 0 {
            return Err(RecordError::ZeroTickets {
                order_id: self.order_id.clone(),
            });
        }
        Ok(())
    }

    /// Returns true when the purchase carries a return leg.
    pub fn is_round_trip(&self) -> bool {
        !(self.origin_return == NO_RETURN_CITY && self.destination_return == NO_RETURN_CITY)
    }

    /// Returns the return leg as `(origin, destination)`, or `None` for one-way trips.
    pub fn return_leg(&self) -> Option<(&str, &str)> {
        if self.is_round_trip() {
            Some((&self.origin_return, &self.destination_return))
        } else {
            None
        }
    }

    /// The outbound route of this purchase.
    pub fn route(&self) -> Route<'_> {
        Route {
            origin: &self.origin_out,
            destination: &self.destination_out,
        }
    }

    /// Purchase month, 1 through 12.
    pub fn month(&self) -> u32 {
        self.purchase_date.month()
    }

    /// Purchase month rendered as `YYYY-MM`.
    pub fn month_label(&self) -> String {
        month_label(self.purchase_date)
    }
}

/// Renders a date's month as `YYYY-MM`.
pub fn month_label(date: NaiveDate) -> String {
    date.format("%Y-%m").to_string()
}

/// An ordered (origin, destination) city pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Route<'a> {
    pub origin: &'a str,
    pub destination: &'a str,
}

impl Route<'_> {
    /// Single-string label used for grouping and categorical encoding.
    pub fn label(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Route<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.origin, self.destination)
    }
}

/// A purchase that violates a record invariant.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordError {
    /// Outbound origin equals outbound destination
    SameOriginAndDestination { order_id: String, city: String },
    /// Gross value is negative or not finite
    InvalidGrossValue { order_id: String, value: f64 },
    /// Ticket count is zero
    ZeroTickets { order_id: String },
}

impl fmt::Display for RecordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordError::SameOriginAndDestination { order_id, city } => write!(
                f,
                "order {}: origin and destination are both '{}'",
                order_id, city
            ),
            RecordError::InvalidGrossValue { order_id, value } => {
                write!(f, "order {}: invalid gross value {}", order_id, value)
            }
            RecordError::ZeroTickets { order_id } => {
                write!(f, "order {}: ticket count must be positive", order_id)
            }
        }
    }
}

impl std::error::Error for RecordError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn noon() -> NaiveTime {
        NaiveTime::from_hms_opt(12, 0, 0).unwrap()
    }

    #[test]
    fn one_way_uses_sentinels() {
        let record = PurchaseRecord::one_way(
            "o1", "c1", date(2024, 3, 9), noon(), "Recife, PE", "Salvador, BA", "Viacao 1001", 120.0, 2,
        )
        .unwrap();

        assert_eq!(record.origin_return, NO_RETURN_CITY);
        assert_eq!(record.destination_return, NO_RETURN_CITY);
        assert_eq!(record.carrier_return, NO_RETURN_CARRIER);
        assert!(!record.is_round_trip());
        assert_eq!(record.return_leg(), None);
    }

    #[test]
    fn round_trip_reverses_outbound_leg() {
        let record = PurchaseRecord::round_trip(
            "o2",
            "c1",
            date(2024, 3, 9),
            noon(),
            "Curitiba, PR",
            "Campinas, SP",
            "Viacao Cometa",
            "Expresso do Sul",
            300.0,
            1,
        )
        .unwrap();

        assert!(record.is_round_trip());
        assert_eq!(record.return_leg(), Some(("Campinas, SP", "Curitiba, PR")));
    }

    #[test]
    fn empty_return_fields_are_not_a_one_way_marker() {
        let mut record =
            PurchaseRecord::one_way("o3", "c1", date(2024, 1, 1), noon(), "A", "B", "X", 10.0, 1)
                .unwrap();
        record.origin_return = String::new();
        record.destination_return = String::new();
        assert!(record.is_round_trip());
    }

    #[test]
    fn rejects_invalid_records() {
        let same = PurchaseRecord::one_way("o4", "c1", date(2024, 1, 1), noon(), "A", "A", "X", 10.0, 1);
        assert!(matches!(same, Err(RecordError::SameOriginAndDestination { .. })));

        let negative =
            PurchaseRecord::one_way("o5", "c1", date(2024, 1, 1), noon(), "A", "B", "X", -1.0, 1);
        assert!(matches!(negative, Err(RecordError::InvalidGrossValue { .. })));

        let zero = PurchaseRecord::one_way("o6", "c1", date(2024, 1, 1), noon(), "A", "B", "X", 1.0, 0);
        assert_eq!(
            zero.unwrap_err(),
            RecordError::ZeroTickets {
                order_id: "o6".to_string()
            }
        );
    }

    #[test]
    fn route_label_and_month() {
        let record =
            PurchaseRecord::one_way("o7", "c1", date(2023, 11, 30), noon(), "X", "Y", "Z", 5.0, 1)
                .unwrap();
        assert_eq!(record.route().label(), "X -> Y");
        assert_eq!(record.month(), 11);
        assert_eq!(record.month_label(), "2023-11");
    }
}
