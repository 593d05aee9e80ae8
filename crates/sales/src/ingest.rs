//! Upload mapping: CSV rows to sales observations.
//!
//! Required columns are validated up front; the date column is coerced
//! (unreadable dates become missing) and numeric columns must parse.

use chrono::{NaiveDate, NaiveDateTime};
use thiserror::Error;

use restock_core::ProductId;

use crate::observation::{SalesObservation, CSV_UPLOAD_SOURCE};

/// Columns every upload must carry.
pub const REQUIRED_COLUMNS: [&str; 3] = ["date", "product_id", "quantity_sold"];

const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d-%m-%Y"];
const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("missing required columns: {0}")]
    MissingColumns(String),

    #[error("row {row}: invalid value for '{column}': {value}")]
    InvalidValue {
        row: usize,
        column: &'static str,
        value: String,
    },

    #[error("malformed csv: {0}")]
    Csv(#[from] csv::Error),
}

struct Columns {
    date: usize,
    product_id: usize,
    quantity_sold: usize,
    price: Option<usize>,
    location: Option<usize>,
}

impl Columns {
    fn resolve(headers: &csv::StringRecord) -> Result<Self, IngestError> {
        let find = |name: &str| headers.iter().position(|h| h.trim() == name);

        let missing: Vec<&str> = REQUIRED_COLUMNS
            .iter()
            .copied()
            .filter(|c| find(c).is_none())
            .collect();
        if !missing.is_empty() {
            return Err(IngestError::MissingColumns(missing.join(", ")));
        }

        Ok(Self {
            date: find("date").unwrap_or_default(),
            product_id: find("product_id").unwrap_or_default(),
            quantity_sold: find("quantity_sold").unwrap_or_default(),
            price: find("price"),
            location: find("location"),
        })
    }
}

/// Parse an uploaded CSV document into sales observations tagged `csv_upload`.
pub fn parse_csv(input: &[u8]) -> Result<Vec<SalesObservation>, IngestError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(input);

    let columns = Columns::resolve(reader.headers()?)?;

    let mut out = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        let record = record?;
        // 1-based data row number (header is row 0).
        let row = idx + 1;
        let cell = |i: usize| record.get(i).unwrap_or("");

        let raw_id = cell(columns.product_id);
        let product_id = ProductId::parse(raw_id).map_err(|_| IngestError::InvalidValue {
            row,
            column: "product_id",
            value: raw_id.to_string(),
        })?;

        let quantity_sold = parse_optional_number(cell(columns.quantity_sold), row, "quantity_sold")?;
        if let Some(q) = quantity_sold {
            if q < 0.0 {
                return Err(IngestError::InvalidValue {
                    row,
                    column: "quantity_sold",
                    value: q.to_string(),
                });
            }
        }

        let price = match columns.price {
            Some(i) => parse_optional_number(cell(i), row, "price")?.unwrap_or(0.0),
            None => 0.0,
        };

        out.push(SalesObservation {
            product_id,
            date: coerce_date(cell(columns.date)),
            quantity_sold,
            price,
            location: columns.location.map(|i| cell(i).to_string()).unwrap_or_default(),
            source: CSV_UPLOAD_SOURCE.to_string(),
        });
    }

    Ok(out)
}

fn parse_optional_number(
    raw: &str,
    row: usize,
    column: &'static str,
) -> Result<Option<f64>, IngestError> {
    if raw.is_empty() {
        return Ok(None);
    }
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(Some(value)),
        _ => Err(IngestError::InvalidValue {
            row,
            column,
            value: raw.to_string(),
        }),
    }
}

/// Lenient date parsing; anything unreadable becomes `None`.
pub fn coerce_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    DATE_FORMATS
        .iter()
        .find_map(|f| NaiveDate::parse_from_str(raw, f).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|f| NaiveDateTime::parse_from_str(raw, f).ok())
                .map(|dt| dt.date())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn parses_required_and_optional_columns() {
        let csv = b"date,product_id,quantity_sold,price,location\n\
                    2025-01-01,SKU_101,10,1.5,Store A\n\
                    2025-01-02,SKU_101,12,,Store A\n";
        let rows = parse_csv(csv).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].product_id.as_str(), "SKU_101");
        assert_eq!(rows[0].date, NaiveDate::from_ymd_opt(2025, 1, 1));
        assert_eq!(rows[0].quantity_sold, Some(10.0));
        assert_eq!(rows[0].price, 1.5);
        assert_eq!(rows[0].location, "Store A");
        assert_eq!(rows[0].source, CSV_UPLOAD_SOURCE);
        assert_eq!(rows[1].price, 0.0);
    }

    #[test]
    fn missing_required_column_is_rejected() {
        let csv = b"date,quantity_sold\n2025-01-01,3\n";
        match parse_csv(csv).unwrap_err() {
            IngestError::MissingColumns(cols) => assert_eq!(cols, "product_id"),
            other => panic!("Expected MissingColumns, got {other:?}"),
        }
    }

    #[test]
    fn unreadable_date_becomes_missing() {
        let csv = b"product_id,date,quantity_sold\nSKU_9,not-a-date,3\n";
        let rows = parse_csv(csv).unwrap();
        assert_eq!(rows[0].date, None);
        assert_eq!(rows[0].point(), None);
    }

    #[test]
    fn non_numeric_quantity_is_rejected() {
        let csv = b"date,product_id,quantity_sold\n2025-01-01,SKU_1,lots\n";
        match parse_csv(csv).unwrap_err() {
            IngestError::InvalidValue { row, column, .. } => {
                assert_eq!(row, 1);
                assert_eq!(column, "quantity_sold");
            }
            other => panic!("Expected InvalidValue, got {other:?}"),
        }
    }

    #[test]
    fn negative_quantity_is_rejected() {
        let csv = b"date,product_id,quantity_sold\n2025-01-01,SKU_1,-4\n";
        assert!(matches!(
            parse_csv(csv).unwrap_err(),
            IngestError::InvalidValue { column: "quantity_sold", .. }
        ));
    }

    #[test]
    fn non_finite_numbers_are_rejected() {
        for (csv, column) in [
            (&b"date,product_id,quantity_sold\n2025-01-01,SKU_1,NaN\n"[..], "quantity_sold"),
            (&b"date,product_id,quantity_sold\n2025-01-01,SKU_1,inf\n"[..], "quantity_sold"),
            (&b"date,product_id,quantity_sold,price\n2025-01-01,SKU_1,2,-inf\n"[..], "price"),
        ] {
            match parse_csv(csv).unwrap_err() {
                IngestError::InvalidValue { row, column: c, .. } => {
                    assert_eq!(row, 1);
                    assert_eq!(c, column);
                }
                other => panic!("Expected InvalidValue, got {other:?}"),
            }
        }
    }

    #[test]
    fn coerce_date_accepts_common_layouts() {
        let expected = NaiveDate::from_ymd_opt(2025, 3, 4);
        assert_eq!(coerce_date("2025-03-04"), expected);
        assert_eq!(coerce_date("03/04/2025"), expected);
        assert_eq!(coerce_date("2025-03-04 10:30:00"), expected);
        assert_eq!(coerce_date(""), None);
    }

    proptest! {
        /// Property: every well-formed row yields exactly one observation.
        #[test]
        fn row_count_is_preserved(qty in prop::collection::vec(0u32..10_000, 0..50)) {
            let mut doc = String::from("date,product_id,quantity_sold\n");
            for (i, q) in qty.iter().enumerate() {
                doc.push_str(&format!("2025-01-{:02},SKU_{},{}\n", (i % 28) + 1, i % 3, q));
            }
            let rows = parse_csv(doc.as_bytes()).unwrap();
            prop_assert_eq!(rows.len(), qty.len());
        }
    }
}
