use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use restock_core::ProductId;

/// Provenance tag for rows that arrived through a file upload.
pub const CSV_UPLOAD_SOURCE: &str = "csv_upload";

/// A single historical sales observation.
///
/// `date` and `quantity_sold` are nullable in storage: an upload coerces an
/// unreadable date (or blank quantity) to missing instead of rejecting the file,
/// and the forecaster drops such rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesObservation {
    pub product_id: ProductId,
    pub date: Option<NaiveDate>,
    pub quantity_sold: Option<f64>,
    pub price: f64,
    pub location: String,
    pub source: String,
}

impl SalesObservation {
    pub fn new(product_id: ProductId, date: NaiveDate, quantity_sold: f64) -> Self {
        Self {
            product_id,
            date: Some(date),
            quantity_sold: Some(quantity_sold),
            price: 0.0,
            location: String::new(),
            source: CSV_UPLOAD_SOURCE.to_string(),
        }
    }

    /// The `(date, quantity)` pair usable for model fitting, if both are present.
    pub fn point(&self) -> Option<(NaiveDate, f64)> {
        match (self.date, self.quantity_sold) {
            (Some(d), Some(q)) if q.is_finite() => Some((d, q)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, d).unwrap()
    }

    #[test]
    fn point_requires_date_and_quantity() {
        let id = ProductId::parse("SKU_101").unwrap();
        let full = SalesObservation::new(id.clone(), day(1), 4.0);
        assert_eq!(full.point(), Some((day(1), 4.0)));

        let mut no_date = full.clone();
        no_date.date = None;
        assert_eq!(no_date.point(), None);

        let mut nan_qty = full;
        nan_qty.quantity_sold = Some(f64::NAN);
        assert_eq!(nan_qty.point(), None);
    }
}
