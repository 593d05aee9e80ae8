use chrono::NaiveDate;

use crate::error::AiError;

/// A daily observation series ordered by date.
///
/// Several observations may share a date (e.g. one row per location); they are
/// kept as separate points.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    points: Vec<(NaiveDate, f64)>,
}

impl Series {
    /// Build a series, sorting by date (stable for equal dates).
    ///
    /// Rejects non-finite values; callers are expected to drop missing values
    /// before building the series.
    pub fn new(mut points: Vec<(NaiveDate, f64)>) -> Result<Self, AiError> {
        if let Some((d, y)) = points.iter().find(|(_, y)| !y.is_finite()) {
            return Err(AiError::InvalidInput(format!(
                "non-finite observation {y} on {d}"
            )));
        }
        points.sort_by_key(|(d, _)| *d);
        Ok(Self { points })
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[(NaiveDate, f64)] {
        &self.points
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.points.first().map(|(d, _)| *d)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.points.last().map(|(d, _)| *d)
    }

    /// Number of days between first and last observation.
    pub fn span_days(&self) -> i64 {
        match (self.first_date(), self.last_date()) {
            (Some(a), Some(b)) => (b - a).num_days(),
            _ => 0,
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
    fn points_are_sorted_by_date() {
        let s = Series::new(vec![(day(3), 1.0), (day(1), 2.0), (day(2), 3.0)]).unwrap();
        let dates: Vec<_> = s.points().iter().map(|(d, _)| *d).collect();
        assert_eq!(dates, vec![day(1), day(2), day(3)]);
        assert_eq!(s.span_days(), 2);
    }

    #[test]
    fn non_finite_values_are_rejected() {
        let err = Series::new(vec![(day(1), f64::INFINITY)]).unwrap_err();
        assert!(matches!(err, AiError::InvalidInput(_)));
    }
}
