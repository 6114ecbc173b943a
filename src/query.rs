use chrono::{DateTime, Utc};

use crate::aggregate::{aggregate, AggregatedReading, TimeStep};
use crate::compare::{compare_series, ComparisonPoint};
use crate::error::{InputError, StoreError};
use crate::store::ReadingStore;
use crate::time::{parse_date_utc, parse_end_date_utc};

/// Inclusive UTC query window, already validated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QueryWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl QueryWindow {
    pub fn parse(start_raw: &str, end_raw: &str) -> Result<Self, InputError> {
        let start = parse_date_utc(start_raw)?;
        let end = parse_end_date_utc(end_raw)?;
        if end < start {
            return Err(InputError::EndBeforeStart);
        }
        Ok(Self { start, end })
    }
}

/// Single-series pipeline: range query, then resample.
pub fn production_series(
    store: &dyn ReadingStore,
    hpp_id: i64,
    window: QueryWindow,
    step: TimeStep,
) -> Result<Vec<AggregatedReading>, StoreError> {
    let rows = store.query(hpp_id, window.start, window.end)?;
    Ok(aggregate(rows, step))
}

/// Comparison pipeline: the same per-plant query/resample run for every
/// comparator, merged into one ordered result.
pub fn comparison_series(
    store: &dyn ReadingStore,
    hpp_id: i64,
    window: QueryWindow,
    step: TimeStep,
) -> Result<Vec<ComparisonPoint>, StoreError> {
    compare_series(store, hpp_id, window.start, window.end, step)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{ReadingStore, FLAG_VALID};
    use crate::test_support::{reading, ts, MemoryStore};

    #[test]
    fn window_parse_normalizes_both_bounds_to_utc() {
        let window = QueryWindow::parse("2025-02-01", "2025-02-28T23:00:00+01:00").expect("parse");
        assert_eq!(window.start, ts(2025, 2, 1, 0, 0, 0));
        assert_eq!(window.end, ts(2025, 2, 28, 22, 0, 0));
    }

    #[test]
    fn window_parse_rejects_inverted_bounds() {
        let err = QueryWindow::parse("2025-02-02", "2025-02-01").expect_err("inverted");
        assert!(matches!(err, InputError::EndBeforeStart));
    }

    #[test]
    fn window_parse_allows_equal_bounds() {
        let window =
            QueryWindow::parse("2025-02-01T10:00:00", "2025-02-01T10:00:00").expect("parse");
        assert_eq!(window.start, window.end);
    }

    #[test]
    fn bare_end_date_makes_the_window_cover_its_whole_day() {
        let window = QueryWindow::parse("2025-02-01", "2025-02-01").expect("parse");
        assert_eq!(window.start, ts(2025, 2, 1, 0, 0, 0));
        assert_eq!(window.end, ts(2025, 2, 1, 23, 59, 59));
    }

    #[test]
    fn window_parse_reports_the_offending_string() {
        let err = QueryWindow::parse("soon", "2025-02-01").expect_err("invalid");
        assert!(matches!(err, InputError::InvalidDate(ref raw) if raw == "soon"));
    }

    #[test]
    fn round_trip_through_raw_step_preserves_the_window_rows() {
        let mut store = MemoryStore::new(vec![
            reading(1, ts(2025, 2, 1, 2, 0, 0), 3.0, FLAG_VALID),
            reading(1, ts(2025, 2, 1, 0, 0, 0), 1.0, FLAG_VALID),
            reading(1, ts(2025, 2, 1, 1, 0, 0), 2.0, FLAG_VALID),
            reading(1, ts(2025, 2, 2, 0, 0, 0), 9.0, FLAG_VALID),
        ]);
        store.load().expect("load");

        let window = QueryWindow::parse("2025-02-01", "2025-02-01T02:00:00").expect("window");
        let series = production_series(&store, 1, window, TimeStep::Hourly).expect("series");
        assert_eq!(series.len(), 3);
        let timestamps: Vec<_> = series.iter().map(|row| row.ts_utc).collect();
        assert_eq!(
            timestamps,
            vec![
                ts(2025, 2, 1, 0, 0, 0),
                ts(2025, 2, 1, 1, 0, 0),
                ts(2025, 2, 1, 2, 0, 0),
            ]
        );
    }

    #[test]
    fn production_series_on_empty_window_is_empty() {
        let mut store = MemoryStore::new(vec![reading(
            1,
            ts(2025, 2, 1, 0, 0, 0),
            1.0,
            FLAG_VALID,
        )]);
        store.load().expect("load");

        let window = QueryWindow::parse("2030-01-01", "2030-01-31").expect("window");
        let series = production_series(&store, 1, window, TimeStep::Daily).expect("series");
        assert!(series.is_empty());
    }
}
