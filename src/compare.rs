use chrono::{DateTime, Utc};

use crate::aggregate::{aggregate, round1, AggregatedReading, TimeStep};
use crate::error::StoreError;
use crate::store::{ReadingStore, FLAG_FLAGGED, FLAG_VALID};

/// Plants included in every comparison response. The requested plant is
/// never echoed as its own comparator.
pub const COMPARATOR_HPP_IDS: [i64; 4] = [2, 3, 4, 5];

/// One merged comparison row: the six loss categories collapsed into a
/// single aggregate value and validity code, tagged with the source plant.
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonPoint {
    pub ts_utc: DateTime<Utc>,
    pub e_prod_kwh: f64,
    pub prod_valid_id: i32,
    pub loss_value_agg: f64,
    pub loss_valid_id: i32,
    pub cmpr_hpp_id: i64,
}

/// Run the query/aggregate pipeline for each comparator plant and
/// concatenate the per-plant blocks in comparator-id ascending order.
/// Comparators with no rows in range contribute nothing; blocks are not
/// globally re-sorted by timestamp.
pub fn compare_series(
    store: &dyn ReadingStore,
    hpp_id: i64,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    step: TimeStep,
) -> Result<Vec<ComparisonPoint>, StoreError> {
    let mut merged = Vec::new();
    for cmpr_hpp_id in COMPARATOR_HPP_IDS {
        if cmpr_hpp_id == hpp_id {
            continue;
        }
        let rows = store.query(cmpr_hpp_id, start, end)?;
        if rows.is_empty() {
            continue;
        }
        merged.extend(
            aggregate(rows, step)
                .into_iter()
                .map(|row| collapse_losses(row, cmpr_hpp_id)),
        );
    }
    Ok(merged)
}

fn collapse_losses(row: AggregatedReading, cmpr_hpp_id: i64) -> ComparisonPoint {
    let loss_value_agg = round1(row.loss_values.iter().sum::<f64>());
    let loss_valid_id = if row.loss_valid_ids.contains(&FLAG_FLAGGED) {
        FLAG_FLAGGED
    } else {
        FLAG_VALID
    };
    ComparisonPoint {
        ts_utc: row.ts_utc,
        e_prod_kwh: row.e_prod_kwh,
        prod_valid_id: row.prod_valid_id,
        loss_value_agg,
        loss_valid_id,
        cmpr_hpp_id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::LOSS_CATEGORIES;
    use crate::test_support::{reading, ts, MemoryStore};

    fn window() -> (DateTime<Utc>, DateTime<Utc>) {
        (ts(2025, 2, 1, 0, 0, 0), ts(2025, 2, 28, 23, 0, 0))
    }

    #[test]
    fn requested_plant_is_never_its_own_comparator() {
        let mut store = MemoryStore::new(vec![
            reading(2, ts(2025, 2, 1, 0, 0, 0), 1.0, FLAG_VALID),
            reading(3, ts(2025, 2, 1, 0, 0, 0), 2.0, FLAG_VALID),
            reading(4, ts(2025, 2, 1, 0, 0, 0), 3.0, FLAG_VALID),
        ]);
        store.load().expect("load");

        let (start, end) = window();
        let out = compare_series(&store, 3, start, end, TimeStep::Hourly).expect("compare");
        assert!(out.iter().all(|point| point.cmpr_hpp_id != 3));
        let ids: Vec<i64> = out.iter().map(|point| point.cmpr_hpp_id).collect();
        assert_eq!(ids, vec![2, 4]);
    }

    #[test]
    fn blocks_are_ordered_by_comparator_id_not_timestamp() {
        // Plant 4's readings predate plant 2's; the merge must still list
        // plant 2's block first.
        let mut store = MemoryStore::new(vec![
            reading(2, ts(2025, 2, 10, 0, 0, 0), 1.0, FLAG_VALID),
            reading(4, ts(2025, 2, 1, 0, 0, 0), 3.0, FLAG_VALID),
            reading(4, ts(2025, 2, 2, 0, 0, 0), 4.0, FLAG_VALID),
        ]);
        store.load().expect("load");

        let (start, end) = window();
        let out = compare_series(&store, 1, start, end, TimeStep::Hourly).expect("compare");
        let ids: Vec<i64> = out.iter().map(|point| point.cmpr_hpp_id).collect();
        assert_eq!(ids, vec![2, 4, 4]);
        assert!(out[1].ts_utc < out[0].ts_utc);
        assert!(out[1].ts_utc < out[2].ts_utc);
    }

    #[test]
    fn empty_comparators_are_skipped_silently() {
        let mut store = MemoryStore::new(vec![reading(
            2,
            ts(2025, 2, 1, 0, 0, 0),
            1.0,
            FLAG_VALID,
        )]);
        store.load().expect("load");

        let (start, end) = window();
        let out = compare_series(&store, 1, start, end, TimeStep::Daily).expect("compare");
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].cmpr_hpp_id, 2);
    }

    #[test]
    fn no_comparator_rows_is_empty_not_an_error() {
        let mut store = MemoryStore::new(vec![reading(
            1,
            ts(2025, 2, 1, 0, 0, 0),
            1.0,
            FLAG_VALID,
        )]);
        store.load().expect("load");

        let (start, end) = window();
        let out = compare_series(&store, 1, start, end, TimeStep::Hourly).expect("compare");
        assert!(out.is_empty());
    }

    #[test]
    fn losses_collapse_to_sum_and_dominant_flag() {
        let mut row = reading(2, ts(2025, 2, 1, 0, 0, 0), 1.0, FLAG_VALID);
        row.loss_values = [0.5, 0.5, 1.0, 1.0, 0.25, 0.25];
        row.loss_valid_ids[4] = FLAG_FLAGGED;
        let mut store = MemoryStore::new(vec![row]);
        store.load().expect("load");

        let (start, end) = window();
        let out = compare_series(&store, 1, start, end, TimeStep::Daily).expect("compare");
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].loss_value_agg, 3.5);
        assert_eq!(out[0].loss_valid_id, FLAG_FLAGGED);
        assert_eq!(out[0].prod_valid_id, FLAG_VALID);
    }

    #[test]
    fn all_valid_flags_collapse_to_valid() {
        let mut row = reading(5, ts(2025, 2, 1, 0, 0, 0), 1.0, FLAG_VALID);
        row.loss_values = [0.1; LOSS_CATEGORIES];
        let mut store = MemoryStore::new(vec![row]);
        store.load().expect("load");

        let (start, end) = window();
        let out = compare_series(&store, 1, start, end, TimeStep::Hourly).expect("compare");
        assert_eq!(out[0].loss_valid_id, FLAG_VALID);
        assert_eq!(out[0].loss_value_agg, 0.6);
    }
}
