use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::store::{Reading, FLAG_FLAGGED, FLAG_VALID, LOSS_CATEGORIES};
use crate::time::{floor_to_day, floor_to_month};

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum TimeStep {
    /// The dataset's native granularity; no resampling.
    #[default]
    Hourly,
    Daily,
    Monthly,
}

/// One output row of the resampler: bucket sums for the continuous columns,
/// dominance-reduced validity codes, values rounded to one decimal place.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedReading {
    pub ts_utc: DateTime<Utc>,
    pub e_prod_kwh: f64,
    pub prod_valid_id: i32,
    pub loss_values: [f64; LOSS_CATEGORIES],
    pub loss_valid_ids: [i32; LOSS_CATEGORIES],
}

pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Resample a single plant's readings at the requested step.
///
/// Summation runs at full precision; the one-decimal rounding is applied to
/// every real-valued output as the final step. Empty input yields empty
/// output.
pub fn aggregate(rows: Vec<Reading>, step: TimeStep) -> Vec<AggregatedReading> {
    match step {
        TimeStep::Hourly => passthrough(rows),
        TimeStep::Daily => resample(rows, floor_to_day),
        TimeStep::Monthly => resample(rows, floor_to_month),
    }
}

fn passthrough(mut rows: Vec<Reading>) -> Vec<AggregatedReading> {
    rows.sort_by_key(|reading| reading.ts_utc);
    rows.into_iter()
        .map(|reading| AggregatedReading {
            ts_utc: reading.ts_utc,
            e_prod_kwh: round1(reading.e_prod_kwh),
            prod_valid_id: reading.prod_valid_id,
            loss_values: reading.loss_values.map(round1),
            loss_valid_ids: reading.loss_valid_ids,
        })
        .collect()
}

#[derive(Debug, Default)]
struct Bucket {
    e_prod_kwh: f64,
    prod_flagged: bool,
    loss_values: [f64; LOSS_CATEGORIES],
    loss_flagged: [bool; LOSS_CATEGORIES],
}

impl Bucket {
    fn fold(&mut self, reading: &Reading) {
        self.e_prod_kwh += reading.e_prod_kwh;
        self.prod_flagged |= reading.prod_valid_id == FLAG_FLAGGED;
        for k in 0..LOSS_CATEGORIES {
            self.loss_values[k] += reading.loss_values[k];
            self.loss_flagged[k] |= reading.loss_valid_ids[k] == FLAG_FLAGGED;
        }
    }

    fn finish(self, ts_utc: DateTime<Utc>) -> AggregatedReading {
        AggregatedReading {
            ts_utc,
            e_prod_kwh: round1(self.e_prod_kwh),
            prod_valid_id: reduce_flag(self.prod_flagged),
            loss_values: self.loss_values.map(round1),
            loss_valid_ids: self.loss_flagged.map(reduce_flag),
        }
    }
}

fn reduce_flag(flagged: bool) -> i32 {
    if flagged {
        FLAG_FLAGGED
    } else {
        FLAG_VALID
    }
}

fn resample(
    rows: Vec<Reading>,
    bucket_key: fn(DateTime<Utc>) -> DateTime<Utc>,
) -> Vec<AggregatedReading> {
    let mut buckets: BTreeMap<DateTime<Utc>, Bucket> = BTreeMap::new();
    for reading in &rows {
        buckets
            .entry(bucket_key(reading.ts_utc))
            .or_default()
            .fold(reading);
    }
    buckets
        .into_iter()
        .map(|(ts_utc, bucket)| bucket.finish(ts_utc))
        .collect()
}
