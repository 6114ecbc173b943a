use std::collections::HashMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::error::StoreError;
use crate::time::parse_date_utc;

pub const LOSS_CATEGORIES: usize = 6;

/// Validity codes carried verbatim from the dataset; 2 dominates 1 under
/// any reduction.
pub const FLAG_VALID: i32 = 1;
pub const FLAG_FLAGGED: i32 = 2;

pub const REQUIRED_COLUMNS: [&str; 17] = [
    "hpp_id",
    "hpp_name",
    "ts_utc",
    "E_prod_kWh",
    "prod_valid_id",
    "loss_value_1",
    "loss_value_2",
    "loss_value_3",
    "loss_value_4",
    "loss_value_5",
    "loss_value_6",
    "loss_valid_id_1",
    "loss_valid_id_2",
    "loss_valid_id_3",
    "loss_valid_id_4",
    "loss_valid_id_5",
    "loss_valid_id_6",
];

/// One timestamped observation of production and losses for one plant.
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    pub hpp_id: i64,
    pub hpp_name: String,
    pub ts_utc: DateTime<Utc>,
    pub e_prod_kwh: f64,
    pub prod_valid_id: i32,
    pub loss_values: [f64; LOSS_CATEGORIES],
    pub loss_valid_ids: [i32; LOSS_CATEGORIES],
}

/// Backing store for per-plant readings. Implementations build the full
/// table once in `load` and answer inclusive range queries afterwards;
/// `query` never mutates the table.
pub trait ReadingStore: Send + Sync {
    fn load(&mut self) -> Result<(), StoreError>;

    /// All readings for `hpp_id` with `start <= ts_utc <= end`, ascending by
    /// timestamp. Unknown plants and empty windows yield an empty Vec.
    fn query(
        &self,
        hpp_id: i64,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Reading>, StoreError>;
}

pub(crate) type PlantTable = HashMap<i64, Vec<Reading>>;

/// Inclusive range selection over a timestamp-sorted slice.
pub(crate) fn select_range(
    rows: &[Reading],
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Vec<Reading> {
    let lo = rows.partition_point(|reading| reading.ts_utc < start);
    let hi = rows.partition_point(|reading| reading.ts_utc <= end);
    if hi <= lo {
        return Vec::new();
    }
    rows[lo..hi].to_vec()
}

#[derive(Debug, Deserialize)]
struct CsvRow {
    hpp_id: i64,
    hpp_name: String,
    ts_utc: String,
    #[serde(rename = "E_prod_kWh")]
    e_prod_kwh: f64,
    prod_valid_id: i32,
    loss_value_1: f64,
    loss_value_2: f64,
    loss_value_3: f64,
    loss_value_4: f64,
    loss_value_5: f64,
    loss_value_6: f64,
    loss_valid_id_1: i32,
    loss_valid_id_2: i32,
    loss_valid_id_3: i32,
    loss_valid_id_4: i32,
    loss_valid_id_5: i32,
    loss_valid_id_6: i32,
}

impl CsvRow {
    fn into_reading(self, row: usize) -> Result<Reading, StoreError> {
        let ts_utc = parse_date_utc(&self.ts_utc).map_err(|_| StoreError::Schema {
            detail: format!("row {row}: unparseable ts_utc {:?}", self.ts_utc),
        })?;
        Ok(Reading {
            hpp_id: self.hpp_id,
            hpp_name: self.hpp_name,
            ts_utc,
            e_prod_kwh: self.e_prod_kwh,
            prod_valid_id: self.prod_valid_id,
            loss_values: [
                self.loss_value_1,
                self.loss_value_2,
                self.loss_value_3,
                self.loss_value_4,
                self.loss_value_5,
                self.loss_value_6,
            ],
            loss_valid_ids: [
                self.loss_valid_id_1,
                self.loss_valid_id_2,
                self.loss_valid_id_3,
                self.loss_valid_id_4,
                self.loss_valid_id_5,
                self.loss_valid_id_6,
            ],
        })
    }
}

/// CSV-backed store. The file may hold plants and timestamps in any order;
/// load sorts per plant so queries can binary-search the window bounds.
#[derive(Debug, Default)]
pub struct CsvReadingStore {
    csv_path: PathBuf,
    table: Option<PlantTable>,
}

impl CsvReadingStore {
    pub fn new(csv_path: impl Into<PathBuf>) -> Self {
        Self {
            csv_path: csv_path.into(),
            table: None,
        }
    }
}

impl ReadingStore for CsvReadingStore {
    fn load(&mut self) -> Result<(), StoreError> {
        if !self.csv_path.exists() {
            return Err(StoreError::DataUnavailable {
                path: self.csv_path.clone(),
            });
        }
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(&self.csv_path)
            .map_err(|_| StoreError::DataUnavailable {
                path: self.csv_path.clone(),
            })?;

        let headers = reader.headers().map_err(|err| StoreError::Schema {
            detail: format!("unreadable header row: {err}"),
        })?;
        let missing: Vec<&str> = REQUIRED_COLUMNS
            .iter()
            .copied()
            .filter(|required| !headers.iter().any(|column| column == *required))
            .collect();
        if !missing.is_empty() {
            return Err(StoreError::Schema {
                detail: format!("missing required columns: {}", missing.join(", ")),
            });
        }

        let mut table: PlantTable = HashMap::new();
        for (index, result) in reader.deserialize::<CsvRow>().enumerate() {
            let row = result.map_err(|err| StoreError::Schema {
                detail: format!("row {}: {err}", index + 1),
            })?;
            let reading = row.into_reading(index + 1)?;
            table.entry(reading.hpp_id).or_default().push(reading);
        }
        for rows in table.values_mut() {
            rows.sort_by_key(|reading| reading.ts_utc);
        }

        let row_count: usize = table.values().map(Vec::len).sum();
        tracing::info!(
            rows = row_count,
            plants = table.len(),
            path = %self.csv_path.display(),
            "loaded production dataset"
        );
        self.table = Some(table);
        Ok(())
    }

    fn query(
        &self,
        hpp_id: i64,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Reading>, StoreError> {
        let table = self.table.as_ref().ok_or(StoreError::NotInitialized)?;
        let Some(rows) = table.get(&hpp_id) else {
            return Ok(Vec::new());
        };
        Ok(select_range(rows, start, end))
    }
}
