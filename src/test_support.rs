use std::collections::HashMap;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};

use crate::config::AppConfig;
use crate::error::StoreError;
use crate::state::AppState;
use crate::store::{
    select_range, CsvReadingStore, PlantTable, Reading, ReadingStore, FLAG_FLAGGED, FLAG_VALID,
    LOSS_CATEGORIES, REQUIRED_COLUMNS,
};
use crate::time::format_ts_utc;

pub fn ts(year: i32, month: u32, day: u32, hour: u32, min: u32, sec: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, min, sec)
        .single()
        .expect("fixture timestamp")
}

pub fn reading(
    hpp_id: i64,
    ts_utc: DateTime<Utc>,
    e_prod_kwh: f64,
    prod_valid_id: i32,
) -> Reading {
    Reading {
        hpp_id,
        hpp_name: format!("Plant {hpp_id}"),
        ts_utc,
        e_prod_kwh,
        prod_valid_id,
        loss_values: [0.0; LOSS_CATEGORIES],
        loss_valid_ids: [FLAG_VALID; LOSS_CATEGORIES],
    }
}

/// Five-plant fixture. Plant 3 carries the two-reading day used by the
/// daily-aggregation assertions plus a March reading for monthly tests;
/// plant 5 has no rows at all. Rows are deliberately not time-ordered.
pub fn fixture_readings() -> Vec<Reading> {
    let mut rows = Vec::new();

    for (hour, energy) in [(0, 5.0), (1, 6.0), (2, 7.0)] {
        let mut row = reading(1, ts(2025, 2, 1, hour, 0, 0), energy, FLAG_VALID);
        row.loss_values = [0.5; LOSS_CATEGORIES];
        rows.push(row);
    }

    for (hour, energy) in [(0, 1.0), (1, 2.0)] {
        let mut row = reading(2, ts(2025, 2, 1, hour, 0, 0), energy, FLAG_VALID);
        row.loss_values = [0.2; LOSS_CATEGORIES];
        rows.push(row);
    }

    let mut march = reading(3, ts(2025, 3, 1, 0, 0, 0), 3.3, FLAG_VALID);
    march.loss_values[0] = 0.2;
    rows.push(march);

    let mut flagged = reading(3, ts(2025, 2, 1, 1, 0, 0), 12.5, FLAG_FLAGGED);
    flagged.loss_values[0] = 2.0;
    flagged.loss_valid_ids[0] = FLAG_FLAGGED;
    rows.push(flagged);

    let mut clean = reading(3, ts(2025, 2, 1, 0, 0, 0), 10.0, FLAG_VALID);
    clean.loss_values[0] = 1.0;
    rows.push(clean);

    let mut delta = reading(4, ts(2025, 2, 2, 5, 0, 0), 8.0, FLAG_VALID);
    delta.loss_values[0] = 0.5;
    rows.push(delta);

    rows
}

fn csv_line(row: &Reading) -> String {
    let mut line = format!(
        "{},{},{},{},{}",
        row.hpp_id,
        row.hpp_name,
        format_ts_utc(row.ts_utc),
        row.e_prod_kwh,
        row.prod_valid_id
    );
    for value in row.loss_values {
        let _ = write!(line, ",{value}");
    }
    for flag in row.loss_valid_ids {
        let _ = write!(line, ",{flag}");
    }
    line.push('\n');
    line
}

pub fn fixture_csv() -> String {
    let mut out = REQUIRED_COLUMNS.join(",");
    out.push('\n');
    for row in &fixture_readings() {
        out.push_str(&csv_line(row));
    }
    out
}

pub fn write_fixture_csv(dir: &Path) -> PathBuf {
    let path = dir.join("kwh_fixture.csv");
    std::fs::write(&path, fixture_csv()).expect("write fixture csv");
    path
}

pub fn test_state() -> AppState {
    let dir = tempfile::tempdir().expect("tempdir").keep();
    let csv_path = write_fixture_csv(&dir);
    let mut store = CsvReadingStore::new(csv_path.clone());
    store.load().expect("load fixture");
    AppState {
        config: AppConfig { csv_path },
        store: Arc::new(store),
    }
}

/// In-memory fixture implementation of the store contract.
#[derive(Debug, Default)]
pub struct MemoryStore {
    rows: Vec<Reading>,
    table: Option<PlantTable>,
}

impl MemoryStore {
    pub fn new(rows: Vec<Reading>) -> Self {
        Self { rows, table: None }
    }
}

impl ReadingStore for MemoryStore {
    fn load(&mut self) -> Result<(), StoreError> {
        let mut table: PlantTable = HashMap::new();
        for reading in self.rows.drain(..) {
            table.entry(reading.hpp_id).or_default().push(reading);
        }
        for rows in table.values_mut() {
            rows.sort_by_key(|reading| reading.ts_utc);
        }
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
