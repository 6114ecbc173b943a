use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};

use crate::aggregate::{AggregatedReading, TimeStep};
use crate::compare::ComparisonPoint;
use crate::error::ApiResult;
use crate::query::{comparison_series, production_series, QueryWindow};
use crate::state::AppState;
use crate::time::format_ts_utc;

#[derive(Debug, Clone, serde::Deserialize, utoipa::IntoParams)]
pub(crate) struct KwhQuery {
    /// Hydropower plant id.
    hpp_id: i64,
    /// Inclusive UTC window start, e.g. 2025-02-01 or 2025-02-01T00:00:00Z.
    start_date: String,
    /// Inclusive UTC window end.
    end_date: String,
    /// Output resolution; `hourly` keeps the dataset's native granularity.
    #[serde(default)]
    time_step: TimeStep,
}

#[derive(Debug, Clone, serde::Serialize, utoipa::ToSchema)]
pub(crate) struct KwhPoint {
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

impl From<AggregatedReading> for KwhPoint {
    fn from(row: AggregatedReading) -> Self {
        let [loss_value_1, loss_value_2, loss_value_3, loss_value_4, loss_value_5, loss_value_6] =
            row.loss_values;
        let [loss_valid_id_1, loss_valid_id_2, loss_valid_id_3, loss_valid_id_4, loss_valid_id_5, loss_valid_id_6] =
            row.loss_valid_ids;
        Self {
            ts_utc: format_ts_utc(row.ts_utc),
            e_prod_kwh: row.e_prod_kwh,
            prod_valid_id: row.prod_valid_id,
            loss_value_1,
            loss_value_2,
            loss_value_3,
            loss_value_4,
            loss_value_5,
            loss_value_6,
            loss_valid_id_1,
            loss_valid_id_2,
            loss_valid_id_3,
            loss_valid_id_4,
            loss_valid_id_5,
            loss_valid_id_6,
        }
    }
}

#[derive(Debug, Clone, serde::Serialize, utoipa::ToSchema)]
pub(crate) struct KwhResponse {
    hpp_id: i64,
    step: TimeStep,
    data: Vec<KwhPoint>,
}

#[derive(Debug, Clone, serde::Serialize, utoipa::ToSchema)]
pub(crate) struct CmprPoint {
    ts_utc: String,
    #[serde(rename = "E_prod_kWh")]
    e_prod_kwh: f64,
    prod_valid_id: i32,
    loss_value_agg: f64,
    loss_valid_id: i32,
    cmpr_hpp_id: i64,
}

impl From<ComparisonPoint> for CmprPoint {
    fn from(point: ComparisonPoint) -> Self {
        Self {
            ts_utc: format_ts_utc(point.ts_utc),
            e_prod_kwh: point.e_prod_kwh,
            prod_valid_id: point.prod_valid_id,
            loss_value_agg: point.loss_value_agg,
            loss_valid_id: point.loss_valid_id,
            cmpr_hpp_id: point.cmpr_hpp_id,
        }
    }
}

#[derive(Debug, Clone, serde::Serialize, utoipa::ToSchema)]
pub(crate) struct CmprResponse {
    hpp_id: i64,
    step: TimeStep,
    data: Vec<CmprPoint>,
}

#[utoipa::path(
    get,
    path = "/api/v1/kwh_main",
    tag = "kwh",
    params(KwhQuery),
    responses(
        (status = 200, description = "Production and loss series for a plant", body = KwhResponse),
        (status = 400, description = "Invalid date or inverted window", body = crate::error::ErrorBody),
        (status = 500, description = "Data not initialized", body = crate::error::ErrorBody)
    )
)]
pub(crate) async fn get_kwh_main(
    State(state): State<AppState>,
    Query(query): Query<KwhQuery>,
) -> ApiResult<Json<KwhResponse>> {
    let window = QueryWindow::parse(&query.start_date, &query.end_date)?;
    let series = production_series(state.store.as_ref(), query.hpp_id, window, query.time_step)?;
    Ok(Json(KwhResponse {
        hpp_id: query.hpp_id,
        step: query.time_step,
        data: series.into_iter().map(KwhPoint::from).collect(),
    }))
}

#[utoipa::path(
    get,
    path = "/api/v1/kwh_cmpr",
    tag = "kwh",
    params(KwhQuery),
    responses(
        (status = 200, description = "Merged comparator series", body = CmprResponse),
        (status = 400, description = "Invalid date or inverted window", body = crate::error::ErrorBody),
        (status = 500, description = "Data not initialized", body = crate::error::ErrorBody)
    )
)]
pub(crate) async fn get_kwh_cmpr(
    State(state): State<AppState>,
    Query(query): Query<KwhQuery>,
) -> ApiResult<Json<CmprResponse>> {
    let window = QueryWindow::parse(&query.start_date, &query.end_date)?;
    let merged = comparison_series(state.store.as_ref(), query.hpp_id, window, query.time_step)?;
    Ok(Json(CmprResponse {
        hpp_id: query.hpp_id,
        step: query.time_step,
        data: merged.into_iter().map(CmprPoint::from).collect(),
    }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/kwh_main", get(get_kwh_main))
        .route("/kwh_cmpr", get(get_kwh_cmpr))
}
