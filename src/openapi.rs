use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "HPP Production API",
        description = "Time-windowed production and loss series per hydropower plant"
    ),
    paths(
        crate::routes::health::healthz_handler,
        crate::routes::kwh::get_kwh_main,
        crate::routes::kwh::get_kwh_cmpr,
    ),
    components(schemas(
        crate::aggregate::TimeStep,
        crate::error::ErrorBody,
        crate::routes::health::HealthResponse,
        crate::routes::kwh::KwhPoint,
        crate::routes::kwh::KwhResponse,
        crate::routes::kwh::CmprPoint,
        crate::routes::kwh::CmprResponse,
    )),
    tags((name = "kwh", description = "Production and loss series"))
)]
pub struct ApiDoc;

pub fn openapi_json() -> serde_json::Value {
    serde_json::to_value(ApiDoc::openapi()).unwrap_or_default()
}

async fn openapi_handler() -> Json<serde_json::Value> {
    Json(openapi_json())
}

pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(openapi_handler))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_both_series_endpoints() {
        let doc = openapi_json();
        let paths = doc["paths"].as_object().expect("paths");
        assert!(paths.contains_key("/api/v1/kwh_main"));
        assert!(paths.contains_key("/api/v1/kwh_cmpr"));
        assert!(paths.contains_key("/healthz"));
    }
}
