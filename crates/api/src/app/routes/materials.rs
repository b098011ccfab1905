use std::ops::Bound;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use chrono::{Duration, Utc};
use serde_json::json;

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::config::MAX_WINDOW_DAYS;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_materials))
        .route("/:name/forecast", get(forecast))
        .route("/:name/series", get(series))
        .route("/:name/transactions", get(transactions))
}

/// Preset catalog first, then every other material seen in the ledger.
pub async fn list_materials(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    let known = match services
        .session()
        .read(|ledger| ledger.materials().map(|m| m.to_string()).collect::<Vec<_>>())
    {
        Ok(known) => known,
        Err(e) => return errors::session_error_to_response(e),
    };

    let mut materials = services.config().material_catalog.clone();
    for name in known {
        if !materials.contains(&name) {
            materials.push(name);
        }
    }

    (StatusCode::OK, Json(json!({ "materials": materials }))).into_response()
}

pub async fn forecast(
    Extension(services): Extension<Arc<AppServices>>,
    Path(name): Path<String>,
    Query(query): Query<dto::ForecastQuery>,
) -> axum::response::Response {
    let window_days = query
        .window_days
        .unwrap_or(services.config().forecast_window_days);
    if !(1..=MAX_WINDOW_DAYS).contains(&window_days) {
        return errors::json_error(
            StatusCode::BAD_REQUEST,
            "invalid_input",
            format!("window_days must be between 1 and {MAX_WINDOW_DAYS}"),
        );
    }

    let window = Duration::days(window_days);
    let now = query.as_of.unwrap_or_else(Utc::now);

    let result = services.session().forecast(|f| {
        (
            f.consumption_rate(&name, now, window),
            f.project_depletion(&name, now, window),
        )
    });

    match result {
        Ok((rate, depletion)) => (
            StatusCode::OK,
            Json(json!({
                "material": name,
                "as_of": now,
                "window_days": window_days,
                "consumption_rate": rate,
                "depletion": depletion,
                "depletion_display": depletion.to_string(),
            })),
        )
            .into_response(),
        Err(e) => errors::session_error_to_response(e),
    }
}

pub async fn series(
    Extension(services): Extension<Arc<AppServices>>,
    Path(name): Path<String>,
) -> axum::response::Response {
    match services.session().forecast(|f| f.stock_time_series(&name)) {
        Ok(points) => (
            StatusCode::OK,
            Json(json!({
                "material": name,
                "points": points.iter().map(dto::point_to_json).collect::<Vec<_>>(),
            })),
        )
            .into_response(),
        Err(e) => errors::session_error_to_response(e),
    }
}

pub async fn transactions(
    Extension(services): Extension<Arc<AppServices>>,
    Path(name): Path<String>,
    Query(query): Query<dto::TransactionsQuery>,
) -> axum::response::Response {
    let lower = query.since.map_or(Bound::Unbounded, Bound::Included);
    let upper = query.until.map_or(Bound::Unbounded, Bound::Included);

    let result = services.session().read(|ledger| {
        ledger
            .transactions_for(&name, (lower, upper))
            .into_iter()
            .map(dto::transaction_to_json)
            .collect::<Vec<_>>()
    });

    match result {
        Ok(txs) => (
            StatusCode::OK,
            Json(json!({
                "material": name,
                "count": txs.len(),
                "transactions": txs,
            })),
        )
            .into_response(),
        Err(e) => errors::session_error_to_response(e),
    }
}
