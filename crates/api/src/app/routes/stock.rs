use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::Utc;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/deliveries", post(record_delivery))
        .route("/withdrawals", post(record_withdrawal))
        .route("/stock", get(stock_overview))
}

pub async fn record_delivery(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::DeliveryRequest>,
) -> axum::response::Response {
    let now = body.occurred_at.unwrap_or_else(Utc::now);
    let threshold = body.threshold.unwrap_or(services.config().default_threshold);

    match services
        .session()
        .record_delivery(&body.material, body.quantity, threshold, now)
    {
        Ok(record) => (StatusCode::CREATED, Json(dto::record_to_json(&record))).into_response(),
        Err(e) => errors::session_error_to_response(e),
    }
}

pub async fn record_withdrawal(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::WithdrawalRequest>,
) -> axum::response::Response {
    let now = body.occurred_at.unwrap_or_else(Utc::now);

    match services
        .session()
        .record_withdrawal(&body.material, body.quantity, now)
    {
        Ok(record) => (StatusCode::OK, Json(dto::record_to_json(&record))).into_response(),
        Err(e) => errors::session_error_to_response(e),
    }
}

pub async fn stock_overview(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::StockQuery>,
) -> axum::response::Response {
    let now = query.as_of.unwrap_or_else(Utc::now);

    match services.session().forecast(|f| f.overview(now)) {
        Ok(rows) => {
            let materials = match rows
                .iter()
                .map(dto::overview_to_json)
                .collect::<Result<Vec<_>, _>>()
            {
                Ok(materials) => materials,
                Err(e) => return errors::serialization_error_to_response(e),
            };

            (
                StatusCode::OK,
                Json(serde_json::json!({
                    "as_of": now,
                    "window_days": services.config().forecast_window_days,
                    "count": materials.len(),
                    "materials": materials,
                })),
            )
                .into_response()
        }
        Err(e) => errors::session_error_to_response(e),
    }
}
