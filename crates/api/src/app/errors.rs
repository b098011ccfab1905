use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use stockwatch_core::DomainError;
use stockwatch_inventory::SessionError;

pub fn session_error_to_response(err: SessionError) -> axum::response::Response {
    match err {
        SessionError::Domain(e) => domain_error_to_response(e),
        SessionError::Poisoned => json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal_error",
            "ledger unavailable",
        ),
    }
}

pub fn serialization_error_to_response(err: serde_json::Error) -> axum::response::Response {
    tracing::error!(error = %err, "failed to serialize response body");
    json_error(
        StatusCode::INTERNAL_SERVER_ERROR,
        "internal_error",
        "failed to serialize response",
    )
}

pub fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    let status = match &err {
        DomainError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        DomainError::UnknownMaterial(_) => StatusCode::NOT_FOUND,
        DomainError::InsufficientStock { .. } => StatusCode::CONFLICT,
    };
    json_error(status, err.code(), err.to_string())
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialization_failure_is_an_internal_error() {
        let err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let res = serialization_error_to_response(err);
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn domain_errors_map_to_client_statuses() {
        let res = domain_error_to_response(DomainError::invalid_input("bad"));
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let res = domain_error_to_response(DomainError::unknown_material("Sand".into()));
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }
}
