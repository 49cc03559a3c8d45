use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use fueleu_compliance::ComplianceError;
use fueleu_infra::EngineError;

pub fn engine_error_to_response(err: EngineError) -> axum::response::Response {
    match err {
        EngineError::Compliance(e) => compliance_error_to_response(e),
        EngineError::Store(e) => json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "store_error",
            e.to_string(),
        ),
    }
}

fn compliance_error_to_response(err: ComplianceError) -> axum::response::Response {
    let code = err.code();
    let message = err.to_string();
    match err {
        ComplianceError::NotFound(_) => json_error(StatusCode::NOT_FOUND, code, message),
        ComplianceError::PoolInfeasible {
            total_sum_cb,
            members,
        } => (
            StatusCode::BAD_REQUEST,
            axum::Json(json!({
                "error": code,
                "message": message,
                "totalSumCB": total_sum_cb,
                "members": members,
            })),
        )
            .into_response(),
        ComplianceError::AllocationShortfall { .. } => {
            json_error(StatusCode::INTERNAL_SERVER_ERROR, code, message)
        }
        ComplianceError::Validation(_)
        | ComplianceError::Deficit { .. }
        | ComplianceError::ExceedsSurplus { .. }
        | ComplianceError::ExceedsAvailable { .. }
        | ComplianceError::InvalidMembers { .. }
        | ComplianceError::DonorOverdrawn { .. } => json_error(StatusCode::BAD_REQUEST, code, message),
    }
}

pub fn validation_error(message: impl Into<String>) -> axum::response::Response {
    json_error(StatusCode::BAD_REQUEST, "validation_error", message)
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
