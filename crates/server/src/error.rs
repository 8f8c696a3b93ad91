use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use spendlens_core::transaction::LedgerError;
use spendlens_import::ImportError;
use spendlens_storage::StorageError;
use thiserror::Error;

/// Envelope for every JSON response.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

impl ApiResponse<()> {
    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

pub type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

pub fn ok<T>(data: T) -> ApiResult<T> {
    Ok(Json(ApiResponse::ok(data)))
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Import(#[from] ImportError),
    #[error("{0}")]
    BadRequest(String),
    #[error("Web lookups are disabled")]
    LookupDisabled,
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Storage(StorageError::Ledger(e)) => match e {
                LedgerError::TransactionNotFound(_) | LedgerError::TransferPairNotFound(_) => StatusCode::NOT_FOUND,
                LedgerError::SelfTransfer(_) | LedgerError::AlreadyPaired(_) => StatusCode::CONFLICT,
            },
            ApiError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Import(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::LookupDisabled => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() && !matches!(self, ApiError::LookupDisabled) {
            tracing::error!(error = %self, "request failed");
        }
        (status, Json(ApiResponse::err(self.to_string()))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ledger_errors_map_to_client_statuses() {
        let not_found = ApiError::from(StorageError::from(LedgerError::TransactionNotFound("x".into())));
        assert_eq!(not_found.status(), StatusCode::NOT_FOUND);
        let conflict = ApiError::from(StorageError::from(LedgerError::AlreadyPaired("x".into())));
        assert_eq!(conflict.status(), StatusCode::CONFLICT);
        assert_eq!(ApiError::LookupDisabled.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn error_envelope_omits_data() {
        let json = serde_json::to_value(ApiResponse::err("boom")).unwrap();
        assert_eq!(json, serde_json::json!({"success": false, "error": "boom"}));
    }
}
