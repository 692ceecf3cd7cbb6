//! Mapping shop outcomes onto HTTP responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::error::ShopError;
use crate::shop::{ErrorBody, Report, ResponseStatus};

impl From<ResponseStatus> for StatusCode {
    fn from(status: ResponseStatus) -> Self {
        match status {
            ResponseStatus::Ok => StatusCode::OK,
            ResponseStatus::Created => StatusCode::CREATED,
            ResponseStatus::PaymentRequired => StatusCode::PAYMENT_REQUIRED,
            ResponseStatus::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Report {
    fn into_response(self) -> Response {
        (StatusCode::from(self.status), Json(self.body)).into_response()
    }
}

/// Faults always surface as a 500 with the error message as body.
impl IntoResponse for ShopError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self, "Request failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorBody::new(self.to_string())),
        )
            .into_response()
    }
}
