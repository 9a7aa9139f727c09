//! Gateway errors and their HTTP mapping

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use dispatcher::DispatchError;

/// Failures surfaced to HTTP clients
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Body was not the expected JSON array
    #[error("{0}")]
    Decode(#[from] serde_json::Error),

    /// Dispatcher refusal or processor failure
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

impl GatewayError {
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::Decode(_) => StatusCode::BAD_REQUEST,
            GatewayError::Dispatch(e) if e.is_overload() => StatusCode::TOO_MANY_REQUESTS,
            GatewayError::Dispatch(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        (self.status(), self.to_string()).into_response()
    }
}
