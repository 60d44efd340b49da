use axum::{http::StatusCode, response::{IntoResponse, Response}, Json};
use serde_json::json;
use crate::checkout::CheckoutError;

/// Error returned by handlers. The message is what the caller sees; causes
/// are logged where they happen.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Upstream(String),
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Upstream(_) => StatusCode::BAD_GATEWAY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<CheckoutError> for ApiError {
    fn from(e: CheckoutError) -> Self {
        if e.is_validation() { Self::BadRequest(e.user_message()) } else { Self::Upstream(e.user_message()) }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(e: validator::ValidationErrors) -> Self { Self::BadRequest(e.to_string()) }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payments::GatewayError;

    #[test]
    fn test_checkout_errors_map_to_status() {
        let validation: ApiError = CheckoutError::MissingPrice.into();
        assert_eq!(validation.status(), StatusCode::BAD_REQUEST);
        assert_eq!(validation.to_string(), "Some items do not have a price");

        let upstream: ApiError = CheckoutError::Gateway(GatewayError::Incomplete("session url")).into();
        assert_eq!(upstream.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(upstream.to_string(), crate::checkout::GENERIC_CHECKOUT_ERROR);
    }
}
