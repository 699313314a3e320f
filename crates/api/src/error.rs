use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use launchpad_accounts::RegistrationError;
use launchpad_auth::AuthError;
use serde::Serialize;
use tracing::{debug, error};
use utoipa::ToSchema;

const INTERNAL_MESSAGE: &str = "internal server error";

/// Body of every error response.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorResponse {
            error: self.message,
        });
        (self.status, body).into_response()
    }
}

impl From<RegistrationError> for ApiError {
    fn from(error: RegistrationError) -> Self {
        let status = match &error {
            RegistrationError::Validation(_) => StatusCode::BAD_REQUEST,
            RegistrationError::Conflict => StatusCode::CONFLICT,
            RegistrationError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        // Internal causes were already logged by the handler.
        debug!(kind = error.kind(), "registration request failed");
        Self::new(status, error.user_message())
    }
}

impl From<AuthError> for ApiError {
    fn from(error: AuthError) -> Self {
        let status = match error {
            AuthError::InvalidCredentials
            | AuthError::SessionNotFound
            | AuthError::SessionExpired
            | AuthError::InvalidSession => StatusCode::UNAUTHORIZED,
            AuthError::UnknownProvider(_) => StatusCode::NOT_FOUND,
            AuthError::ProviderDisabled(_) => StatusCode::SERVICE_UNAVAILABLE,
            AuthError::MissingOAuthEmail => StatusCode::BAD_REQUEST,
            AuthError::OAuth(_) => StatusCode::BAD_GATEWAY,
            AuthError::TokenSigning(_) | AuthError::Database(_) | AuthError::Password(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        if status.is_server_error() {
            error!(error = ?error, "auth error");
        } else {
            debug!(%error, "auth request rejected");
        }

        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            INTERNAL_MESSAGE.to_string()
        } else {
            error.to_string()
        };
        Self::new(status, message)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        debug!(%rejection, "rejected request body");
        Self::bad_request(rejection.body_text())
    }
}
