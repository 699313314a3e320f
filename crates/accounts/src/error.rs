//! Registration outcome errors.

use thiserror::Error;

use crate::validation::ValidationError;

/// Shown to users whenever registration fails for a reason they cannot fix.
pub const GENERIC_FAILURE_MESSAGE: &str = "An error occurred during registration";

#[derive(Debug, Error)]
pub enum RegistrationError {
    /// Client input problem, safe to show verbatim.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("User with this email already exists")]
    Conflict,

    /// Store or auth layer failure. The detail is for logs only.
    #[error("registration failed: {0}")]
    Internal(String),
}

impl RegistrationError {
    pub fn internal(detail: impl Into<String>) -> Self {
        Self::Internal(detail.into())
    }

    /// Message suitable for inline display next to the form.
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(error) => error.to_string(),
            Self::Conflict => self.to_string(),
            Self::Internal(_) => GENERIC_FAILURE_MESSAGE.to_string(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::Conflict => "conflict",
            Self::Internal(_) => "internal",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn internal_errors_hide_their_detail_from_users() {
        let error = RegistrationError::internal("database is locked");
        assert_eq!(error.user_message(), GENERIC_FAILURE_MESSAGE);
        assert!(error.to_string().contains("database is locked"));
    }

    #[test]
    fn validation_errors_surface_verbatim() {
        let error = RegistrationError::from(ValidationError::PasswordTooShort);
        assert_eq!(
            error.user_message(),
            "Password must be at least 6 characters long"
        );
        assert_eq!(error.kind(), "validation");
    }

    #[test]
    fn conflict_has_a_specific_message() {
        assert_eq!(
            RegistrationError::Conflict.user_message(),
            "User with this email already exists"
        );
    }
}
