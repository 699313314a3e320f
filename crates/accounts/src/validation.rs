//! Input validation for new-account submissions.
//!
//! The server validates [`RegistrationRequest`]; the client form additionally
//! collects a confirmation field and validates a [`RegistrationForm`] first.
//! Checks run in a fixed order and stop at the first failure.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MIN_PASSWORD_LENGTH: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("All fields are required")]
    MissingFields,

    #[error("Passwords do not match")]
    PasswordMismatch,

    #[error("Password must be at least 6 characters long")]
    PasswordTooShort,

    /// Reported by a remote registration endpoint; carries its message.
    #[error("{0}")]
    Rejected(String),
}

#[derive(Clone, Default, Serialize, Deserialize)]
pub struct RegistrationRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl RegistrationRequest {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            password: password.into(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_fields(&self.name, &self.email, &self.password)?;
        require_password_length(&self.password)
    }
}

impl std::fmt::Debug for RegistrationRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistrationRequest")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// What the registration view collects before anything is sent.
#[derive(Clone, Default)]
pub struct RegistrationForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

impl RegistrationForm {
    pub fn validate(&self) -> Result<RegistrationRequest, ValidationError> {
        require_fields(&self.name, &self.email, &self.password)?;

        if self.password != self.confirm_password {
            return Err(ValidationError::PasswordMismatch);
        }

        require_password_length(&self.password)?;

        Ok(RegistrationRequest::new(
            self.name.clone(),
            self.email.clone(),
            self.password.clone(),
        ))
    }
}

impl std::fmt::Debug for RegistrationForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistrationForm")
            .field("name", &self.name)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

// Name and email are trimmed before the emptiness check; passwords are taken as typed.
fn require_fields(name: &str, email: &str, password: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() || email.trim().is_empty() || password.is_empty() {
        return Err(ValidationError::MissingFields);
    }
    Ok(())
}

fn require_password_length(password: &str) -> Result<(), ValidationError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ValidationError::PasswordTooShort);
    }
    Ok(())
}
