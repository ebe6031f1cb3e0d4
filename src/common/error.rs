// Error handling types for the client core

use std::fmt;

use super::validation::ValidationResult;
use crate::services::ProviderError;

/// Client error types
#[derive(Debug)]
pub enum AppError {
    /// An operation needed a signed-in identity and there was none
    Unauthenticated,
    Validation(ValidationResult),
    Provider(ProviderError),
    /// The profile row could not be read. Kept apart from "no row yet".
    ProfileLookup(ProviderError),
    NotFound(String),
    InvalidUpload(String),
    /// The same guarded operation is already in flight
    Busy(&'static str),
    Config(String),
}

impl AppError {
    /// Short, user-facing text for toasts
    pub fn user_message(&self) -> String {
        match self {
            AppError::Unauthenticated => "You need to be signed in.".to_string(),
            AppError::Validation(result) => result.to_string(),
            AppError::Provider(e) | AppError::ProfileLookup(e) => e.user_message(),
            AppError::NotFound(msg) => msg.clone(),
            AppError::InvalidUpload(msg) => msg.clone(),
            AppError::Busy(what) => format!("Please wait, {} is still in progress.", what),
            AppError::Config(msg) => msg.clone(),
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Unauthenticated => write!(f, "Unauthenticated: user not authenticated"),
            AppError::Validation(result) => write!(f, "Validation Error: {}", result),
            AppError::Provider(e) => write!(f, "Provider Error: {}", e),
            AppError::ProfileLookup(e) => write!(f, "Profile Lookup Error: {}", e),
            AppError::NotFound(msg) => write!(f, "Not Found: {}", msg),
            AppError::InvalidUpload(msg) => write!(f, "Invalid Upload: {}", msg),
            AppError::Busy(what) => write!(f, "Busy: {} already in progress", what),
            AppError::Config(msg) => write!(f, "Configuration Error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Provider(e) | AppError::ProfileLookup(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ProviderError> for AppError {
    fn from(e: ProviderError) -> Self {
        AppError::Provider(e)
    }
}

/// Helper conversion from a failed ValidationResult
impl From<ValidationResult> for AppError {
    fn from(result: ValidationResult) -> Self {
        AppError::Validation(result)
    }
}
