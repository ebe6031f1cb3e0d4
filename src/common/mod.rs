// Common module - shared types and utilities across all modules

pub mod config;
pub mod dev_mode;
pub mod error;
pub mod helpers;
pub mod notification;
pub mod validation;

// Re-export commonly used types for convenience
pub use config::AppConfig;
pub use error::AppError;
pub use helpers::{format_count_pt_br, initial_of, safe_email_log};
pub use notification::{Notification, NotificationVariant, Toaster};
pub use validation::{ValidationError, ValidationResult, Validator};
