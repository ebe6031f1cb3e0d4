// Common validation types and traits

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<ValidationError>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self {
            is_valid: true,
            errors: Vec::new(),
        }
    }

    pub fn add_error(&mut self, field: &str, message: &str) {
        self.is_valid = false;
        self.errors.push(ValidationError {
            field: field.to_string(),
            message: message.to_string(),
        });
    }

    /// Messages recorded against a single field, in insertion order
    pub fn messages_for(&self, field: &str) -> Vec<&str> {
        self.errors
            .iter()
            .filter(|e| e.field == field)
            .map(|e| e.message.as_str())
            .collect()
    }

    /// Hands back `value` when no errors were recorded
    pub fn into_result<T>(self, value: T) -> Result<T, ValidationResult> {
        if self.is_valid {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ValidationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<String> = self
            .errors
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect();
        write!(f, "{}", messages.join(", "))
    }
}

pub trait Validator<T> {
    fn validate(&self, data: &T) -> ValidationResult;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_result_is_valid() {
        let result = ValidationResult::new();
        assert!(result.is_valid);
        assert!(result.errors.is_empty());
        assert_eq!(result.into_result(7), Ok(7));
    }

    #[test]
    fn test_messages_for_keeps_insertion_order() {
        let mut first = ValidationResult::new();
        first.add_error("bio", "Bio is too long");
        first.add_error("avatar_url", "Avatar URL is invalid");
        first.add_error("bio", "Bio contains a null byte");

        assert!(!first.is_valid);
        assert_eq!(first.errors.len(), 3);
        assert_eq!(
            first.messages_for("bio"),
            vec!["Bio is too long", "Bio contains a null byte"]
        );
    }

    #[test]
    fn test_display_joins_field_messages() {
        let mut result = ValidationResult::new();
        result.add_error("display_name", "too short");
        result.add_error("bio", "too long");

        assert_eq!(result.to_string(), "display_name: too short, bio: too long");
    }
}
