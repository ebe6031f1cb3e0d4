// src/profile/validators.rs

use reqwest::Url;

use super::models::*;
use crate::common::{ValidationResult, Validator};

pub const DISPLAY_NAME_MIN_CHARS: usize = 2;
pub const DISPLAY_NAME_MAX_CHARS: usize = 50;
pub const BIO_MAX_CHARS: usize = 200;

// ============================================================================
// Profile Validators
// ============================================================================

pub struct ProfileValidator;

impl Validator<ProfileUpdate> for ProfileValidator {
    fn validate(&self, data: &ProfileUpdate) -> ValidationResult {
        let mut result = ValidationResult::new();

        if let Some(name) = data.display_name.as_set() {
            let len = name.chars().count();
            if len < DISPLAY_NAME_MIN_CHARS {
                result.add_error(
                    ProfileField::DisplayName.as_str(),
                    "Display name must be at least 2 characters",
                );
            } else if len > DISPLAY_NAME_MAX_CHARS {
                result.add_error(
                    ProfileField::DisplayName.as_str(),
                    "Display name must be at most 50 characters",
                );
            }
        }

        if let Some(bio) = data.bio.as_set() {
            if bio.chars().count() > BIO_MAX_CHARS {
                result.add_error(
                    ProfileField::Bio.as_str(),
                    "Bio is too long (max 200 characters)",
                );
            }
        }

        if let Some(url) = data.avatar_url.as_set() {
            if let Err(message) = validate_avatar_url(url) {
                result.add_error(ProfileField::AvatarUrl.as_str(), message);
            }
        }

        result
    }
}

impl Validator<ProfileForm> for ProfileValidator {
    fn validate(&self, data: &ProfileForm) -> ValidationResult {
        self.validate(&form_to_update(data))
    }
}

/// Turns raw form input into a full update, or the per-field errors.
/// Inputs are trimmed; an empty input clears the field.
pub fn parse_profile_form(form: &ProfileForm) -> Result<ProfileUpdate, ValidationResult> {
    let update = form_to_update(form);
    ProfileValidator.validate(&update).into_result(update)
}

fn form_to_update(form: &ProfileForm) -> ProfileUpdate {
    ProfileUpdate {
        display_name: normalize(&form.display_name),
        bio: normalize(&form.bio),
        avatar_url: normalize(&form.avatar_url),
    }
}

fn normalize(raw: &str) -> Patch<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        Patch::Clear
    } else {
        Patch::Set(trimmed.to_string())
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Accepts absolute http(s) URLs with a host
pub fn validate_avatar_url(url: &str) -> Result<(), &'static str> {
    const MESSAGE: &str = "Enter a valid avatar URL";

    let parsed = Url::parse(url).map_err(|_| MESSAGE)?;
    if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
        return Err(MESSAGE);
    }

    Ok(())
}
