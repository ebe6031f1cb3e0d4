// src/profile/avatar.rs

use chrono::{DateTime, Utc};
use infer::Infer;

use crate::common::AppError;

/// File size limit: 5MB
pub const MAX_AVATAR_BYTES: usize = 5 * 1024 * 1024;

/// Sniffed type of an accepted avatar image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AvatarImage {
    pub mime_type: &'static str,
    pub extension: &'static str,
}

/// Checks size and magic bytes. The file name is never trusted for the type.
pub fn inspect_image(data: &[u8]) -> Result<AvatarImage, AppError> {
    if data.is_empty() {
        return Err(AppError::InvalidUpload("The selected file is empty".to_string()));
    }

    if data.len() > MAX_AVATAR_BYTES {
        return Err(AppError::InvalidUpload(
            "File size exceeds 5MB limit".to_string(),
        ));
    }

    let info = Infer::new().get(data).ok_or_else(invalid_type)?;
    let extension = match info.mime_type() {
        "image/jpeg" | "image/jpg" => "jpg",
        "image/png" => "png",
        "image/gif" => "gif",
        "image/webp" => "webp",
        _ => return Err(invalid_type()),
    };

    Ok(AvatarImage {
        mime_type: info.mime_type(),
        extension,
    })
}

/// `{user_id}/{unix_millis}.{ext}` inside the avatar bucket
pub fn avatar_object_path(user_id: &str, uploaded_at: DateTime<Utc>, extension: &str) -> String {
    format!("{}/{}.{}", user_id, uploaded_at.timestamp_millis(), extension)
}

fn invalid_type() -> AppError {
    AppError::InvalidUpload(
        "Invalid image type. Only JPEG, PNG, GIF, and WebP are supported".to_string(),
    )
}
