// src/profile/models.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};

use crate::common::initial_of;

pub const DEFAULT_ROLE: &str = "user";

// ============================================================================
// Profile Models
// ============================================================================

/// One row of the `profiles` relation, keyed by `user_id`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub user_id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default = "default_role")]
    pub role: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

fn default_role() -> String {
    DEFAULT_ROLE.to_string()
}

/// Upsert body for a fresh profile row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewProfile {
    pub user_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    pub role: String,
}

impl NewProfile {
    pub fn new(user_id: &str, display_name: Option<&str>) -> Self {
        Self {
            user_id: user_id.to_string(),
            display_name: display_name.map(str::to_string),
            role: DEFAULT_ROLE.to_string(),
        }
    }
}

/// One field of a partial update
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Patch<T> {
    /// Leave the stored value alone (not sent)
    Keep,
    /// Store `null`
    Clear,
    Set(T),
}

impl<T> Default for Patch<T> {
    fn default() -> Self {
        Patch::Keep
    }
}

impl<T> Patch<T> {
    pub fn is_keep(&self) -> bool {
        matches!(self, Patch::Keep)
    }

    pub fn as_set(&self) -> Option<&T> {
        match self {
            Patch::Set(value) => Some(value),
            _ => None,
        }
    }
}

impl<T: PartialEq> Patch<T> {
    /// `Keep` when applying the patch would leave `current` as it is
    fn or_keep_if_same(self, current: Option<&T>) -> Self {
        match (&self, current) {
            (Patch::Clear, None) => Patch::Keep,
            (Patch::Set(value), Some(current)) if value == current => Patch::Keep,
            _ => self,
        }
    }
}

impl<T: Serialize> Serialize for Patch<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Patch::Set(value) => value.serialize(serializer),
            Patch::Keep | Patch::Clear => serializer.serialize_none(),
        }
    }
}

/// Partial update of the user-editable profile fields
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Patch::is_keep")]
    pub display_name: Patch<String>,
    #[serde(skip_serializing_if = "Patch::is_keep")]
    pub bio: Patch<String>,
    #[serde(skip_serializing_if = "Patch::is_keep")]
    pub avatar_url: Patch<String>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.display_name.is_keep() && self.bio.is_keep() && self.avatar_url.is_keep()
    }

    pub fn avatar(url: &str) -> Self {
        Self {
            avatar_url: Patch::Set(url.to_string()),
            ..Self::default()
        }
    }

    /// Drops the fields that already match `base`, so a save from a stale
    /// form cannot overwrite values it never touched
    pub fn changes_from(self, base: &Profile) -> Self {
        Self {
            display_name: self
                .display_name
                .or_keep_if_same(base.display_name.as_ref()),
            bio: self.bio.or_keep_if_same(base.bio.as_ref()),
            avatar_url: self.avatar_url.or_keep_if_same(base.avatar_url.as_ref()),
        }
    }

    /// Copies every non-`Keep` field onto `profile`
    pub fn apply_to(&self, profile: &mut Profile) {
        apply_patch(&self.display_name, &mut profile.display_name);
        apply_patch(&self.bio, &mut profile.bio);
        apply_patch(&self.avatar_url, &mut profile.avatar_url);
    }
}

fn apply_patch(patch: &Patch<String>, slot: &mut Option<String>) {
    match patch {
        Patch::Keep => {}
        Patch::Clear => *slot = None,
        Patch::Set(value) => *slot = Some(value.clone()),
    }
}

// ============================================================================
// Form Models
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileField {
    DisplayName,
    Bio,
    AvatarUrl,
}

impl ProfileField {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProfileField::DisplayName => "display_name",
            ProfileField::Bio => "bio",
            ProfileField::AvatarUrl => "avatar_url",
        }
    }
}

/// Raw text inputs of the profile form, as typed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileForm {
    pub display_name: String,
    pub bio: String,
    pub avatar_url: String,
}

impl ProfileForm {
    pub fn from_profile(profile: &Profile) -> Self {
        Self {
            display_name: profile.display_name.clone().unwrap_or_default(),
            bio: profile.bio.clone().unwrap_or_default(),
            avatar_url: profile.avatar_url.clone().unwrap_or_default(),
        }
    }

    pub fn set(&mut self, field: ProfileField, value: &str) {
        let slot = match field {
            ProfileField::DisplayName => &mut self.display_name,
            ProfileField::Bio => &mut self.bio,
            ProfileField::AvatarUrl => &mut self.avatar_url,
        };
        *slot = value.to_string();
    }
}

// ============================================================================
// Avatar Models
// ============================================================================

/// What a view needs to draw an avatar: image, alt text, and initial fallback
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvatarBadge {
    pub image_url: Option<String>,
    pub alt: String,
    pub fallback_initial: Option<char>,
}

impl AvatarBadge {
    pub fn for_profile(profile: Option<&Profile>) -> Self {
        let display_name = profile.and_then(|p| p.display_name.as_deref());

        Self {
            image_url: profile.and_then(|p| p.avatar_url.clone()),
            alt: display_name.unwrap_or("User Avatar").to_string(),
            fallback_initial: display_name.and_then(initial_of),
        }
    }
}

/// A file picked for avatar upload
#[derive(Debug, Clone)]
pub struct AvatarFile {
    pub file_name: String,
    pub data: bytes::Bytes,
}

impl AvatarFile {
    pub fn new(file_name: &str, data: impl Into<bytes::Bytes>) -> Self {
        Self {
            file_name: file_name.to_string(),
            data: data.into(),
        }
    }

    pub async fn read(path: &std::path::Path) -> std::io::Result<Self> {
        let data = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "avatar".to_string());

        Ok(Self::new(&file_name, data))
    }
}
