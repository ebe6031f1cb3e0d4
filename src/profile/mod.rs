// src/profile/mod.rs

pub mod avatar;
pub mod models;
pub mod page;
pub mod repository;
pub mod validators;

#[cfg(test)]
mod tests;

pub use models::{AvatarBadge, AvatarFile, Patch, Profile, ProfileField, ProfileForm, ProfileUpdate};
pub use page::{PageState, ProfilePage};
pub use repository::ProfileRepository;
