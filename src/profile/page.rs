// src/profile/page.rs
//! Profile page: editable form over the cached profile, avatar upload and
//! sign-out. Rendering is left to the caller; this holds the page state.

use chrono::Utc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use super::avatar::{avatar_object_path, inspect_image};
use super::models::{AvatarBadge, AvatarFile, Profile, ProfileField, ProfileForm, ProfileUpdate};
use super::validators::parse_profile_form;
use crate::auth::AuthContext;
use crate::common::{AppError, Toaster, ValidationResult};
use crate::routes::{Navigator, Route};
use crate::services::ObjectStorage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageState {
    Loading,
    Unauthenticated,
    Editing,
}

pub struct ProfilePage {
    auth: AuthContext,
    storage: Arc<dyn ObjectStorage>,
    navigator: Arc<dyn Navigator>,
    toaster: Toaster,
    avatar_bucket: String,
    form: RwLock<ProfileForm>,
    errors: RwLock<ValidationResult>,
    /// Profile the form was last reset from
    synced: RwLock<Option<Profile>>,
    submitting: AtomicBool,
    uploading: AtomicBool,
}

/// Holds a busy flag for the lifetime of one operation
struct BusyGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> BusyGuard<'a> {
    fn acquire(flag: &'a AtomicBool, operation: &'static str) -> Result<Self, AppError> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .map_err(|_| AppError::Busy(operation))?;
        Ok(Self { flag })
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

impl ProfilePage {
    pub fn new(
        auth: AuthContext,
        storage: Arc<dyn ObjectStorage>,
        navigator: Arc<dyn Navigator>,
        toaster: Toaster,
        avatar_bucket: &str,
    ) -> Self {
        Self {
            auth,
            storage,
            navigator,
            toaster,
            avatar_bucket: avatar_bucket.to_string(),
            form: RwLock::new(ProfileForm::default()),
            errors: RwLock::new(ValidationResult::new()),
            synced: RwLock::new(None),
            submitting: AtomicBool::new(false),
            uploading: AtomicBool::new(false),
        }
    }

    /// Re-reads the session. Redirects to the login page once loading is
    /// over without an identity, and resets the form when the cached
    /// profile changed since the last sync.
    pub async fn sync(&self) -> PageState {
        let snapshot = self.auth.snapshot();

        if snapshot.loading {
            return PageState::Loading;
        }

        if snapshot.identity.is_none() {
            self.navigator.navigate(Route::Login);
            return PageState::Unauthenticated;
        }

        let mut synced = self.synced.write().await;
        if *synced != snapshot.profile {
            *self.form.write().await = snapshot
                .profile
                .as_ref()
                .map(ProfileForm::from_profile)
                .unwrap_or_default();
            *self.errors.write().await = ValidationResult::new();
            *synced = snapshot.profile;
        }

        PageState::Editing
    }

    pub async fn set_field(&self, field: ProfileField, value: &str) {
        self.form.write().await.set(field, value);
    }

    pub async fn form(&self) -> ProfileForm {
        self.form.read().await.clone()
    }

    pub async fn field_errors(&self, field: ProfileField) -> Vec<String> {
        self.errors
            .read()
            .await
            .messages_for(field.as_str())
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    pub fn can_submit(&self) -> bool {
        !self.submitting.load(Ordering::SeqCst)
    }

    pub fn can_upload(&self) -> bool {
        !self.uploading.load(Ordering::SeqCst)
    }

    /// The sign-out button shares the submit button's disabled state
    pub fn can_sign_out(&self) -> bool {
        self.can_submit()
    }

    pub fn title(&self) -> String {
        self.auth
            .snapshot()
            .profile
            .and_then(|p| p.display_name)
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| "Your profile".to_string())
    }

    pub fn avatar(&self) -> AvatarBadge {
        AvatarBadge::for_profile(self.auth.snapshot().profile.as_ref())
    }

    /// Validates the form and saves the fields that differ from the last
    /// synced profile. Invalid input only sets field errors.
    pub async fn submit(&self) -> Result<Profile, AppError> {
        let _busy = BusyGuard::acquire(&self.submitting, "saving the profile")?;

        let form = self.form().await;
        let update = match parse_profile_form(&form) {
            Ok(update) => update,
            Err(errors) => {
                *self.errors.write().await = errors.clone();
                return Err(AppError::Validation(errors));
            }
        };
        *self.errors.write().await = ValidationResult::new();

        let synced = self.synced.read().await.clone();
        let update = match synced {
            Some(base) => {
                let update = update.changes_from(&base);
                if update.is_empty() {
                    debug!("Profile form has no changes");
                    self.toaster
                        .success("Profile updated!", "Your information was saved.");
                    return Ok(base);
                }
                update
            }
            None => update,
        };

        match self.auth.update_profile(update).await {
            Ok(profile) => {
                self.toaster
                    .success("Profile updated!", "Your information was saved.");
                Ok(profile)
            }
            Err(e) => {
                error!(error = %e, "Failed to update profile");
                self.toaster
                    .failure("Could not update profile", &e.user_message());
                Err(e)
            }
        }
    }

    /// Uploads the image, persists its public URL, then shows it in the form.
    /// Other unsaved form edits are kept.
    pub async fn upload_avatar(&self, file: AvatarFile) -> Result<String, AppError> {
        let _busy = BusyGuard::acquire(&self.uploading, "the avatar upload")?;

        match self.store_avatar(&file).await {
            Ok((url, profile)) => {
                self.form.write().await.avatar_url = url.clone();
                *self.synced.write().await = Some(profile);

                self.toaster
                    .success("Avatar updated!", "Your new picture was saved.");
                Ok(url)
            }
            Err(e) => {
                warn!(error = %e, file_name = %file.file_name, "Avatar upload failed");
                self.toaster.failure("Avatar upload failed", &e.user_message());
                Err(e)
            }
        }
    }

    pub async fn sign_out(&self) -> Result<(), AppError> {
        if !self.can_sign_out() {
            return Err(AppError::Busy("saving the profile"));
        }

        match self.auth.sign_out().await {
            Ok(()) => {
                self.navigator.navigate(Route::Login);
                Ok(())
            }
            Err(e) => {
                self.toaster.failure("Could not sign out", &e.user_message());
                Err(e)
            }
        }
    }

    async fn store_avatar(&self, file: &AvatarFile) -> Result<(String, Profile), AppError> {
        let user_id = self
            .auth
            .snapshot()
            .user_id()
            .map(str::to_string)
            .ok_or(AppError::Unauthenticated)?;

        let image = inspect_image(&file.data)?;
        let path = avatar_object_path(&user_id, Utc::now(), image.extension);

        self.storage
            .upload(&self.avatar_bucket, &path, file.data.clone(), image.mime_type)
            .await?;

        let url = self.storage.public_url(&self.avatar_bucket, &path);
        let profile = self.auth.update_profile(ProfileUpdate::avatar(&url)).await?;

        info!(user_id = %user_id, path = %path, "Avatar uploaded");
        Ok((url, profile))
    }
}
