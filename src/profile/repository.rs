// src/profile/repository.rs

use std::sync::Arc;
use tracing::{error, info};

use super::models::{NewProfile, Profile, ProfileUpdate};
use crate::common::AppError;
use crate::services::ProfileTable;

/// Reads and writes the single `profiles` row of each identity
#[derive(Clone)]
pub struct ProfileRepository {
    table: Arc<dyn ProfileTable>,
}

impl ProfileRepository {
    pub fn new(table: Arc<dyn ProfileTable>) -> Self {
        Self { table }
    }

    /// Fetches the row, creating a default one when there is none.
    /// A failed lookup is `ProfileLookup`, never mistaken for "no row".
    pub async fn load_profile(&self, user_id: &str) -> Result<Profile, AppError> {
        let existing = self
            .table
            .select_by_user(user_id)
            .await
            .map_err(AppError::ProfileLookup)?;

        match existing {
            Some(profile) => Ok(profile),
            None => {
                info!(user_id = %user_id, "No profile yet, creating default");
                self.create_profile(user_id, None).await
            }
        }
    }

    /// Upsert keyed on `user_id`, role set to the default
    pub async fn create_profile(
        &self,
        user_id: &str,
        display_name: Option<&str>,
    ) -> Result<Profile, AppError> {
        let row = NewProfile::new(user_id, display_name);

        let stored = self.table.upsert(&row).await.map_err(|e| {
            error!(error = %e, user_id = %user_id, "Failed to create profile");
            AppError::Provider(e)
        })?;

        stored.ok_or_else(|| {
            AppError::NotFound(format!("profile for {} was not returned after upsert", user_id))
        })
    }

    pub async fn update_profile(
        &self,
        user_id: &str,
        patch: &ProfileUpdate,
    ) -> Result<Profile, AppError> {
        let updated = self.table.update(user_id, patch).await.map_err(|e| {
            error!(error = %e, user_id = %user_id, "Failed to update profile");
            AppError::Provider(e)
        })?;

        updated.ok_or_else(|| AppError::NotFound(format!("no profile row for {}", user_id)))
    }
}
