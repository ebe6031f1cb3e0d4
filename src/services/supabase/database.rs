// src/services/supabase/database.rs
//
// PostgREST access to the `profiles` relation.

use async_trait::async_trait;
use tracing::debug;

use super::{check, decode, SupabaseClient};
use crate::profile::models::{NewProfile, Profile, ProfileUpdate};
use crate::services::provider::{ProfileTable, ProviderError};

const PROFILES: &str = "/rest/v1/profiles";

fn user_filter(user_id: &str) -> String {
    format!("user_id=eq.{}", urlencoding::encode(user_id))
}

#[async_trait]
impl ProfileTable for SupabaseClient {
    async fn select_by_user(&self, user_id: &str) -> Result<Option<Profile>, ProviderError> {
        let url = self.endpoint(&format!(
            "{}?select=*&{}&limit=1",
            PROFILES,
            user_filter(user_id)
        ));

        let request = self.authorized(self.inner.http.get(url)).await?;
        let response = check(request.send().await?).await?;
        let rows: Vec<Profile> = decode(response).await?;

        debug!(user_id = %user_id, found = !rows.is_empty(), "Profile lookup");
        Ok(rows.into_iter().next())
    }

    async fn upsert(&self, row: &NewProfile) -> Result<Option<Profile>, ProviderError> {
        let url = self.endpoint(&format!("{}?on_conflict=user_id", PROFILES));

        let request = self
            .authorized(
                self.inner
                    .http
                    .post(url)
                    .header("Prefer", "resolution=merge-duplicates,return=representation")
                    .json(row),
            )
            .await?;

        let response = check(request.send().await?).await?;
        let rows: Vec<Profile> = decode(response).await?;
        Ok(rows.into_iter().next())
    }

    async fn update(
        &self,
        user_id: &str,
        patch: &ProfileUpdate,
    ) -> Result<Option<Profile>, ProviderError> {
        let url = self.endpoint(&format!("{}?{}", PROFILES, user_filter(user_id)));

        let request = self
            .authorized(
                self.inner
                    .http
                    .patch(url)
                    .header("Prefer", "return=representation")
                    .json(patch),
            )
            .await?;

        let response = check(request.send().await?).await?;
        let rows: Vec<Profile> = decode(response).await?;
        Ok(rows.into_iter().next())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::models::Patch;

    #[test]
    fn test_user_filter_encodes_value() {
        assert_eq!(user_filter("u1"), "user_id=eq.u1");
        assert_eq!(user_filter("a b&c"), "user_id=eq.a%20b%26c");
    }

    #[test]
    fn test_patch_body_omits_kept_fields() {
        let patch = ProfileUpdate {
            display_name: Patch::Set("Ana".to_string()),
            bio: Patch::Clear,
            avatar_url: Patch::Keep,
        };

        let body = serde_json::to_value(&patch).unwrap();
        assert_eq!(body, serde_json::json!({ "display_name": "Ana", "bio": null }));
    }

    #[test]
    fn test_profile_row_decodes_with_defaults() {
        let rows: Vec<Profile> = serde_json::from_str(
            r#"[{"id":"p1","user_id":"u1","display_name":null,"created_at":"2024-05-01T12:00:00+00:00"}]"#,
        )
        .unwrap();

        let profile = &rows[0];
        assert_eq!(profile.role, "user");
        assert!(profile.bio.is_none());
        assert!(profile.created_at.is_some());
    }
}
