//! Tests for profile module
//!
//! These tests verify core profile functionality including:
//! - Form parsing and field validators
//! - Profile repository (lazy creation, missing rows, lookup failures)
//! - Profile page: submit, avatar upload, busy flags and redirects

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::mpsc::UnboundedReceiver;

    use super::super::avatar::fixtures::{PDF, PNG};
    use super::super::validators::{parse_profile_form, ProfileValidator};
    use super::super::*;
    use crate::auth::AuthContext;
    use crate::common::{AppError, Notification, NotificationVariant, Toaster, Validator};
    use crate::routes::{History, Route};
    use crate::services::memory::MEMORY_BASE_URL;
    use crate::services::{MemoryProvider, Operation};
    use crate::test_support::{identity, mount};

    // ============================================================================
    // Validator Tests
    // ============================================================================

    fn form(display_name: &str, bio: &str, avatar_url: &str) -> ProfileForm {
        ProfileForm {
            display_name: display_name.to_string(),
            bio: bio.to_string(),
            avatar_url: avatar_url.to_string(),
        }
    }

    #[test]
    fn test_parse_profile_form_trims_and_clears_empty_inputs() {
        let update = parse_profile_form(&form("  Ana Clara ", "   ", "")).unwrap();

        assert_eq!(update.display_name, Patch::Set("Ana Clara".to_string()));
        assert_eq!(update.bio, Patch::Clear);
        assert_eq!(update.avatar_url, Patch::Clear);
    }

    #[test]
    fn test_display_name_length_limits() {
        let errors = parse_profile_form(&form("A", "", "")).unwrap_err();
        assert_eq!(
            errors.messages_for("display_name"),
            vec!["Display name must be at least 2 characters"]
        );

        let errors = parse_profile_form(&form(&"x".repeat(51), "", "")).unwrap_err();
        assert_eq!(
            errors.messages_for("display_name"),
            vec!["Display name must be at most 50 characters"]
        );

        assert!(parse_profile_form(&form(&"x".repeat(50), "", "")).is_ok());
    }

    #[test]
    fn test_bio_length_limit() {
        assert!(parse_profile_form(&form("", &"b".repeat(200), "")).is_ok());

        let errors = parse_profile_form(&form("", &"b".repeat(201), "")).unwrap_err();
        assert_eq!(errors.messages_for("bio").len(), 1);
        assert!(errors.messages_for("display_name").is_empty());
    }

    #[test]
    fn test_avatar_url_must_be_absolute_http() {
        for bad in ["not-a-url", "ftp://example.com/a.png", "/avatars/a.png"] {
            let errors = parse_profile_form(&form("", "", bad)).unwrap_err();
            assert_eq!(
                errors.messages_for("avatar_url"),
                vec!["Enter a valid avatar URL"],
                "{} should be rejected",
                bad
            );
        }

        assert!(parse_profile_form(&form("", "", "https://cdn.example.com/a.png")).is_ok());
    }

    #[test]
    fn test_validator_ignores_kept_fields() {
        let update = ProfileUpdate {
            bio: Patch::Set("ok".to_string()),
            ..ProfileUpdate::default()
        };

        assert!(ProfileValidator.validate(&update).is_valid);
    }

    #[test]
    fn test_changes_from_drops_matching_fields() {
        let base = Profile {
            id: None,
            user_id: "u1".to_string(),
            display_name: Some("Ana".to_string()),
            bio: None,
            avatar_url: Some("https://cdn.example.com/a.png".to_string()),
            role: "user".to_string(),
            created_at: None,
            updated_at: None,
        };

        let update = parse_profile_form(&form("Ana", "", "")).unwrap().changes_from(&base);

        assert_eq!(update.display_name, Patch::Keep);
        assert_eq!(update.bio, Patch::Keep);
        assert_eq!(update.avatar_url, Patch::Clear);
    }

    #[test]
    fn test_update_serializes_only_touched_fields() {
        let update = ProfileUpdate {
            display_name: Patch::Set("Ana".to_string()),
            bio: Patch::Clear,
            avatar_url: Patch::Keep,
        };

        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(json, serde_json::json!({ "display_name": "Ana", "bio": null }));
    }

    #[test]
    fn test_avatar_badge_fallbacks() {
        let anonymous = AvatarBadge::for_profile(None);
        assert_eq!(anonymous.alt, "User Avatar");
        assert_eq!(anonymous.fallback_initial, None);

        let profile = Profile {
            id: None,
            user_id: "u1".to_string(),
            display_name: Some("ana".to_string()),
            bio: None,
            avatar_url: Some("https://cdn.example.com/a.png".to_string()),
            role: "user".to_string(),
            created_at: None,
            updated_at: None,
        };
        let badge = AvatarBadge::for_profile(Some(&profile));
        assert_eq!(badge.alt, "ana");
        assert_eq!(badge.fallback_initial, Some('A'));
        assert_eq!(badge.image_url.as_deref(), Some("https://cdn.example.com/a.png"));
    }

    // ============================================================================
    // Repository Tests
    // ============================================================================

    fn repository(provider: &MemoryProvider) -> ProfileRepository {
        ProfileRepository::new(Arc::new(provider.clone()))
    }

    #[tokio::test]
    async fn test_load_profile_creates_default_once() {
        let provider = MemoryProvider::new();
        let repo = repository(&provider);

        let created = repo.load_profile("u1").await.unwrap();
        assert_eq!(created.user_id, "u1");
        assert_eq!(created.display_name, None);
        assert_eq!(created.role, "user");

        let loaded = repo.load_profile("u1").await.unwrap();
        assert_eq!(loaded.id, created.id);
        assert_eq!(provider.calls(Operation::UpsertProfile).await, 1);
    }

    #[tokio::test]
    async fn test_load_profile_lookup_failure() {
        let provider = MemoryProvider::new();
        provider.fail(Operation::SelectProfile, "timeout").await;

        let result = repository(&provider).load_profile("u1").await;

        assert!(matches!(result, Err(AppError::ProfileLookup(_))));
        assert_eq!(provider.profile_count().await, 0);
    }

    #[tokio::test]
    async fn test_update_profile_without_row_is_not_found() {
        let provider = MemoryProvider::new();

        let result = repository(&provider)
            .update_profile("ghost", &ProfileUpdate::avatar("https://cdn.example.com/a.png"))
            .await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_update_profile_keeps_untouched_fields() {
        let provider = MemoryProvider::new();
        let repo = repository(&provider);
        repo.create_profile("u1", Some("Ana")).await.unwrap();

        let updated = repo
            .update_profile(
                "u1",
                &ProfileUpdate {
                    bio: Patch::Set("Oi!".to_string()),
                    ..ProfileUpdate::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.display_name.as_deref(), Some("Ana"));
        assert_eq!(updated.bio.as_deref(), Some("Oi!"));
        assert_eq!(updated.role, "user");
    }

    // ============================================================================
    // Profile Page Tests
    // ============================================================================

    struct Fixture {
        provider: MemoryProvider,
        ctx: AuthContext,
        page: ProfilePage,
        history: Arc<History>,
        toasts: UnboundedReceiver<Notification>,
    }

    async fn open_page(signed_in_as: Option<&str>) -> Fixture {
        let provider = MemoryProvider::new();
        if let Some(user_id) = signed_in_as {
            provider.restore_session(identity(user_id)).await;
        }

        let ctx = mount(&provider).await;
        let history = Arc::new(History::new());
        let (toaster, toasts) = Toaster::channel();
        let page = ProfilePage::new(
            ctx.clone(),
            Arc::new(provider.clone()),
            history.clone(),
            toaster,
            "avatars",
        );
        page.sync().await;

        Fixture {
            provider,
            ctx,
            page,
            history,
            toasts,
        }
    }

    #[tokio::test]
    async fn test_page_redirects_when_signed_out() {
        let f = open_page(None).await;

        assert_eq!(f.page.sync().await, PageState::Unauthenticated);
        assert_eq!(f.history.current(), Some(Route::Login));
    }

    #[tokio::test]
    async fn test_sync_resets_form_only_when_profile_changes() {
        let f = open_page(Some("u1")).await;
        assert_eq!(f.page.title(), "Your profile");

        f.ctx
            .update_profile(ProfileUpdate {
                display_name: Patch::Set("Ana".to_string()),
                ..ProfileUpdate::default()
            })
            .await
            .unwrap();
        assert_eq!(f.page.sync().await, PageState::Editing);
        assert_eq!(f.page.form().await.display_name, "Ana");
        assert_eq!(f.page.title(), "Ana");

        f.page.set_field(ProfileField::Bio, "rascunho").await;
        f.page.sync().await;
        assert_eq!(f.page.form().await.bio, "rascunho");
    }

    #[tokio::test]
    async fn test_submit_invalid_form_makes_no_call() {
        let mut f = open_page(Some("u1")).await;
        f.page.set_field(ProfileField::DisplayName, "A").await;
        f.page.set_field(ProfileField::Bio, &"b".repeat(201)).await;

        let result = f.page.submit().await;

        assert!(matches!(result, Err(AppError::Validation(_))));
        assert_eq!(f.page.field_errors(ProfileField::DisplayName).await.len(), 1);
        assert_eq!(f.page.field_errors(ProfileField::Bio).await.len(), 1);
        assert!(f.page.field_errors(ProfileField::AvatarUrl).await.is_empty());
        assert_eq!(f.provider.calls(Operation::UpdateProfile).await, 0);
        assert!(f.toasts.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_submit_saves_and_toasts() {
        let mut f = open_page(Some("u1")).await;
        f.page.set_field(ProfileField::DisplayName, "  Ana  ").await;

        let saved = f.page.submit().await.unwrap();

        assert_eq!(saved.display_name.as_deref(), Some("Ana"));
        assert_eq!(saved.bio, None);
        assert_eq!(f.ctx.snapshot().profile, Some(saved));

        let toast = f.toasts.try_recv().unwrap();
        assert_eq!(toast.title, "Profile updated!");
        assert_eq!(toast.variant, NotificationVariant::Default);
        assert!(f.page.can_submit());
    }

    #[tokio::test]
    async fn test_submit_failure_keeps_form() {
        let mut f = open_page(Some("u1")).await;
        f.provider.fail(Operation::UpdateProfile, "permission denied").await;
        f.page.set_field(ProfileField::DisplayName, "Ana").await;

        let result = f.page.submit().await;

        assert!(matches!(result, Err(AppError::Provider(_))));
        assert_eq!(f.page.form().await.display_name, "Ana");

        let toast = f.toasts.try_recv().unwrap();
        assert_eq!(toast.variant, NotificationVariant::Destructive);
        assert_eq!(toast.description, "permission denied");
    }

    #[tokio::test]
    async fn test_upload_avatar_persists_public_url() {
        let mut f = open_page(Some("u1")).await;

        let url = f
            .page
            .upload_avatar(AvatarFile::new("me.png", PNG))
            .await
            .unwrap();

        assert!(url.starts_with(&format!("{}/avatars/u1/", MEMORY_BASE_URL)));
        assert!(url.ends_with(".png"));

        let persisted = f.provider.profile("u1").await.and_then(|p| p.avatar_url);
        assert_eq!(persisted.as_deref(), Some(url.as_str()));
        assert_eq!(f.page.form().await.avatar_url, url);
        assert_eq!(f.page.avatar().image_url, Some(url.clone()));

        let path = url.trim_start_matches(&format!("{}/avatars/", MEMORY_BASE_URL));
        let object = f.provider.object("avatars", path).await.expect("stored object");
        assert_eq!(object.content_type, "image/png");

        assert_eq!(f.toasts.try_recv().unwrap().variant, NotificationVariant::Default);
    }

    #[tokio::test]
    async fn test_upload_avatar_keeps_unsaved_edits() {
        let f = open_page(Some("u1")).await;
        f.page.set_field(ProfileField::Bio, "rascunho").await;

        let url = f
            .page
            .upload_avatar(AvatarFile::new("me.png", PNG))
            .await
            .unwrap();
        f.page.sync().await;

        let form = f.page.form().await;
        assert_eq!(form.bio, "rascunho");
        assert_eq!(form.avatar_url, url);
    }

    #[tokio::test]
    async fn test_upload_failure_leaves_avatar_unchanged() {
        let mut f = open_page(Some("u1")).await;
        f.provider.fail(Operation::Upload, "bucket not found").await;

        let result = f.page.upload_avatar(AvatarFile::new("me.png", PNG)).await;

        assert!(matches!(result, Err(AppError::Provider(_))));
        assert_eq!(f.page.form().await.avatar_url, "");
        assert_eq!(f.provider.profile("u1").await.and_then(|p| p.avatar_url), None);
        assert_eq!(f.provider.calls(Operation::UpdateProfile).await, 0);
        assert_eq!(
            f.toasts.try_recv().unwrap().variant,
            NotificationVariant::Destructive
        );
    }

    #[tokio::test]
    async fn test_upload_with_failed_profile_write_leaves_form_unchanged() {
        let f = open_page(Some("u1")).await;
        f.provider.fail(Operation::UpdateProfile, "permission denied").await;

        let result = f.page.upload_avatar(AvatarFile::new("me.png", PNG)).await;

        assert!(result.is_err());
        assert_eq!(f.page.form().await.avatar_url, "");
        assert_eq!(f.ctx.snapshot().profile.and_then(|p| p.avatar_url), None);
    }

    #[tokio::test]
    async fn test_upload_rejects_non_image() {
        let f = open_page(Some("u1")).await;

        let result = f.page.upload_avatar(AvatarFile::new("cv.png", PDF)).await;

        assert!(matches!(result, Err(AppError::InvalidUpload(_))));
        assert_eq!(f.provider.calls(Operation::Upload).await, 0);
        assert!(f.page.can_upload());
    }

    #[tokio::test]
    async fn test_second_submit_while_saving_is_refused() {
        let f = open_page(Some("u1")).await;
        f.provider
            .delay(Operation::UpdateProfile, Duration::from_millis(50))
            .await;
        f.page.set_field(ProfileField::DisplayName, "Ana").await;

        let (first, second) = tokio::join!(f.page.submit(), async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            assert!(!f.page.can_submit());
            assert!(!f.page.can_sign_out());
            f.page.submit().await
        });

        assert!(first.is_ok());
        assert!(matches!(second, Err(AppError::Busy(_))));
        assert!(f.page.can_submit());
        assert_eq!(f.provider.calls(Operation::UpdateProfile).await, 1);
    }

    #[tokio::test]
    async fn test_upload_and_submit_have_independent_flags() {
        let f = open_page(Some("u1")).await;
        f.provider
            .delay(Operation::Upload, Duration::from_millis(50))
            .await;
        f.page.set_field(ProfileField::DisplayName, "Ana").await;

        let (uploaded, submitted) = tokio::join!(
            f.page.upload_avatar(AvatarFile::new("me.png", PNG)),
            async {
                tokio::time::sleep(Duration::from_millis(10)).await;
                assert!(!f.page.can_upload());
                assert!(f.page.can_submit());
                f.page.submit().await
            }
        );

        let url = uploaded.unwrap();
        assert!(submitted.is_ok());

        let stored = f.provider.profile("u1").await.unwrap();
        assert_eq!(stored.avatar_url.as_deref(), Some(url.as_str()));
        assert_eq!(stored.display_name.as_deref(), Some("Ana"));
    }

    #[tokio::test]
    async fn test_submit_started_before_upload_keeps_new_avatar() {
        let f = open_page(Some("u1")).await;
        f.provider
            .delay(Operation::UpdateProfile, Duration::from_millis(50))
            .await;
        f.page.set_field(ProfileField::DisplayName, "Ana").await;

        let (submitted, uploaded) = tokio::join!(f.page.submit(), async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            f.provider
                .delay(Operation::UpdateProfile, Duration::ZERO)
                .await;
            f.page.upload_avatar(AvatarFile::new("me.png", PNG)).await
        });

        let url = uploaded.unwrap();
        let saved = submitted.unwrap();
        assert_eq!(saved.avatar_url.as_deref(), Some(url.as_str()));

        let stored = f.provider.profile("u1").await.unwrap();
        assert_eq!(stored.avatar_url.as_deref(), Some(url.as_str()));
        assert_eq!(stored.display_name.as_deref(), Some("Ana"));

        let cached = f.ctx.snapshot().profile.unwrap();
        assert_eq!(cached.avatar_url.as_deref(), Some(url.as_str()));
        assert_eq!(cached.display_name.as_deref(), Some("Ana"));
        assert_eq!(f.page.form().await.avatar_url, url);
    }

    #[tokio::test]
    async fn test_submit_without_changes_makes_no_call() {
        let mut f = open_page(Some("u1")).await;

        let saved = f.page.submit().await.unwrap();

        assert_eq!(Some(saved), f.ctx.snapshot().profile);
        assert_eq!(f.provider.calls(Operation::UpdateProfile).await, 0);
        assert_eq!(f.toasts.try_recv().unwrap().variant, NotificationVariant::Default);
    }

    #[tokio::test]
    async fn test_page_sign_out_navigates_to_login() {
        let f = open_page(Some("u1")).await;

        f.page.sign_out().await.unwrap();

        assert!(f.ctx.snapshot().identity.is_none());
        assert_eq!(f.history.current(), Some(Route::Login));
        assert_eq!(f.page.sync().await, PageState::Unauthenticated);
    }
}
