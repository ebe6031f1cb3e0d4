// src/main.rs
use anyhow::{anyhow, bail};
use chrono::Utc;
use dotenv::dotenv;
use std::env;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

// ============================================================================
// COMMON IMPORTS
// ============================================================================

use monynha_fun::auth::AuthContext;
use monynha_fun::common::dev_mode::{
    apply_cli_override, print_dev_mode_status, split_cli_args, DEV_USER_PASSWORD,
};
use monynha_fun::common::{AppConfig, AppError, Notification, NotificationVariant, Toaster};
use monynha_fun::header::{Header, UserMenu};
use monynha_fun::profile::{
    AvatarFile, PageState, Profile, ProfileField, ProfilePage, ProfileRepository,
};
use monynha_fun::routes::History;
use monynha_fun::services::{
    AuthProvider, MemoryProvider, ObjectStorage, ProfileTable, SupabaseClient,
};

const USAGE: &str = "\
usage: monynha [--dev|--prod] <command>  (mode flags go before the command)

commands:
  whoami
  login <email> <password>
  signup <email> <password> [display name]
  logout
  profile
  edit-profile [display_name=..] [bio=..] [avatar_url=..]
  upload-avatar <file>
  header [votes] [query]";

/// The three provider ports, backed by one client
struct Backend {
    auth: Arc<dyn AuthProvider>,
    profiles: Arc<dyn ProfileTable>,
    storage: Arc<dyn ObjectStorage>,
}

// ============================================================================
// MAIN APPLICATION ENTRY POINT
// ============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    // ========================================================================
    // CONFIGURATION
    // ========================================================================

    let args: Vec<String> = env::args().skip(1).collect();
    let (flags, command) = split_cli_args(&args);

    let mut config = AppConfig::from_env();
    config.dev_mode = apply_cli_override(config.dev_mode, &flags);
    print_dev_mode_status(&config.dev_mode);

    let command: Vec<&str> = command.iter().map(String::as_str).collect();

    if command.is_empty() {
        println!("{}", USAGE);
        return Ok(());
    }

    // ========================================================================
    // PROVIDER + AUTH CONTEXT
    // ========================================================================

    let backend = connect(&config).await?;
    let ctx = AuthContext::mount(
        backend.auth.clone(),
        ProfileRepository::new(backend.profiles.clone()),
    )
    .await;

    let (toaster, mut toasts) = Toaster::channel();
    let history = Arc::new(History::new());

    let result = run(&command, &config, &ctx, &backend, toaster, history.clone()).await;
    ctx.unmount();

    while let Ok(toast) = toasts.try_recv() {
        print_toast(&toast);
    }
    if let Some(route) = history.current() {
        info!(path = %route, "Would navigate");
    }

    result
}

async fn connect(config: &AppConfig) -> anyhow::Result<Backend> {
    if config.dev_mode.is_enabled() {
        let provider = MemoryProvider::new();
        let identity = config.dev_mode.dev_identity();

        provider.add_account(identity.clone(), DEV_USER_PASSWORD).await;
        provider.restore_session(identity.clone()).await;
        provider
            .insert_profile(Profile {
                id: None,
                user_id: identity.id.clone(),
                display_name: Some(config.dev_mode.user_name.clone()),
                bio: None,
                avatar_url: None,
                role: "user".to_string(),
                created_at: Some(Utc::now()),
                updated_at: None,
            })
            .await;

        info!(user_id = %identity.id, "Using in-memory provider");
        let provider = Arc::new(provider);
        return Ok(Backend {
            auth: provider.clone(),
            profiles: provider.clone(),
            storage: provider,
        });
    }

    let (url, anon_key) = config.provider_credentials()?;
    let client = SupabaseClient::new(
        &url,
        &anon_key,
        config.http_timeout,
        config.session_file.clone(),
    )?;

    if client.restore_session().await.is_none() {
        info!("No saved session");
    }

    let client = Arc::new(client);
    Ok(Backend {
        auth: client.clone(),
        profiles: client.clone(),
        storage: client,
    })
}

// ============================================================================
// COMMANDS
// ============================================================================

async fn run(
    command: &[&str],
    config: &AppConfig,
    ctx: &AuthContext,
    backend: &Backend,
    toaster: Toaster,
    history: Arc<History>,
) -> anyhow::Result<()> {
    match command {
        ["whoami"] => {
            let snapshot = ctx.snapshot();
            match &snapshot.identity {
                Some(identity) => println!(
                    "{} <{}>",
                    identity.id,
                    identity.email.as_deref().unwrap_or("no email")
                ),
                None => println!("Not signed in"),
            }
        }
        ["login", email, password] => {
            let identity = ctx.sign_in(email, password).await?;
            println!("Signed in as {}", identity.id);
        }
        ["signup", email, password, name @ ..] => {
            let name = name.join(" ");
            let display_name = Some(name.as_str()).filter(|n| !n.trim().is_empty());

            let outcome = ctx.sign_up(email, password, display_name).await?;
            match (outcome.user, outcome.session) {
                (Some(user), Some(_)) => println!("Signed up and signed in as {}", user.id),
                (Some(user), None) => {
                    println!("Signed up as {}. Confirm your email to sign in.", user.id)
                }
                (None, _) => println!("Sign-up accepted. Check your email."),
            }
        }
        ["logout"] => {
            ctx.sign_out().await?;
            println!("Signed out");
        }
        ["profile"] => {
            let profile = ctx.refresh_profile().await?;
            println!("{}", serde_json::to_string_pretty(&profile)?);
        }
        ["edit-profile", assignments @ ..] => {
            let page = open_profile_page(config, ctx, backend, toaster, history).await?;

            for assignment in assignments {
                let (key, value) = assignment
                    .split_once('=')
                    .ok_or_else(|| anyhow!("expected field=value, got '{}'", assignment))?;
                let field = match key {
                    "display_name" => ProfileField::DisplayName,
                    "bio" => ProfileField::Bio,
                    "avatar_url" => ProfileField::AvatarUrl,
                    other => bail!("unknown profile field '{}'", other),
                };
                page.set_field(field, value).await;
            }

            match page.submit().await {
                Ok(profile) => println!("{}", serde_json::to_string_pretty(&profile)?),
                Err(AppError::Validation(errors)) => {
                    for error in &errors.errors {
                        eprintln!("{}: {}", error.field, error.message);
                    }
                    bail!("profile not saved");
                }
                Err(e) => return Err(e.into()),
            }
        }
        ["upload-avatar", file] => {
            let page = open_profile_page(config, ctx, backend, toaster, history).await?;
            let file = AvatarFile::read(Path::new(file)).await?;

            let url = page.upload_avatar(file).await?;
            println!("{}", url);
        }
        ["header", rest @ ..] => {
            let mut header = Header::new();
            if let Some(votes) = rest.first() {
                header.set_total_votes(votes.parse()?);
            }
            if rest.len() > 1 {
                header.input_search(&rest[1..].join(" "));
            }

            let model = header.render(&ctx.snapshot());
            println!(
                "{} ({})  [{}]  ♥ {}",
                model.brand, model.home, model.search_query, model.votes
            );
            match model.user_menu {
                UserMenu::Authenticated {
                    avatar,
                    name,
                    email,
                    items,
                } => {
                    let initial = avatar.fallback_initial.map(String::from).unwrap_or_default();
                    println!("({}) {} {}", initial, name, email.unwrap_or_default());
                    for item in items {
                        println!("  - {}", item.label);
                    }
                }
                UserMenu::Anonymous { login } => println!("Sign in: {}", login),
            }
        }
        _ => {
            println!("{}", USAGE);
        }
    }

    Ok(())
}

async fn open_profile_page(
    config: &AppConfig,
    ctx: &AuthContext,
    backend: &Backend,
    toaster: Toaster,
    history: Arc<History>,
) -> anyhow::Result<ProfilePage> {
    let page = ProfilePage::new(
        ctx.clone(),
        backend.storage.clone(),
        history,
        toaster,
        &config.avatar_bucket,
    );

    match page.sync().await {
        PageState::Editing => Ok(page),
        PageState::Unauthenticated => bail!("not signed in, run `monynha login` first"),
        PageState::Loading => {
            warn!("Session still loading");
            bail!("session is still loading, try again")
        }
    }
}

fn print_toast(toast: &Notification) {
    match toast.variant {
        NotificationVariant::Default => println!("✔ {}: {}", toast.title, toast.description),
        NotificationVariant::Destructive => {
            eprintln!("✘ {}: {}", toast.title, toast.description)
        }
    }
}
