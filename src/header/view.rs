// src/header/view.rs

use tracing::{debug, error, info};

use crate::auth::{AuthContext, SessionSnapshot};
use crate::common::format_count_pt_br;
use crate::profile::models::AvatarBadge;
use crate::routes::{Navigator, Route};

pub const BRAND: &str = "Monynha Fun";

/// Upward events of the header. Every callback is optional.
pub trait HeaderCallbacks: Send + Sync {
    fn on_menu_toggle(&self) {}

    fn on_search(&self, _query: &str) {}

    fn on_submit_video(&self) {}
}

/// A header with no listeners
impl HeaderCallbacks for () {}

// ============================================================================
// View Models
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuAction {
    Navigate(Route),
    Logout,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuItem {
    pub label: &'static str,
    pub action: MenuAction,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserMenu {
    Authenticated {
        avatar: AvatarBadge,
        name: String,
        email: Option<String>,
        items: Vec<MenuItem>,
    },
    Anonymous {
        login: Route,
    },
}

/// Everything the header draws for one snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderModel {
    pub brand: &'static str,
    /// Where the brand logo links to
    pub home: Route,
    pub search_query: String,
    pub votes: String,
    pub user_menu: UserMenu,
}

// ============================================================================
// Header
// ============================================================================

pub struct Header<C = ()> {
    callbacks: C,
    search_query: String,
    total_votes: i64,
}

impl Default for Header<()> {
    fn default() -> Self {
        Self::new()
    }
}

impl Header<()> {
    pub fn new() -> Self {
        Self::with_callbacks(())
    }
}

impl<C: HeaderCallbacks> Header<C> {
    pub fn with_callbacks(callbacks: C) -> Self {
        Self {
            callbacks,
            search_query: String::new(),
            total_votes: 0,
        }
    }

    pub fn callbacks(&self) -> &C {
        &self.callbacks
    }

    pub fn search_query(&self) -> &str {
        &self.search_query
    }

    /// Stores the text and reports every keystroke
    pub fn input_search(&mut self, text: &str) {
        self.search_query = text.to_string();
        self.callbacks.on_search(&self.search_query);
    }

    pub fn submit_search(&self) {
        debug!(query = %self.search_query, "Search submitted");
        self.callbacks.on_search(&self.search_query);
    }

    pub fn toggle_menu(&self) {
        self.callbacks.on_menu_toggle();
    }

    pub fn submit_video(&self) {
        self.callbacks.on_submit_video();
    }

    pub fn set_total_votes(&mut self, total_votes: i64) {
        self.total_votes = total_votes;
    }

    pub fn formatted_votes(&self) -> String {
        format_count_pt_br(self.total_votes)
    }

    pub fn render(&self, snapshot: &SessionSnapshot) -> HeaderModel {
        HeaderModel {
            brand: BRAND,
            home: Route::Home,
            search_query: self.search_query.clone(),
            votes: self.formatted_votes(),
            user_menu: user_menu(snapshot),
        }
    }
}

fn user_menu(snapshot: &SessionSnapshot) -> UserMenu {
    if !snapshot.is_authenticated() {
        return UserMenu::Anonymous { login: Route::Login };
    }

    let profile = snapshot.profile.as_ref();
    let name = profile
        .and_then(|p| p.display_name.clone())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "User".to_string());

    UserMenu::Authenticated {
        avatar: AvatarBadge::for_profile(profile),
        name,
        email: snapshot.email().map(str::to_string),
        items: menu_items(),
    }
}

fn menu_items() -> Vec<MenuItem> {
    vec![
        MenuItem {
            label: "Profile",
            action: MenuAction::Navigate(Route::Profile),
        },
        MenuItem {
            label: "My videos",
            action: MenuAction::Navigate(Route::MyVideos),
        },
        MenuItem {
            label: "Settings",
            action: MenuAction::Navigate(Route::Settings),
        },
        MenuItem {
            label: "Log out",
            action: MenuAction::Logout,
        },
    ]
}

// ============================================================================
// Menu Actions
// ============================================================================

pub async fn activate(item: &MenuItem, auth: &AuthContext, navigator: &dyn Navigator) {
    match &item.action {
        MenuAction::Navigate(route) => navigator.navigate(*route),
        MenuAction::Logout => logout(auth, navigator).await,
    }
}

/// Signs out and goes to the login page. A failed sign-out is only logged
/// and leaves the user where they are.
pub async fn logout(auth: &AuthContext, navigator: &dyn Navigator) {
    match auth.sign_out().await {
        Ok(()) => {
            info!("Logged out from header menu");
            navigator.navigate(Route::Login);
        }
        Err(e) => {
            error!(error = %e, "Failed to log out");
        }
    }
}
