// src/routes.rs
//! Client-side routes and navigation

use std::fmt;
use std::sync::Mutex;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Home,
    Login,
    Profile,
    MyVideos,
    Settings,
}

impl Route {
    pub fn path(&self) -> &'static str {
        match self {
            Route::Home => "/",
            Route::Login => "/login",
            Route::Profile => "/profile",
            Route::MyVideos => "/my-videos",
            Route::Settings => "/settings",
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

pub trait Navigator: Send + Sync {
    fn navigate(&self, route: Route);
}

/// In-memory navigation history
#[derive(Debug, Default)]
pub struct History {
    entries: Mutex<Vec<Route>>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<Route> {
        self.entries.lock().ok().and_then(|e| e.last().copied())
    }

    pub fn entries(&self) -> Vec<Route> {
        self.entries.lock().map(|e| e.clone()).unwrap_or_default()
    }
}

impl Navigator for History {
    fn navigate(&self, route: Route) {
        debug!(path = %route, "Navigate");
        if let Ok(mut entries) = self.entries.lock() {
            entries.push(route);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths() {
        assert_eq!(Route::Home.path(), "/");
        assert_eq!(Route::MyVideos.to_string(), "/my-videos");
        assert_eq!(Route::Login.to_string(), "/login");
    }

    #[test]
    fn test_history_records_navigation() {
        let history = History::new();
        assert_eq!(history.current(), None);

        history.navigate(Route::Profile);
        history.navigate(Route::Login);

        assert_eq!(history.current(), Some(Route::Login));
        assert_eq!(history.entries(), vec![Route::Profile, Route::Login]);
    }
}
