//! Client route table and guarded navigation.
//!
//! SYSTEM CONTEXT
//! ==============
//! Deal pages need a valid session; admin pages need a valid admin session.
//! The empty path and unknown paths land on the login page, and `admin`
//! opens the user list.

#[cfg(test)]
#[path = "routes_test.rs"]
mod tests;

use std::fmt;
use std::sync::Arc;

use crate::auth::guard::{AuthGuard, GuardDecision, RoleGuard};

/// Performs the actual navigation (browser location, CLI message, test log).
pub trait Navigator: Send + Sync {
    fn navigate(&self, route: &Route);
}

/// A page the client can show.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Route {
    /// Anonymous entry point.
    Login,
    /// Default authenticated landing area.
    Deals,
    DealCreate,
    DealEdit(String),
    AdminUsers,
    AdminUserCreate,
}

/// Guard consulted before entering a route.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GuardKind {
    Auth,
    Role,
}

impl Route {
    /// Resolve a path, applying the default and wildcard redirects.
    #[must_use]
    pub fn parse(path: &str) -> Self {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        match segments.as_slice() {
            ["deals"] => Self::Deals,
            ["deals", "create"] => Self::DealCreate,
            ["deals", "edit", id] => Self::DealEdit((*id).to_owned()),
            ["admin"] | ["admin", "users"] => Self::AdminUsers,
            ["admin", "users", "create"] => Self::AdminUserCreate,
            _ => Self::Login,
        }
    }

    #[must_use]
    pub fn path(&self) -> String {
        match self {
            Self::Login => "/login".to_owned(),
            Self::Deals => "/deals".to_owned(),
            Self::DealCreate => "/deals/create".to_owned(),
            Self::DealEdit(id) => format!("/deals/edit/{id}"),
            Self::AdminUsers => "/admin/users".to_owned(),
            Self::AdminUserCreate => "/admin/users/create".to_owned(),
        }
    }

    /// Guards to pass, in order, before the route may be entered.
    #[must_use]
    pub fn guards(&self) -> &'static [GuardKind] {
        match self {
            Self::Login => &[],
            Self::Deals | Self::DealCreate | Self::DealEdit(_) => &[GuardKind::Auth],
            Self::AdminUsers | Self::AdminUserCreate => &[GuardKind::Auth, GuardKind::Role],
        }
    }

    #[must_use]
    pub fn is_admin_area(&self) -> bool {
        self.guards().contains(&GuardKind::Role)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

/// Runs guards for a path and navigates to whatever route wins.
#[derive(Clone)]
pub struct AppRouter {
    auth: AuthGuard,
    role: RoleGuard,
    navigator: Arc<dyn Navigator>,
}

impl AppRouter {
    #[must_use]
    pub fn new(auth: AuthGuard, role: RoleGuard, navigator: Arc<dyn Navigator>) -> Self {
        Self { auth, role, navigator }
    }

    /// Navigate to `path` and return the route actually entered.
    pub fn navigate(&self, path: &str) -> Route {
        let route = Route::parse(path);
        for kind in route.guards() {
            let decision = match kind {
                GuardKind::Auth => self.auth.check(),
                GuardKind::Role => self.role.check(),
            };
            if let GuardDecision::Redirect(target) = decision {
                tracing::debug!(requested = %route, redirected = %target, "navigation denied");
                return target;
            }
        }
        self.navigator.navigate(&route);
        route
    }
}

// =============================================================================
// BROWSER
// =============================================================================

/// Navigates by assigning `window.location`.
#[cfg(feature = "hydrate")]
#[derive(Clone, Copy, Debug, Default)]
pub struct BrowserNavigator;

#[cfg(feature = "hydrate")]
impl Navigator for BrowserNavigator {
    fn navigate(&self, route: &Route) {
        if let Some(window) = web_sys::window() {
            let _ = window.location().set_href(&route.path());
        }
    }
}
