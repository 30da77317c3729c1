use super::*;
use crate::auth::session::SessionOracle;
use crate::test_helpers::{ManualClock, NOW, RecordingNavigator, store_with, token_expiring_in};

fn router(token: Option<String>) -> (AppRouter, Arc<RecordingNavigator>) {
    let store = store_with(token);
    let navigator = RecordingNavigator::new();
    let oracle = SessionOracle::new(store.clone(), ManualClock::at(NOW));
    let auth = AuthGuard::new(oracle.clone(), store.clone(), navigator.clone());
    let role = RoleGuard::new(oracle, store, navigator.clone());
    (AppRouter::new(auth, role, navigator.clone()), navigator)
}

// =============================================================================
// Route::parse / path
// =============================================================================

#[test]
fn parse_known_routes() {
    assert_eq!(Route::parse("/login"), Route::Login);
    assert_eq!(Route::parse("/deals"), Route::Deals);
    assert_eq!(Route::parse("deals/create"), Route::DealCreate);
    assert_eq!(Route::parse("/deals/edit/abc123"), Route::DealEdit("abc123".into()));
    assert_eq!(Route::parse("/admin/users/create/"), Route::AdminUserCreate);
}

#[test]
fn admin_root_redirects_to_user_list() {
    assert_eq!(Route::parse("/admin"), Route::AdminUsers);
}

#[test]
fn empty_and_unknown_paths_land_on_login() {
    assert_eq!(Route::parse(""), Route::Login);
    assert_eq!(Route::parse("/"), Route::Login);
    assert_eq!(Route::parse("/nowhere"), Route::Login);
    assert_eq!(Route::parse("/deals/edit"), Route::Login);
}

#[test]
fn parse_ignores_query_and_fragment() {
    assert_eq!(Route::parse("/deals?stage=LEAD#top"), Route::Deals);
}

#[test]
fn path_round_trips_through_parse() {
    let routes = [
        Route::Login,
        Route::Deals,
        Route::DealCreate,
        Route::DealEdit("d-1".into()),
        Route::AdminUsers,
        Route::AdminUserCreate,
    ];
    for route in routes {
        assert_eq!(Route::parse(&route.path()), route);
    }
}

#[test]
fn guard_table() {
    assert!(Route::Login.guards().is_empty());
    assert_eq!(Route::DealEdit("x".into()).guards(), &[GuardKind::Auth]);
    assert_eq!(Route::AdminUsers.guards(), &[GuardKind::Auth, GuardKind::Role]);
    assert!(Route::AdminUserCreate.is_admin_area());
    assert!(!Route::Deals.is_admin_area());
}

// =============================================================================
// AppRouter::navigate
// =============================================================================

#[test]
fn anonymous_user_is_sent_to_login() {
    let (router, nav) = router(None);
    assert_eq!(router.navigate("/deals"), Route::Login);
    assert_eq!(nav.visits(), vec![Route::Login]);
}

#[test]
fn login_page_needs_no_session() {
    let (router, nav) = router(None);
    assert_eq!(router.navigate("/login"), Route::Login);
    assert_eq!(nav.visits(), vec![Route::Login]);
}

#[test]
fn user_enters_deals_but_not_admin() {
    let (router, nav) = router(Some(token_expiring_in(3600, "USER")));
    assert_eq!(router.navigate("/deals/create"), Route::DealCreate);
    assert_eq!(router.navigate("/admin"), Route::Deals);
    assert_eq!(nav.visits(), vec![Route::DealCreate, Route::Deals]);
}

#[test]
fn admin_enters_admin_area() {
    let (router, nav) = router(Some(token_expiring_in(3600, "ADMIN")));
    assert_eq!(router.navigate("/admin/users/create"), Route::AdminUserCreate);
    assert_eq!(nav.last(), Some(Route::AdminUserCreate));
}

#[test]
fn expired_admin_is_sent_to_login_not_deals() {
    let (router, _) = router(Some(token_expiring_in(-1, "ADMIN")));
    assert_eq!(router.navigate("/admin/users"), Route::Login);
}
