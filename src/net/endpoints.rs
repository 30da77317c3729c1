//! Backend paths consumed by the client.

pub const AUTH_PREFIX: &str = "/api/auth/";
pub const LOGIN: &str = "/api/auth/login";
pub const REFRESH: &str = "/api/auth/refresh";
pub const LOGOUT: &str = "/api/auth/logout";
pub const CURRENT_USER: &str = "/api/users/me";
pub const USERS: &str = "/api/users";
pub const DEALS: &str = "/api/deals";
pub const MY_DEALS: &str = "/api/deals/my";

/// Calls into the auth subsystem itself, refresh included; the interceptor
/// never refreshes or retries for these.
#[must_use]
pub fn is_auth_endpoint(path: &str) -> bool {
    path.contains(AUTH_PREFIX)
}

#[must_use]
pub fn deal(id: &str) -> String {
    format!("{DEALS}/{id}")
}

#[must_use]
pub fn deal_value(id: &str) -> String {
    format!("{DEALS}/{id}/value")
}

#[must_use]
pub fn deal_notes(id: &str) -> String {
    format!("{DEALS}/{id}/notes")
}

#[must_use]
pub fn deal_note(id: &str, note_id: &str) -> String {
    format!("{DEALS}/{id}/notes/{note_id}")
}

#[must_use]
pub fn user(username: &str) -> String {
    format!("{USERS}/{username}")
}

#[must_use]
pub fn user_by_username(username: &str) -> String {
    format!("{USERS}/username/{username}")
}

#[must_use]
pub fn user_by_email(email: &str) -> String {
    format!("{USERS}/email/{email}")
}

#[must_use]
pub fn user_make_admin(username: &str) -> String {
    format!("{USERS}/{username}/make-admin")
}

#[must_use]
pub fn user_status(username: &str) -> String {
    format!("{USERS}/{username}/status")
}

#[must_use]
pub fn user_password(username: &str) -> String {
    format!("{USERS}/{username}/password")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_endpoints_are_recognized() {
        assert!(is_auth_endpoint(LOGIN));
        assert!(is_auth_endpoint(REFRESH));
        assert!(is_auth_endpoint(LOGOUT));
        assert!(!is_auth_endpoint(CURRENT_USER));
        assert!(!is_auth_endpoint(DEALS));
    }

    #[test]
    fn resource_paths() {
        assert_eq!(deal_note("d1", "n2"), "/api/deals/d1/notes/n2");
        assert_eq!(deal_value("d1"), "/api/deals/d1/value");
        assert_eq!(user_make_admin("bob"), "/api/users/bob/make-admin");
        assert_eq!(user_by_email("a@b.c"), "/api/users/email/a@b.c");
    }
}
