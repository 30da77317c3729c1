//! Deal and user endpoints on top of the authenticated client.
//!
//! Every call goes through [`ApiClient::send`], so bearer attachment,
//! refresh and the single 401 retry apply uniformly. Wrappers that the
//! server answers with an empty body return `()`.
//!
//! ERROR HANDLING
//! ==============
//! Errors are returned as [`ApiError`] unchanged. Callers decide how to
//! present them; [`ApiError::is_conflict`] covers duplicate user creation.

#[cfg(test)]
#[path = "api_test.rs"]
mod api_test;

use serde_json::json;

use super::endpoints;
use super::interceptor::ApiClient;
use super::models::{Deal, DealEdit, DealFilters, DealPage, DealPatch, NewDeal, NewUser, User};
use super::types::ApiRequest;
use crate::error::ApiError;

fn with_filters(mut request: ApiRequest, filters: &DealFilters) -> ApiRequest {
    for (key, value) in filters.query_pairs() {
        request = request.with_query(key, value);
    }
    request
}

impl ApiClient {
    /// `GET /api/users/me`.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::send`].
    pub async fn current_user(&self) -> Result<User, ApiError> {
        self.send_json(ApiRequest::get(endpoints::CURRENT_USER)).await
    }

    // =========================================================================
    // DEALS
    // =========================================================================

    /// All deals visible to the caller, filtered.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::send`].
    pub async fn list_deals(&self, filters: &DealFilters) -> Result<Vec<Deal>, ApiError> {
        let page: DealPage = self.send_json(with_filters(ApiRequest::get(endpoints::DEALS), filters)).await?;
        Ok(page.into_deals())
    }

    /// Deals owned by the caller.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::send`].
    pub async fn list_my_deals(&self, filters: &DealFilters) -> Result<Vec<Deal>, ApiError> {
        let page: DealPage = self.send_json(with_filters(ApiRequest::get(endpoints::MY_DEALS), filters)).await?;
        Ok(page.into_deals())
    }

    /// # Errors
    ///
    /// See [`ApiClient::send`].
    pub async fn get_deal(&self, id: &str) -> Result<Deal, ApiError> {
        self.send_json(ApiRequest::get(endpoints::deal(id))).await
    }

    /// # Errors
    ///
    /// See [`ApiClient::send`].
    pub async fn create_deal(&self, deal: &NewDeal) -> Result<Deal, ApiError> {
        self.send_json(ApiRequest::post(endpoints::DEALS).with_json(deal)?).await
    }

    /// # Errors
    ///
    /// See [`ApiClient::send`].
    pub async fn update_deal(&self, id: &str, patch: &DealPatch) -> Result<(), ApiError> {
        self.send(ApiRequest::patch(endpoints::deal(id)).with_json(patch)?).await?;
        Ok(())
    }

    /// Admin-only.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::send`]; non-admins get [`ApiError::Forbidden`].
    pub async fn update_deal_value(&self, id: &str, value: f64) -> Result<(), ApiError> {
        let request = ApiRequest::patch(endpoints::deal_value(id)).with_body(json!({ "dealValue": value }));
        self.send(request).await?;
        Ok(())
    }

    /// Apply a planned edit: the field patch first, then the value update.
    /// Empty steps are skipped, so a no-op edit makes no calls.
    ///
    /// # Errors
    ///
    /// Stops at the first failing call and returns its error.
    pub async fn save_deal_edit(&self, id: &str, edit: &DealEdit) -> Result<(), ApiError> {
        if !edit.patch.is_empty() {
            self.update_deal(id, &edit.patch).await?;
        }
        if let Some(value) = edit.value {
            self.update_deal_value(id, value).await?;
        }
        tracing::debug!(deal = id, noop = edit.is_noop(), "deal edit saved");
        Ok(())
    }

    /// # Errors
    ///
    /// See [`ApiClient::send`].
    pub async fn delete_deal(&self, id: &str) -> Result<(), ApiError> {
        self.send(ApiRequest::delete(endpoints::deal(id))).await?;
        Ok(())
    }

    /// Append a note and return the updated deal.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::send`].
    pub async fn add_note(&self, id: &str, note: &str) -> Result<Deal, ApiError> {
        let request = ApiRequest::post(endpoints::deal_notes(id)).with_body(json!({ "note": note }));
        self.send_json(request).await
    }

    /// Remove a note and return the updated deal.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::send`].
    pub async fn delete_note(&self, id: &str, note_id: &str) -> Result<Deal, ApiError> {
        self.send_json(ApiRequest::delete(endpoints::deal_note(id, note_id))).await
    }

    // =========================================================================
    // USERS (admin)
    // =========================================================================

    /// # Errors
    ///
    /// See [`ApiClient::send`].
    pub async fn list_users(&self) -> Result<Vec<User>, ApiError> {
        self.send_json(ApiRequest::get(endpoints::USERS)).await
    }

    /// # Errors
    ///
    /// See [`ApiClient::send`].
    pub async fn get_user_by_username(&self, username: &str) -> Result<User, ApiError> {
        self.send_json(ApiRequest::get(endpoints::user_by_username(username))).await
    }

    /// # Errors
    ///
    /// See [`ApiClient::send`].
    pub async fn get_user_by_email(&self, email: &str) -> Result<User, ApiError> {
        self.send_json(ApiRequest::get(endpoints::user_by_email(email))).await
    }

    /// # Errors
    ///
    /// See [`ApiClient::send`]. A duplicate username or email satisfies
    /// [`ApiError::is_conflict`].
    pub async fn create_user(&self, user: &NewUser) -> Result<(), ApiError> {
        self.send(ApiRequest::post(endpoints::USERS).with_json(user)?).await?;
        tracing::info!(username = %user.username, "user created");
        Ok(())
    }

    /// # Errors
    ///
    /// See [`ApiClient::send`].
    pub async fn promote_to_admin(&self, username: &str) -> Result<(), ApiError> {
        self.send(ApiRequest::patch(endpoints::user_make_admin(username)).with_body(json!({}))).await?;
        Ok(())
    }

    /// Activate or deactivate an account.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::send`].
    pub async fn update_user_status(&self, username: &str, active: bool) -> Result<(), ApiError> {
        let request = ApiRequest::patch(endpoints::user_status(username))
            .with_query("active", active.to_string())
            .with_body(json!({}));
        self.send(request).await?;
        Ok(())
    }

    /// # Errors
    ///
    /// See [`ApiClient::send`].
    pub async fn delete_user(&self, username: &str) -> Result<(), ApiError> {
        self.send(ApiRequest::delete(endpoints::user(username))).await?;
        Ok(())
    }

    /// # Errors
    ///
    /// See [`ApiClient::send`].
    pub async fn reset_user_password(&self, username: &str, password: &str) -> Result<(), ApiError> {
        let request = ApiRequest::put(endpoints::user_password(username)).with_body(json!({ "password": password }));
        self.send(request).await?;
        Ok(())
    }
}
