//! Deal and user records exchanged with the REST backend.
//!
//! DESIGN
//! ======
//! Records keep `stage`, `sector` and `dealType` as the raw strings the
//! server sends so unknown values survive a round trip. [`DealStage`] and
//! [`DealType`] are the catalogs the client offers when creating or editing.
//! `dealValue` is an admin-only field: the server omits it for regular users
//! and the client never sends it on their behalf.

#[cfg(test)]
#[path = "models_test.rs"]
mod models_test;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::auth::session::Viewer;
use crate::auth::token::Role;

/// Sectors offered by the deal filters and forms.
pub const SECTORS: [&str; 5] = ["Technology", "Energy", "Finance", "Healthcare", "Manufacturing"];

/// Page size used by the deal list.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

// =============================================================================
// CATALOGS
// =============================================================================

/// Pipeline stage of a deal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DealStage {
    Prospecting,
    Lead,
    Qualified,
    TermSheet,
    DueDiligence,
    Won,
    Closed,
    Lost,
}

impl DealStage {
    pub const ALL: [Self; 8] = [
        Self::Prospecting,
        Self::Lead,
        Self::Qualified,
        Self::TermSheet,
        Self::DueDiligence,
        Self::Won,
        Self::Closed,
        Self::Lost,
    ];

    /// Wire value, e.g. `TERM_SHEET`.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Prospecting => "PROSPECTING",
            Self::Lead => "LEAD",
            Self::Qualified => "QUALIFIED",
            Self::TermSheet => "TERM_SHEET",
            Self::DueDiligence => "DUE_DILIGENCE",
            Self::Won => "WON",
            Self::Closed => "CLOSED",
            Self::Lost => "LOST",
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Prospecting => "Prospecting",
            Self::Lead => "Lead",
            Self::Qualified => "Qualified",
            Self::TermSheet => "Term Sheet",
            Self::DueDiligence => "Due Diligence",
            Self::Won => "Won",
            Self::Closed => "Closed",
            Self::Lost => "Lost",
        }
    }
}

/// Kind of transaction a deal represents.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DealType {
    MergerAcquisition,
    Ipo,
    EquityFinancing,
    DebtFinancing,
}

impl DealType {
    pub const ALL: [Self; 4] = [Self::MergerAcquisition, Self::Ipo, Self::EquityFinancing, Self::DebtFinancing];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MergerAcquisition => "MERGER_ACQUISITION",
            Self::Ipo => "IPO",
            Self::EquityFinancing => "EQUITY_FINANCING",
            Self::DebtFinancing => "DEBT_FINANCING",
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::MergerAcquisition => "M&A",
            Self::Ipo => "IPO",
            Self::EquityFinancing => "Equity",
            Self::DebtFinancing => "Debt",
        }
    }
}

/// A catalog value that is neither a known wire value nor a known label.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind}: {value}")]
pub struct UnknownValue {
    pub kind: &'static str,
    pub value: String,
}

/// Match `raw` against wire values and labels, ignoring case and treating
/// spaces, dashes and underscores alike.
fn lookup<T: Copy>(all: &[T], raw: &str, keys: impl Fn(T) -> [&'static str; 2]) -> Option<T> {
    let wanted = fold(raw);
    all.iter().copied().find(|item| keys(*item).iter().any(|k| fold(k) == wanted))
}

fn fold(raw: &str) -> String {
    raw.trim().chars().map(|c| if c == ' ' || c == '-' { '_' } else { c.to_ascii_uppercase() }).collect()
}

impl FromStr for DealStage {
    type Err = UnknownValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        lookup(&Self::ALL, s, |v| [v.as_str(), v.label()])
            .ok_or_else(|| UnknownValue { kind: "deal stage", value: s.to_owned() })
    }
}

impl FromStr for DealType {
    type Err = UnknownValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        lookup(&Self::ALL, s, |v| [v.as_str(), v.label()])
            .ok_or_else(|| UnknownValue { kind: "deal type", value: s.to_owned() })
    }
}

impl fmt::Display for DealStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for DealType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// CSS class for a stage badge: lowercase, whitespace and underscore runs
/// collapsed to a single `-`.
#[must_use]
pub fn stage_class(stage: Option<&str>) -> String {
    let mut out = String::new();
    let mut pending_dash = false;
    for c in stage.unwrap_or_default().chars() {
        if c.is_whitespace() || c == '_' {
            pending_dash = true;
            continue;
        }
        if pending_dash {
            out.push('-');
            pending_dash = false;
        }
        out.extend(c.to_lowercase());
    }
    if pending_dash {
        out.push('-');
    }
    out
}

// =============================================================================
// DEALS
// =============================================================================

/// A note attached to a deal.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DealNote {
    pub note_id: String,
    pub note: String,
    /// Author of the note.
    pub user_id: String,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl DealNote {
    /// Admins may delete any note; everyone else only their own.
    #[must_use]
    pub fn can_delete(&self, viewer: &Viewer) -> bool {
        viewer.is_admin() || viewer.user_id.as_deref() == Some(self.user_id.as_str())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deal {
    pub id: String,
    pub title: String,
    pub sector: String,
    pub deal_type: String,
    pub stage: String,
    #[serde(default)]
    pub notes: Vec<DealNote>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    /// Only present for admins.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deal_value: Option<f64>,
}

impl Deal {
    /// Owners and admins may edit a deal.
    #[must_use]
    pub fn can_edit(&self, viewer: &Viewer) -> bool {
        viewer.is_admin() || (self.owner_id.is_some() && self.owner_id == viewer.user_id)
    }

    #[must_use]
    pub fn stage_class(&self) -> String {
        stage_class(Some(&self.stage))
    }
}

/// Body of `POST /api/deals`.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDeal {
    pub title: String,
    pub sector: String,
    pub deal_type: DealType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deal_value: Option<f64>,
}

impl NewDeal {
    #[must_use]
    pub fn new(title: impl Into<String>, sector: impl Into<String>, deal_type: DealType) -> Self {
        Self { title: title.into(), sector: sector.into(), deal_type, deal_value: None }
    }

    /// Attach a deal value, but only for an admin viewer.
    #[must_use]
    pub fn with_value(mut self, value: Option<f64>, viewer: &Viewer) -> Self {
        self.deal_value = if viewer.is_admin() { value } else { None };
        self
    }
}

/// Body of `PATCH /api/deals/{id}`: only the fields that changed.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DealPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sector: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deal_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
}

impl DealPatch {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// The calls needed to save an edited deal.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DealEdit {
    pub patch: DealPatch,
    /// New deal value, set only for admins when it changed.
    pub value: Option<f64>,
}

impl DealEdit {
    /// Diff `edited` against `original`.
    #[must_use]
    pub fn plan(original: &Deal, edited: &Deal, is_admin: bool) -> Self {
        fn changed(before: &str, after: &str) -> Option<String> {
            (before != after).then(|| after.to_owned())
        }

        let patch = DealPatch {
            title: changed(&original.title, &edited.title),
            sector: changed(&original.sector, &edited.sector),
            deal_type: changed(&original.deal_type, &edited.deal_type),
            stage: changed(&original.stage, &edited.stage),
        };
        let value = match edited.deal_value {
            Some(v) if is_admin && original.deal_value != Some(v) => Some(v),
            _ => None,
        };
        Self { patch, value }
    }

    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.patch.is_empty() && self.value.is_none()
    }
}

/// Query filters for the deal list endpoints.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DealFilters {
    pub stage: Option<String>,
    pub sector: Option<String>,
    pub page: Option<u32>,
    pub size: Option<u32>,
}

impl DealFilters {
    /// First page at the default size.
    #[must_use]
    pub fn first_page() -> Self {
        Self { page: Some(0), size: Some(DEFAULT_PAGE_SIZE), ..Self::default() }
    }

    /// Query pairs to send. Empty strings and zero numbers are left out, so
    /// page 0 is the server's default rather than an explicit parameter.
    #[must_use]
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let text = [("stage", &self.stage), ("sector", &self.sector)];
        let numbers = [("page", self.page), ("size", self.size)];

        let mut pairs: Vec<(&'static str, String)> = text
            .into_iter()
            .filter_map(|(k, v)| v.as_deref().filter(|s| !s.trim().is_empty()).map(|s| (k, s.to_owned())))
            .collect();
        pairs.extend(numbers.into_iter().filter_map(|(k, v)| v.filter(|n| *n > 0).map(|n| (k, n.to_string()))));
        pairs
    }
}

/// The deal list comes back either paged or as a bare array.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum DealPage {
    Paged { content: Vec<Deal> },
    Bare(Vec<Deal>),
}

impl DealPage {
    #[must_use]
    pub fn into_deals(self) -> Vec<Deal> {
        match self {
            Self::Paged { content } | Self::Bare(content) => content,
        }
    }
}

// =============================================================================
// USERS
// =============================================================================

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub active: bool,
}

/// Body of `POST /api/users`. New accounts always start as `USER`.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct NewUser {
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub password: String,
    role: Role,
}

impl NewUser {
    #[must_use]
    pub fn new(username: impl Into<String>, email: Option<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            email: email.filter(|e| !e.trim().is_empty()),
            password: password.into(),
            role: Role::User,
        }
    }

    #[must_use]
    pub fn role(&self) -> Role {
        self.role
    }
}

impl fmt::Debug for NewUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewUser")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("role", &self.role)
            .finish_non_exhaustive()
    }
}
