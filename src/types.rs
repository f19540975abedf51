//! Wire DTOs for the MedBrief backend.
//!
//! DESIGN
//! ======
//! Field names mirror the backend JSON so serde needs no renames beyond
//! `abstract`, which is a reserved word in Rust.

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;

use serde::{Deserialize, Serialize};

/// Default trailing window for brief generation, in days.
pub const DEFAULT_BRIEF_DAYS: u32 = 7;

// =============================================================================
// AUTH
// =============================================================================

/// Successful login/register payload.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    /// Any additional fields the backend returns, preserved verbatim.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

fn default_token_type() -> String {
    "bearer".to_owned()
}

/// JSON body for `POST /auth/register`.
#[derive(Clone, Debug, Serialize)]
pub(crate) struct Credentials<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// Identity known for the current session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub email: String,
}

// =============================================================================
// JOURNALS & PROFILES
// =============================================================================

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Journal {
    pub id: i64,
    pub name: String,
    pub issn: Option<String>,
    pub iso_abbreviation: Option<String>,
    pub category: Option<String>,
}

/// A named set of journals that scopes brief generation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub journal_ids: Vec<i64>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub message: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Health {
    pub status: String,
}

// =============================================================================
// BRIEFS
// =============================================================================

/// One PubMed article in a generated brief.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    pub pmid: String,
    pub title: String,
    #[serde(default)]
    pub authors: Vec<String>,
    pub journal: String,
    pub pub_date: String,
    #[serde(rename = "abstract")]
    pub abstract_text: Option<String>,
    pub doi: Option<String>,
    pub pubmed_url: String,
}

/// Caller-facing brief options.
///
/// Both dates must be present for a date range; otherwise `days` applies.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BriefOptions {
    pub days: u32,
    pub from_date: Option<String>,
    pub to_date: Option<String>,
}

impl Default for BriefOptions {
    fn default() -> Self {
        Self { days: DEFAULT_BRIEF_DAYS, from_date: None, to_date: None }
    }
}

impl BriefOptions {
    #[must_use]
    pub fn last_days(days: u32) -> Self {
        Self { days, ..Self::default() }
    }

    #[must_use]
    pub fn range(from_date: impl Into<String>, to_date: impl Into<String>) -> Self {
        Self { from_date: Some(from_date.into()), to_date: Some(to_date.into()), ..Self::default() }
    }

    /// Resolve to exactly one query mode.
    #[must_use]
    pub fn window(&self) -> BriefWindow {
        match (non_empty(self.from_date.as_deref()), non_empty(self.to_date.as_deref())) {
            (Some(from), Some(to)) => BriefWindow::Range { from: from.to_owned(), to: to.to_owned() },
            _ => BriefWindow::Days(self.days),
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// The single active date mode of a brief request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BriefWindow {
    /// Trailing window ending today.
    Days(u32),
    /// Explicit inclusive `YYYY-MM-DD` range.
    Range { from: String, to: String },
}
