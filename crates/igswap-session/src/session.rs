//! Session data structures

use chrono::{DateTime, Utc};
use igswap_cookies::Cookie;
use igswap_tabs::TabId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Account key used when the account cookie is missing.
///
/// Every capture without an account cookie shares this key, so a second
/// anonymous capture replaces the first.
pub const UNKNOWN_ACCOUNT: &str = "unknown";

/// Captured cookie snapshot of one account
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountSession {
    /// Unique identifier, new on every capture
    pub id: String,
    /// User-supplied label
    pub name: String,
    /// Value of the account cookie, or [`UNKNOWN_ACCOUNT`]
    pub account_key: String,
    /// Every cookie of the site, in jar order
    pub cookies: Vec<Cookie>,
    pub saved_at: DateTime<Utc>,
}

impl AccountSession {
    pub fn new(name: String, account_key: String, cookies: Vec<Cookie>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            account_key,
            cookies,
            saved_at: Utc::now(),
        }
    }

    pub fn cookie_count(&self) -> usize {
        self.cookies.len()
    }

    pub fn cookie(&self, name: &str) -> Option<&Cookie> {
        self.cookies.iter().find(|c| c.name == name)
    }

    pub fn is_unidentified(&self) -> bool {
        self.account_key == UNKNOWN_ACCOUNT
    }
}

/// Persisted store contents as shown to the UI
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionList {
    pub sessions: Vec<AccountSession>,
    pub active_session_id: Option<String>,
}

impl SessionList {
    pub fn active(&self) -> Option<&AccountSession> {
        let id = self.active_session_id.as_deref()?;
        self.sessions.iter().find(|s| s.id == id)
    }
}

/// Login state of the live cookie jar
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountStatus {
    pub is_logged_in: bool,
    pub account_key: Option<String>,
}

/// Outcome of swapping the live jar to a session
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activation {
    #[serde(flatten)]
    pub session: AccountSession,
    /// Stored cookies the jar refused to set
    pub skipped_cookies: usize,
    /// Live cookies the jar refused to remove
    pub failed_removals: usize,
    /// Tabs the caller has to reload for the new cookies to apply
    pub reload_tab_ids: Vec<TabId>,
}

impl Activation {
    pub fn is_complete(&self) -> bool {
        self.skipped_cookies == 0 && self.failed_removals == 0
    }
}
