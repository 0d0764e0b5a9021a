//! Extension message protocol
//!
//! One JSON object per request, discriminated by its `action` field.
//! Requests that read the live jar may carry the site's `cookies` as the
//! browser reports them; `loadSession` answers with the `cookieOps` the
//! extension must apply. Failures are answered with `{"error": "..."}` rather than a fault because
//! the channel has no native error propagation.

use igswap_cookies::{Cookie, CookieOp};
use igswap_session::{AccountSession, AccountStatus, Activation, SessionList};
use igswap_tabs::{TabId, TabStatus};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CoreError;
use crate::Result;

/// Every action the background understands
pub const ACTIONS: &[&str] = &[
    "getSessions",
    "saveSession",
    "loadSession",
    "deleteSession",
    "detectAccount",
    "tabUpdated",
    "tabRemoved",
    "syncCookies",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Request {
    GetSessions,
    SaveSession {
        #[serde(rename = "accountName", default)]
        account_name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        cookies: Option<Vec<Cookie>>,
    },
    LoadSession {
        #[serde(rename = "sessionId")]
        session_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        cookies: Option<Vec<Cookie>>,
    },
    DeleteSession {
        #[serde(rename = "sessionId")]
        session_id: String,
    },
    DetectAccount {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        cookies: Option<Vec<Cookie>>,
    },
    TabUpdated {
        #[serde(rename = "tabId")]
        tab_id: TabId,
        url: String,
        #[serde(default)]
        status: Option<TabStatus>,
    },
    TabRemoved {
        #[serde(rename = "tabId")]
        tab_id: TabId,
    },
    /// Refresh the host's view of the site's cookies without doing anything else
    SyncCookies { cookies: Vec<Cookie> },
}

impl Request {
    /// Decode a raw message.
    ///
    /// Unknown or missing actions are `InvalidAction`; a known action with a
    /// bad payload is `InvalidRequest`.
    pub fn from_value(value: Value) -> Result<Self> {
        let action = match value.get("action") {
            Some(Value::String(action)) => action.clone(),
            Some(other) => return Err(CoreError::InvalidAction(other.to_string())),
            None => return Err(CoreError::InvalidAction("missing action".to_string())),
        };

        if !ACTIONS.contains(&action.as_str()) {
            return Err(CoreError::InvalidAction(action));
        }

        serde_json::from_value(value).map_err(|e| CoreError::InvalidRequest(e.to_string()))
    }

    pub fn action(&self) -> &'static str {
        match self {
            Request::GetSessions => "getSessions",
            Request::SaveSession { .. } => "saveSession",
            Request::LoadSession { .. } => "loadSession",
            Request::DeleteSession { .. } => "deleteSession",
            Request::DetectAccount { .. } => "detectAccount",
            Request::TabUpdated { .. } => "tabUpdated",
            Request::TabRemoved { .. } => "tabRemoved",
            Request::SyncCookies { .. } => "syncCookies",
        }
    }

    /// Take the browser cookie snapshot carried by the request, if any
    pub fn take_cookies(&mut self) -> Option<Vec<Cookie>> {
        match self {
            Request::SaveSession { cookies, .. }
            | Request::LoadSession { cookies, .. }
            | Request::DetectAccount { cookies } => cookies.take(),
            Request::SyncCookies { cookies } => Some(std::mem::take(cookies)),
            _ => None,
        }
    }
}

/// Activation plus the browser changes that carry it out
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadedSession {
    #[serde(flatten)]
    pub activation: Activation,
    /// Removals then restores, to be applied in order
    pub cookie_ops: Vec<CookieOp>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Response {
    Sessions(SessionList),
    Session(AccountSession),
    Loaded(LoadedSession),
    Account(AccountStatus),
    Success { success: bool },
    Error { error: String },
}

impl Response {
    pub fn success() -> Self {
        Response::Success { success: true }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Response::Error {
            error: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Response::Error { .. })
    }

    pub fn to_value(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }
}

impl From<CoreError> for Response {
    fn from(err: CoreError) -> Self {
        Response::error(err.to_string())
    }
}
