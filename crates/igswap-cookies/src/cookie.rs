//! Cookie record
//!
//! Field names follow the browser cookie API (`httpOnly`, `sameSite`,
//! `expirationDate` in seconds since the epoch) so a captured snapshot can be
//! handed back to the browser unchanged.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::CookieError;
use crate::Result;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SameSite {
    /// Sent on every request, including cross-site ones
    #[default]
    NoRestriction,
    Lax,
    Strict,
    /// Browser default applies
    Unspecified,
}

impl SameSite {
    pub fn as_str(&self) -> &'static str {
        match self {
            SameSite::NoRestriction => "no_restriction",
            SameSite::Lax => "lax",
            SameSite::Strict => "strict",
            SameSite::Unspecified => "unspecified",
        }
    }
}

impl std::fmt::Display for SameSite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for SameSite {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "no_restriction" | "none" => Ok(SameSite::NoRestriction),
            "lax" => Ok(SameSite::Lax),
            "strict" => Ok(SameSite::Strict),
            "unspecified" => Ok(SameSite::Unspecified),
            _ => Err(format!("Unknown same-site policy: {}", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cookie {
    pub name: String,
    pub value: String,
    /// Cookie domain; a leading dot marks a domain cookie
    pub domain: String,
    #[serde(default = "default_path")]
    pub path: String,
    #[serde(default)]
    pub secure: bool,
    #[serde(default)]
    pub http_only: bool,
    /// Absent on snapshots taken before the browser reported it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub same_site: Option<SameSite>,
    /// Seconds since the UNIX epoch; `None` for session cookies
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration_date: Option<f64>,
    #[serde(default)]
    pub host_only: bool,
}

fn default_path() -> String {
    "/".to_string()
}

impl Cookie {
    pub fn new(name: impl Into<String>, value: impl Into<String>, domain: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            domain: domain.into(),
            path: default_path(),
            secure: false,
            http_only: false,
            same_site: None,
            expiration_date: None,
            host_only: false,
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    pub fn secure(mut self) -> Self {
        self.secure = true;
        self
    }

    pub fn http_only(mut self) -> Self {
        self.http_only = true;
        self
    }

    pub fn with_same_site(mut self, same_site: SameSite) -> Self {
        self.same_site = Some(same_site);
        self
    }

    pub fn expires_at(mut self, at: DateTime<Utc>) -> Self {
        self.expiration_date = Some(at.timestamp() as f64);
        self
    }

    /// Domain without the leading dot
    pub fn host(&self) -> &str {
        self.domain.trim_start_matches('.')
    }

    /// Session cookies carry no expiration and die with the browser
    pub fn is_session(&self) -> bool {
        self.expiration_date.is_none()
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        match self.expiration_date {
            Some(expires) => expires <= now.timestamp() as f64,
            None => false,
        }
    }

    pub fn has_value(&self) -> bool {
        !self.value.is_empty()
    }

    /// Url addressing this cookie in the jar: scheme from the secure flag,
    /// host from the domain, and the cookie path.
    pub fn url(&self) -> Result<Url> {
        let host = self.host();
        if host.is_empty() {
            return Err(CookieError::InvalidUrl(format!(
                "cookie {} has no domain",
                self.name
            )));
        }

        let scheme = if self.secure { "https" } else { "http" };
        let path = if self.path.starts_with('/') {
            self.path.as_str()
        } else {
            "/"
        };

        Url::parse(&format!("{}://{}{}", scheme, host, path))
            .map_err(|e| CookieError::InvalidUrl(format!("{}: {}", self.domain, e)))
    }

    /// Identity of a cookie inside a jar
    pub fn same_slot(&self, other: &Cookie) -> bool {
        self.name == other.name
            && self.host().eq_ignore_ascii_case(other.host())
            && self.path == other.path
    }
}

/// True when `cookie_domain` is `site` or one of its subdomains.
///
/// Leading dots are ignored on both sides and the comparison is
/// case-insensitive, so `.www.instagram.com` matches `instagram.com`.
pub fn domain_matches(cookie_domain: &str, site: &str) -> bool {
    let cookie_domain = cookie_domain.trim_start_matches('.').to_ascii_lowercase();
    let site = site.trim_start_matches('.').to_ascii_lowercase();

    if site.is_empty() {
        return false;
    }

    cookie_domain == site || cookie_domain.ends_with(&format!(".{}", site))
}
