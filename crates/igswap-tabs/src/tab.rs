//! Tab data structure

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::TabError;
use crate::Result;

/// Browser-assigned tab id
pub type TabId = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TabStatus {
    Loading,
    Complete,
}

impl TabStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TabStatus::Loading => "loading",
            TabStatus::Complete => "complete",
        }
    }
}

impl std::fmt::Display for TabStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tab {
    pub id: TabId,
    pub url: String,
    pub status: TabStatus,
    pub updated_at: DateTime<Utc>,
    /// Reloads requested by session swaps
    pub reload_count: u32,
}

impl Tab {
    pub fn new(id: TabId, url: String, status: TabStatus) -> Result<Self> {
        validate_url(&url)?;

        Ok(Self {
            id,
            url,
            status,
            updated_at: Utc::now(),
            reload_count: 0,
        })
    }

    /// Update URL (navigation or status report)
    pub fn navigate(&mut self, url: String, status: TabStatus) -> Result<()> {
        validate_url(&url)?;

        self.url = url;
        self.status = status;
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn mark_reloading(&mut self) {
        self.status = TabStatus::Loading;
        self.reload_count += 1;
        self.updated_at = Utc::now();
    }

    /// True when the tab shows a page on `domain` or one of its subdomains
    pub fn is_on_site(&self, domain: &str) -> bool {
        let site = domain.trim_start_matches('.').to_ascii_lowercase();
        let host = match Url::parse(&self.url) {
            Ok(url) => url.host_str().map(|h| h.to_ascii_lowercase()),
            Err(_) => None,
        };

        match host {
            Some(host) if !site.is_empty() => {
                host == site || host.ends_with(&format!(".{}", site))
            }
            _ => false,
        }
    }
}

fn validate_url(url: &str) -> Result<()> {
    if url.is_empty() {
        return Err(TabError::InvalidUrl("URL cannot be empty".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_tab() {
        let tab = Tab::new(7, "https://www.instagram.com/".to_string(), TabStatus::Complete)
            .unwrap();
        assert_eq!(tab.reload_count, 0);
        assert!(tab.is_on_site("instagram.com"));
        assert!(!tab.is_on_site("facebook.com"));
    }

    #[test]
    fn test_empty_url_rejected() {
        assert!(Tab::new(1, String::new(), TabStatus::Loading).is_err());
    }

    #[test]
    fn test_non_http_pages_are_off_site() {
        let tab = Tab::new(1, "chrome://newtab/".to_string(), TabStatus::Complete).unwrap();
        assert!(!tab.is_on_site("instagram.com"));

        let tab = Tab::new(2, "https://instagram.com.evil.net/".to_string(), TabStatus::Complete)
            .unwrap();
        assert!(!tab.is_on_site("instagram.com"));
    }

    #[test]
    fn test_status_serialization() {
        let json = serde_json::to_string(&TabStatus::Loading).unwrap();
        assert_eq!(json, r#""loading""#);
    }
}
