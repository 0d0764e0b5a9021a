//! Target site description

use igswap_cookies::SameSite;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Registrable domain whose cookies make up a session
    pub domain: String,
    /// Cookie whose non-empty value marks a logged-in browser
    pub auth_cookie: String,
    /// Cookie holding the account id used to deduplicate sessions
    pub account_cookie: String,
    /// Applied on restore to cookies captured without a same-site policy
    pub default_same_site: SameSite,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            domain: "instagram.com".to_string(),
            auth_cookie: "sessionid".to_string(),
            account_cookie: "ds_user_id".to_string(),
            default_same_site: SameSite::NoRestriction,
        }
    }
}
