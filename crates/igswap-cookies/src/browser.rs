//! Cookie jar mirrored from the extension
//!
//! The host cannot touch the browser's cookie store itself. The extension
//! reports the site's live cookies with each request, and every `set` or
//! `remove` the host performs is journaled as a [`CookieOp`] that the
//! extension replays through `chrome.cookies`, in order.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use url::Url;

use crate::cookie::Cookie;
use crate::jar::{CookieJar, MemoryCookieJar};
use crate::Result;

/// A change for the extension to apply to the browser jar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum CookieOp {
    /// `chrome.cookies.remove({url, name})`
    Remove { url: String, name: String },
    /// `chrome.cookies.set({url, ...cookie})`
    Set { url: String, cookie: Cookie },
}

pub struct BrowserCookieJar {
    mirror: MemoryCookieJar,
    ops: Arc<Mutex<Vec<CookieOp>>>,
}

impl BrowserCookieJar {
    pub fn new() -> Self {
        Self::over(MemoryCookieJar::new())
    }

    /// Mirror kept in `jar`
    pub fn over(jar: MemoryCookieJar) -> Self {
        Self {
            mirror: jar,
            ops: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Take the browser's word for what is on `domain`.
    ///
    /// Unapplied ops from an earlier request are dropped: the snapshot
    /// already reflects whatever the extension did with them.
    pub fn sync(&self, domain: &str, cookies: Vec<Cookie>) {
        let count = cookies.len();
        let foreign = self.mirror.replace_site(domain, cookies);
        let stale = std::mem::take(&mut *self.ops.lock()).len();

        if foreign > 0 {
            tracing::warn!(domain = %domain, foreign, "Ignored cookies outside the site");
        }
        tracing::debug!(domain = %domain, count = count - foreign, stale, "Synced browser cookies");
    }

    /// Drain the journal, oldest first
    pub fn take_ops(&self) -> Vec<CookieOp> {
        std::mem::take(&mut *self.ops.lock())
    }

    fn record(&self, op: CookieOp) {
        self.ops.lock().push(op);
    }
}

impl Default for BrowserCookieJar {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for BrowserCookieJar {
    fn clone(&self) -> Self {
        Self {
            mirror: self.mirror.clone(),
            ops: Arc::clone(&self.ops),
        }
    }
}

impl CookieJar for BrowserCookieJar {
    fn list(&self, domain: &str) -> Result<Vec<Cookie>> {
        self.mirror.list(domain)
    }

    fn set(&self, cookie: &Cookie) -> Result<()> {
        let url = cookie.url()?;
        self.mirror.set(cookie)?;
        self.record(CookieOp::Set {
            url: url.to_string(),
            cookie: cookie.clone(),
        });
        Ok(())
    }

    fn remove(&self, url: &Url, name: &str) -> Result<bool> {
        let removed = self.mirror.remove(url, name)?;
        if removed {
            self.record(CookieOp::Remove {
                url: url.to_string(),
                name: name.to_string(),
            });
        } else {
            tracing::debug!(url = %url, name = %name, "Cookie not in mirror");
        }
        Ok(removed)
    }
}
