//! Live cookie jar seam

use chrono::Utc;
use parking_lot::RwLock;
use std::collections::HashSet;
use std::sync::Arc;
use url::Url;

use crate::cookie::{domain_matches, Cookie};
use crate::error::CookieError;
use crate::Result;

/// The browser's live cookie storage.
///
/// Implementations must be safe to share between the worker and whoever
/// feeds the jar, hence `Send + Sync`.
pub trait CookieJar: Send + Sync {
    /// Every unexpired cookie on `domain` or one of its subdomains, in jar order.
    fn list(&self, domain: &str) -> Result<Vec<Cookie>>;

    /// Inserts or replaces the cookie in its (name, domain, path) slot.
    fn set(&self, cookie: &Cookie) -> Result<()>;

    /// Removes the cookie named `name` addressed by `url`.
    ///
    /// Returns whether anything was removed; absent cookies are not an error.
    fn remove(&self, url: &Url, name: &str) -> Result<bool>;
}

/// True when `cookie` is addressed by (`url`, `name`)
///
/// Compared in url form on both sides, so a stored path that the url parser
/// normalizes (spaces, missing leading slash) still resolves to its slot.
pub(crate) fn addressed_by(cookie: &Cookie, url: &Url, name: &str) -> bool {
    if cookie.name != name {
        return false;
    }
    match cookie.url() {
        Ok(own) => own.host_str() == url.host_str() && own.path() == url.path(),
        Err(_) => false,
    }
}

/// In-process jar
///
/// Holds the cookies of a [`crate::BrowserCookieJar`] and backs tests.
/// Names registered with
/// [`MemoryCookieJar::reject`] fail on `set` and `remove`, standing in for
/// cookies the browser refuses.
#[derive(Default)]
pub struct MemoryCookieJar {
    cookies: Arc<RwLock<Vec<Cookie>>>,
    rejected: Arc<RwLock<HashSet<String>>>,
}

impl MemoryCookieJar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cookies(cookies: impl IntoIterator<Item = Cookie>) -> Self {
        Self {
            cookies: Arc::new(RwLock::new(cookies.into_iter().collect())),
            rejected: Arc::new(RwLock::new(HashSet::new())),
        }
    }

    /// Make every later `set`/`remove` of `name` fail
    pub fn reject(&self, name: impl Into<String>) {
        self.rejected.write().insert(name.into());
    }

    /// Everything in the jar, any domain, in jar order
    pub fn all(&self) -> Vec<Cookie> {
        self.cookies.read().clone()
    }

    pub fn get(&self, name: &str) -> Option<Cookie> {
        self.cookies.read().iter().find(|c| c.name == name).cloned()
    }

    /// Replace every cookie on `domain` with `cookies`, leaving other sites alone.
    ///
    /// Cookies outside `domain` are dropped and their count returned.
    pub fn replace_site(&self, domain: &str, cookies: Vec<Cookie>) -> usize {
        let (kept, foreign): (Vec<Cookie>, Vec<Cookie>) = cookies
            .into_iter()
            .partition(|c| domain_matches(&c.domain, domain));

        let mut jar = self.cookies.write();
        jar.retain(|c| !domain_matches(&c.domain, domain));
        jar.extend(kept);
        foreign.len()
    }

    fn check_rejected(&self, name: &str, action: &str) -> Result<()> {
        if self.rejected.read().contains(name) {
            return Err(CookieError::Rejected {
                name: name.to_string(),
                reason: format!("{} refused", action),
            });
        }
        Ok(())
    }
}

impl Clone for MemoryCookieJar {
    fn clone(&self) -> Self {
        Self {
            cookies: Arc::clone(&self.cookies),
            rejected: Arc::clone(&self.rejected),
        }
    }
}

impl CookieJar for MemoryCookieJar {
    fn list(&self, domain: &str) -> Result<Vec<Cookie>> {
        let now = Utc::now();
        Ok(self
            .cookies
            .read()
            .iter()
            .filter(|c| domain_matches(&c.domain, domain) && !c.is_expired(now))
            .cloned()
            .collect())
    }

    fn set(&self, cookie: &Cookie) -> Result<()> {
        self.check_rejected(&cookie.name, "set")?;
        cookie.url()?;

        let mut cookies = self.cookies.write();
        let existing = cookies.iter().position(|c| c.same_slot(cookie));

        // An already-expired cookie deletes its slot, as in a browser
        if cookie.is_expired(Utc::now()) {
            if let Some(index) = existing {
                cookies.remove(index);
            }
            return Ok(());
        }

        match existing {
            Some(index) => cookies[index] = cookie.clone(),
            None => cookies.push(cookie.clone()),
        }
        Ok(())
    }

    fn remove(&self, url: &Url, name: &str) -> Result<bool> {
        self.check_rejected(name, "remove")?;

        let mut cookies = self.cookies.write();
        let before = cookies.len();
        cookies.retain(|c| !addressed_by(c, url, name));
        Ok(cookies.len() != before)
    }
}
