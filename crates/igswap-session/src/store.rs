//! Session Store
//!
//! Persists snapshots in the local storage area and swaps the live cookie
//! jar. Every read-modify-write of the snapshot list runs in one storage
//! transaction.

use std::sync::Arc;

use igswap_cookies::{Cookie, CookieJar};
use igswap_storage::{Database, LocalArea};
use igswap_tabs::TabReloader;

use crate::error::SessionError;
use crate::session::{AccountSession, AccountStatus, Activation, SessionList, UNKNOWN_ACCOUNT};
use crate::site::SiteConfig;
use crate::Result;

/// Storage key of the ordered snapshot list
pub const SESSIONS_KEY: &str = "sessions";
/// Storage key of the last activated session id
pub const ACTIVE_SESSION_KEY: &str = "activeSessionId";

pub struct SessionStore {
    db: Database,
    jar: Arc<dyn CookieJar>,
    reloader: Arc<dyn TabReloader>,
    site: SiteConfig,
}

impl SessionStore {
    pub fn new(
        db: Database,
        jar: Arc<dyn CookieJar>,
        reloader: Arc<dyn TabReloader>,
        site: SiteConfig,
    ) -> Self {
        Self {
            db,
            jar,
            reloader,
            site,
        }
    }

    /// All snapshots in display order, plus the active pointer
    pub fn list_sessions(&self) -> Result<SessionList> {
        let list = self.db.read_local(|area| {
            Ok(SessionList {
                sessions: load_sessions(area)?,
                active_session_id: area.get(ACTIVE_SESSION_KEY)?,
            })
        })?;
        Ok(list)
    }

    pub fn get_session(&self, session_id: &str) -> Result<AccountSession> {
        let sessions = self.db.read_local(load_sessions)?;
        sessions
            .into_iter()
            .find(|s| s.id == session_id)
            .ok_or_else(|| SessionError::NotFound(session_id.to_string()))
    }

    /// Snapshot the live jar under `label`.
    ///
    /// A snapshot for the same account key is replaced at its position;
    /// otherwise the new one is appended.
    pub fn capture_current_session(&self, label: String) -> Result<AccountSession> {
        let cookies = self.jar.list(&self.site.domain)?;

        if cookies.is_empty() {
            return Err(SessionError::NoSession(self.site.domain.clone()));
        }
        if find_value(&cookies, &self.site.auth_cookie).is_none() {
            return Err(SessionError::NotAuthenticated(self.site.auth_cookie.clone()));
        }

        let account_key = find_value(&cookies, &self.site.account_cookie)
            .unwrap_or(UNKNOWN_ACCOUNT)
            .to_string();

        let session = AccountSession::new(label, account_key, cookies);

        let replaced = self.db.update_local(|area| {
            let mut sessions = load_sessions(area)?;
            let replaced = match sessions
                .iter()
                .position(|s| s.account_key == session.account_key)
            {
                Some(index) => {
                    sessions[index] = session.clone();
                    true
                }
                None => {
                    sessions.push(session.clone());
                    false
                }
            };
            area.set(SESSIONS_KEY, &sessions)?;
            Ok(replaced)
        })?;

        tracing::info!(
            session_id = %session.id,
            session_name = %session.name,
            account_key = %session.account_key,
            cookie_count = session.cookie_count(),
            replaced,
            "Captured session"
        );

        Ok(session)
    }

    /// Swap the live jar to the snapshot `session_id`.
    ///
    /// Every live cookie of the site is removed before any stored cookie is
    /// set. Per-cookie failures are logged and counted in the returned
    /// [`Activation`], never raised.
    pub fn activate_session(&self, session_id: &str) -> Result<Activation> {
        let session = self.get_session(session_id)?;
        let domain = &self.site.domain;

        let live = self.jar.list(domain)?;
        let mut failed_removals = 0;
        for cookie in &live {
            let removed = cookie
                .url()
                .and_then(|url| self.jar.remove(&url, &cookie.name));
            match removed {
                Ok(true) => {}
                // Just listed, so a miss means the cookie is still there
                Ok(false) => {
                    tracing::warn!(cookie = %cookie.name, domain = %cookie.domain, path = %cookie.path, "Listed cookie was not removed");
                    failed_removals += 1;
                }
                Err(e) => {
                    tracing::warn!(cookie = %cookie.name, domain = %cookie.domain, error = %e, "Failed to remove cookie");
                    failed_removals += 1;
                }
            }
        }

        let mut skipped_cookies = 0;
        for stored in &session.cookies {
            let mut cookie = stored.clone();
            if cookie.same_site.is_none() {
                cookie.same_site = Some(self.site.default_same_site);
            }

            if let Err(e) = self.jar.set(&cookie) {
                tracing::warn!(cookie = %cookie.name, domain = %cookie.domain, error = %e, "Failed to restore cookie");
                skipped_cookies += 1;
            }
        }

        self.db.set_item(ACTIVE_SESSION_KEY, &session.id)?;

        let reload_tab_ids = self.reloader.reload_site(domain);

        tracing::info!(
            session_id = %session.id,
            session_name = %session.name,
            cleared = live.len(),
            restored = session.cookie_count() - skipped_cookies,
            skipped_cookies,
            failed_removals,
            "Activated session"
        );

        Ok(Activation {
            session,
            skipped_cookies,
            failed_removals,
            reload_tab_ids,
        })
    }

    /// Delete a snapshot. Unknown ids are a no-op.
    ///
    /// Clears the active pointer when it referenced `session_id`; the live
    /// jar is left alone. Returns whether a snapshot was removed.
    pub fn delete_session(&self, session_id: &str) -> Result<bool> {
        let removed = self.db.update_local(|area| {
            let mut sessions = load_sessions(area)?;
            let before = sessions.len();
            sessions.retain(|s| s.id != session_id);
            let removed = sessions.len() != before;
            if removed {
                area.set(SESSIONS_KEY, &sessions)?;
            }

            let active: Option<String> = area.get(ACTIVE_SESSION_KEY)?;
            if active.as_deref() == Some(session_id) {
                area.remove(ACTIVE_SESSION_KEY)?;
            }

            Ok(removed)
        })?;

        if removed {
            tracing::info!(session_id = %session_id, "Deleted session");
        }

        Ok(removed)
    }

    /// Login state of the live jar; persisted state is not read
    pub fn detect_active_account(&self) -> Result<AccountStatus> {
        let cookies = self.jar.list(&self.site.domain)?;

        Ok(AccountStatus {
            is_logged_in: find_value(&cookies, &self.site.auth_cookie).is_some(),
            account_key: find_value(&cookies, &self.site.account_cookie).map(str::to_string),
        })
    }
}

fn load_sessions(area: &LocalArea<'_>) -> igswap_storage::Result<Vec<AccountSession>> {
    Ok(area.get(SESSIONS_KEY)?.unwrap_or_default())
}

/// Non-empty value of the cookie called `name`
fn find_value<'a>(cookies: &'a [Cookie], name: &str) -> Option<&'a str> {
    cookies
        .iter()
        .find(|c| c.name == name && c.has_value())
        .map(|c| c.value.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use igswap_cookies::{MemoryCookieJar, SameSite};
    use igswap_tabs::{TabManager, TabStatus};

    struct Fixture {
        store: SessionStore,
        jar: MemoryCookieJar,
        tabs: TabManager,
        db: Database,
    }

    fn fixture(cookies: Vec<Cookie>) -> Fixture {
        let db = Database::open_in_memory().unwrap();
        let jar = MemoryCookieJar::with_cookies(cookies);
        let tabs = TabManager::new();
        let store = SessionStore::new(
            db.clone(),
            Arc::new(jar.clone()),
            Arc::new(tabs.clone()),
            SiteConfig::default(),
        );
        Fixture {
            store,
            jar,
            tabs,
            db,
        }
    }

    fn ig(name: &str, value: &str) -> Cookie {
        Cookie::new(name, value, ".instagram.com").secure()
    }

    /// Replace the whole live jar, as a browser login would
    fn log_in(jar: &MemoryCookieJar, cookies: Vec<Cookie>) {
        for cookie in jar.list("instagram.com").unwrap() {
            jar.remove(&cookie.url().unwrap(), &cookie.name).unwrap();
        }
        for cookie in cookies {
            jar.set(&cookie).unwrap();
        }
    }

    #[test]
    fn test_capture_without_cookies() {
        let f = fixture(vec![Cookie::new("NID", "x", ".google.com")]);
        let err = f.store.capture_current_session("Work".to_string()).unwrap_err();
        assert!(matches!(err, SessionError::NoSession(_)));
        assert!(f.store.list_sessions().unwrap().sessions.is_empty());
    }

    #[test]
    fn test_capture_without_auth_cookie() {
        let f = fixture(vec![ig("ds_user_id", "42"), ig("csrftoken", "t")]);
        let err = f.store.capture_current_session("Work".to_string()).unwrap_err();
        assert!(matches!(err, SessionError::NotAuthenticated(_)));

        log_in(&f.jar, vec![ig("sessionid", ""), ig("ds_user_id", "42")]);
        let err = f.store.capture_current_session("Work".to_string()).unwrap_err();
        assert!(matches!(err, SessionError::NotAuthenticated(_)));
    }

    #[test]
    fn test_capture_and_recapture_same_account() {
        let f = fixture(vec![ig("sessionid", "abc"), ig("ds_user_id", "42")]);

        let first = f.store.capture_current_session("Work".to_string()).unwrap();
        assert_eq!(first.account_key, "42");
        assert_eq!(first.cookie_count(), 2);

        let list = f.store.list_sessions().unwrap();
        assert_eq!(list.sessions.len(), 1);
        assert_eq!(list.sessions[0].id, first.id);

        log_in(&f.jar, vec![ig("sessionid", "xyz"), ig("ds_user_id", "42")]);
        let second = f.store.capture_current_session("Work2".to_string()).unwrap();
        assert_ne!(second.id, first.id);

        let list = f.store.list_sessions().unwrap();
        assert_eq!(list.sessions.len(), 1);
        assert_eq!(list.sessions[0].name, "Work2");
        assert_eq!(list.sessions[0].cookie("sessionid").unwrap().value, "xyz");
    }

    #[test]
    fn test_recapture_keeps_position() {
        let f = fixture(vec![ig("sessionid", "a"), ig("ds_user_id", "1")]);
        f.store.capture_current_session("One".to_string()).unwrap();

        log_in(&f.jar, vec![ig("sessionid", "b"), ig("ds_user_id", "2")]);
        f.store.capture_current_session("Two".to_string()).unwrap();

        log_in(&f.jar, vec![ig("sessionid", "c"), ig("ds_user_id", "1")]);
        f.store.capture_current_session("One again".to_string()).unwrap();

        let names: Vec<String> = f
            .store
            .list_sessions()
            .unwrap()
            .sessions
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names, vec!["One again", "Two"]);
    }

    #[test]
    fn test_unknown_account_collides() {
        let f = fixture(vec![ig("sessionid", "a")]);
        let first = f.store.capture_current_session("Anon".to_string()).unwrap();
        assert_eq!(first.account_key, UNKNOWN_ACCOUNT);

        log_in(&f.jar, vec![ig("sessionid", "b")]);
        f.store.capture_current_session("Anon 2".to_string()).unwrap();

        let list = f.store.list_sessions().unwrap();
        assert_eq!(list.sessions.len(), 1);
        assert_eq!(list.sessions[0].name, "Anon 2");
        assert!(list.sessions[0].is_unidentified());
    }

    #[test]
    fn test_activate_unknown_session() {
        let f = fixture(vec![ig("sessionid", "a"), ig("ds_user_id", "1")]);
        let session = f.store.capture_current_session("One".to_string()).unwrap();
        f.store.activate_session(&session.id).unwrap();

        let err = f.store.activate_session("missing").unwrap_err();
        assert!(matches!(err, SessionError::NotFound(_)));
        assert_eq!(
            f.store.list_sessions().unwrap().active_session_id,
            Some(session.id)
        );
    }

    #[test]
    fn test_activate_swaps_live_jar() {
        let f = fixture(vec![
            ig("sessionid", "a"),
            ig("ds_user_id", "1"),
            Cookie::new("NID", "x", ".google.com"),
        ]);
        let one = f.store.capture_current_session("One".to_string()).unwrap();

        log_in(
            &f.jar,
            vec![ig("sessionid", "b"), ig("ds_user_id", "2"), ig("rur", "leftover")],
        );
        f.tabs
            .update_tab(8, "https://www.instagram.com/".to_string(), TabStatus::Complete)
            .unwrap();

        let activation = f.store.activate_session(&one.id).unwrap();
        assert!(activation.is_complete());
        assert_eq!(activation.reload_tab_ids, vec![8]);
        assert_eq!(f.tabs.get_tab(8).unwrap().status, TabStatus::Loading);

        let live = f.jar.list("instagram.com").unwrap();
        assert_eq!(live.len(), one.cookie_count());
        for stored in &one.cookies {
            let restored = live.iter().find(|c| c.name == stored.name).unwrap();
            assert_eq!(restored.value, stored.value);
        }
        assert!(f.jar.get("rur").is_none());
        assert!(f.jar.get("NID").is_some());

        let list = f.store.list_sessions().unwrap();
        assert_eq!(list.active_session_id.as_deref(), Some(one.id.as_str()));
        assert_eq!(list.active().unwrap().name, "One");
        assert_eq!(f.store.detect_active_account().unwrap().account_key.as_deref(), Some("1"));
    }

    #[test]
    fn test_activate_restores_attributes() {
        let f = fixture(vec![
            ig("sessionid", "a").http_only(),
            ig("ds_user_id", "1"),
            ig("csrftoken", "t").with_same_site(SameSite::Strict),
        ]);
        let session = f.store.capture_current_session("One".to_string()).unwrap();
        f.store.activate_session(&session.id).unwrap();

        let sessionid = f.jar.get("sessionid").unwrap();
        assert!(sessionid.secure);
        assert!(sessionid.http_only);
        assert_eq!(sessionid.same_site, Some(SameSite::NoRestriction));
        assert_eq!(f.jar.get("ds_user_id").unwrap().same_site, Some(SameSite::NoRestriction));
        assert_eq!(f.jar.get("csrftoken").unwrap().same_site, Some(SameSite::Strict));
    }

    #[test]
    fn test_activate_tolerates_cookie_failures() {
        let f = fixture(vec![ig("sessionid", "a"), ig("ds_user_id", "1"), ig("mid", "m")]);
        let session = f.store.capture_current_session("One".to_string()).unwrap();

        f.jar.reject("mid");
        let activation = f.store.activate_session(&session.id).unwrap();

        // mid could be neither cleared nor restored
        assert_eq!(activation.failed_removals, 1);
        assert_eq!(activation.skipped_cookies, 1);
        assert_eq!(f.jar.get("sessionid").unwrap().value, "a");
        assert_eq!(
            f.store.list_sessions().unwrap().active_session_id,
            Some(session.id)
        );
    }

    #[test]
    fn test_activate_clears_unusual_paths() {
        let f = fixture(vec![ig("sessionid", "a"), ig("ds_user_id", "1")]);
        let one = f.store.capture_current_session("One".to_string()).unwrap();

        log_in(
            &f.jar,
            vec![
                ig("sessionid", "b"),
                ig("ds_user_id", "2"),
                ig("pref", "account2").with_path("/my dir"),
            ],
        );

        let activation = f.store.activate_session(&one.id).unwrap();
        assert_eq!(activation.failed_removals, 0);
        assert!(f.jar.get("pref").is_none());
    }

    /// Accepts every removal without removing anything
    struct StickyJar(MemoryCookieJar);

    impl CookieJar for StickyJar {
        fn list(&self, domain: &str) -> igswap_cookies::Result<Vec<Cookie>> {
            self.0.list(domain)
        }

        fn set(&self, cookie: &Cookie) -> igswap_cookies::Result<()> {
            self.0.set(cookie)
        }

        fn remove(&self, _url: &url::Url, _name: &str) -> igswap_cookies::Result<bool> {
            Ok(false)
        }
    }

    #[test]
    fn test_activate_counts_cookies_left_behind() {
        let f = fixture(vec![ig("sessionid", "a"), ig("ds_user_id", "1")]);
        let one = f.store.capture_current_session("One".to_string()).unwrap();
        log_in(&f.jar, vec![ig("sessionid", "b"), ig("ds_user_id", "2"), ig("rur", "x")]);

        let store = SessionStore::new(
            f.db.clone(),
            Arc::new(StickyJar(f.jar.clone())),
            Arc::new(f.tabs.clone()),
            SiteConfig::default(),
        );
        let activation = store.activate_session(&one.id).unwrap();

        assert_eq!(activation.failed_removals, 3);
        assert_eq!(activation.skipped_cookies, 0);
        assert!(!activation.is_complete());
        assert_eq!(f.jar.get("rur").unwrap().value, "x");
    }

    #[test]
    fn test_delete_session() {
        let f = fixture(vec![ig("sessionid", "a"), ig("ds_user_id", "1")]);
        let one = f.store.capture_current_session("One".to_string()).unwrap();
        log_in(&f.jar, vec![ig("sessionid", "b"), ig("ds_user_id", "2")]);
        let two = f.store.capture_current_session("Two".to_string()).unwrap();

        f.store.activate_session(&two.id).unwrap();

        // Non-active delete keeps the pointer
        assert!(f.store.delete_session(&one.id).unwrap());
        assert_eq!(
            f.store.list_sessions().unwrap().active_session_id.as_deref(),
            Some(two.id.as_str())
        );

        // Active delete clears it, and leaves the live jar alone
        assert!(f.store.delete_session(&two.id).unwrap());
        let list = f.store.list_sessions().unwrap();
        assert!(list.sessions.is_empty());
        assert!(list.active_session_id.is_none());
        assert_eq!(f.jar.get("sessionid").unwrap().value, "b");

        // Repeats and unknown ids are no-ops
        assert!(!f.store.delete_session(&two.id).unwrap());
        assert!(!f.store.delete_session("missing").unwrap());
    }

    #[test]
    fn test_detect_active_account() {
        let f = fixture(Vec::new());
        assert_eq!(
            f.store.detect_active_account().unwrap(),
            AccountStatus {
                is_logged_in: false,
                account_key: None
            }
        );

        log_in(&f.jar, vec![ig("sessionid", "a"), ig("ds_user_id", "42")]);
        let status = f.store.detect_active_account().unwrap();
        assert!(status.is_logged_in);
        assert_eq!(status.account_key.as_deref(), Some("42"));

        // Detection never writes persisted state
        assert!(f.store.list_sessions().unwrap().sessions.is_empty());
    }

    #[test]
    fn test_persisted_layout() {
        let f = fixture(vec![ig("sessionid", "a"), ig("ds_user_id", "1")]);
        let session = f.store.capture_current_session("One".to_string()).unwrap();
        f.store.activate_session(&session.id).unwrap();

        let raw: serde_json::Value = f.db.get_item(SESSIONS_KEY).unwrap().unwrap();
        assert_eq!(raw[0]["id"], session.id.as_str());
        assert_eq!(raw[0]["accountKey"], "1");
        assert_eq!(raw[0]["cookies"][0]["name"], "sessionid");

        let active: String = f.db.get_item(ACTIVE_SESSION_KEY).unwrap().unwrap();
        assert_eq!(active, session.id);
    }
}
