//! Background state container
//!
//! Owns every piece of host state. Protocol handlers receive it explicitly
//! instead of reaching for module-level globals.

use serde_json::Value;
use std::sync::Arc;

use igswap_cookies::BrowserCookieJar;
use igswap_session::SessionStore;
use igswap_storage::Database;
use igswap_tabs::{TabManager, TabStatus};

use crate::config::Config;
use crate::protocol::{LoadedSession, Request, Response};
use crate::Result;

pub struct Background {
    /// Configuration
    config: Config,
    /// Host-side mirror of the browser's cookies for the site
    jar: BrowserCookieJar,
    /// Open tab registry, also the store's reload capability
    tab_manager: TabManager,
    store: SessionStore,
}

impl Background {
    /// Open the configured database; the live jar starts empty until the
    /// extension reports cookies
    pub fn new(config: Config) -> Result<Self> {
        let db = Database::open(&config.database_path)?;

        tracing::info!(
            database = %config.database_path.display(),
            domain = %config.site.domain,
            "Background initialized"
        );

        Ok(Self::with_parts(config, db, BrowserCookieJar::new()))
    }

    /// Assemble from an already-open database and jar
    pub fn with_parts(config: Config, db: Database, jar: BrowserCookieJar) -> Self {
        let tab_manager = TabManager::new();
        let store = SessionStore::new(
            db,
            Arc::new(jar.clone()),
            Arc::new(tab_manager.clone()),
            config.site.clone(),
        );

        Self {
            config,
            jar,
            tab_manager,
            store,
        }
    }

    pub fn tab_manager(&self) -> &TabManager {
        &self.tab_manager
    }

    /// Run one request against the store
    pub fn handle(&self, mut request: Request) -> Result<Response> {
        if let Some(cookies) = request.take_cookies() {
            self.jar.sync(&self.config.site.domain, cookies);
        }

        let response = match request {
            Request::GetSessions => Response::Sessions(self.store.list_sessions()?),
            Request::SaveSession { account_name, .. } => {
                Response::Session(self.store.capture_current_session(account_name)?)
            }
            Request::LoadSession { session_id, .. } => {
                let activation = self.store.activate_session(&session_id);
                // Drained even on failure so the journal never outlives its request
                let cookie_ops = self.jar.take_ops();
                Response::Loaded(LoadedSession {
                    activation: activation?,
                    cookie_ops,
                })
            }
            Request::DeleteSession { session_id } => {
                self.store.delete_session(&session_id)?;
                Response::success()
            }
            Request::DetectAccount { .. } => {
                Response::Account(self.store.detect_active_account()?)
            }
            Request::TabUpdated {
                tab_id,
                url,
                status,
            } => {
                self.tab_manager
                    .update_tab(tab_id, url, status.unwrap_or(TabStatus::Complete))?;
                Response::success()
            }
            Request::TabRemoved { tab_id } => {
                self.tab_manager.remove_tab(tab_id);
                Response::success()
            }
            Request::SyncCookies { .. } => Response::success(),
        };

        Ok(response)
    }

    /// Like [`Background::handle`], with failures folded into `{error}`
    pub fn dispatch(&self, request: Request) -> Response {
        let action = request.action();
        match self.handle(request) {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(action, error = %e, "Request failed");
                e.into()
            }
        }
    }

    /// Decode and dispatch a raw message
    pub fn dispatch_value(&self, value: Value) -> Response {
        match Request::from_value(value) {
            Ok(request) => self.dispatch(request),
            Err(e) => {
                tracing::warn!(error = %e, "Rejected message");
                e.into()
            }
        }
    }
}
