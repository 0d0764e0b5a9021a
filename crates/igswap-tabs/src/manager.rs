//! Tab Manager
//!
//! In-memory registry of the browser's open tabs. Tabs are not persisted:
//! browser tab ids do not survive a restart.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::TabError;
use crate::tab::{Tab, TabId, TabStatus};
use crate::Result;

/// Reload capability used after the live cookie jar has been swapped.
pub trait TabReloader: Send + Sync {
    /// Reloads every open tab on `domain`, returning the ids in ascending order.
    fn reload_site(&self, domain: &str) -> Vec<TabId>;
}

pub struct TabManager {
    tabs: Arc<RwLock<HashMap<TabId, Tab>>>,
}

impl TabManager {
    pub fn new() -> Self {
        Self {
            tabs: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Record a tab creation, navigation or status change
    pub fn update_tab(&self, id: TabId, url: String, status: TabStatus) -> Result<Tab> {
        let mut tabs = self.tabs.write();
        let tab = match tabs.get_mut(&id) {
            Some(tab) => {
                tab.navigate(url, status)?;
                tab.clone()
            }
            None => {
                let tab = Tab::new(id, url, status)?;
                tabs.insert(id, tab.clone());
                tab
            }
        };

        tracing::debug!(tab_id = id, url = %tab.url, status = %tab.status, "Tab updated");

        Ok(tab)
    }

    /// Forget a closed tab; unknown ids are ignored
    pub fn remove_tab(&self, id: TabId) -> bool {
        let removed = self.tabs.write().remove(&id).is_some();
        if removed {
            tracing::debug!(tab_id = id, "Tab removed");
        }
        removed
    }

    pub fn get_tab(&self, id: TabId) -> Result<Tab> {
        self.tabs
            .read()
            .get(&id)
            .cloned()
            .ok_or(TabError::NotFound(id))
    }

    /// All tabs, ordered by id
    pub fn list_tabs(&self) -> Vec<Tab> {
        let mut tabs: Vec<Tab> = self.tabs.read().values().cloned().collect();
        tabs.sort_by_key(|t| t.id);
        tabs
    }

    pub fn tabs_on_site(&self, domain: &str) -> Vec<Tab> {
        self.list_tabs()
            .into_iter()
            .filter(|t| t.is_on_site(domain))
            .collect()
    }
}

impl Default for TabManager {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for TabManager {
    fn clone(&self) -> Self {
        Self {
            tabs: Arc::clone(&self.tabs),
        }
    }
}

impl TabReloader for TabManager {
    fn reload_site(&self, domain: &str) -> Vec<TabId> {
        let mut tabs = self.tabs.write();
        let mut reloaded: Vec<TabId> = tabs
            .values_mut()
            .filter(|t| t.is_on_site(domain))
            .map(|t| {
                t.mark_reloading();
                t.id
            })
            .collect();
        reloaded.sort_unstable();

        tracing::info!(domain = %domain, count = reloaded.len(), "Reloading site tabs");

        reloaded
    }
}
