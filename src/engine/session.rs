use rustc_hash::FxHashMap;
use serde::Serialize;
use std::sync::{Arc, PoisonError, RwLock};

pub type TabId = i64;

/// Transient per-tab flags. At most one of them is set at a time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TabSession {
    /// The user already chose to continue into a blocked domain in this tab.
    pub allowed_on_blocked_site: bool,
    /// The tab is currently showing the interstitial.
    pub on_interstitial: bool,
}

impl TabSession {
    fn is_clear(&self) -> bool {
        !self.allowed_on_blocked_site && !self.on_interstitial
    }
}

/// In-memory tab id → session flags. Lost on restart, which simply means
/// every tab gets prompted again.
#[derive(Debug, Clone, Default)]
pub struct TabSessionTracker {
    tabs: Arc<RwLock<FxHashMap<TabId, TabSession>>>,
}

impl TabSessionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, tab_id: TabId) -> TabSession {
        let tabs = self.tabs.read().unwrap_or_else(PoisonError::into_inner);
        tabs.get(&tab_id).copied().unwrap_or_default()
    }

    pub fn mark_allowed(&self, tab_id: TabId) {
        self.update(tab_id, |s| {
            s.allowed_on_blocked_site = true;
            s.on_interstitial = false;
        });
    }

    pub fn mark_on_interstitial(&self, tab_id: TabId) {
        self.update(tab_id, |s| {
            s.on_interstitial = true;
            s.allowed_on_blocked_site = false;
        });
    }

    pub fn clear_interstitial(&self, tab_id: TabId) {
        self.update(tab_id, |s| s.on_interstitial = false);
    }

    /// Tab closed: forget it entirely.
    pub fn clear_all(&self, tab_id: TabId) {
        let mut tabs = self.tabs.write().unwrap_or_else(PoisonError::into_inner);
        tabs.remove(&tab_id);
    }

    /// The tab left the blocked domains; any earlier grant ends here.
    pub fn reset(&self, tab_id: TabId) {
        self.clear_all(tab_id);
    }

    pub fn tracked_tabs(&self) -> usize {
        self.tabs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn update(&self, tab_id: TabId, f: impl FnOnce(&mut TabSession)) {
        let mut tabs = self.tabs.write().unwrap_or_else(PoisonError::into_inner);
        let session = tabs.entry(tab_id).or_default();
        f(session);
        if session.is_clear() {
            tabs.remove(&tab_id);
        }
    }
}
