/// Pinned tab operations: sync, reset, repin, pin toggling and listing.

use futures::future::join_all;

use crate::config::Config;
use crate::error::{BatchReport, HostError};
use crate::host::{KeyValueStore, TabRegistry};
use crate::storage::HomeUrlStore;
use crate::tab_data::{PinnedTabView, TabId, TabInfo, TabQuery, TabRef, TabUpdate};

/// Keeps pinned tabs tied to their home URL.
///
/// Holds no state of its own: every home URL lives in the host's session
/// storage, every tab in the host's registry. Build one per event.
pub struct PinSynchronizer<R, S> {
    tabs: R,
    homes: HomeUrlStore<S>,
    discard_on_sync: bool,
    replace_history: bool,
}

impl<R: TabRegistry, S: KeyValueStore> PinSynchronizer<R, S> {
    pub fn new(tabs: R, store: S, config: &Config) -> Self {
        PinSynchronizer {
            tabs,
            homes: HomeUrlStore::new(store, config.home_url_key.clone()),
            discard_on_sync: config.discard_on_sync,
            replace_history: false,
        }
    }

    /// Restores replace the drifted history entry (`loadReplace`, Firefox only)
    pub fn with_history_replace(mut self, replace_history: bool) -> Self {
        self.replace_history = replace_history;
        self
    }

    pub async fn home_url(&self, id: TabId) -> Result<Option<String>, HostError> {
        self.homes.home_url(id).await
    }

    /// Turn a tab-or-id into a full tab record. `None` if the id is gone.
    async fn resolve(&self, tab: TabRef) -> Result<Option<TabInfo>, HostError> {
        match tab {
            TabRef::Tab(tab) => Ok(Some(tab)),
            TabRef::Id(id) => {
                let found = self.tabs.get(id).await?;
                if found.is_none() {
                    log::debug!("Tab {} does not exist. No action taken.", id);
                }
                Ok(found)
            }
        }
    }

    async fn resolve_pinned(&self, tab: TabRef) -> Result<Option<TabInfo>, HostError> {
        Ok(self.resolve(tab).await?.filter(|tab| {
            if !tab.pinned {
                log::debug!("Tab {} is not pinned. No action taken.", tab.id);
            }
            tab.pinned
        }))
    }

    /// Run at install and startup: record a home URL for pinned tabs that
    /// lack one, discard the others and send drifted ones back home.
    pub async fn sync_all(&self) -> Result<BatchReport, HostError> {
        let pinned = self.tabs.query(&TabQuery::pinned()).await?;
        let mut report = BatchReport::default();

        for tab in &pinned {
            let result = self.sync_tab(tab).await;
            report.record(tab.id, result);
        }

        Ok(report)
    }

    async fn sync_tab(&self, tab: &TabInfo) -> Result<(), HostError> {
        let Some(home) = self.homes.home_url(tab.id).await? else {
            self.homes.set_home_url(tab.id, &tab.url).await?;
            log::info!("Saved Home URL: {}", tab.url);
            return Ok(());
        };

        if self.discard_on_sync {
            self.tabs.discard(tab.id).await?;
            log::info!("Discarded tab {} to reset it to Home URL", tab.id);
        }

        if home != tab.url {
            self.tabs.update(tab.id, &TabUpdate::restore(home.as_str(), self.replace_history)).await?;
            log::info!("Reset tab {} to Home URL: {}", tab.id, home);
        }

        Ok(())
    }

    /// Record the tab's current URL as home after a pin transition, unless one
    /// is already stored. Two pin events racing here both write; last one wins.
    pub async fn bootstrap(&self, tab: &TabInfo) -> Result<(), HostError> {
        if let Some(existing) = self.homes.home_url(tab.id).await? {
            log::info!("Tab {} is already pinned with Home URL: {}", tab.id, existing);
            return Ok(());
        }

        self.homes.set_home_url(tab.id, &tab.url).await?;
        log::info!("Locked home URL for tab {}: {}", tab.id, tab.url);
        Ok(())
    }

    /// Navigate a pinned tab back to its home URL if it has drifted
    pub async fn reset_one(&self, tab: impl Into<TabRef>) -> Result<(), HostError> {
        let Some(tab) = self.resolve_pinned(tab.into()).await? else {
            return Ok(());
        };

        match self.homes.home_url(tab.id).await? {
            Some(home) if home != tab.url => {
                self.tabs
                    .update(tab.id, &TabUpdate::restore(home.as_str(), self.replace_history))
                    .await?;
                log::info!("Reset tab {} to Home URL: {}", tab.id, home);
            }
            _ => log::debug!("Tab {} is already home", tab.id),
        }

        Ok(())
    }

    /// Reset every pinned tab concurrently. One failing tab does not stop the rest.
    pub async fn reset_all(&self) -> Result<BatchReport, HostError> {
        let pinned = self.tabs.query(&TabQuery::pinned()).await?;

        let results = join_all(pinned.into_iter().map(|tab| async move {
            let id = tab.id;
            (id, self.reset_one(tab).await)
        }))
        .await;

        let mut report = BatchReport::default();
        for (id, result) in results {
            report.record(id, result);
        }

        if report.is_clean() {
            log::info!("All pinned tabs have been reset to their Home URLs.");
        } else {
            log::error!(
                "Error resetting pinned tabs: {} of {} failed",
                report.failures.len(),
                report.processed
            );
        }

        Ok(report)
    }

    /// Adopt the tab's current URL as its new home
    pub async fn repin_one(&self, tab: impl Into<TabRef>) -> Result<(), HostError> {
        let Some(tab) = self.resolve_pinned(tab.into()).await? else {
            return Ok(());
        };

        self.homes.set_home_url(tab.id, &tab.url).await?;
        log::info!("Repinned tab {} to new Home URL: {}", tab.id, tab.url);
        Ok(())
    }

    /// Pin or unpin a tab. Does nothing if it is already in that state.
    pub async fn toggle_pin(&self, tab: impl Into<TabRef>, pinned: bool) -> Result<(), HostError> {
        let Some(tab) = self.resolve(tab.into()).await? else {
            return Ok(());
        };

        if tab.pinned == pinned {
            return Ok(());
        }

        self.tabs.update(tab.id, &TabUpdate::pin(pinned)).await?;
        log::info!("{} tab {}", if pinned { "Pinned" } else { "Unpinned" }, tab.id);
        Ok(())
    }

    /// One row per pinned tab for the popup
    pub async fn pinned_snapshot(&self) -> Result<Vec<PinnedTabView>, HostError> {
        let pinned = self.tabs.query(&TabQuery::pinned()).await?;
        let mut views = Vec::with_capacity(pinned.len());

        for tab in pinned {
            let home_url = self.homes.home_url(tab.id).await?.unwrap_or_default();
            views.push(PinnedTabView {
                id: tab.id,
                url: tab.url,
                home_url,
                title: tab.title,
                fav_icon_url: tab.fav_icon_url,
            });
        }

        Ok(views)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HOME_URL_KEY;
    use crate::host::fake::{FakeHost, HostCall};
    use futures::executor::block_on;

    fn synchronizer(host: &FakeHost) -> PinSynchronizer<FakeHost, FakeHost> {
        PinSynchronizer::new(host.clone(), host.clone(), &Config::default())
    }

    fn home(host: &FakeHost, id: TabId) -> Option<String> {
        host.value(id, HOME_URL_KEY)
    }

    #[test]
    fn test_sync_all_bootstraps_missing_home() {
        let host = FakeHost::new();
        host.add_tab(1, "https://a.com", true);
        host.add_tab(2, "https://b.com", false);

        let report = block_on(synchronizer(&host).sync_all()).unwrap();

        assert_eq!(report.processed, 1);
        assert_eq!(home(&host, 1).as_deref(), Some("https://a.com"));
        assert_eq!(home(&host, 2), None);
        // Freshly recorded tabs are neither discarded nor navigated
        assert!(!host.calls().contains(&HostCall::Discard(1)));
        assert!(host.updates().is_empty());
    }

    #[test]
    fn test_sync_all_discards_and_restores() {
        let host = FakeHost::new();
        host.add_tab(1, "https://a.com/sub", true);
        host.add_tab(2, "https://b.com", true);
        host.put_value(1, HOME_URL_KEY, "https://a.com");
        host.put_value(2, HOME_URL_KEY, "https://b.com");

        let report = block_on(synchronizer(&host).sync_all()).unwrap();

        assert!(report.is_clean());
        let calls = host.calls();
        assert!(calls.contains(&HostCall::Discard(1)));
        assert!(calls.contains(&HostCall::Discard(2)));
        assert_eq!(host.updates(), vec![(1, TabUpdate::navigate("https://a.com"))]);
        assert_eq!(host.tab(1).url, "https://a.com");
    }

    #[test]
    fn test_sync_all_without_discard() {
        let host = FakeHost::new();
        host.add_tab(1, "https://a.com/sub", true);
        host.put_value(1, HOME_URL_KEY, "https://a.com");
        let config = Config {
            discard_on_sync: false,
            ..Config::default()
        };

        block_on(PinSynchronizer::new(host.clone(), host.clone(), &config).sync_all()).unwrap();

        assert!(!host.calls().contains(&HostCall::Discard(1)));
        assert_eq!(host.tab(1).url, "https://a.com");
    }

    #[test]
    fn test_sync_all_isolates_failures() {
        let host = FakeHost::new();
        host.add_tab(1, "https://a.com/x", true);
        host.add_tab(2, "https://b.com/x", true);
        host.add_tab(3, "https://c.com/x", true);
        for (id, url) in [(1, "https://a.com"), (2, "https://b.com"), (3, "https://c.com")] {
            host.put_value(id, HOME_URL_KEY, url);
        }
        host.fail_discards_for(2);

        let report = block_on(synchronizer(&host).sync_all()).unwrap();

        assert_eq!(report.processed, 3);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].tab_id, 2);
        assert_eq!(host.tab(1).url, "https://a.com");
        assert_eq!(host.tab(2).url, "https://b.com/x");
        assert_eq!(host.tab(3).url, "https://c.com");
    }

    #[test]
    fn test_sync_all_isolates_store_failures() {
        let host = FakeHost::new();
        host.add_tab(1, "https://a.com", true);
        host.add_tab(2, "https://b.com", true);
        host.fail_store_writes_for(1);

        let report = block_on(synchronizer(&host).sync_all()).unwrap();

        assert_eq!(report.processed, 2);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].tab_id, 1);
        assert_eq!(home(&host, 1), None);
        assert_eq!(home(&host, 2).as_deref(), Some("https://b.com"));
    }

    #[test]
    fn test_failed_bootstrap_is_retried_by_next_sync() {
        let host = FakeHost::new();
        host.add_tab(1, "https://a.com", true);
        host.fail_store_writes_for(1);
        let sync = synchronizer(&host);

        let result = block_on(sync.bootstrap(&host.tab(1)));
        assert!(matches!(result, Err(HostError::Rejected { call: "sessions.setTabValue", .. })));
        assert_eq!(home(&host, 1), None);

        host.recover_store_for(1);
        let report = block_on(sync.sync_all()).unwrap();

        assert!(report.is_clean());
        assert_eq!(home(&host, 1).as_deref(), Some("https://a.com"));
        assert!(!host.calls().contains(&HostCall::Discard(1)));
    }

    #[test]
    fn test_restore_with_history_replace() {
        let host = FakeHost::new();
        host.add_tab(1, "https://a.com/sub", true);
        host.add_tab(2, "https://b.com/sub", true);
        host.put_value(1, HOME_URL_KEY, "https://a.com");
        host.put_value(2, HOME_URL_KEY, "https://b.com");
        let sync = synchronizer(&host).with_history_replace(true);

        block_on(sync.reset_one(1)).unwrap();
        block_on(sync.sync_all()).unwrap();

        assert_eq!(
            host.updates(),
            vec![
                (1, TabUpdate::restore("https://a.com", true)),
                (2, TabUpdate::restore("https://b.com", true)),
            ]
        );
        let json = serde_json::to_string(&host.updates()[0].1).unwrap();
        assert_eq!(json, r#"{"url":"https://a.com","loadReplace":true}"#);
    }

    #[test]
    fn test_restore_without_history_replace() {
        let host = FakeHost::new();
        host.add_tab(1, "https://a.com/sub", true);
        host.put_value(1, HOME_URL_KEY, "https://a.com");

        block_on(synchronizer(&host).reset_one(1)).unwrap();

        let json = serde_json::to_string(&host.updates()[0].1).unwrap();
        assert_eq!(json, r#"{"url":"https://a.com"}"#);
    }

    #[test]
    fn test_unpin_drops_tab_from_snapshot() {
        let host = FakeHost::new();
        host.add_tab(1, "https://a.com", true);
        host.add_tab(2, "https://b.com", true);
        let sync = synchronizer(&host);

        block_on(sync.toggle_pin(1, false)).unwrap();

        let views = block_on(sync.pinned_snapshot()).unwrap();
        assert_eq!(views.iter().map(|view| view.id).collect::<Vec<_>>(), vec![2]);
    }

    #[test]
    fn test_reset_one_restores_then_noops() {
        let host = FakeHost::new();
        host.add_tab(1, "https://a.com", true);
        host.put_value(1, HOME_URL_KEY, "https://a.com");
        host.navigate(1, "https://elsewhere.com");
        let sync = synchronizer(&host);

        block_on(sync.reset_one(host.tab(1))).unwrap();
        assert_eq!(host.tab(1).url, "https://a.com");
        assert_eq!(host.updates().len(), 1);

        host.clear_calls();
        block_on(sync.reset_one(host.tab(1))).unwrap();
        assert!(host.updates().is_empty());
    }

    #[test]
    fn test_reset_one_by_id() {
        let host = FakeHost::new();
        host.add_tab(5, "https://a.com/sub", true);
        host.put_value(5, HOME_URL_KEY, "https://a.com");

        block_on(synchronizer(&host).reset_one(5)).unwrap();

        assert_eq!(host.calls()[0], HostCall::Get(5));
        assert_eq!(host.tab(5).url, "https://a.com");
    }

    #[test]
    fn test_reset_one_missing_tab_is_noop() {
        let host = FakeHost::new();

        block_on(synchronizer(&host).reset_one(99)).unwrap();

        assert_eq!(host.calls(), vec![HostCall::Get(99)]);
    }

    #[test]
    fn test_reset_one_unpinned_is_noop() {
        let host = FakeHost::new();
        host.add_tab(1, "https://a.com/sub", false);
        host.put_value(1, HOME_URL_KEY, "https://a.com");

        block_on(synchronizer(&host).reset_one(host.tab(1))).unwrap();

        assert!(host.updates().is_empty());
        assert_eq!(host.tab(1).url, "https://a.com/sub");
    }

    #[test]
    fn test_reset_one_without_home_is_noop() {
        let host = FakeHost::new();
        host.add_tab(1, "https://a.com", true);

        block_on(synchronizer(&host).reset_one(host.tab(1))).unwrap();

        assert!(host.updates().is_empty());
    }

    #[test]
    fn test_reset_one_propagates_update_failure() {
        let host = FakeHost::new();
        host.add_tab(1, "https://a.com/sub", true);
        host.put_value(1, HOME_URL_KEY, "https://a.com");
        host.fail_updates_for(1);

        let result = block_on(synchronizer(&host).reset_one(host.tab(1)));

        assert!(matches!(result, Err(HostError::Rejected { call: "tabs.update", .. })));
    }

    #[test]
    fn test_reset_all_isolates_failures() {
        let host = FakeHost::new();
        for id in 1..=4 {
            host.add_tab(id, &format!("https://site{}.com/drift", id), true);
            host.put_value(id, HOME_URL_KEY, &format!("https://site{}.com", id));
        }
        host.fail_updates_for(3);

        let report = block_on(synchronizer(&host).reset_all()).unwrap();

        assert_eq!(report.processed, 4);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].tab_id, 3);
        for id in [1, 2, 4] {
            assert_eq!(host.tab(id).url, format!("https://site{}.com", id));
        }
        assert_eq!(host.tab(3).url, "https://site3.com/drift");
    }

    #[test]
    fn test_reset_all_skips_unpinned() {
        let host = FakeHost::new();
        host.add_tab(1, "https://a.com/drift", false);
        host.put_value(1, HOME_URL_KEY, "https://a.com");

        let report = block_on(synchronizer(&host).reset_all()).unwrap();

        assert_eq!(report.processed, 0);
        assert!(host.updates().is_empty());
    }

    #[test]
    fn test_repin_overwrites_home() {
        let host = FakeHost::new();
        host.add_tab(1, "https://a.com/sub", true);
        host.put_value(1, HOME_URL_KEY, "https://a.com");
        let sync = synchronizer(&host);

        block_on(sync.repin_one(host.tab(1))).unwrap();
        assert_eq!(home(&host, 1).as_deref(), Some("https://a.com/sub"));

        host.clear_calls();
        block_on(sync.reset_one(host.tab(1))).unwrap();
        assert!(host.updates().is_empty());
    }

    #[test]
    fn test_repin_unpinned_is_noop() {
        let host = FakeHost::new();
        host.add_tab(1, "https://a.com/sub", false);
        host.put_value(1, HOME_URL_KEY, "https://a.com");

        block_on(synchronizer(&host).repin_one(1)).unwrap();

        assert_eq!(home(&host, 1).as_deref(), Some("https://a.com"));
    }

    #[test]
    fn test_toggle_pin_is_idempotent() {
        let host = FakeHost::new();
        host.add_tab(1, "https://a.com", false);
        let sync = synchronizer(&host);

        block_on(sync.toggle_pin(host.tab(1), true)).unwrap();
        block_on(sync.toggle_pin(host.tab(1), true)).unwrap();

        assert!(host.tab(1).pinned);
        assert_eq!(host.updates(), vec![(1, TabUpdate::pin(true))]);
        // Pinning alone does not record a home URL
        assert_eq!(home(&host, 1), None);
    }

    #[test]
    fn test_toggle_pin_unpin() {
        let host = FakeHost::new();
        host.add_tab(1, "https://a.com", true);

        block_on(synchronizer(&host).toggle_pin(1, false)).unwrap();

        assert!(!host.tab(1).pinned);
    }

    #[test]
    fn test_bootstrap_keeps_existing_home() {
        let host = FakeHost::new();
        host.add_tab(1, "https://a.com/sub", true);
        host.put_value(1, HOME_URL_KEY, "https://a.com");

        block_on(synchronizer(&host).bootstrap(&host.tab(1))).unwrap();

        assert_eq!(home(&host, 1).as_deref(), Some("https://a.com"));
        assert!(!host.calls().iter().any(|call| matches!(call, HostCall::StoreSet(..))));
    }

    #[test]
    fn test_snapshot_reports_absent_home_as_empty() {
        let host = FakeHost::new();
        host.add_tab(1, "https://a.com", true);
        host.add_tab(2, "https://b.com/x", true);
        host.add_tab(3, "https://c.com", false);
        host.put_value(2, HOME_URL_KEY, "https://b.com");

        let views = block_on(synchronizer(&host).pinned_snapshot()).unwrap();

        assert_eq!(views.len(), 2);
        assert_eq!(views[0].id, 1);
        assert_eq!(views[0].home_url, "");
        assert_eq!(views[1].home_url, "https://b.com");
        assert_eq!(views[1].title, "Tab 2");
        assert!(views[1].has_drifted());
        assert!(host.updates().is_empty());
    }

    #[test]
    fn test_pin_navigate_reset_repin_scenario() {
        let host = FakeHost::new();
        host.add_tab(1, "https://a.com", false);
        let sync = synchronizer(&host);

        block_on(sync.toggle_pin(1, true)).unwrap();
        block_on(sync.bootstrap(&host.tab(1))).unwrap();
        assert_eq!(home(&host, 1).as_deref(), Some("https://a.com"));

        host.navigate(1, "https://a.com/sub");
        block_on(sync.reset_one(1)).unwrap();
        assert_eq!(host.tab(1).url, "https://a.com");

        host.navigate(1, "https://a.com/sub");
        block_on(sync.repin_one(1)).unwrap();
        assert_eq!(home(&host, 1).as_deref(), Some("https://a.com/sub"));

        host.clear_calls();
        block_on(sync.reset_one(1)).unwrap();
        assert!(host.updates().is_empty());
        assert_eq!(host.tab(1).url, "https://a.com/sub");
    }
}
