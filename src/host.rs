/// Capabilities the host browser provides to the synchronizer
use async_trait::async_trait;

use crate::error::HostError;
use crate::tab_data::{TabId, TabInfo, TabQuery, TabUpdate};

/// The browser's tab registry
#[async_trait(?Send)]
pub trait TabRegistry {
    async fn query(&self, query: &TabQuery) -> Result<Vec<TabInfo>, HostError>;

    /// `Ok(None)` when no live tab has this id
    async fn get(&self, id: TabId) -> Result<Option<TabInfo>, HostError>;

    async fn update(&self, id: TabId, update: &TabUpdate) -> Result<TabInfo, HostError>;

    /// Unload the tab's rendered content without closing it
    async fn discard(&self, id: TabId) -> Result<(), HostError>;
}

/// Per-tab string storage living as long as the tab (or the session)
#[async_trait(?Send)]
pub trait KeyValueStore {
    async fn get(&self, id: TabId, key: &str) -> Result<Option<String>, HostError>;

    async fn set(&self, id: TabId, key: &str, value: &str) -> Result<(), HostError>;
}
