/// Home URL storage on top of the host's per-tab session values

use crate::error::HostError;
use crate::host::KeyValueStore;
use crate::tab_data::TabId;

/// Key used by the global session map fallback, e.g. `originalUrl_42`
pub fn session_key(key: &str, id: TabId) -> String {
    format!("{}_{}", key, id)
}

/// Reads and writes the home URL of a tab under one namespaced key
pub struct HomeUrlStore<S> {
    store: S,
    key: String,
}

impl<S: KeyValueStore> HomeUrlStore<S> {
    pub fn new(store: S, key: impl Into<String>) -> Self {
        HomeUrlStore {
            store,
            key: key.into(),
        }
    }

    /// An empty stored string counts as no home URL
    pub async fn home_url(&self, id: TabId) -> Result<Option<String>, HostError> {
        let value = self.store.get(id, &self.key).await?;
        Ok(value.filter(|url| !url.is_empty()))
    }

    pub async fn set_home_url(&self, id: TabId, url: &str) -> Result<(), HostError> {
        self.store.set(id, &self.key, url).await?;
        log::info!("Updated Home URL for tab {} to: {}", id, url);
        Ok(())
    }
}
