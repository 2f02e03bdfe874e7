/// Data structures for Pin Keeper
use serde::{Deserialize, Serialize};

/// Tab identifier handed out by the browser. Reused after a tab closes.
pub type TabId = i32;

/// Information about a browser tab, as returned by `tabs.query` / `tabs.get`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabInfo {
    pub id: TabId,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub pinned: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fav_icon_url: Option<String>,
}

/// A tab as handed to an operation: either the full record from an event,
/// or a bare id that still has to be looked up.
#[derive(Debug, Clone, PartialEq)]
pub enum TabRef {
    Tab(TabInfo),
    Id(TabId),
}

impl From<TabInfo> for TabRef {
    fn from(tab: TabInfo) -> Self {
        TabRef::Tab(tab)
    }
}

impl From<TabId> for TabRef {
    fn from(id: TabId) -> Self {
        TabRef::Id(id)
    }
}

/// Filter passed to `tabs.query`
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TabQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pinned: Option<bool>,
}

impl TabQuery {
    pub fn pinned() -> Self {
        TabQuery { pinned: Some(true) }
    }
}

/// Properties passed to `tabs.update`; unset fields are left alone
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TabUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pinned: Option<bool>,
    /// Firefox only. Chrome rejects the property.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub load_replace: Option<bool>,
}

impl TabUpdate {
    pub fn navigate(url: impl Into<String>) -> Self {
        TabUpdate {
            url: Some(url.into()),
            ..TabUpdate::default()
        }
    }

    /// Navigate back home. With `replace_history` the drifted page is
    /// dropped from the tab's history instead of left behind Back.
    pub fn restore(url: impl Into<String>, replace_history: bool) -> Self {
        TabUpdate {
            load_replace: replace_history.then_some(true),
            ..TabUpdate::navigate(url)
        }
    }

    pub fn pin(pinned: bool) -> Self {
        TabUpdate {
            pinned: Some(pinned),
            ..TabUpdate::default()
        }
    }
}

/// Read-only row shown by the popup for each pinned tab.
/// `home_url` is empty when no home URL has been recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PinnedTabView {
    pub id: TabId,
    pub url: String,
    pub home_url: String,
    pub title: String,
    pub fav_icon_url: Option<String>,
}

impl PinnedTabView {
    /// True when the tab has wandered away from its recorded home
    pub fn has_drifted(&self) -> bool {
        !self.home_url.is_empty() && self.home_url != self.url
    }
}
