/// Bindings to the WebExtension APIs behind the capability traits.
///
/// Everything goes through the `browser` namespace. On Chrome that name does
/// not exist, so `install_browser_polyfill` aliases it to `chrome` at startup.
use async_trait::async_trait;
use js_sys::{Object, Reflect};
use serde::Serialize;
use serde::de::DeserializeOwned;
use wasm_bindgen::prelude::*;

use crate::config::Config;
use crate::error::HostError;
use crate::host::{KeyValueStore, TabRegistry};
use crate::operations::PinSynchronizer;
use crate::storage::session_key;
use crate::tab_data::{TabId, TabInfo, TabQuery, TabUpdate};

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(catch, js_namespace = ["browser", "tabs"], js_name = query)]
    async fn tabs_query(query: JsValue) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch, js_namespace = ["browser", "tabs"], js_name = get)]
    async fn tabs_get(id: TabId) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch, js_namespace = ["browser", "tabs"], js_name = update)]
    async fn tabs_update(id: TabId, props: JsValue) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch, js_namespace = ["browser", "tabs"], js_name = discard)]
    async fn tabs_discard(id: TabId) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch, js_namespace = ["browser", "sessions"], js_name = getTabValue)]
    async fn sessions_get_tab_value(id: TabId, key: &str) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch, js_namespace = ["browser", "sessions"], js_name = setTabValue)]
    async fn sessions_set_tab_value(id: TabId, key: &str, value: &str) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch, js_namespace = ["browser", "storage", "session"], js_name = get)]
    async fn session_storage_get(key: &str) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch, js_namespace = ["browser", "storage", "session"], js_name = set)]
    async fn session_storage_set(items: JsValue) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(js_namespace = ["browser", "runtime"], js_name = getURL)]
    fn runtime_get_url(path: &str) -> String;
}

/// Alias `browser` to `chrome` when only the latter exists
pub fn install_browser_polyfill() {
    let global = js_sys::global();
    if !lookup(&["browser"]).is_undefined() {
        return;
    }

    let chrome = lookup(&["chrome"]);
    if chrome.is_undefined() {
        log::warn!("No extension API namespace found");
        return;
    }

    if Reflect::set(&global, &JsValue::from_str("browser"), &chrome).is_err() {
        log::error!("Failed to alias browser to chrome");
    }
}

/// Walk a dotted path from the global object, `undefined` if any link is missing
fn lookup(path: &[&str]) -> JsValue {
    let mut current: JsValue = js_sys::global().into();
    for segment in path {
        if current.is_undefined() || current.is_null() {
            return JsValue::UNDEFINED;
        }
        current = Reflect::get(&current, &JsValue::from_str(segment)).unwrap_or(JsValue::UNDEFINED);
    }
    current
}

pub fn has_api(path: &[&str]) -> bool {
    lookup(path).is_function()
}

/// Which browser the extension runs in, judged by its base URL scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostFlavor {
    Chrome,
    Firefox,
    Unknown,
}

impl HostFlavor {
    pub fn from_extension_url(base: &str) -> HostFlavor {
        match url::Url::parse(base).as_ref().map(url::Url::scheme) {
            Ok("chrome-extension") => HostFlavor::Chrome,
            Ok("moz-extension") => HostFlavor::Firefox,
            _ => HostFlavor::Unknown,
        }
    }

    pub fn detect() -> HostFlavor {
        if !has_api(&["browser", "runtime", "getURL"]) {
            return HostFlavor::Unknown;
        }
        HostFlavor::from_extension_url(&runtime_get_url(""))
    }

    /// Whether `tabs.update` accepts `loadReplace`
    pub fn supports_load_replace(self) -> bool {
        self == HostFlavor::Firefox
    }
}

pub type BrowserSynchronizer = PinSynchronizer<BrowserTabs, SessionStore>;

/// Synchronizer over the live browser APIs, used by the background script and the popup
pub fn synchronizer(config: &Config) -> BrowserSynchronizer {
    PinSynchronizer::new(BrowserTabs, SessionStore::detect(), config)
        .with_history_replace(HostFlavor::detect().supports_load_replace())
}

pub(crate) fn js_message(err: &JsValue) -> String {
    if let Some(error) = err.dyn_ref::<js_sys::Error>() {
        return String::from(error.message());
    }
    err.as_string().unwrap_or_else(|| format!("{:?}", err))
}

pub(crate) fn rejected(call: &'static str, err: JsValue) -> HostError {
    HostError::rejected(call, js_message(&err))
}

pub(crate) fn decode<T: DeserializeOwned>(what: &'static str, value: JsValue) -> Result<T, HostError> {
    serde_wasm_bindgen::from_value(value).map_err(|e| HostError::Decode {
        what,
        message: e.to_string(),
    })
}

pub(crate) fn encode<T: Serialize>(what: &'static str, value: &T) -> Result<JsValue, HostError> {
    serde_wasm_bindgen::to_value(value).map_err(|e| HostError::Encode {
        what,
        message: e.to_string(),
    })
}

/// Chrome says "No tab with id: 4.", Firefox says "Invalid tab ID: 4"
fn is_missing_tab(message: &str) -> bool {
    message.starts_with("No tab with id") || message.starts_with("Invalid tab ID")
}

/// `browser.tabs`
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserTabs;

#[async_trait(?Send)]
impl TabRegistry for BrowserTabs {
    async fn query(&self, query: &TabQuery) -> Result<Vec<TabInfo>, HostError> {
        let tabs = tabs_query(encode("tab query", query)?)
            .await
            .map_err(|e| rejected("tabs.query", e))?;
        decode("tab list", tabs)
    }

    async fn get(&self, id: TabId) -> Result<Option<TabInfo>, HostError> {
        match tabs_get(id).await {
            Ok(tab) if tab.is_undefined() || tab.is_null() => Ok(None),
            Ok(tab) => decode("tab", tab).map(Some),
            Err(e) => {
                let message = js_message(&e);
                if is_missing_tab(&message) {
                    Ok(None)
                } else {
                    Err(HostError::rejected("tabs.get", message))
                }
            }
        }
    }

    async fn update(&self, id: TabId, update: &TabUpdate) -> Result<TabInfo, HostError> {
        let tab = tabs_update(id, encode("tab update", update)?)
            .await
            .map_err(|e| rejected("tabs.update", e))?;
        decode("tab", tab)
    }

    async fn discard(&self, id: TabId) -> Result<(), HostError> {
        tabs_discard(id).await.map_err(|e| rejected("tabs.discard", e))?;
        Ok(())
    }
}

/// `browser.sessions` tab values, which die with the tab (Firefox)
#[derive(Debug, Clone, Copy, Default)]
pub struct TabSessionStore;

#[async_trait(?Send)]
impl KeyValueStore for TabSessionStore {
    async fn get(&self, id: TabId, key: &str) -> Result<Option<String>, HostError> {
        let value = sessions_get_tab_value(id, key)
            .await
            .map_err(|e| rejected("sessions.getTabValue", e))?;
        Ok(value.as_string())
    }

    async fn set(&self, id: TabId, key: &str, value: &str) -> Result<(), HostError> {
        sessions_set_tab_value(id, key, value)
            .await
            .map_err(|e| rejected("sessions.setTabValue", e))?;
        Ok(())
    }
}

/// `browser.storage.session` with one `<key>_<id>` entry per tab (Chrome)
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionMapStore;

#[async_trait(?Send)]
impl KeyValueStore for SessionMapStore {
    async fn get(&self, id: TabId, key: &str) -> Result<Option<String>, HostError> {
        let key = session_key(key, id);
        let items = session_storage_get(&key)
            .await
            .map_err(|e| rejected("storage.session.get", e))?;
        if items.is_undefined() || items.is_null() {
            return Ok(None);
        }
        let value = Reflect::get(&items, &JsValue::from_str(&key)).map_err(|e| rejected("storage.session.get", e))?;
        Ok(value.as_string())
    }

    async fn set(&self, id: TabId, key: &str, value: &str) -> Result<(), HostError> {
        let items = Object::new();
        Reflect::set(
            &items,
            &JsValue::from_str(&session_key(key, id)),
            &JsValue::from_str(value),
        )
        .map_err(|e| rejected("storage.session.set", e))?;
        session_storage_set(items.into())
            .await
            .map_err(|e| rejected("storage.session.set", e))?;
        Ok(())
    }
}

/// Per-tab session values where the browser has them, the session map otherwise
#[derive(Debug, Clone, Copy)]
pub enum SessionStore {
    Tab(TabSessionStore),
    Map(SessionMapStore),
}

impl SessionStore {
    pub fn detect() -> SessionStore {
        if has_api(&["browser", "sessions", "getTabValue"]) && has_api(&["browser", "sessions", "setTabValue"]) {
            SessionStore::Tab(TabSessionStore)
        } else {
            log::debug!("sessions API unavailable, falling back to storage.session");
            SessionStore::Map(SessionMapStore)
        }
    }
}

#[async_trait(?Send)]
impl KeyValueStore for SessionStore {
    async fn get(&self, id: TabId, key: &str) -> Result<Option<String>, HostError> {
        match self {
            SessionStore::Tab(store) => store.get(id, key).await,
            SessionStore::Map(store) => store.get(id, key).await,
        }
    }

    async fn set(&self, id: TabId, key: &str, value: &str) -> Result<(), HostError> {
        match self {
            SessionStore::Tab(store) => store.set(id, key, value).await,
            SessionStore::Map(store) => store.set(id, key, value).await,
        }
    }
}
