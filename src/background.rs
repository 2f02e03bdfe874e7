/// Background script handlers.
///
/// `extension/background.js` registers the browser listeners synchronously on
/// load and forwards each event here once the module is initialised.
use serde::Serialize;
use wasm_bindgen::prelude::*;

use crate::browser::{self, synchronizer};
use crate::config::Config;
use crate::error::{BatchReport, HostError};
use crate::events::{self, MenuClick, MenuCommand, MenuState, TabChange};
use crate::tab_data::{TabId, TabInfo};

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(catch, js_namespace = ["browser", "menus"], js_name = create)]
    fn menus_create(props: JsValue) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch, js_namespace = ["browser", "menus"], js_name = update)]
    async fn menus_update(id: &str, props: JsValue) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(js_namespace = ["browser", "menus"], js_name = refresh)]
    fn menus_refresh() -> JsValue;
}

#[derive(Serialize)]
struct CheckedProps {
    checked: bool,
}

#[derive(Serialize)]
struct EnabledProps {
    enabled: bool,
}

/// Firefox only; Chrome's `contextMenus` has no tab context or `onShown`
pub fn menus_available() -> bool {
    browser::has_api(&["browser", "menus", "create"]) && browser::has_api(&["browser", "menus", "onShown", "addListener"])
}

fn create_context_menu() -> Result<(), HostError> {
    if !menus_available() {
        return Err(HostError::Unsupported("menus"));
    }

    for item in events::context_menu_items() {
        let props = browser::encode("menu item", &item)?;
        if let Err(e) = menus_create(props) {
            log::error!("Failed to create menu item {}: {}", item.id, browser::js_message(&e));
        }
    }
    Ok(())
}

fn log_report(what: &str, result: Result<BatchReport, HostError>) {
    match result {
        Ok(report) if report.is_clean() => log::info!("{}: {} pinned tabs in sync", what, report.processed),
        Ok(report) => log::warn!(
            "{}: {} of {} pinned tabs in sync",
            what,
            report.succeeded(),
            report.processed
        ),
        Err(e) => log::error!("{} failed: {}", what, e),
    }
}

async fn apply_menu_state(state: MenuState) -> Result<(), HostError> {
    let checked = browser::encode("menu update", &CheckedProps { checked: state.pin_checked })?;
    menus_update(MenuCommand::TogglePin.menu_id(), checked)
        .await
        .map_err(|e| browser::rejected("menus.update", e))?;

    let enabled = browser::encode("menu update", &EnabledProps { enabled: state.reset_enabled })?;
    menus_update(MenuCommand::ResetThisTab.menu_id(), enabled)
        .await
        .map_err(|e| browser::rejected("menus.update", e))?;
    Ok(())
}

#[wasm_bindgen]
pub async fn handle_installed() {
    if let Err(e) = create_context_menu() {
        log::info!("{}; use the popup to manage pinned tabs", e);
    }
    log_report("Install sync", events::handle_install(&synchronizer(&Config::default())).await);
}

#[wasm_bindgen]
pub async fn handle_startup() {
    log_report("Startup sync", events::handle_startup(&synchronizer(&Config::default())).await);
}

#[wasm_bindgen]
pub async fn handle_tab_updated(tab_id: TabId, change: JsValue, tab: JsValue) {
    let result = async {
        let change: TabChange = browser::decode("tab change", change)?;
        if change.pinned.is_none() {
            return Ok(());
        }
        let tab: TabInfo = browser::decode("tab", tab)?;
        events::handle_tab_updated(&synchronizer(&Config::default()), &change, &tab).await
    }
    .await;

    if let Err(e) = result {
        log::error!("Tab {} update handling failed: {}", tab_id, e);
    }
}

#[wasm_bindgen]
pub async fn handle_menu_shown(_info: JsValue, tab: JsValue) {
    if tab.is_undefined() || tab.is_null() {
        menus_refresh();
        return;
    }

    let result = async {
        let tab: TabInfo = browser::decode("tab", tab)?;
        let state = events::handle_menu_shown(&synchronizer(&Config::default()), &tab).await?;
        apply_menu_state(state).await
    }
    .await;

    if let Err(e) = result {
        log::error!("Error updating menu state: {}", e);
    }
    menus_refresh();
}

#[wasm_bindgen]
pub async fn handle_menu_clicked(info: JsValue, tab: JsValue) {
    let result = async {
        let click: MenuClick = browser::decode("menu click", info)?;
        let tab: TabInfo = browser::decode("tab", tab)?;
        events::handle_menu_click(&synchronizer(&Config::default()), &click, tab).await
    }
    .await;

    if let Err(e) = result {
        log::error!("Menu action failed: {}", e);
    }
}
