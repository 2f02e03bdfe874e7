/// Translates host events (install, startup, tab updates, context menu)
/// into synchronizer calls. Nothing in here talks to the browser directly.
use serde::Deserialize;

use crate::error::{BatchReport, HostError};
use crate::host::{KeyValueStore, TabRegistry};
use crate::operations::PinSynchronizer;
use crate::tab_data::TabInfo;

/// Commands reachable from the tab context menu
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuCommand {
    TogglePin,
    ResetThisTab,
    ResetAllPinned,
    RepinToCurrentUrl,
}

impl MenuCommand {
    pub const ALL: [MenuCommand; 4] = [
        MenuCommand::ResetThisTab,
        MenuCommand::RepinToCurrentUrl,
        MenuCommand::ResetAllPinned,
        MenuCommand::TogglePin,
    ];

    pub fn menu_id(self) -> &'static str {
        match self {
            MenuCommand::TogglePin => "pin-tab",
            MenuCommand::ResetThisTab => "reset-this-tab",
            MenuCommand::ResetAllPinned => "reset-all-pinned",
            MenuCommand::RepinToCurrentUrl => "repin-tab-to-current-url",
        }
    }

    pub fn from_menu_id(id: &str) -> Option<MenuCommand> {
        MenuCommand::ALL.into_iter().find(|command| command.menu_id() == id)
    }

    pub fn title(self) -> &'static str {
        match self {
            MenuCommand::TogglePin => "Pin Tab",
            MenuCommand::ResetThisTab => "Reset This Tab",
            MenuCommand::ResetAllPinned => "Reset All Pinned Tabs",
            MenuCommand::RepinToCurrentUrl => "Repin Tab to Current URL",
        }
    }

    pub fn is_checkbox(self) -> bool {
        matches!(self, MenuCommand::TogglePin)
    }
}

/// `createProperties` for `menus.create`
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct MenuItemSpec {
    pub id: &'static str,
    pub title: &'static str,
    pub contexts: [&'static str; 1],
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<&'static str>,
}

/// Items created on install, in display order
pub fn context_menu_items() -> Vec<MenuItemSpec> {
    MenuCommand::ALL
        .into_iter()
        .map(|command| MenuItemSpec {
            id: command.menu_id(),
            title: command.title(),
            contexts: ["tab"],
            kind: command.is_checkbox().then_some("checkbox"),
        })
        .collect()
}

/// The `changeInfo` argument of `tabs.onUpdated`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TabChange {
    #[serde(default)]
    pub pinned: Option<bool>,
}

/// The `info` argument of `menus.onClicked`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuClick {
    pub menu_item_id: String,
    #[serde(default)]
    pub checked: Option<bool>,
}

/// How the context menu should look for the tab it was opened on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MenuState {
    pub pin_checked: bool,
    pub reset_enabled: bool,
}

pub async fn handle_install<R: TabRegistry, S: KeyValueStore>(
    sync: &PinSynchronizer<R, S>,
) -> Result<BatchReport, HostError> {
    sync.sync_all().await
}

pub async fn handle_startup<R: TabRegistry, S: KeyValueStore>(
    sync: &PinSynchronizer<R, S>,
) -> Result<BatchReport, HostError> {
    sync.sync_all().await
}

/// Only a transition into pinned state matters; other changes are ignored
pub async fn handle_tab_updated<R: TabRegistry, S: KeyValueStore>(
    sync: &PinSynchronizer<R, S>,
    change: &TabChange,
    tab: &TabInfo,
) -> Result<(), HostError> {
    if change.pinned == Some(true) {
        sync.bootstrap(tab).await?;
    }
    Ok(())
}

pub async fn handle_menu_shown<R: TabRegistry, S: KeyValueStore>(
    sync: &PinSynchronizer<R, S>,
    tab: &TabInfo,
) -> Result<MenuState, HostError> {
    let home = sync.home_url(tab.id).await?;
    let reset_enabled = tab.pinned && home.is_some_and(|home| home != tab.url);

    Ok(MenuState {
        pin_checked: tab.pinned,
        reset_enabled,
    })
}

/// Unknown menu ids are ignored
pub async fn handle_menu_click<R: TabRegistry, S: KeyValueStore>(
    sync: &PinSynchronizer<R, S>,
    click: &MenuClick,
    tab: TabInfo,
) -> Result<(), HostError> {
    let Some(command) = MenuCommand::from_menu_id(&click.menu_item_id) else {
        log::debug!("Ignoring unknown menu item {}", click.menu_item_id);
        return Ok(());
    };

    match command {
        MenuCommand::TogglePin => {
            let pinned = click.checked.unwrap_or(!tab.pinned);
            sync.toggle_pin(tab, pinned).await
        }
        MenuCommand::ResetThisTab => sync.reset_one(tab).await,
        MenuCommand::ResetAllPinned => sync.reset_all().await.map(|_| ()),
        MenuCommand::RepinToCurrentUrl => sync.repin_one(tab).await,
    }
}
