/// Reusable UI components

use patternfly_yew::prelude::*;
use yew::prelude::*;

use crate::tab_data::{PinnedTabView, TabId};

#[derive(Properties, PartialEq)]
pub struct PinnedTabRowProps {
    pub tab: PinnedTabView,
    pub on_reset: Callback<TabId>,
    pub on_repin: Callback<TabId>,
    pub on_unpin: Callback<TabId>,
    #[prop_or(false)]
    pub disabled: bool,
}

#[function_component(PinnedTabRow)]
pub fn pinned_tab_row(props: &PinnedTabRowProps) -> Html {
    let tab = &props.tab;
    let drifted = tab.has_drifted();

    let on_reset = {
        let on_reset = props.on_reset.clone();
        let id = tab.id;
        Callback::from(move |_: MouseEvent| on_reset.emit(id))
    };

    let on_repin = {
        let on_repin = props.on_repin.clone();
        let id = tab.id;
        Callback::from(move |_: MouseEvent| on_repin.emit(id))
    };

    let on_unpin = {
        let on_unpin = props.on_unpin.clone();
        let id = tab.id;
        Callback::from(move |_: MouseEvent| on_unpin.emit(id))
    };

    let title = if tab.title.is_empty() { tab.url.clone() } else { tab.title.clone() };

    html! {
        <div class={if drifted { "pinned-row pinned-row-drifted" } else { "pinned-row" }}>
            <div class="pinned-row-header">
                if let Some(icon) = &tab.fav_icon_url {
                    <img class="pinned-row-icon" src={icon.clone()} alt="" />
                }
                <span class="pinned-row-title" title={tab.url.clone()}>{title}</span>
            </div>
            <div class="pinned-row-urls">
                <span class="pinned-row-label">{"Home: "}</span>
                if tab.home_url.is_empty() {
                    <span class="pinned-row-missing">{"not recorded"}</span>
                } else {
                    <span class="pinned-row-url">{&tab.home_url}</span>
                }
                if drifted {
                    <div>
                        <span class="pinned-row-label">{"Now: "}</span>
                        <span class="pinned-row-url">{&tab.url}</span>
                    </div>
                }
            </div>
            <div class="pinned-row-actions">
                <Button onclick={on_reset} disabled={props.disabled || !drifted} variant={ButtonVariant::Secondary}>
                    {"Reset"}
                </Button>
                <Button onclick={on_repin} disabled={props.disabled} variant={ButtonVariant::Link}>
                    {"Repin here"}
                </Button>
                <Button onclick={on_unpin} disabled={props.disabled} variant={ButtonVariant::Link}>
                    {"Unpin"}
                </Button>
            </div>
        </div>
    }
}
