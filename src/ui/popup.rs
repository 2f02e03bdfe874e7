/// Popup UI for Pin Keeper extension

use patternfly_yew::prelude::*;
use wasm_bindgen_futures::spawn_local;
use yew::prelude::*;

use crate::browser::{self, BrowserSynchronizer};
use crate::config::Config;
use crate::error::HostError;
use crate::tab_data::{PinnedTabView, TabId};
use crate::ui::components::PinnedTabRow;

#[derive(Clone, PartialEq)]
enum AppState {
    Idle,
    Loading(String),
    Error(String),
}

fn synchronizer() -> BrowserSynchronizer {
    browser::synchronizer(&Config::default())
}

async fn load_snapshot(state: UseStateHandle<AppState>, tabs: UseStateHandle<Vec<PinnedTabView>>) {
    match synchronizer().pinned_snapshot().await {
        Ok(snapshot) => {
            tabs.set(snapshot);
            state.set(AppState::Idle);
        }
        Err(e) => {
            state.set(AppState::Error(format!("Failed to load pinned tabs: {}", e)));
        }
    }
}

/// Run one action, then reload the list so the rows reflect the new state
fn run_action<F>(
    state: UseStateHandle<AppState>,
    tabs: UseStateHandle<Vec<PinnedTabView>>,
    message: &str,
    action: F,
) where
    F: std::future::Future<Output = Result<(), HostError>> + 'static,
{
    state.set(AppState::Loading(message.to_string()));
    spawn_local(async move {
        if let Err(e) = action.await {
            log::error!("{}", e);
            state.set(AppState::Error(e.to_string()));
            return;
        }
        load_snapshot(state, tabs).await;
    });
}

#[function_component(App)]
pub fn app() -> Html {
    let state = use_state(|| AppState::Loading("Loading pinned tabs...".to_string()));
    let tabs = use_state(Vec::<PinnedTabView>::new);

    // Load pinned tabs on mount
    {
        let state = state.clone();
        let tabs = tabs.clone();
        use_effect_with((), move |_| {
            spawn_local(load_snapshot(state, tabs));
            || ()
        });
    }

    let on_reset = {
        let state = state.clone();
        let tabs = tabs.clone();
        Callback::from(move |id: TabId| {
            run_action(state.clone(), tabs.clone(), "Resetting tab...", async move {
                synchronizer().reset_one(id).await
            });
        })
    };

    let on_repin = {
        let state = state.clone();
        let tabs = tabs.clone();
        Callback::from(move |id: TabId| {
            run_action(state.clone(), tabs.clone(), "Repinning tab...", async move {
                synchronizer().repin_one(id).await
            });
        })
    };

    let on_unpin = {
        let state = state.clone();
        let tabs = tabs.clone();
        Callback::from(move |id: TabId| {
            run_action(state.clone(), tabs.clone(), "Unpinning tab...", async move {
                synchronizer().toggle_pin(id, false).await
            });
        })
    };

    let on_reset_all = {
        let state = state.clone();
        let tabs = tabs.clone();
        Callback::from(move |_: MouseEvent| {
            run_action(state.clone(), tabs.clone(), "Resetting all pinned tabs...", async move {
                let report = synchronizer().reset_all().await?;
                match report.failures.first() {
                    None => Ok(()),
                    Some(failure) => Err(failure.error.clone()),
                }
            });
        })
    };

    let is_busy = matches!(*state, AppState::Loading(_));
    let drifted = tabs.iter().filter(|tab| tab.has_drifted()).count();

    html! {
        <div class="padding-20">
            <h1 class="popup-title">{"Pin Keeper"}</h1>

            // Status display
            {match &*state {
                AppState::Loading(msg) => html! {
                    <div class="loading-text-center">
                        <Spinner />
                        <p class="loading-text">{msg}</p>
                    </div>
                },
                AppState::Error(err) => html! {
                    <div class="message-top-margin">
                        <Alert r#type={AlertType::Danger} title={"Error"} inline={true}>
                            {err.clone()}
                        </Alert>
                    </div>
                },
                AppState::Idle => html! {}
            }}

            if tabs.is_empty() {
                <div class="empty-state">
                    <p>{"No pinned tabs."}</p>
                    <p class="empty-state-hint">{"Pin a tab to lock in its home URL."}</p>
                </div>
            } else {
                <div class="flex-column-gap">
                    <Button onclick={on_reset_all} disabled={is_busy || drifted == 0} variant={ButtonVariant::Primary} block={true}>
                        {format!("Reset All Pinned Tabs ({})", drifted)}
                    </Button>
                    {for tabs.iter().map(|tab| html! {
                        <PinnedTabRow
                            key={tab.id}
                            tab={tab.clone()}
                            on_reset={on_reset.clone()}
                            on_repin={on_repin.clone()}
                            on_unpin={on_unpin.clone()}
                            disabled={is_busy}
                        />
                    })}
                </div>
            }

            <p class="footer-popup">
                {"Pin Keeper v0.1.0"}
            </p>
        </div>
    }
}
