//! Runtime provider and context wiring for the Berry desktop.
//!
//! This module owns the long-lived reducer container, the switcher state machines, the runtime
//! effect queue, and boot hydration. Rendering lives outside this crate; views read the signals
//! exposed on [`DesktopRuntimeContext`] and mutate only through [`DesktopRuntimeContext::dispatch`].

use std::{collections::BTreeMap, rc::Rc};

use berry_app_contract::{AppLifecycleEvent, AppRegistry};
use leptos::*;

use crate::{
    effect_executor,
    model::{DesktopState, ProcessId, WindowId},
    persistence::{self, PersistenceBridge, StorePersistenceBridge},
    reducer::{reduce_desktop, DesktopAction, RuntimeEffect},
    switcher::{AppSwitcher, SwitcherEvent},
    touch_switcher::TouchSwitcher,
};

/// Shared handle to the persistence bridge used by the runtime.
pub type SharedPersistence = Rc<dyn PersistenceBridge>;

#[derive(Clone, Copy)]
/// Leptos context for reading desktop runtime state and dispatching [`DesktopAction`] values.
pub struct DesktopRuntimeContext {
    /// Installed app catalog.
    pub registry: StoredValue<AppRegistry>,
    /// Persistence bridge for layout, dock and preferences.
    pub persistence: StoredValue<SharedPersistence>,
    /// Reactive desktop state signal.
    pub state: RwSignal<DesktopState>,
    /// Keyboard app switcher state.
    pub app_switcher: RwSignal<AppSwitcher>,
    /// Touch app switcher overlay state.
    pub touch_switcher: RwSignal<TouchSwitcher>,
    /// Queue of runtime effects emitted by the reducer and drained by the effect executor.
    pub effects: RwSignal<Vec<RuntimeEffect>>,
    /// Latest lifecycle event per open window, for hosted apps to observe.
    pub window_lifecycle: RwSignal<BTreeMap<WindowId, AppLifecycleEvent>>,
    /// Reducer dispatch callback.
    pub dispatch: Callback<DesktopAction>,
}

impl DesktopRuntimeContext {
    /// Dispatches a reducer action through the runtime context callback.
    pub fn dispatch_action(&self, action: DesktopAction) {
        self.dispatch.call(action);
    }

    /// Feeds a keyboard switcher event and dispatches the committed action, if any.
    pub fn handle_switcher_event(&self, event: SwitcherEvent) {
        let desktop = self.state.get_untracked();
        let mut action = None;
        self.app_switcher
            .update(|switcher| action = switcher.handle(&desktop, event));
        if let Some(action) = action {
            self.dispatch_action(action);
        }
    }

    pub fn open_touch_switcher(&self) {
        let desktop = self.state.get_untracked();
        self.touch_switcher.update(|switcher| switcher.open(&desktop));
    }

    pub fn close_touch_switcher(&self) {
        self.touch_switcher.update(TouchSwitcher::close);
    }

    pub fn start_switcher_card_touch(&self, process_id: ProcessId) {
        self.touch_switcher
            .update(|switcher| switcher.start_card_touch(process_id));
    }

    pub fn drag_switcher_card(&self, process_id: ProcessId, offset_x: f64) {
        self.touch_switcher
            .update(|switcher| switcher.drag_card(process_id, offset_x));
    }

    /// Ends a card touch; a dismissing swipe kills the process.
    pub fn end_switcher_card_touch(&self, process_id: ProcessId) {
        let mut action = None;
        self.touch_switcher
            .update(|switcher| action = switcher.end_card_touch(process_id));
        if let Some(action) = action {
            self.dispatch_action(action);
        }
    }

    pub fn tap_switcher_card(&self, process_id: ProcessId) {
        let mut action = None;
        self.touch_switcher
            .update(|switcher| action = switcher.tap_card(process_id));
        if let Some(action) = action {
            self.dispatch_action(action);
        }
    }

    pub fn drag_switcher_background(&self, offset_y: f64) {
        self.touch_switcher
            .update(|switcher| switcher.drag_background(offset_y));
    }

    pub fn end_switcher_background_drag(&self) {
        self.touch_switcher.update(|switcher| {
            switcher.end_background_drag();
        });
    }

    /// Latest lifecycle event for `window_id`, tracked reactively.
    pub fn lifecycle_for(&self, window_id: WindowId) -> Signal<Option<AppLifecycleEvent>> {
        let lifecycle = self.window_lifecycle;
        Signal::derive(move || lifecycle.with(|events| events.get(&window_id).copied()))
    }
}

/// Persistence bridge for the current target: `localStorage` in the browser, no-op elsewhere.
pub fn default_persistence() -> SharedPersistence {
    #[cfg(target_arch = "wasm32")]
    {
        Rc::new(StorePersistenceBridge::new(
            berry_platform_host::LocalStorageSnapshotStore,
        ))
    }

    #[cfg(not(target_arch = "wasm32"))]
    {
        Rc::new(StorePersistenceBridge::new(
            berry_platform_host::NoopSnapshotStore,
        ))
    }
}

fn install_boot_hydration(runtime: DesktopRuntimeContext) {
    create_effect(move |_| {
        let bridge = runtime.persistence.get_value();
        spawn_local(async move {
            for action in persistence::load_boot_actions(bridge.as_ref()).await {
                runtime.dispatch_action(action);
            }
        });
    });
}

#[component]
/// Provides [`DesktopRuntimeContext`] to descendant components and boots persisted state.
pub fn DesktopProvider(
    /// Installed app catalog.
    registry: AppRegistry,
    /// Persistence bridge; defaults to [`default_persistence`].
    #[prop(optional)]
    persistence: Option<SharedPersistence>,
    children: Children,
) -> impl IntoView {
    let initial = DesktopState::with_registry(&registry);
    let registry = store_value(registry);
    let persistence = store_value(persistence.unwrap_or_else(default_persistence));
    let state = create_rw_signal(initial);
    let app_switcher = create_rw_signal(AppSwitcher::default());
    let touch_switcher = create_rw_signal(TouchSwitcher::default());
    let effects = create_rw_signal(Vec::<RuntimeEffect>::new());
    let window_lifecycle = create_rw_signal(BTreeMap::new());

    let dispatch = Callback::new(move |action: DesktopAction| {
        let mut desktop = state.get_untracked();
        let previous = desktop.clone();
        let result = registry.with_value(|registry| reduce_desktop(&mut desktop, registry, action));

        match result {
            Ok(new_effects) => {
                if desktop != previous {
                    if touch_switcher.with_untracked(|switcher| switcher.open) {
                        touch_switcher.update(|switcher| switcher.sync_cards(&desktop));
                    }
                    state.set(desktop);
                }
                if !new_effects.is_empty() {
                    let mut queue = effects.get_untracked();
                    queue.extend(new_effects);
                    effects.set(queue);
                }
            }
            Err(err) => logging::warn!("desktop reducer error ({:?}): {err}", err.kind()),
        }
    });

    let runtime = DesktopRuntimeContext {
        registry,
        persistence,
        state,
        app_switcher,
        touch_switcher,
        effects,
        window_lifecycle,
        dispatch,
    };

    provide_context(runtime);

    install_boot_hydration(runtime);
    effect_executor::install(runtime);
    crate::keyboard::install_switcher_keys(runtime);

    children().into_view()
}

/// Returns the current [`DesktopRuntimeContext`].
///
/// # Panics
///
/// Panics if called outside [`DesktopProvider`].
pub fn use_desktop_runtime() -> DesktopRuntimeContext {
    use_context::<DesktopRuntimeContext>().expect("DesktopRuntimeContext not provided")
}
