use berry_app_contract::{AppRegistry, ApplicationId, WindowRect};
use berry_desktop_runtime::{
    builtin_registry, capture_layout, load_boot_actions, reduce_desktop, DesktopAction,
    DesktopState, PersistenceBridge, RuntimeEffect, StorePersistenceBridge, WindowState,
};
use berry_platform_host::{MemorySnapshotStore, DESKTOP_LAYOUT_NAMESPACE, DOCK_NAMESPACE};
use futures::executor::block_on;
use pretty_assertions::assert_eq;

fn app(raw: &str) -> ApplicationId {
    ApplicationId::trusted(raw)
}

fn apply(state: &mut DesktopState, registry: &AppRegistry, action: DesktopAction) {
    reduce_desktop(state, registry, action).expect("action applies");
}

fn tuples(state: &DesktopState) -> Vec<(String, WindowRect, WindowState)> {
    let mut tuples = state
        .windows()
        .map(|w| (w.app_id.to_string(), w.rect, w.state))
        .collect::<Vec<_>>();
    tuples.sort_by(|a, b| (&a.0, a.1.x, a.1.y).cmp(&(&b.0, b.1.x, b.1.y)));
    tuples
}

fn focused_app(state: &DesktopState) -> Option<ApplicationId> {
    state
        .focused_window_id()
        .and_then(|id| state.window(id))
        .map(|w| w.app_id.clone())
}

fn busy_desktop(registry: &AppRegistry) -> DesktopState {
    let mut state = DesktopState::with_registry(registry);
    for raw in ["finder", "text-edit", "text-edit", "calculator", "terminal"] {
        apply(&mut state, registry, DesktopAction::NewInstance { app_id: app(raw) });
    }
    let ids = state.windows().map(|w| w.id).collect::<Vec<_>>();
    apply(
        &mut state,
        registry,
        DesktopAction::MoveWindow {
            window_id: ids[1],
            rect: WindowRect::new(300, 200, 500, 350),
        },
    );
    apply(
        &mut state,
        registry,
        DesktopAction::MaximizeWindow {
            window_id: ids[2],
            viewport: WindowRect::new(0, 28, 1440, 820),
        },
    );
    apply(
        &mut state,
        registry,
        DesktopAction::MinimizeWindow { window_id: ids[3] },
    );
    apply(
        &mut state,
        registry,
        DesktopAction::FocusWindow { window_id: ids[0] },
    );
    state
}

#[test]
fn save_then_load_into_empty_desktop_reconstructs_layout() {
    let registry = builtin_registry().expect("catalog");
    let source = busy_desktop(&registry);
    let bridge = StorePersistenceBridge::new(MemorySnapshotStore::default());
    block_on(bridge.save_snapshot(&capture_layout(&source)));

    let mut restored = DesktopState::with_registry(&registry);
    for action in block_on(load_boot_actions(&bridge)) {
        apply(&mut restored, &registry, action);
    }

    assert_eq!(tuples(&restored), tuples(&source));
    assert_eq!(focused_app(&restored), focused_app(&source));
    assert_eq!(focused_app(&restored), Some(app("finder")));
}

#[test]
fn restore_respects_window_cap_and_disabled_preference() {
    let registry = builtin_registry().expect("catalog");
    let source = busy_desktop(&registry);
    let store = MemorySnapshotStore::default();
    let bridge = StorePersistenceBridge::new(store.clone());
    block_on(bridge.save_snapshot(&capture_layout(&source)));

    let mut capped = DesktopState::with_registry(&registry);
    apply(
        &mut capped,
        &registry,
        DesktopAction::HydratePreferences {
            preferences: berry_desktop_runtime::DesktopPreferences {
                restore_on_boot: true,
                max_restore_windows: 2,
            },
        },
    );
    let layout = block_on(bridge.load_snapshot()).expect("layout saved");
    apply(&mut capped, &registry, DesktopAction::RestoreLayout { layout });
    assert_eq!(capped.window_count(), 2);
    assert_eq!(focused_app(&capped), Some(app("finder")));

    let mut state = DesktopState::with_registry(&registry);
    let effects = reduce_desktop(
        &mut state,
        &registry,
        DesktopAction::SetRestoreOnBoot { enabled: false },
    )
    .unwrap();
    assert_eq!(effects, vec![RuntimeEffect::PersistPreferences]);
    block_on(bridge.save_preferences(state.preferences()));

    let actions = block_on(load_boot_actions(&bridge));
    assert!(actions
        .iter()
        .all(|action| !matches!(action, DesktopAction::RestoreLayout { .. })));
    assert!(store
        .namespaces()
        .contains(&DESKTOP_LAYOUT_NAMESPACE.to_string()));
}

#[test]
fn pinned_dock_order_survives_reload() {
    let registry = builtin_registry().expect("catalog");
    let mut state = DesktopState::with_registry(&registry);
    let effects = reduce_desktop(
        &mut state,
        &registry,
        DesktopAction::MovePinnedItem { from: 0, to: 2 },
    )
    .unwrap();
    assert_eq!(effects, vec![RuntimeEffect::PersistDock]);
    apply(
        &mut state,
        &registry,
        DesktopAction::PinApp {
            app_id: app("system-settings"),
        },
    );

    let store = MemorySnapshotStore::default();
    let bridge = StorePersistenceBridge::new(store.clone());
    block_on(bridge.save_pinned(state.pinned_apps()));
    assert_eq!(store.namespaces(), vec![DOCK_NAMESPACE.to_string()]);

    let mut fresh = DesktopState::with_registry(&registry);
    for action in block_on(load_boot_actions(&bridge)) {
        apply(&mut fresh, &registry, action);
    }
    assert_eq!(fresh.pinned_apps(), state.pinned_apps());
}
