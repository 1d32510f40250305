//! Window layout snapshots, replay on boot, and the snapshot-store persistence bridge.

use std::{future::Future, pin::Pin};

use berry_app_contract::{AppRegistry, ApplicationId, WindowRect};
use berry_platform_host::{
    load_typed_with, save_typed_with, SnapshotStore, DESKTOP_LAYOUT_NAMESPACE, DOCK_NAMESPACE,
    PREFERENCES_NAMESPACE,
};
use leptos::logging;
use serde::{Deserialize, Serialize};

use crate::{
    focus,
    model::{DesktopPreferences, DesktopState, OpenWindowRequest, WindowId, WindowState},
    reducer::DesktopAction,
    window_manager::{self, DesktopError},
};

pub const LAYOUT_SCHEMA_VERSION: u32 = 1;
pub const DOCK_SCHEMA_VERSION: u32 = 1;
pub const PREFERENCES_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// One window in a saved layout.
pub struct LayoutEntry {
    pub app_id: ApplicationId,
    pub bounds: WindowRect,
    /// Pre-maximize bounds, if the window was maximized when captured.
    #[serde(default)]
    pub restore_bounds: Option<WindowRect>,
    pub state: WindowState,
    #[serde(default)]
    pub focused: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Saved window layout, entries ordered back to front.
pub struct WindowLayout {
    pub schema_version: u32,
    pub entries: Vec<LayoutEntry>,
}

impl Default for WindowLayout {
    fn default() -> Self {
        Self {
            schema_version: LAYOUT_SCHEMA_VERSION,
            entries: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct PinnedDock {
    pinned: Vec<ApplicationId>,
}

/// Captures every open window, back to front.
pub fn capture_layout(state: &DesktopState) -> WindowLayout {
    let mut windows = state.windows().collect::<Vec<_>>();
    windows.sort_by_key(|w| (w.z_index, w.id));
    WindowLayout {
        schema_version: LAYOUT_SCHEMA_VERSION,
        entries: windows
            .into_iter()
            .map(|w| LayoutEntry {
                app_id: w.app_id.clone(),
                bounds: w.rect,
                restore_bounds: w.restore_rect,
                state: w.state,
                focused: w.focused,
            })
            .collect(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
/// Outcome of [`replay_layout`].
pub struct RestoreReport {
    pub restored: usize,
    pub skipped: usize,
}

/// Replays a saved layout into `state`.
///
/// Only the frontmost `max_windows` entries are replayed. Entries that fail (uninstalled app,
/// policy conflicts) are skipped and counted; the rest still restore. The entry marked focused
/// is focused last.
pub fn replay_layout(
    state: &mut DesktopState,
    registry: &AppRegistry,
    layout: &WindowLayout,
    max_windows: usize,
) -> RestoreReport {
    let dropped = layout.entries.len().saturating_sub(max_windows);
    let mut report = RestoreReport {
        restored: 0,
        skipped: dropped,
    };
    let mut focus_target = None;

    for entry in layout.entries.iter().skip(dropped) {
        match replay_entry(state, registry, entry) {
            Ok(window_id) => {
                report.restored += 1;
                if entry.focused {
                    focus_target = Some(window_id);
                }
            }
            Err(err) => {
                report.skipped += 1;
                logging::warn!("layout entry for `{}` skipped: {err}", entry.app_id);
            }
        }
    }

    if let Some(window_id) = focus_target {
        if let Err(err) = focus::focus_window(state, window_id) {
            logging::warn!("restored focus target lost: {err}");
        }
    }
    report
}

fn replay_entry(
    state: &mut DesktopState,
    registry: &AppRegistry,
    entry: &LayoutEntry,
) -> Result<WindowId, DesktopError> {
    if entry.state == WindowState::Closed {
        return Err(DesktopError::InvalidTransition {
            operation: "restore layout entry",
            detail: "entry is closed".to_string(),
        });
    }
    let singleton = registry
        .get(&entry.app_id)
        .ok_or_else(|| DesktopError::AppNotFound(entry.app_id.clone()))?
        .policy
        .singleton();

    let running = state.process_for_app(&entry.app_id).map(|p| p.id);
    let window_id = match running {
        Some(process_id) if singleton => window_manager::open_window(
            state,
            registry,
            process_id,
            OpenWindowRequest::new(),
        )?,
        _ => {
            window_manager::spawn_process(state, registry, &entry.app_id, OpenWindowRequest::new())?
                .1
        }
    };

    match entry.restore_bounds {
        Some(restore_bounds) => {
            window_manager::move_window(state, window_id, restore_bounds)?;
            window_manager::maximize_window(state, window_id, entry.bounds)?;
        }
        None => window_manager::move_window(state, window_id, entry.bounds)?,
    }
    if entry.state == WindowState::Minimized {
        window_manager::minimize_window(state, window_id)?;
    } else if entry.state == WindowState::Normal && entry.restore_bounds.is_some() {
        window_manager::restore_window(state, window_id)?;
    }
    Ok(window_id)
}

/// Boxed future returned by [`PersistenceBridge`] methods.
pub type BridgeFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Object-safe async persistence boundary for the desktop runtime.
///
/// Implementations swallow and log storage failures: a failed load is `None`, a failed save is
/// dropped. Nothing here mutates [`DesktopState`]; loaded values re-enter through actions.
pub trait PersistenceBridge {
    fn load_snapshot(&self) -> BridgeFuture<'_, Option<WindowLayout>>;
    fn save_snapshot<'a>(&'a self, layout: &'a WindowLayout) -> BridgeFuture<'a, ()>;
    fn load_pinned(&self) -> BridgeFuture<'_, Option<Vec<ApplicationId>>>;
    fn save_pinned<'a>(&'a self, pinned: &'a [ApplicationId]) -> BridgeFuture<'a, ()>;
    fn load_preferences(&self) -> BridgeFuture<'_, Option<DesktopPreferences>>;
    fn save_preferences<'a>(&'a self, preferences: &'a DesktopPreferences)
        -> BridgeFuture<'a, ()>;
}

/// [`PersistenceBridge`] over any [`SnapshotStore`].
#[derive(Debug, Clone, Default)]
pub struct StorePersistenceBridge<S> {
    store: S,
}

impl<S: SnapshotStore> StorePersistenceBridge<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

fn loaded<T>(namespace: &str, result: Result<Option<T>, String>) -> Option<T> {
    match result {
        Ok(value) => value,
        Err(err) => {
            logging::warn!("{namespace} load failed: {err}");
            None
        }
    }
}

fn saved(namespace: &str, result: Result<(), String>) {
    if let Err(err) = result {
        logging::warn!("{namespace} save failed: {err}");
    }
}

impl<S: SnapshotStore> PersistenceBridge for StorePersistenceBridge<S> {
    fn load_snapshot(&self) -> BridgeFuture<'_, Option<WindowLayout>> {
        Box::pin(async move {
            let result =
                load_typed_with(&self.store, DESKTOP_LAYOUT_NAMESPACE, LAYOUT_SCHEMA_VERSION)
                    .await;
            loaded(DESKTOP_LAYOUT_NAMESPACE, result)
        })
    }

    fn save_snapshot<'a>(&'a self, layout: &'a WindowLayout) -> BridgeFuture<'a, ()> {
        Box::pin(async move {
            let result = save_typed_with(
                &self.store,
                DESKTOP_LAYOUT_NAMESPACE,
                LAYOUT_SCHEMA_VERSION,
                layout,
            )
            .await;
            saved(DESKTOP_LAYOUT_NAMESPACE, result);
        })
    }

    fn load_pinned(&self) -> BridgeFuture<'_, Option<Vec<ApplicationId>>> {
        Box::pin(async move {
            let result =
                load_typed_with::<_, PinnedDock>(&self.store, DOCK_NAMESPACE, DOCK_SCHEMA_VERSION)
                    .await;
            loaded(DOCK_NAMESPACE, result).map(|dock| dock.pinned)
        })
    }

    fn save_pinned<'a>(&'a self, pinned: &'a [ApplicationId]) -> BridgeFuture<'a, ()> {
        Box::pin(async move {
            let dock = PinnedDock {
                pinned: pinned.to_vec(),
            };
            let result =
                save_typed_with(&self.store, DOCK_NAMESPACE, DOCK_SCHEMA_VERSION, &dock).await;
            saved(DOCK_NAMESPACE, result);
        })
    }

    fn load_preferences(&self) -> BridgeFuture<'_, Option<DesktopPreferences>> {
        Box::pin(async move {
            let result = load_typed_with(
                &self.store,
                PREFERENCES_NAMESPACE,
                PREFERENCES_SCHEMA_VERSION,
            )
            .await;
            loaded(PREFERENCES_NAMESPACE, result)
        })
    }

    fn save_preferences<'a>(
        &'a self,
        preferences: &'a DesktopPreferences,
    ) -> BridgeFuture<'a, ()> {
        Box::pin(async move {
            let result = save_typed_with(
                &self.store,
                PREFERENCES_NAMESPACE,
                PREFERENCES_SCHEMA_VERSION,
                preferences,
            )
            .await;
            saved(PREFERENCES_NAMESPACE, result);
        })
    }
}

/// Loads persisted state and turns it into the actions that hydrate a fresh desktop.
///
/// Preferences come first so the restore gate and window cap apply to the layout replay.
pub async fn load_boot_actions(bridge: &dyn PersistenceBridge) -> Vec<DesktopAction> {
    let mut actions = Vec::new();
    let preferences = bridge.load_preferences().await;
    let restore_on_boot = preferences
        .as_ref()
        .map_or(DesktopPreferences::default().restore_on_boot, |p| {
            p.restore_on_boot
        });
    if let Some(preferences) = preferences {
        actions.push(DesktopAction::HydratePreferences { preferences });
    }
    if let Some(pinned) = bridge.load_pinned().await {
        actions.push(DesktopAction::HydrateDock { pinned });
    }
    if restore_on_boot {
        if let Some(layout) = bridge.load_snapshot().await {
            actions.push(DesktopAction::RestoreLayout { layout });
        }
    }
    actions
}
