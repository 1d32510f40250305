//! Dock model: pinned and running items, click routing, and pin management.

use berry_app_contract::{AppRegistry, ApplicationId};

use crate::{
    model::{DesktopState, ProcessId, WindowId},
    window_manager::DesktopError,
};

#[derive(Debug, Clone, PartialEq, Eq)]
/// One icon in the dock.
pub struct DockItem {
    /// App behind the icon.
    pub app_id: ApplicationId,
    /// Whether the item sits in the pinned section.
    pub pinned: bool,
    /// Position in the dock, pinned items first.
    pub order: usize,
    /// Whether at least one process of the app is running (draws the indicator dot).
    pub running: bool,
}

/// Dock items: pinned apps in pin order, then running unpinned apps in launch order.
pub fn dock_items(state: &DesktopState, registry: &AppRegistry) -> Vec<DockItem> {
    let mut items = state
        .pinned_apps()
        .iter()
        .map(|app_id| DockItem {
            app_id: app_id.clone(),
            pinned: true,
            order: 0,
            running: state.is_running(app_id),
        })
        .collect::<Vec<_>>();

    for process in state.processes() {
        if items.iter().any(|item| item.app_id == process.app_id) {
            continue;
        }
        let visible_in_dock = registry
            .get(&process.app_id)
            .map_or(true, |definition| definition.show_in_dock);
        if visible_in_dock {
            items.push(DockItem {
                app_id: process.app_id.clone(),
                pinned: false,
                order: 0,
                running: true,
            });
        }
    }

    for (order, item) in items.iter_mut().enumerate() {
        item.order = order;
    }
    items
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// What a dock click resolves to for the current desktop.
pub enum DockRoute {
    /// Nothing is running: launch the app.
    Launch,
    /// Focus the app's frontmost visible window.
    Focus(WindowId),
    /// Every window is minimized: restore the most recent one.
    Restore(WindowId),
    /// Running without windows: activate the process so it opens one.
    OpenWindow(ProcessId),
}

/// Resolves a dock click on `app_id` against the current tables.
pub fn route_dock_click(state: &DesktopState, app_id: &ApplicationId) -> DockRoute {
    if !state.is_running(app_id) {
        return DockRoute::Launch;
    }
    if let Some(window) = state
        .windows_for_app(app_id)
        .filter(|w| w.is_visible())
        .max_by_key(|w| w.z_index)
    {
        return DockRoute::Focus(window.id);
    }
    if let Some(window) = state.windows_for_app(app_id).max_by_key(|w| w.z_index) {
        return DockRoute::Restore(window.id);
    }
    state
        .processes_for_app(app_id)
        .max_by_key(|p| (p.last_focused, p.id))
        .map_or(DockRoute::Launch, |p| DockRoute::OpenWindow(p.id))
}

/// Pins an installed app to the end of the dock. Returns `false` when it was already pinned.
pub fn pin_app(
    state: &mut DesktopState,
    registry: &AppRegistry,
    app_id: &ApplicationId,
) -> Result<bool, DesktopError> {
    if !registry.contains(app_id) {
        return Err(DesktopError::AppNotFound(app_id.clone()));
    }
    if state.pinned.contains(app_id) {
        return Ok(false);
    }
    state.pinned.push(app_id.clone());
    Ok(true)
}

/// Returns `false` when the app was not pinned.
pub fn unpin_app(state: &mut DesktopState, app_id: &ApplicationId) -> bool {
    let before = state.pinned.len();
    state.pinned.retain(|pinned| pinned != app_id);
    state.pinned.len() != before
}

/// Moves the pinned item at `from` to `to`; `to` is clamped to the last slot.
pub fn move_pinned(state: &mut DesktopState, from: usize, to: usize) -> Result<bool, DesktopError> {
    if from >= state.pinned.len() {
        return Err(DesktopError::InvalidTransition {
            operation: "move pinned item",
            detail: format!("index {from} is out of range"),
        });
    }
    let to = to.min(state.pinned.len() - 1);
    if from == to {
        return Ok(false);
    }
    let item = state.pinned.remove(from);
    state.pinned.insert(to, item);
    Ok(true)
}

/// Replaces the pinned list with persisted pins, dropping unknown and duplicate apps.
pub(crate) fn hydrate_pins(
    state: &mut DesktopState,
    registry: &AppRegistry,
    pinned: Vec<ApplicationId>,
) {
    let mut next = Vec::with_capacity(pinned.len());
    for app_id in pinned {
        if registry.contains(&app_id) && !next.contains(&app_id) {
            next.push(app_id);
        }
    }
    state.pinned = next;
}

#[cfg(test)]
mod tests {
    use berry_app_contract::{AppDefinition, AppPolicy};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::window_manager::{close_window, launch_app, minimize_window};

    fn app(raw: &str) -> ApplicationId {
        ApplicationId::trusted(raw)
    }

    fn registry() -> AppRegistry {
        AppRegistry::from_definitions(vec![
            AppDefinition::new(app("finder"), "Finder")
                .with_policy(AppPolicy::from_flags(true, true))
                .pinned_at(0),
            AppDefinition::new(app("text-edit"), "TextEdit").pinned_at(1),
            AppDefinition::new(app("terminal"), "Terminal"),
        ])
        .expect("registry")
    }

    #[test]
    fn running_unpinned_apps_follow_pinned_items() {
        let registry = registry();
        let mut state = DesktopState::with_registry(&registry);
        launch_app(&mut state, &registry, &app("terminal")).unwrap();
        launch_app(&mut state, &registry, &app("terminal")).unwrap();

        let items = dock_items(&state, &registry);
        let ids = items.iter().map(|i| i.app_id.as_str()).collect::<Vec<_>>();
        assert_eq!(ids, vec!["finder", "text-edit", "terminal"]);
        assert!(!items[2].pinned);
        assert!(items[2].running);
        assert!(!items[0].running);
        assert_eq!(items[2].order, 2);
    }

    #[test]
    fn clicks_route_by_window_visibility() {
        let registry = registry();
        let mut state = DesktopState::default();
        let finder = app("finder");
        assert_eq!(route_dock_click(&state, &finder), DockRoute::Launch);

        let pid = launch_app(&mut state, &registry, &finder).unwrap();
        let window = state.process(pid).unwrap().windows[0];
        assert_eq!(route_dock_click(&state, &finder), DockRoute::Focus(window));

        minimize_window(&mut state, window).unwrap();
        assert_eq!(route_dock_click(&state, &finder), DockRoute::Restore(window));

        close_window(&mut state, &registry, window).unwrap();
        assert_eq!(route_dock_click(&state, &finder), DockRoute::OpenWindow(pid));
    }

    #[test]
    fn pin_management_rejects_unknown_and_clamps_moves() {
        let registry = registry();
        let mut state = DesktopState::with_registry(&registry);

        assert!(matches!(
            pin_app(&mut state, &registry, &app("ghost")),
            Err(DesktopError::AppNotFound(_))
        ));
        assert!(pin_app(&mut state, &registry, &app("terminal")).unwrap());
        assert!(!pin_app(&mut state, &registry, &app("terminal")).unwrap());

        assert!(move_pinned(&mut state, 2, 0).unwrap());
        assert_eq!(
            state.pinned_apps(),
            &[app("terminal"), app("finder"), app("text-edit")]
        );
        assert!(move_pinned(&mut state, 0, 99).unwrap());
        assert_eq!(state.pinned_apps().last(), Some(&app("terminal")));
        assert!(move_pinned(&mut state, 7, 0).is_err());

        assert!(unpin_app(&mut state, &app("finder")));
        assert!(!unpin_app(&mut state, &app("finder")));
    }

    #[test]
    fn hydrated_pins_drop_unknown_and_duplicates() {
        let registry = registry();
        let mut state = DesktopState::default();
        hydrate_pins(
            &mut state,
            &registry,
            vec![app("terminal"), app("ghost"), app("terminal"), app("finder")],
        );
        assert_eq!(state.pinned_apps(), &[app("terminal"), app("finder")]);
    }
}
