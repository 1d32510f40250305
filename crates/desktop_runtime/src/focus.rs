//! Focus controller: raise, focus, fallback and self-healing of the focus pointer.

use berry_app_contract::AppRegistry;
use leptos::logging;

use crate::{
    model::{DesktopState, OpenWindowRequest, ProcessId, WindowId, WindowState},
    window_manager::{self, DesktopError},
};

/// Focuses `window_id`, restoring it if minimized and raising it to the top of the stack.
///
/// Focusing the window that is already focused and on top changes nothing.
pub fn focus_window(state: &mut DesktopState, window_id: WindowId) -> Result<(), DesktopError> {
    let window = state
        .windows
        .get_mut(&window_id)
        .ok_or(DesktopError::WindowNotFound(window_id))?;
    if window.state == WindowState::Minimized {
        if let Some(rect) = window.restore_rect.take() {
            window.rect = rect;
        }
        window.state = WindowState::Normal;
    }
    if window.focused && state.focused == Some(window_id) {
        return Ok(());
    }

    raise_to_top(state, window_id);
    for window in state.windows.values_mut() {
        window.focused = window.id == window_id;
    }
    state.focused = Some(window_id);
    mark_process_focused(state, window_id);
    Ok(())
}

/// Assigns the window `max(existing) + 1`.
pub(crate) fn raise_to_top(state: &mut DesktopState, window_id: WindowId) {
    let top = state.max_z_index() + 1;
    if let Some(window) = state.windows.get_mut(&window_id) {
        window.z_index = top;
    }
}

fn mark_process_focused(state: &mut DesktopState, window_id: WindowId) {
    let Some(process_id) = state.windows.get(&window_id).map(|w| w.process_id) else {
        return;
    };
    let tick = state.tick_focus_clock();
    if let Some(process) = state.processes.get_mut(&process_id) {
        process.last_focused = tick;
    }
}

/// Focuses the highest visible window, or nothing when every window is minimized.
pub fn apply_fallback(state: &mut DesktopState) {
    let next = top_visible_window(state);
    for window in state.windows.values_mut() {
        window.focused = Some(window.id) == next;
    }
    state.focused = next;
    if let Some(window_id) = next {
        mark_process_focused(state, window_id);
    }
}

fn top_visible_window(state: &DesktopState) -> Option<WindowId> {
    state
        .windows
        .values()
        .filter(|w| w.is_visible())
        .max_by_key(|w| w.z_index)
        .map(|w| w.id)
}

/// Re-establishes the focus invariants if something left them broken.
///
/// Returns `true` when a repair was needed. A dangling or stale focus pointer is cleared and the
/// fallback rule picks the new focused window.
pub fn heal_focus(state: &mut DesktopState) -> bool {
    let expected = top_visible_window(state);
    let mut flagged = state.windows.values().filter(|w| w.focused).map(|w| w.id);
    let first_flagged = flagged.next();
    let extra_flags = flagged.next().is_some();

    if state.focused == expected && first_flagged == expected && !extra_flags {
        return false;
    }

    logging::warn!(
        "focus invariant repaired: pointer={:?} flagged={:?} expected={:?}",
        state.focused,
        first_flagged,
        expected
    );
    state.focused = None;
    apply_fallback(state);
    true
}

/// The process's primary window: its highest z-index window, minimized or not.
pub fn primary_window(state: &DesktopState, process_id: ProcessId) -> Option<WindowId> {
    state
        .windows
        .values()
        .filter(|w| w.process_id == process_id)
        .max_by_key(|w| w.z_index)
        .map(|w| w.id)
}

/// Brings a process forward: focuses its primary window, or opens one for a headless process.
pub fn activate_process(
    state: &mut DesktopState,
    registry: &AppRegistry,
    process_id: ProcessId,
) -> Result<WindowId, DesktopError> {
    if state.process(process_id).is_none() {
        return Err(DesktopError::ProcessNotFound(process_id));
    }
    match primary_window(state, process_id) {
        Some(window_id) => {
            focus_window(state, window_id)?;
            Ok(window_id)
        }
        None => window_manager::open_window(state, registry, process_id, OpenWindowRequest::new()),
    }
}
