//! Process and window table operations.
//!
//! Every function here validates before it mutates, so a returned error leaves the tables as
//! they were. Focus changes are delegated to [`crate::focus`].

use berry_app_contract::{
    AppDefinition, AppRegistry, ApplicationId, WindowRect, MIN_WINDOW_HEIGHT, MIN_WINDOW_WIDTH,
};
use berry_platform_host::unix_time_ms_now;
use thiserror::Error;

use crate::{
    focus,
    model::{
        DesktopState, OpenWindowRequest, ProcessId, ProcessRecord, WindowId,
        WindowRecord, WindowState,
    },
};

const CASCADE_STEP: i32 = 20;
const CASCADE_SLOTS: i32 = 8;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
/// Errors returned by window manager operations. None of them are fatal.
pub enum DesktopError {
    /// No window with this id exists.
    #[error("window {0} not found")]
    WindowNotFound(WindowId),
    /// No process with this id exists.
    #[error("process {0} not found")]
    ProcessNotFound(ProcessId),
    /// The app id is not in the registry.
    #[error("application `{0}` is not installed")]
    AppNotFound(ApplicationId),
    /// The target exists (or existed) but cannot make this transition.
    #[error("cannot {operation}: {detail}")]
    InvalidTransition {
        /// Operation that was attempted.
        operation: &'static str,
        /// Why it was refused.
        detail: String,
    },
    /// The request conflicts with an app or window policy.
    #[error("policy violation: {0}")]
    PolicyViolation(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    InvalidTransition,
    PolicyViolation,
}

impl DesktopError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::WindowNotFound(_) | Self::ProcessNotFound(_) | Self::AppNotFound(_) => {
                ErrorKind::NotFound
            }
            Self::InvalidTransition { .. } => ErrorKind::InvalidTransition,
            Self::PolicyViolation(_) => ErrorKind::PolicyViolation,
        }
    }
}

fn app_definition<'a>(
    registry: &'a AppRegistry,
    app_id: &ApplicationId,
) -> Result<&'a AppDefinition, DesktopError> {
    registry
        .get(app_id)
        .ok_or_else(|| DesktopError::AppNotFound(app_id.clone()))
}

fn missing_window(
    state: &DesktopState,
    window_id: WindowId,
    operation: &'static str,
) -> DesktopError {
    if state.was_issued(window_id) {
        DesktopError::InvalidTransition {
            operation,
            detail: format!("window {window_id} is closed"),
        }
    } else {
        DesktopError::WindowNotFound(window_id)
    }
}

fn window_mut<'a>(
    state: &'a mut DesktopState,
    window_id: WindowId,
    operation: &'static str,
) -> Result<&'a mut WindowRecord, DesktopError> {
    if !state.windows.contains_key(&window_id) {
        return Err(missing_window(state, window_id, operation));
    }
    state
        .windows
        .get_mut(&window_id)
        .ok_or(DesktopError::WindowNotFound(window_id))
}

/// Launches `app_id`, or focuses the running instance of a singleton app.
pub fn launch_app(
    state: &mut DesktopState,
    registry: &AppRegistry,
    app_id: &ApplicationId,
) -> Result<ProcessId, DesktopError> {
    launch_app_with(state, registry, app_id, OpenWindowRequest::new())
}

/// [`launch_app`] with explicit window parameters.
///
/// A running singleton only uses `request` when it is headless and needs a new window.
pub fn launch_app_with(
    state: &mut DesktopState,
    registry: &AppRegistry,
    app_id: &ApplicationId,
    request: OpenWindowRequest,
) -> Result<ProcessId, DesktopError> {
    let definition = app_definition(registry, app_id)?;
    if definition.policy.singleton() {
        if let Some(process_id) = state.process_for_app(app_id).map(|p| p.id) {
            match focus::primary_window(state, process_id) {
                Some(window_id) => focus::focus_window(state, window_id)?,
                None => {
                    open_window(state, registry, process_id, request)?;
                }
            }
            return Ok(process_id);
        }
    }
    spawn_process(state, registry, app_id, request).map(|(id, _)| id)
}

/// Starts another process of `app_id`; singleton apps that are already running are refused.
pub fn new_instance(
    state: &mut DesktopState,
    registry: &AppRegistry,
    app_id: &ApplicationId,
) -> Result<ProcessId, DesktopError> {
    spawn_process(state, registry, app_id, OpenWindowRequest::new()).map(|(id, _)| id)
}

/// Creates a process record and its first window.
pub fn spawn_process(
    state: &mut DesktopState,
    registry: &AppRegistry,
    app_id: &ApplicationId,
    request: OpenWindowRequest,
) -> Result<(ProcessId, WindowId), DesktopError> {
    let definition = app_definition(registry, app_id)?;
    if definition.policy.singleton() && state.is_running(app_id) {
        return Err(DesktopError::PolicyViolation(format!(
            "{} is single-instance and already running",
            definition.display_name
        )));
    }

    let process_id = state.allocate_process_id();
    state.processes.insert(
        process_id,
        ProcessRecord {
            id: process_id,
            app_id: app_id.clone(),
            windows: Vec::new(),
            created_at_unix_ms: unix_time_ms_now(),
            last_focused: 0,
        },
    );
    let window_id = open_window(state, registry, process_id, request)?;
    Ok((process_id, window_id))
}

/// Opens a window owned by `process_id` on top of the stack and focuses it.
pub fn open_window(
    state: &mut DesktopState,
    registry: &AppRegistry,
    process_id: ProcessId,
    request: OpenWindowRequest,
) -> Result<WindowId, DesktopError> {
    let process = state
        .processes
        .get(&process_id)
        .ok_or(DesktopError::ProcessNotFound(process_id))?;
    let app_id = process.app_id.clone();
    let definition = registry.get(&app_id);

    let rect = request
        .rect
        .unwrap_or_else(|| {
            let base = definition.map(|d| d.default_bounds).unwrap_or_default();
            let slot = (state.windows_for_app(&app_id).count() as i32) % CASCADE_SLOTS;
            base.offset(slot * CASCADE_STEP, slot * CASCADE_STEP)
        })
        .clamped_min(MIN_WINDOW_WIDTH, MIN_WINDOW_HEIGHT);
    let title = request
        .title
        .or_else(|| definition.map(|d| d.display_name.clone()))
        .unwrap_or_else(|| app_id.to_string());

    let window_id = state.allocate_window_id();
    state.windows.insert(
        window_id,
        WindowRecord {
            id: window_id,
            process_id,
            app_id,
            title,
            rect,
            restore_rect: None,
            // Raised to max + 1 by the focus below.
            z_index: 0,
            state: WindowState::Normal,
            focused: false,
            flags: request.flags,
        },
    );
    if let Some(process) = state.processes.get_mut(&process_id) {
        process.windows.push(window_id);
    }
    focus::focus_window(state, window_id)?;
    Ok(window_id)
}

/// Closes a window. Returns the owning process id when the process quit with it.
pub fn close_window(
    state: &mut DesktopState,
    registry: &AppRegistry,
    window_id: WindowId,
) -> Result<Option<ProcessId>, DesktopError> {
    let window = state
        .windows
        .remove(&window_id)
        .ok_or(DesktopError::WindowNotFound(window_id))?;

    let mut quit = None;
    if let Some(process) = state.processes.get_mut(&window.process_id) {
        process.windows.retain(|id| *id != window_id);
        let allows_zero_windows = registry
            .get(&process.app_id)
            .map(|d| d.policy.allows_zero_windows())
            .unwrap_or(false);
        if process.windows.is_empty() && !allows_zero_windows {
            quit = Some(process.id);
        }
    }
    if let Some(process_id) = quit {
        state.processes.remove(&process_id);
    }

    if state.focused == Some(window_id) {
        state.focused = None;
        focus::apply_fallback(state);
    }
    Ok(quit)
}

/// Minimizes a window, keeping its z-index so restore order reflects recency.
pub fn minimize_window(state: &mut DesktopState, window_id: WindowId) -> Result<(), DesktopError> {
    let window = window_mut(state, window_id, "minimize window")?;
    if !window.flags.minimizable {
        return Err(DesktopError::PolicyViolation(format!(
            "window {} cannot be minimized",
            window_id.0
        )));
    }
    if window.state == WindowState::Minimized {
        return Ok(());
    }
    window.state = WindowState::Minimized;
    window.focused = false;

    if state.focused == Some(window_id) {
        state.focused = None;
        focus::apply_fallback(state);
    }
    Ok(())
}

/// Returns a minimized or maximized window to normal, raises it and focuses it.
pub fn restore_window(state: &mut DesktopState, window_id: WindowId) -> Result<(), DesktopError> {
    let window = window_mut(state, window_id, "restore window")?;
    if let Some(rect) = window.restore_rect.take() {
        window.rect = rect;
    }
    window.state = WindowState::Normal;
    raise_and_focus(state, window_id)
}

/// Maximizes a window into `viewport`, remembering its previous bounds.
pub fn maximize_window(
    state: &mut DesktopState,
    window_id: WindowId,
    viewport: WindowRect,
) -> Result<(), DesktopError> {
    let window = window_mut(state, window_id, "maximize window")?;
    if !window.flags.maximizable {
        return Err(DesktopError::PolicyViolation(format!(
            "window {} cannot be maximized",
            window_id.0
        )));
    }
    if window.restore_rect.is_none() {
        window.restore_rect = Some(window.rect);
    }
    window.rect = viewport.clamped_min(MIN_WINDOW_WIDTH, MIN_WINDOW_HEIGHT);
    window.state = WindowState::Maximized;
    raise_and_focus(state, window_id)
}

/// Restore and maximize always raise, even when the window already holds focus.
fn raise_and_focus(state: &mut DesktopState, window_id: WindowId) -> Result<(), DesktopError> {
    if state.focused == Some(window_id) {
        focus::raise_to_top(state, window_id);
        return Ok(());
    }
    focus::focus_window(state, window_id)
}

/// Pure bounds change; focus and z-order are untouched.
pub fn move_window(
    state: &mut DesktopState,
    window_id: WindowId,
    rect: WindowRect,
) -> Result<(), DesktopError> {
    window_mut(state, window_id, "move window")?.rect = rect;
    Ok(())
}

/// Pure bounds change clamped to the minimum window size.
pub fn resize_window(
    state: &mut DesktopState,
    window_id: WindowId,
    rect: WindowRect,
) -> Result<(), DesktopError> {
    let window = window_mut(state, window_id, "resize window")?;
    if !window.flags.resizable {
        return Err(DesktopError::PolicyViolation(format!(
            "window {} is not resizable",
            window_id.0
        )));
    }
    window.rect = rect.clamped_min(MIN_WINDOW_WIDTH, MIN_WINDOW_HEIGHT);
    Ok(())
}

pub fn set_window_title(
    state: &mut DesktopState,
    window_id: WindowId,
    title: String,
) -> Result<(), DesktopError> {
    window_mut(state, window_id, "retitle window")?.title = title;
    Ok(())
}

/// Terminates a process and every window it owns, ignoring its lifetime policy.
pub fn kill_process(
    state: &mut DesktopState,
    process_id: ProcessId,
) -> Result<Vec<WindowId>, DesktopError> {
    if !state.processes.contains_key(&process_id) {
        return Err(DesktopError::ProcessNotFound(process_id));
    }

    let removed = state
        .windows
        .values()
        .filter(|w| w.process_id == process_id)
        .map(|w| w.id)
        .collect::<Vec<_>>();
    state.windows.retain(|_, w| w.process_id != process_id);
    state.processes.remove(&process_id);

    if state.focused.is_some_and(|id| removed.contains(&id)) {
        state.focused = None;
        focus::apply_fallback(state);
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use berry_app_contract::{AppDefinition, AppPolicy};
    use pretty_assertions::assert_eq;

    use super::*;

    fn app(raw: &str) -> ApplicationId {
        ApplicationId::trusted(raw)
    }

    fn registry() -> AppRegistry {
        AppRegistry::from_definitions(vec![
            AppDefinition::new(app("finder"), "Finder")
                .with_policy(AppPolicy::from_flags(true, true)),
            AppDefinition::new(app("calculator"), "Calculator")
                .with_policy(AppPolicy::from_flags(true, false)),
            AppDefinition::new(app("text-edit"), "TextEdit"),
        ])
        .expect("registry")
    }

    #[test]
    fn launching_unknown_app_is_not_found() {
        let mut state = DesktopState::default();
        let err = launch_app(&mut state, &registry(), &app("paint")).unwrap_err();
        assert_eq!(err, DesktopError::AppNotFound(app("paint")));
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(state, DesktopState::default());
    }

    #[test]
    fn singleton_launch_reuses_the_running_process() {
        let registry = registry();
        let mut state = DesktopState::default();
        let first = launch_app(&mut state, &registry, &app("calculator")).unwrap();
        let again = launch_app(&mut state, &registry, &app("calculator")).unwrap();
        assert_eq!(first, again);
        assert_eq!(state.process_count(), 1);
        assert_eq!(state.window_count(), 1);

        let err = new_instance(&mut state, &registry, &app("calculator")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PolicyViolation);
    }

    #[test]
    fn multi_instance_apps_get_a_process_per_launch_with_cascaded_windows() {
        let registry = registry();
        let mut state = DesktopState::default();
        let a = launch_app(&mut state, &registry, &app("text-edit")).unwrap();
        let b = launch_app(&mut state, &registry, &app("text-edit")).unwrap();
        assert_ne!(a, b);
        let rects = state.windows().map(|w| w.rect).collect::<Vec<_>>();
        assert_eq!(rects[1], rects[0].offset(CASCADE_STEP, CASCADE_STEP));
    }

    #[test]
    fn open_window_on_missing_process_is_not_found() {
        let mut state = DesktopState::default();
        let err = open_window(&mut state, &registry(), ProcessId(9), OpenWindowRequest::new())
            .unwrap_err();
        assert_eq!(err, DesktopError::ProcessNotFound(ProcessId(9)));
    }

    #[test]
    fn closing_last_window_keeps_zero_window_apps_alive() {
        let registry = registry();
        let mut state = DesktopState::default();
        let finder = launch_app(&mut state, &registry, &app("finder")).unwrap();
        let window = state.process(finder).unwrap().windows[0];

        assert_eq!(close_window(&mut state, &registry, window), Ok(None));
        assert!(state.process(finder).unwrap().windows.is_empty());
        assert_eq!(state.focused_window_id(), None);
    }

    #[test]
    fn operations_on_closed_windows_are_invalid_transitions() {
        let registry = registry();
        let mut state = DesktopState::default();
        let pid = launch_app(&mut state, &registry, &app("text-edit")).unwrap();
        let window = state.process(pid).unwrap().windows[0];
        close_window(&mut state, &registry, window).unwrap();

        assert_eq!(state.window_state(window), Some(WindowState::Closed));
        let err = minimize_window(&mut state, window).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidTransition);
        assert_eq!(
            minimize_window(&mut state, WindowId(77)),
            Err(DesktopError::WindowNotFound(WindowId(77)))
        );
        assert_eq!(
            close_window(&mut state, &registry, window),
            Err(DesktopError::WindowNotFound(window))
        );
    }

    #[test]
    fn move_and_resize_leave_focus_and_stack_alone() {
        let registry = registry();
        let mut state = DesktopState::default();
        launch_app(&mut state, &registry, &app("finder")).unwrap();
        let pid = launch_app(&mut state, &registry, &app("text-edit")).unwrap();
        let top = state.process(pid).unwrap().windows[0];
        let bottom = WindowId(1);
        let before = state.focus_state();

        move_window(&mut state, bottom, WindowRect::new(5, 6, 300, 200)).unwrap();
        resize_window(&mut state, bottom, WindowRect::new(5, 6, 10, 10)).unwrap();

        assert_eq!(state.focus_state(), before);
        assert_eq!(state.focused_window_id(), Some(top));
        let rect = state.window(bottom).unwrap().rect;
        assert_eq!((rect.w, rect.h), (MIN_WINDOW_WIDTH, MIN_WINDOW_HEIGHT));
    }

    #[test]
    fn maximize_then_restore_returns_previous_bounds() {
        let registry = registry();
        let mut state = DesktopState::default();
        let pid = launch_app(&mut state, &registry, &app("text-edit")).unwrap();
        let window = state.process(pid).unwrap().windows[0];
        let original = state.window(window).unwrap().rect;
        let viewport = WindowRect::new(0, 0, 1280, 760);

        maximize_window(&mut state, window, viewport).unwrap();
        assert_eq!(state.window(window).unwrap().state, WindowState::Maximized);
        assert_eq!(state.window(window).unwrap().rect, viewport);

        assert_eq!(state.window(window).unwrap().z_index, 2);

        restore_window(&mut state, window).unwrap();
        let record = state.window(window).unwrap();
        assert_eq!(record.state, WindowState::Normal);
        assert_eq!(record.rect, original);
        assert_eq!(record.restore_rect, None);
        assert_eq!(record.z_index, 3);
    }

    #[test]
    fn non_minimizable_windows_refuse_minimize() {
        let registry = registry();
        let mut state = DesktopState::default();
        let (_, window) = spawn_process(
            &mut state,
            &registry,
            &app("text-edit"),
            OpenWindowRequest::new().with_flags(crate::model::WindowFlags {
                minimizable: false,
                ..Default::default()
            }),
        )
        .unwrap();
        let err = minimize_window(&mut state, window).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PolicyViolation);
    }

    #[test]
    fn kill_process_removes_all_windows_and_refocuses() {
        let registry = registry();
        let mut state = DesktopState::default();
        let finder = launch_app(&mut state, &registry, &app("finder")).unwrap();
        let finder_window = state.process(finder).unwrap().windows[0];
        let editor = launch_app(&mut state, &registry, &app("text-edit")).unwrap();
        open_window(&mut state, &registry, editor, OpenWindowRequest::new()).unwrap();

        let removed = kill_process(&mut state, editor).unwrap();
        assert_eq!(removed.len(), 2);
        assert!(state.process(editor).is_none());
        assert_eq!(state.window_count(), 1);
        assert_eq!(state.focused_window_id(), Some(finder_window));
    }
}
