//! Reducer actions, side-effect intents, and transition logic for the window manager.

use berry_app_contract::{AppLifecycleEvent, AppRegistry, ApplicationId, WindowRect};

use crate::{
    dock::{self, DockRoute},
    focus,
    model::{
        DesktopPreferences, DesktopState, OpenWindowRequest, ProcessId, WindowId, WindowState,
    },
    persistence::{self, WindowLayout},
    window_manager::{self, DesktopError},
};

#[derive(Debug, Clone, PartialEq)]
/// Actions accepted by [`reduce_desktop`] to mutate [`DesktopState`].
pub enum DesktopAction {
    /// Launch an app, or focus the running instance of a singleton.
    LaunchApp {
        /// App to launch.
        app_id: ApplicationId,
    },
    /// Launch an app with explicit window parameters.
    LaunchAppWith {
        /// App to launch.
        app_id: ApplicationId,
        /// Window parameters for a newly opened window.
        request: OpenWindowRequest,
    },
    /// Start an additional process of a multi-instance app.
    NewInstance {
        /// App to launch.
        app_id: ApplicationId,
    },
    /// Open another window in a running process.
    OpenWindow {
        /// Owning process.
        process_id: ProcessId,
        /// Window parameters.
        request: OpenWindowRequest,
    },
    /// Close a window by id.
    CloseWindow {
        /// Window to close.
        window_id: WindowId,
    },
    /// Focus (and raise) a window by id.
    FocusWindow {
        /// Window to focus.
        window_id: WindowId,
    },
    /// Minimize a window.
    MinimizeWindow {
        /// Window to minimize.
        window_id: WindowId,
    },
    /// Restore a minimized or maximized window.
    RestoreWindow {
        /// Window to restore.
        window_id: WindowId,
    },
    /// Maximize a window to the provided viewport.
    MaximizeWindow {
        /// Window to maximize.
        window_id: WindowId,
        /// Viewport rectangle to maximize into.
        viewport: WindowRect,
    },
    /// Move a window.
    MoveWindow {
        /// Window to move.
        window_id: WindowId,
        /// New bounds.
        rect: WindowRect,
    },
    /// Resize a window.
    ResizeWindow {
        /// Window to resize.
        window_id: WindowId,
        /// New bounds.
        rect: WindowRect,
    },
    /// Replace a window title.
    SetWindowTitle {
        /// Window to retitle.
        window_id: WindowId,
        /// New title.
        title: String,
    },
    /// Bring a process forward through its primary window.
    ActivateProcess {
        /// Process to activate.
        process_id: ProcessId,
    },
    /// Terminate a process and all of its windows.
    KillProcess {
        /// Process to terminate.
        process_id: ProcessId,
    },
    /// Route a dock icon click to launch, focus or restore.
    DockClick {
        /// App behind the clicked icon.
        app_id: ApplicationId,
    },
    /// Pin an app to the end of the dock.
    PinApp {
        /// App to pin.
        app_id: ApplicationId,
    },
    /// Remove an app from the pinned dock section.
    UnpinApp {
        /// App to unpin.
        app_id: ApplicationId,
    },
    /// Move a pinned dock item to a new slot.
    MovePinnedItem {
        /// Current index.
        from: usize,
        /// Target index.
        to: usize,
    },
    /// Toggle layout restore on the next boot.
    SetRestoreOnBoot {
        /// Whether layout restore is enabled.
        enabled: bool,
    },
    /// Apply persisted preferences.
    HydratePreferences {
        /// Loaded preferences.
        preferences: DesktopPreferences,
    },
    /// Apply the persisted pinned dock order.
    HydrateDock {
        /// Loaded pinned apps.
        pinned: Vec<ApplicationId>,
    },
    /// Rebuild processes and windows from a saved layout.
    RestoreLayout {
        /// Saved layout.
        layout: WindowLayout,
    },
    /// Late bounds update from async work; ignored when the window has since closed.
    ApplyDeferredBounds {
        /// Target window.
        window_id: WindowId,
        /// Bounds to apply.
        rect: WindowRect,
    },
}

#[derive(Debug, Clone, PartialEq)]
/// Side-effect intents emitted by [`reduce_desktop`] for the runtime to execute.
pub enum RuntimeEffect {
    /// Persist the current window layout snapshot.
    PersistLayout,
    /// Persist the pinned dock order.
    PersistDock,
    /// Persist desktop preferences.
    PersistPreferences,
    /// Move DOM focus into the newly focused window.
    FocusWindowInput(WindowId),
    /// Notify the app hosted in a window about a lifecycle change.
    DispatchLifecycle {
        /// Affected window.
        window_id: WindowId,
        /// Lifecycle event.
        event: AppLifecycleEvent,
    },
}

/// Applies a [`DesktopAction`] and collects the resulting side effects.
///
/// The transition is all-or-nothing: on error `state` is left exactly as it was. After every
/// successful transition the focus invariants are re-checked and repaired if needed.
///
/// # Errors
///
/// Returns the [`DesktopError`] raised by the underlying operation.
pub fn reduce_desktop(
    state: &mut DesktopState,
    registry: &AppRegistry,
    action: DesktopAction,
) -> Result<Vec<RuntimeEffect>, DesktopError> {
    let mut next = state.clone();
    let mut effects = Vec::new();

    match action {
        DesktopAction::LaunchApp { app_id } => {
            window_manager::launch_app(&mut next, registry, &app_id)?;
        }
        DesktopAction::LaunchAppWith { app_id, request } => {
            window_manager::launch_app_with(&mut next, registry, &app_id, request)?;
        }
        DesktopAction::NewInstance { app_id } => {
            window_manager::new_instance(&mut next, registry, &app_id)?;
        }
        DesktopAction::OpenWindow {
            process_id,
            request,
        } => {
            window_manager::open_window(&mut next, registry, process_id, request)?;
        }
        DesktopAction::CloseWindow { window_id } => {
            window_manager::close_window(&mut next, registry, window_id)?;
        }
        DesktopAction::FocusWindow { window_id } => {
            focus::focus_window(&mut next, window_id)?;
        }
        DesktopAction::MinimizeWindow { window_id } => {
            window_manager::minimize_window(&mut next, window_id)?;
        }
        DesktopAction::RestoreWindow { window_id } => {
            window_manager::restore_window(&mut next, window_id)?;
        }
        DesktopAction::MaximizeWindow {
            window_id,
            viewport,
        } => {
            window_manager::maximize_window(&mut next, window_id, viewport)?;
        }
        DesktopAction::MoveWindow { window_id, rect } => {
            window_manager::move_window(&mut next, window_id, rect)?;
        }
        DesktopAction::ResizeWindow { window_id, rect } => {
            window_manager::resize_window(&mut next, window_id, rect)?;
        }
        DesktopAction::SetWindowTitle { window_id, title } => {
            window_manager::set_window_title(&mut next, window_id, title)?;
        }
        DesktopAction::ActivateProcess { process_id } => {
            focus::activate_process(&mut next, registry, process_id)?;
        }
        DesktopAction::KillProcess { process_id } => {
            window_manager::kill_process(&mut next, process_id)?;
        }
        DesktopAction::DockClick { app_id } => match dock::route_dock_click(&next, &app_id) {
            DockRoute::Launch => {
                window_manager::launch_app(&mut next, registry, &app_id)?;
            }
            DockRoute::Focus(window_id) => focus::focus_window(&mut next, window_id)?,
            DockRoute::Restore(window_id) => window_manager::restore_window(&mut next, window_id)?,
            DockRoute::OpenWindow(process_id) => {
                focus::activate_process(&mut next, registry, process_id)?;
            }
        },
        DesktopAction::PinApp { app_id } => {
            if dock::pin_app(&mut next, registry, &app_id)? {
                effects.push(RuntimeEffect::PersistDock);
            }
        }
        DesktopAction::UnpinApp { app_id } => {
            if dock::unpin_app(&mut next, &app_id) {
                effects.push(RuntimeEffect::PersistDock);
            }
        }
        DesktopAction::MovePinnedItem { from, to } => {
            if dock::move_pinned(&mut next, from, to)? {
                effects.push(RuntimeEffect::PersistDock);
            }
        }
        DesktopAction::SetRestoreOnBoot { enabled } => {
            if next.preferences.restore_on_boot != enabled {
                next.preferences.restore_on_boot = enabled;
                effects.push(RuntimeEffect::PersistPreferences);
            }
        }
        DesktopAction::HydratePreferences { preferences } => {
            next.preferences = preferences;
        }
        DesktopAction::HydrateDock { pinned } => {
            dock::hydrate_pins(&mut next, registry, pinned);
        }
        DesktopAction::RestoreLayout { layout } => {
            let limit = next.preferences.max_restore_windows;
            persistence::replay_layout(&mut next, registry, &layout, limit);
        }
        DesktopAction::ApplyDeferredBounds { window_id, rect } => {
            if next.window(window_id).is_some() {
                window_manager::move_window(&mut next, window_id, rect)?;
            }
        }
    }

    focus::heal_focus(&mut next);
    effects.extend(lifecycle_effects(state, &next));
    if next.focused != state.focused {
        if let Some(window_id) = next.focused {
            effects.push(RuntimeEffect::FocusWindowInput(window_id));
        }
    }
    if persistence::capture_layout(state) != persistence::capture_layout(&next) {
        effects.push(RuntimeEffect::PersistLayout);
    }

    *state = next;
    Ok(effects)
}

fn lifecycle_effects(before: &DesktopState, after: &DesktopState) -> Vec<RuntimeEffect> {
    let mut effects = Vec::new();
    let mut push = |window_id: WindowId, event: AppLifecycleEvent| {
        effects.push(RuntimeEffect::DispatchLifecycle { window_id, event });
    };

    for window in before.windows() {
        if after.window(window.id).is_none() {
            push(window.id, AppLifecycleEvent::Closed);
        }
    }
    for window in after.windows() {
        let Some(previous) = before.window(window.id) else {
            push(window.id, AppLifecycleEvent::Opened);
            continue;
        };
        match (previous.state, window.state) {
            (old, new) if old == new => {}
            (_, WindowState::Minimized) => push(window.id, AppLifecycleEvent::Minimized),
            (_, WindowState::Maximized) => push(window.id, AppLifecycleEvent::Maximized),
            (_, WindowState::Normal) => push(window.id, AppLifecycleEvent::Restored),
            (_, WindowState::Closed) => {}
        }
    }

    if before.focused != after.focused {
        if let Some(blurred) = before.focused.filter(|id| after.window(*id).is_some()) {
            push(blurred, AppLifecycleEvent::Blurred);
        }
        if let Some(focused) = after.focused {
            push(focused, AppLifecycleEvent::Focused);
        }
    }
    effects
}
